//! # Connector Layer
//!
//! External integrations implementing application interfaces:
//! - Predicate storage (in-memory, durable JSON records)
//! - Configuration registry (in-memory + topology-file loader)
//! - Remote prefix listings (HTTP, scriptable mock)
//! - Local catalog (filesystem walk, static for tests)

pub mod catalog;
pub mod registry;
pub mod remote;
pub mod storage;

pub use catalog::*;
pub use registry::*;
pub use remote::*;
pub use storage::*;
