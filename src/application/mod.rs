//! # Application Layer
//!
//! Use cases, scheduling and event propagation coordinating the domain
//! and connector layers.

pub mod event_bus;
pub mod interfaces;
pub mod scheduler;
pub mod service;
pub mod use_cases;

pub use event_bus::*;
pub use interfaces::*;
pub use scheduler::*;
pub use service::*;
pub use use_cases::*;
