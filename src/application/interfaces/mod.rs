mod config_registry;
mod local_catalog;
mod predicate_store;
mod remote_listing;

pub use config_registry::*;
pub use local_catalog::*;
pub use predicate_store::*;
pub use remote_listing::*;
