mod event;
mod predicate;
mod repository;

pub use event::*;
pub use predicate::*;
pub use repository::*;
