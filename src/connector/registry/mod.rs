mod loader;
mod memory;

pub use loader::*;
pub use memory::*;
