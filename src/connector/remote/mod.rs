mod http;
mod mock;

pub use http::*;
pub use mock::*;
