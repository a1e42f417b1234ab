mod aggregate_group;
mod check_path;
mod compute_whitelist;
mod list_status;

pub use aggregate_group::*;
pub use check_path::*;
pub use compute_whitelist::*;
pub use list_status::*;
