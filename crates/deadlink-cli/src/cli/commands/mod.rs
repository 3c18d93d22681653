//! CLI command handlers, one file per command.

mod check;
mod proxy;
mod sanitize;

pub use check::{run_check, CheckArgs};
pub use proxy::run_proxy;
pub use sanitize::run_sanitize;
