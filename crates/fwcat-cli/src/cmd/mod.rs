//! CLI command implementations.

pub mod get;
pub mod inspect;
pub mod list;
pub mod pack;
pub mod watch;
