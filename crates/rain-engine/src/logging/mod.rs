//! Logging utilities.
//!
//! Centralizes logger initialization. Everything else in the crate logs through
//! the `log` facade; scripts log under the `script` target.

mod init;

pub use init::{init_logging, LoggingConfig, SCRIPT_TARGET};
