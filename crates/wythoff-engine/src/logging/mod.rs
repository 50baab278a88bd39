//! Logging utilities.
//!
//! This module centralizes logger initialization. It avoids imposing a
//! specific logging backend beyond the standard `log` facade.

mod init;

pub use init::{init_logging, LoggingConfig, DEFAULT_FILTER};
