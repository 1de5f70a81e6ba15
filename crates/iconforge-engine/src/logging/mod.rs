//! Logging utilities.
//!
//! Centralizes logger initialization for the engine and its drivers. Only the
//! standard `log` facade is imposed on library consumers; `env_logger` is the
//! backend wired up by `init_logging`.

mod init;

pub use init::{LoggingConfig, init_logging};
