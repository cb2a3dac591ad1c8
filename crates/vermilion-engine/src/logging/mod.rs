//! Logging utilities.
//!
//! Centralizes logger initialization on top of the standard `log` facade.
//! Resource-creation failures are logged at error level by the runtime just
//! before it terminates; frame skips stay at debug level.

mod init;

pub use init::{LoggingConfig, init_logging};
