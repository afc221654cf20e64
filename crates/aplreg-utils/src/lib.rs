//! # aplreg Utilities
//!
//! Shared helpers for the aplreg workspace. At the moment that is the
//! logging setup used by the `aplreg` binary, built on `tracing`.

pub mod logging;

pub use logging::{init_logging, init_logging_with_level, LogFormat, LogLevel, LoggingError, LoggingHandle};
pub use tracing::{debug, error, info, trace, warn};
