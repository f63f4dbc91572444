//! # Sidewave Common
//!
//! Logging configuration shared by the Sidewave binaries and test harnesses.

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat, LOG_ENV_VAR};
