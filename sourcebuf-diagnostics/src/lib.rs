//! # sourcebuf diagnostics
//!
//! Media log sinks and logging setup for sourcebuf.
//! Provides a media log that forwards to `tracing`, a recording media log
//! that can be inspected or exported as JSON, and subscriber installation.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod debug_logger;
pub mod media_log;

// Re-export main types
pub use debug_logger::{
    init_logging, init_logging_from_env, validate_log_filter, DEFAULT_LOG_FILTER,
};
pub use media_log::{MediaLogEntry, MediaLogSnapshot, RecordingMediaLog, TracingMediaLog};
