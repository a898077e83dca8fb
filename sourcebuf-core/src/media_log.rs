//! Media log contract
//!
//! The media log carries user-facing diagnostics about appended content
//! (codec mismatches, malformed init segments, missing coded frames). It is
//! separate from `tracing`, which carries developer traces. Sinks live in
//! `sourcebuf-diagnostics`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Suffix attached to the last entry a [`LogLimiter`] lets through
pub const LOG_LIMIT_SUFFIX: &str =
    " (Log limit reached. Further similar entries may be suppressed.)";

/// Severity of a media log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MediaLogLevel {
    /// Failure of the operation being logged
    Error,
    /// Suspicious but tolerated content
    Warning,
    /// Informational notice
    Info,
    /// Detailed diagnostics
    Debug,
}

impl fmt::Display for MediaLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediaLogLevel::Error => "error",
            MediaLogLevel::Warning => "warning",
            MediaLogLevel::Info => "info",
            MediaLogLevel::Debug => "debug",
        };
        f.write_str(name)
    }
}

/// Value of a named media log property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MediaLogProperty {
    /// Boolean property such as `found_audio_stream`
    Bool(bool),
    /// String property such as `audio_codec_name`
    String(String),
}

impl From<bool> for MediaLogProperty {
    fn from(value: bool) -> Self {
        MediaLogProperty::Bool(value)
    }
}

impl From<&str> for MediaLogProperty {
    fn from(value: &str) -> Self {
        MediaLogProperty::String(value.to_string())
    }
}

impl From<String> for MediaLogProperty {
    fn from(value: String) -> Self {
        MediaLogProperty::String(value)
    }
}

/// Sink for media log entries and property annotations
pub trait MediaLog: Send + Sync + fmt::Debug {
    /// Record a leveled message
    fn add_message(&self, level: MediaLogLevel, message: &str);

    /// Record a named property
    fn set_property(&self, name: &str, value: MediaLogProperty);
}

/// Media log that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMediaLog;

impl MediaLog for NullMediaLog {
    fn add_message(&self, _level: MediaLogLevel, _message: &str) {}

    fn set_property(&self, _name: &str, _value: MediaLogProperty) {}
}

/// Caps how many entries of one kind reach a media log
///
/// The count is never reset, so the cap applies over the limiter's lifetime.
#[derive(Debug, Clone)]
pub struct LogLimiter {
    emitted: usize,
    max: usize,
}

impl LogLimiter {
    /// Create a limiter that lets at most `max` entries through
    pub fn new(max: usize) -> Self {
        Self { emitted: 0, max }
    }

    /// Log `message` unless the cap has been reached
    ///
    /// Returns whether the message was forwarded.
    pub fn log(&mut self, log: &dyn MediaLog, level: MediaLogLevel, message: &str) -> bool {
        if self.emitted >= self.max {
            return false;
        }
        self.emitted += 1;

        if self.emitted == self.max {
            log.add_message(level, &format!("{}{}", message, LOG_LIMIT_SUFFIX));
        } else {
            log.add_message(level, message);
        }
        true
    }

    /// Number of entries forwarded so far
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Whether further entries will be dropped
    pub fn is_exhausted(&self) -> bool {
        self.emitted >= self.max
    }
}
