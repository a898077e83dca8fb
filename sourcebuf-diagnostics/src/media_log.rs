//! Media log sinks
//!
//! [`TracingMediaLog`] turns media log entries into `tracing` events so they
//! share the developer log. [`RecordingMediaLog`] keeps them in memory for
//! inspection and JSON export.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sourcebuf_core::{MediaLog, MediaLogLevel, MediaLogProperty};
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

/// Media log forwarding every entry to `tracing`
#[derive(Debug, Clone)]
pub struct TracingMediaLog {
    source: String,
}

impl TracingMediaLog {
    /// Create a log whose events carry `source` (e.g. a source buffer id)
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
        }
    }

    /// Name attached to every event
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl Default for TracingMediaLog {
    fn default() -> Self {
        Self::new("sourcebuf")
    }
}

impl MediaLog for TracingMediaLog {
    fn add_message(&self, level: MediaLogLevel, message: &str) {
        let source = self.source.as_str();
        match level {
            MediaLogLevel::Error => error!(source, "{}", message),
            MediaLogLevel::Warning => warn!(source, "{}", message),
            MediaLogLevel::Info => info!(source, "{}", message),
            MediaLogLevel::Debug => debug!(source, "{}", message),
        }
    }

    fn set_property(&self, name: &str, value: MediaLogProperty) {
        debug!(source = self.source.as_str(), property = name, value = ?value, "media log property");
    }
}

/// One recorded message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaLogEntry {
    /// Severity
    pub level: MediaLogLevel,
    /// Text
    pub message: String,
}

/// Everything a [`RecordingMediaLog`] holds at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaLogSnapshot {
    /// Messages in arrival order
    pub entries: Vec<MediaLogEntry>,
    /// Latest value of every property
    pub properties: BTreeMap<String, MediaLogProperty>,
}

/// Media log keeping entries in memory
#[derive(Debug, Default)]
pub struct RecordingMediaLog {
    entries: Mutex<Vec<MediaLogEntry>>,
    properties: Mutex<BTreeMap<String, MediaLogProperty>>,
}

impl RecordingMediaLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages recorded so far
    pub fn entries(&self) -> Vec<MediaLogEntry> {
        self.entries.lock().clone()
    }

    /// Messages recorded at `level`
    pub fn messages_at(&self, level: MediaLogLevel) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|entry| entry.level == level)
            .map(|entry| entry.message.clone())
            .collect()
    }

    /// Latest value of property `name`
    pub fn property(&self, name: &str) -> Option<MediaLogProperty> {
        self.properties.lock().get(name).cloned()
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> MediaLogSnapshot {
        MediaLogSnapshot {
            entries: self.entries(),
            properties: self.properties.lock().clone(),
        }
    }

    /// Current contents as pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.snapshot())
    }

    /// Drop everything recorded so far
    pub fn clear(&self) {
        self.entries.lock().clear();
        self.properties.lock().clear();
    }
}

impl MediaLog for RecordingMediaLog {
    fn add_message(&self, level: MediaLogLevel, message: &str) {
        self.entries.lock().push(MediaLogEntry {
            level,
            message: message.to_string(),
        });
    }

    fn set_property(&self, name: &str, value: MediaLogProperty) {
        self.properties.lock().insert(name.to_string(), value);
    }
}
