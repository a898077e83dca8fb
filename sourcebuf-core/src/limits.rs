//! Process-wide per-track buffer size limits
//!
//! Storage engines pick their own default memory limits. These optional
//! overrides raise or lower them for every track of one kind, and are read
//! once after the first init segment of a source buffer has been accepted.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Environment variable overriding the audio per-track buffer limit
pub const AUDIO_BUFFER_SIZE_LIMIT_ENV: &str = "SOURCEBUF_AUDIO_BUFFER_SIZE_LIMIT";

/// Environment variable overriding the video per-track buffer limit
pub const VIDEO_BUFFER_SIZE_LIMIT_ENV: &str = "SOURCEBUF_VIDEO_BUFFER_SIZE_LIMIT";

/// Optional per-track byte limits for audio and video storage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferLimits {
    /// Byte limit applied to every audio track (None = engine default)
    pub audio_buffer_size_limit: Option<usize>,
    /// Byte limit applied to every video track (None = engine default)
    pub video_buffer_size_limit: Option<usize>,
}

impl BufferLimits {
    /// No overrides
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Read overrides from the process environment
    ///
    /// Unparsable or zero values are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read overrides through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| match lookup(name) {
            Some(raw) => match parse_limit(name, &raw) {
                Ok(limit) => limit,
                Err(e) => {
                    warn!("Ignoring buffer size override: {}", e);
                    None
                }
            },
            None => None,
        };

        Self {
            audio_buffer_size_limit: read(AUDIO_BUFFER_SIZE_LIMIT_ENV),
            video_buffer_size_limit: read(VIDEO_BUFFER_SIZE_LIMIT_ENV),
        }
    }
}

/// Parse one limit value; zero means "no override"
fn parse_limit(name: &str, raw: &str) -> CoreResult<Option<usize>> {
    let value: u32 = raw
        .trim()
        .parse()
        .map_err(|e| CoreError::InvalidConfiguration {
            field: name.to_string(),
            reason: format!("{:?} is not an unsigned integer ({})", raw, e),
        })?;

    Ok(if value > 0 { Some(value as usize) } else { None })
}
