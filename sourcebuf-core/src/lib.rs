//! # sourcebuf core
//!
//! Primitives shared by the sourcebuf crates: signed media time, ordered
//! range sets, the media log contract and process-wide buffer limits.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod limits;
pub mod media_log;
pub mod ranges;
pub mod time;

// Re-export main types
pub use error::{CoreError, CoreResult};
pub use limits::{BufferLimits, AUDIO_BUFFER_SIZE_LIMIT_ENV, VIDEO_BUFFER_SIZE_LIMIT_ENV};
pub use media_log::{
    LogLimiter, MediaLog, MediaLogLevel, MediaLogProperty, NullMediaLog, LOG_LIMIT_SUFFIX,
};
pub use ranges::Ranges;
pub use time::{DecodeTimestamp, TimeDelta};
