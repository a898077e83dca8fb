//! # sourcebuf - Track negotiation for media source buffers
//!
//! sourcebuf coordinates what happens to the bytes appended to one source
//! buffer: it drives a byte stream parser, checks each init segment against
//! the codecs the buffer was created for, binds the tracks it announces to
//! storage engines and routes coded frames to a frame processor.
//!
//! ## Key Features
//!
//! - **Codec validation**: init segments must carry exactly the expected codecs
//! - **Stable track binding**: tracks keep their storage engine across init segments
//! - **Cross-track queries**: buffered ranges, eviction and playback fan-out
//! - **Pluggable collaborators**: parser, frame processor and storage engines are traits
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sourcebuf::SourceBuf;
//! # fn collaborators() -> (
//! #     Box<dyn sourcebuf::StreamParser>,
//! #     Box<dyn sourcebuf::FrameProcessor>,
//! #     fn(sourcebuf::TrackKind) -> Option<sourcebuf::StreamHandle>,
//! # ) { unimplemented!() }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (parser, frame_processor, stream_factory) = collaborators();
//!
//! let sourcebuf = SourceBuf::init_from_env()?;
//! let mut source = sourcebuf
//!     .source_state("mp4a.40.2,avc1.42E01E")
//!     .parser(parser)
//!     .frame_processor(frame_processor)
//!     .stream_factory(stream_factory)
//!     .tracks_watcher(|tracks| println!("negotiated {} tracks", tracks.len()))
//!     .build()?;
//!
//! let mut timestamp_offset = sourcebuf::TimeDelta::ZERO;
//! source.append(
//!     &[0u8; 16],
//!     sourcebuf::TimeDelta::ZERO,
//!     sourcebuf::TimeDelta::MAX,
//!     &mut timestamp_offset,
//! )?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

// Re-export core types for easy access
pub use sourcebuf_core::{
    BufferLimits, CoreError, CoreResult, DecodeTimestamp, LogLimiter, MediaLog, MediaLogLevel,
    MediaLogProperty, NullMediaLog, Ranges, TimeDelta,
};

#[cfg(feature = "media")]
pub use sourcebuf_media::{
    AudioCodec, AudioDecoderConfig, BufferQueue, BufferQueueMap, ErrorCategory, FrameProcessor,
    InitParameters, MediaTrack, MediaTracks, NegotiationError, ParserListener, ParserOptions,
    SourceError, SourceResult, SourceState, State, StreamFactory, StreamHandle, StreamParser,
    StreamParserBuffer, TextKind, TextTrackConfig, TextTrackConfigMap, TrackId, TrackKind,
    TrackStream, VideoCodec, VideoDecoderConfig,
};

#[cfg(feature = "diagnostics")]
pub use sourcebuf_diagnostics::{
    init_logging, init_logging_from_env, MediaLogEntry, MediaLogSnapshot, RecordingMediaLog,
    TracingMediaLog,
};

// Public API modules
#[cfg(feature = "media")]
pub mod builder;
pub mod config;

// Re-export main API types
#[cfg(feature = "media")]
pub use builder::SourceStateBuilder;
pub use config::GlobalConfig;

use std::sync::Arc;
use tracing::info;

/// Main entry point for sourcebuf
#[derive(Debug, Clone)]
pub struct SourceBuf {
    config: Arc<GlobalConfig>,
}

impl SourceBuf {
    /// Initialize with default settings
    ///
    /// # Example
    /// ```rust,no_run
    /// use sourcebuf::SourceBuf;
    ///
    /// let sourcebuf = SourceBuf::init()?;
    /// # Ok::<(), sourcebuf::CoreError>(())
    /// ```
    pub fn init() -> CoreResult<Self> {
        Self::init_with(GlobalConfig::default())
    }

    /// Initialize from environment variables
    pub fn init_from_env() -> CoreResult<Self> {
        Self::init_with(GlobalConfig::from_env())
    }

    /// Initialize with custom global configuration
    ///
    /// With `debug_logging` set and the `diagnostics` feature enabled, this
    /// installs the global `tracing` subscriber. An invalid filter is an
    /// error; an already installed subscriber is kept.
    pub fn init_with(config: GlobalConfig) -> CoreResult<Self> {
        if config.debug_logging {
            install_logging(&config.log_filter)?;
        }

        info!(
            "sourcebuf initialized (audio limit {:?}, video limit {:?})",
            config.buffer_limits.audio_buffer_size_limit,
            config.buffer_limits.video_buffer_size_limit
        );
        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// Global configuration in use
    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    /// Create a source state builder for a buffer expecting `codecs`
    ///
    /// The builder starts with the configured buffer limits.
    #[cfg(feature = "media")]
    pub fn source_state(&self, codecs: &str) -> SourceStateBuilder {
        SourceStateBuilder::new(codecs).buffer_limits(self.config.buffer_limits)
    }
}

#[cfg(feature = "diagnostics")]
fn install_logging(filter: &str) -> CoreResult<()> {
    sourcebuf_diagnostics::validate_log_filter(filter)?;
    if let Err(e) = init_logging(filter) {
        tracing::warn!("Keeping existing tracing subscriber: {}", e);
    }
    Ok(())
}

#[cfg(not(feature = "diagnostics"))]
fn install_logging(filter: &str) -> CoreResult<()> {
    tracing::warn!(
        "Debug logging requested with filter {:?} but the diagnostics feature is disabled",
        filter
    );
    Ok(())
}
