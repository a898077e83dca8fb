//! # sourcebuf media
//!
//! Track negotiation and append coordination for one source buffer.
//!
//! A [`SourceState`] sits between a byte-level [`StreamParser`], a
//! [`FrameProcessor`] and the per-track storage engines ([`TrackStream`]).
//! It validates every init segment against the codecs the source buffer was
//! created for, binds bytestream track ids to storage engines, routes coded
//! frames and answers buffered-range and eviction queries across tracks.

#![warn(clippy::all)]

pub mod codecs;
pub mod error;
pub mod eviction;
pub mod frame_processor;
pub mod intersection;
pub mod negotiation;
pub mod parser;
pub mod segment;
pub mod source_state;
pub mod stream;
pub mod track_table;
pub mod tracks;

// Re-export main types
pub use codecs::{
    parse_codec_string, AudioCodec, AudioDecoderConfig, ExpectedCodecs, TextKind, TextTrackConfig,
    VideoCodec, VideoDecoderConfig,
};
pub use error::{ErrorCategory, NegotiationError, SourceError, SourceResult};
pub use eviction::{eviction_share, evict_coded_frames};
pub use frame_processor::FrameProcessor;
pub use intersection::compute_ranges_intersection;
pub use negotiation::{NegotiationContext, NewTextTrackCallback, TrackNegotiator};
pub use parser::{InitParameters, ParserListener, ParserOptions, StreamParser};
pub use segment::{SegmentTracker, MAX_MISSING_TRACK_IN_SEGMENT_LOGS};
pub use source_state::{InitCallback, SourceState, State, TracksWatcher};
pub use stream::{StreamFactory, StreamHandle, TrackStream};
pub use track_table::{TrackSlot, TrackTable};
pub use tracks::{
    end_timestamp, BufferQueue, BufferQueueMap, MediaTrack, MediaTrackId, MediaTracks,
    StreamParserBuffer, TextTrackConfigMap, TrackId, TrackKind,
};
