//! Per-track storage engine interface
//!
//! A storage engine buffers the coded frames of one track, evicts them under
//! memory pressure and serves reads. The frame processor writes into it and
//! the source state queries and fans out to it, so handles are shared
//! (`Arc`) and engines synchronize internally.

use crate::codecs::{AudioDecoderConfig, TextTrackConfig, VideoDecoderConfig};
use crate::tracks::{MediaTrackId, TrackKind};
use sourcebuf_core::{DecodeTimestamp, MediaLog, Ranges, TimeDelta};
use std::fmt::Debug;
use std::sync::Arc;

/// Shared handle to a track's storage engine
pub type StreamHandle = Arc<dyn TrackStream>;

/// Storage engine for one track
pub trait TrackStream: Send + Sync + Debug {
    /// Kind of track this engine stores
    fn kind(&self) -> TrackKind;

    /// Stable identifier of this track
    fn media_track_id(&self) -> MediaTrackId;

    /// Apply a new audio config; false if the engine rejects it
    fn update_audio_config(&self, config: &AudioDecoderConfig, media_log: &dyn MediaLog) -> bool;

    /// Apply a new video config; false if the engine rejects it
    fn update_video_config(&self, config: &VideoDecoderConfig, media_log: &dyn MediaLog) -> bool;

    /// Apply a text config
    fn update_text_config(&self, config: &TextTrackConfig, media_log: &dyn MediaLog);

    /// Current text config, for text tracks
    fn text_track_config(&self) -> Option<TextTrackConfig>;

    /// Bytes currently buffered
    fn buffered_size(&self) -> usize;

    /// Free about `new_data_size` bytes without dropping data needed at or
    /// after `media_time`
    fn evict_coded_frames(&self, media_time: DecodeTimestamp, new_data_size: usize) -> bool;

    /// Buffered presentation ranges, clamped to `duration`
    fn buffered_ranges(&self, duration: TimeDelta) -> Ranges<TimeDelta>;

    /// Remove buffered data in `[start, end)`
    fn remove(&self, start: TimeDelta, end: TimeDelta, duration: TimeDelta);

    /// Highest buffered presentation timestamp
    fn highest_presentation_timestamp(&self) -> TimeDelta;

    /// Total buffered duration
    fn buffered_duration(&self) -> TimeDelta;

    /// Allow reads to return data again after a seek
    fn start_returning_data(&self);

    /// Abort any pending read
    fn abort_reads(&self);

    /// Reposition reads to `time`
    fn seek(&self, time: TimeDelta);

    /// Satisfy a pending read if data is now available
    fn complete_pending_read_if_possible(&self);

    /// Media duration changed
    fn on_set_duration(&self, duration: TimeDelta);

    /// No more data will be appended
    fn mark_end_of_stream(&self);

    /// More data may be appended again
    fn unmark_end_of_stream(&self);

    /// Release resources and fail pending reads
    fn shutdown(&self);

    /// Override the engine's memory limit in bytes
    fn set_memory_limit(&self, memory_limit: usize);

    /// Whether a pending seek is blocked on missing data
    fn is_seek_waiting_for_data(&self) -> bool;
}

/// Creates storage engines for newly discovered tracks
pub trait StreamFactory {
    /// Create an engine for a track of `kind`, or `None` on failure
    fn create_stream(&mut self, kind: TrackKind) -> Option<StreamHandle>;
}

impl<F> StreamFactory for F
where
    F: FnMut(TrackKind) -> Option<StreamHandle>,
{
    fn create_stream(&mut self, kind: TrackKind) -> Option<StreamHandle> {
        self(kind)
    }
}
