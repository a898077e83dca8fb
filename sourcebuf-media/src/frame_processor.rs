//! Frame processor interface
//!
//! The frame processor applies the append window and timestamp offset to
//! parsed frames, handles sequence mode and discontinuities, and writes the
//! result into each track's storage engine.

use crate::codecs::AudioDecoderConfig;
use crate::stream::StreamHandle;
use crate::tracks::{BufferQueueMap, TrackId};
use sourcebuf_core::TimeDelta;
use std::fmt::Debug;

/// Routes parsed frames into storage engines
pub trait FrameProcessor: Send + Debug {
    /// Route frames for `id` into `stream`; false on failure
    fn add_track(&mut self, id: TrackId, stream: StreamHandle) -> bool;

    /// Route frames for `new_id` to the stream previously bound to `old_id`
    fn update_track(&mut self, old_id: TrackId, new_id: TrackId) -> bool;

    /// Forget the stream bound to `id`
    fn remove_track(&mut self, id: TrackId);

    /// Process one delivery, possibly updating `timestamp_offset`
    fn process_frames(
        &mut self,
        buffers: &BufferQueueMap,
        append_window_start: TimeDelta,
        append_window_end: TimeDelta,
        timestamp_offset: &mut TimeDelta,
    ) -> bool;

    /// Forget continuity state after a parser reset
    fn reset(&mut self);

    /// Switch between segments and sequence mode
    fn set_sequence_mode(&mut self, sequence_mode: bool);

    /// Set the group start timestamp if in sequence mode
    fn set_group_start_timestamp_if_in_sequence_mode(&mut self, timestamp_offset: TimeDelta);

    /// Require a random access point before accepting frames on any track
    fn set_all_track_buffers_need_random_access_point(&mut self);

    /// An audio config was (re)negotiated
    fn on_possible_audio_config_update(&mut self, config: &AudioDecoderConfig);
}
