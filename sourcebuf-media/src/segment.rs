//! Media segment bookkeeping
//!
//! Tracks which tracks delivered frames during the current media segment and
//! reports, with a lifetime cap, tracks that delivered none.

use crate::tracks::{BufferQueueMap, TrackId};
use sourcebuf_core::{LogLimiter, MediaLog, MediaLogLevel};
use std::collections::HashMap;

/// Lifetime cap on missing-track diagnostics per source state
pub const MAX_MISSING_TRACK_IN_SEGMENT_LOGS: usize = 10;

/// Per-segment presence of coded frames
#[derive(Debug)]
pub struct SegmentTracker {
    parsing_media_segment: bool,
    has_data_for_track: HashMap<TrackId, bool>,
    missing_track_logs: LogLimiter,
}

impl Default for SegmentTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentTracker {
    /// Create a tracker outside any segment
    pub fn new() -> Self {
        Self {
            parsing_media_segment: false,
            has_data_for_track: HashMap::new(),
            missing_track_logs: LogLimiter::new(MAX_MISSING_TRACK_IN_SEGMENT_LOGS),
        }
    }

    /// Whether a media segment is being parsed
    pub fn is_parsing_media_segment(&self) -> bool {
        self.parsing_media_segment
    }

    /// Enter a new media segment
    pub fn start_segment(&mut self) {
        self.parsing_media_segment = true;
        self.has_data_for_track.clear();
    }

    /// Record every track with a non-empty batch in `buffers`
    pub fn record_buffers(&mut self, buffers: &BufferQueueMap) {
        for (&id, queue) in buffers {
            if !queue.is_empty() {
                self.has_data_for_track.insert(id, true);
            }
        }
    }

    /// Whether `id` delivered frames in the current segment
    pub fn has_data_for(&self, id: TrackId) -> bool {
        self.has_data_for_track.get(&id).copied().unwrap_or(false)
    }

    /// Leave the media segment, logging every track in `track_ids` that
    /// delivered nothing
    ///
    /// Returns the ids without data.
    pub fn end_segment<I>(&mut self, track_ids: I, media_log: &dyn MediaLog) -> Vec<TrackId>
    where
        I: IntoIterator<Item = TrackId>,
    {
        self.parsing_media_segment = false;

        let missing: Vec<TrackId> = track_ids
            .into_iter()
            .filter(|&id| !self.has_data_for(id))
            .collect();
        for &id in &missing {
            let message = format!(
                "Media segment did not contain any coded frames for track {}, mismatching \
                 initialization segment. Therefore, coded frame processing may not \
                 interoperably detect discontinuities in appended media.",
                id
            );
            self.missing_track_logs
                .log(media_log, MediaLogLevel::Debug, &message);
        }
        missing
    }

    /// Leave any segment and forget presence
    pub fn reset(&mut self) {
        self.parsing_media_segment = false;
        self.has_data_for_track.clear();
    }

    /// Missing-track diagnostics emitted so far
    pub fn missing_track_logs(&self) -> usize {
        self.missing_track_logs.emitted()
    }
}
