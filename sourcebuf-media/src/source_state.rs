//! Per-source-buffer state
//!
//! [`SourceState`] drives appends through the stream parser, negotiates the
//! init segments it reports, routes coded frames to the frame processor and
//! answers buffered-range, eviction and playback queries across all tracks.
//!
//! The parser reports back through a listener that only lives for one
//! `parse` or `flush` call and carries the append window and timestamp
//! offset of that call.

use crate::codecs::ExpectedCodecs;
use crate::error::{NegotiationError, SourceError, SourceResult};
use crate::eviction;
use crate::frame_processor::FrameProcessor;
use crate::intersection::compute_ranges_intersection;
use crate::negotiation::{NegotiationContext, NewTextTrackCallback, TrackNegotiator};
use crate::parser::{InitParameters, ParserListener, ParserOptions, StreamParser};
use crate::segment::SegmentTracker;
use crate::stream::{StreamFactory, StreamHandle};
use crate::tracks::{
    end_timestamp, BufferQueueMap, MediaTracks, TextTrackConfigMap, TrackId, TrackKind,
};
use sourcebuf_core::{BufferLimits, DecodeTimestamp, MediaLog, MediaLogLevel, Ranges, TimeDelta};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Callback run once the parser has finished its first init segment
pub type InitCallback = Box<dyn FnOnce(&InitParameters) + Send>;

/// Callback receiving the tracks of every accepted init segment
pub type TracksWatcher = Box<dyn FnMut(MediaTracks) + Send>;

/// Lifecycle of a source state
///
/// States only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum State {
    /// `init` has not been called
    Uninitialized,
    /// Waiting for the first acceptable init segment
    PendingParserConfig,
    /// Init segment accepted, waiting for the parser to finish initializing
    PendingParserInit,
    /// Ready for media segments
    ParserInitialized,
}

/// Coordinates appends and track negotiation for one source buffer
pub struct SourceState {
    parser: Box<dyn StreamParser>,
    inner: SourceInner,
}

struct SourceInner {
    state: State,
    negotiator: TrackNegotiator,
    frame_processor: Box<dyn FrameProcessor>,
    stream_factory: Box<dyn StreamFactory + Send>,
    media_log: Arc<dyn MediaLog>,
    segment: SegmentTracker,
    init_cb: Option<InitCallback>,
    new_text_track_cb: Option<NewTextTrackCallback>,
    tracks_watcher: Option<TracksWatcher>,
    auto_update_timestamp_offset: bool,
    append_in_progress: bool,
}

impl SourceState {
    /// Create an uninitialized source state
    pub fn new(
        parser: Box<dyn StreamParser>,
        frame_processor: Box<dyn FrameProcessor>,
        stream_factory: Box<dyn StreamFactory + Send>,
        media_log: Arc<dyn MediaLog>,
        buffer_limits: BufferLimits,
    ) -> Self {
        Self {
            parser,
            inner: SourceInner {
                state: State::Uninitialized,
                negotiator: TrackNegotiator::new(buffer_limits),
                frame_processor,
                stream_factory,
                media_log,
                segment: SegmentTracker::new(),
                init_cb: None,
                new_text_track_cb: None,
                tracks_watcher: None,
                auto_update_timestamp_offset: false,
                append_in_progress: false,
            },
        }
    }

    /// Prepare for the first append
    ///
    /// `expected_codecs` is the codec string the source buffer was created
    /// with. Text tracks are only reported if `new_text_track_cb` is given.
    ///
    /// # Panics
    ///
    /// If called more than once.
    pub fn init(
        &mut self,
        init_cb: InitCallback,
        expected_codecs: &str,
        new_text_track_cb: Option<NewTextTrackCallback>,
    ) {
        assert_eq!(
            self.inner.state,
            State::Uninitialized,
            "source state initialized twice"
        );

        let expected = ExpectedCodecs::parse(expected_codecs);
        for codec_id in &expected.unrecognized {
            self.inner.media_log.add_message(
                MediaLogLevel::Info,
                &format!("Unrecognized media codec: {}", codec_id),
            );
        }
        info!(
            "Initializing source state for codecs \"{}\" ({} audio, {} video)",
            expected_codecs,
            expected.audio.len(),
            expected.video.len()
        );
        self.inner.negotiator.set_expected_codecs(expected);

        self.inner.init_cb = Some(init_cb);
        self.inner.new_text_track_cb = new_text_track_cb;
        self.inner.state = State::PendingParserConfig;

        self.parser.init(ParserOptions {
            ignore_text_tracks: self.inner.new_text_track_cb.is_none(),
        });
    }

    /// Parse `data`, negotiating init segments and processing coded frames
    ///
    /// Frames outside `[append_window_start, append_window_end)` are dropped
    /// by the frame processor. `timestamp_offset` is applied to every frame
    /// and may be advanced while parsing.
    ///
    /// # Panics
    ///
    /// If an append is already in progress.
    pub fn append(
        &mut self,
        data: &[u8],
        append_window_start: TimeDelta,
        append_window_end: TimeDelta,
        timestamp_offset: &mut TimeDelta,
    ) -> SourceResult<()> {
        if self.inner.state == State::Uninitialized {
            return Err(SourceError::NotInitialized);
        }
        assert!(
            !self.inner.append_in_progress,
            "append called while another append is in progress"
        );
        self.inner.append_in_progress = true;

        let mut listener = ParseListener {
            inner: &mut self.inner,
            mode: ParseMode::Append,
            append_window_start,
            append_window_end,
            timestamp_offset,
            negotiation_error: None,
        };
        let parsed = self.parser.parse(data, &mut listener);
        let cause = listener.negotiation_error.take();

        self.inner.append_in_progress = false;

        if parsed {
            return Ok(());
        }
        let error = SourceError::ParseFailed {
            data_size: data.len(),
            window_start: append_window_start.as_secs_f64(),
            window_end: append_window_end.as_secs_f64(),
            cause,
        };
        self.inner
            .media_log
            .add_message(MediaLogLevel::Error, &error.to_string());
        Err(error)
    }

    /// Drop any partially parsed data and leave the current media segment
    ///
    /// Frames the parser completes while flushing are processed with the
    /// given window and offset. Buffered data is left alone.
    pub fn reset_parser_state(
        &mut self,
        append_window_start: TimeDelta,
        append_window_end: TimeDelta,
        timestamp_offset: &mut TimeDelta,
    ) {
        assert!(
            !self.inner.append_in_progress,
            "reset_parser_state called during an append"
        );

        let mut listener = ParseListener {
            inner: &mut self.inner,
            mode: ParseMode::Flush,
            append_window_start,
            append_window_end,
            timestamp_offset,
            negotiation_error: None,
        };
        self.parser.flush(&mut listener);

        self.inner.frame_processor.reset();
        self.inner.segment.reset();
    }

    /// Register the callback that receives negotiated tracks
    ///
    /// # Panics
    ///
    /// If a watcher is already set.
    pub fn set_tracks_watcher(&mut self, tracks_watcher: TracksWatcher) {
        assert!(
            self.inner.tracks_watcher.is_none(),
            "tracks watcher already set"
        );
        self.inner.tracks_watcher = Some(tracks_watcher);
    }

    /// Switch the frame processor between segments and sequence mode
    ///
    /// # Panics
    ///
    /// If called while a media segment is being parsed.
    pub fn set_sequence_mode(&mut self, sequence_mode: bool) {
        assert!(
            !self.inner.segment.is_parsing_media_segment(),
            "sequence mode changed while parsing a media segment"
        );
        self.inner.frame_processor.set_sequence_mode(sequence_mode);
    }

    /// Set the group start timestamp if in sequence mode
    ///
    /// # Panics
    ///
    /// If called while a media segment is being parsed.
    pub fn set_group_start_timestamp_if_in_sequence_mode(&mut self, timestamp_offset: TimeDelta) {
        assert!(
            !self.inner.segment.is_parsing_media_segment(),
            "group start timestamp changed while parsing a media segment"
        );
        self.inner
            .frame_processor
            .set_group_start_timestamp_if_in_sequence_mode(timestamp_offset);
    }

    /// Remove buffered data in `[start, end)` from every track
    pub fn remove(&self, start: TimeDelta, end: TimeDelta, duration: TimeDelta) {
        for stream in self.inner.negotiator.streams() {
            stream.remove(start, end, duration);
        }
    }

    /// Free about `new_data_size` bytes across tracks, proportionally to
    /// what each buffers
    pub fn evict_coded_frames(&self, media_time: DecodeTimestamp, new_data_size: usize) -> bool {
        eviction::evict_coded_frames(self.inner.negotiator.streams(), media_time, new_data_size)
    }

    /// Time ranges buffered by every track
    pub fn buffered_ranges(&self, duration: TimeDelta, ended: bool) -> Ranges<TimeDelta> {
        let track_ranges: Vec<Ranges<TimeDelta>> = self
            .inner
            .negotiator
            .streams()
            .map(|stream| stream.buffered_ranges(duration))
            .collect();
        compute_ranges_intersection(&track_ranges, ended)
    }

    /// Highest buffered presentation timestamp over all tracks
    pub fn highest_presentation_timestamp(&self) -> TimeDelta {
        self.inner
            .negotiator
            .streams()
            .map(|stream| stream.highest_presentation_timestamp())
            .fold(TimeDelta::ZERO, TimeDelta::max)
    }

    /// Longest buffered duration over all tracks
    pub fn max_buffered_duration(&self) -> TimeDelta {
        self.inner
            .negotiator
            .streams()
            .map(|stream| stream.buffered_duration())
            .fold(TimeDelta::ZERO, TimeDelta::max)
    }

    /// Let every track return data again
    pub fn start_returning_data(&self) {
        for stream in self.inner.negotiator.streams() {
            stream.start_returning_data();
        }
    }

    /// Abort pending reads on every track
    pub fn abort_reads(&self) {
        for stream in self.inner.negotiator.streams() {
            stream.abort_reads();
        }
    }

    /// Seek every track
    pub fn seek(&self, seek_time: TimeDelta) {
        for stream in self.inner.negotiator.streams() {
            stream.seek(seek_time);
        }
    }

    /// Satisfy pending reads where data has arrived
    pub fn complete_pending_read_if_possible(&self) {
        for stream in self.inner.negotiator.streams() {
            stream.complete_pending_read_if_possible();
        }
    }

    /// Propagate a duration change
    pub fn on_set_duration(&self, duration: TimeDelta) {
        for stream in self.inner.negotiator.streams() {
            stream.on_set_duration(duration);
        }
    }

    /// Mark the end of the stream on every track
    pub fn mark_end_of_stream(&self) {
        for stream in self.inner.negotiator.streams() {
            stream.mark_end_of_stream();
        }
    }

    /// Undo [`SourceState::mark_end_of_stream`]
    pub fn unmark_end_of_stream(&self) {
        for stream in self.inner.negotiator.streams() {
            stream.unmark_end_of_stream();
        }
    }

    /// Shut down every track
    pub fn shutdown(&self) {
        for stream in self.inner.negotiator.streams() {
            stream.shutdown();
        }
    }

    /// Override the memory limit of every track of `kind`
    pub fn set_memory_limits(&self, kind: TrackKind, memory_limit: usize) {
        debug!("Setting {} memory limit to {} bytes", kind, memory_limit);
        for stream in self.inner.negotiator.table(kind).streams() {
            stream.set_memory_limit(memory_limit);
        }
    }

    /// Whether an audio or video track is blocking a seek
    ///
    /// Text tracks are discontinuous and never block.
    pub fn is_seek_waiting_for_data(&self) -> bool {
        self.inner
            .negotiator
            .media_streams()
            .any(|stream| stream.is_seek_waiting_for_data())
    }

    /// Lifecycle state
    pub fn state(&self) -> State {
        self.inner.state
    }

    /// Whether a media segment is being parsed
    pub fn is_parsing_media_segment(&self) -> bool {
        self.inner.segment.is_parsing_media_segment()
    }

    /// Whether the parser asked for automatic timestamp offset updates
    pub fn auto_update_timestamp_offset(&self) -> bool {
        self.inner.auto_update_timestamp_offset
    }

    /// Bytestream ids of the negotiated tracks of `kind`
    pub fn track_ids(&self, kind: TrackKind) -> Vec<TrackId> {
        self.inner.negotiator.table(kind).ids()
    }

    /// Storage engine of a negotiated track
    pub fn stream(&self, kind: TrackKind, track_id: TrackId) -> Option<StreamHandle> {
        self.inner.negotiator.table(kind).get(track_id).cloned()
    }
}

impl Drop for SourceState {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for SourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceState")
            .field("state", &self.inner.state)
            .field("parser", &self.parser)
            .field("negotiator", &self.inner.negotiator)
            .field("frame_processor", &self.inner.frame_processor)
            .field("segment", &self.inner.segment)
            .field(
                "auto_update_timestamp_offset",
                &self.inner.auto_update_timestamp_offset,
            )
            .field("append_in_progress", &self.inner.append_in_progress)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseMode {
    Append,
    Flush,
}

/// Parser callbacks bound to one `parse` or `flush` call
struct ParseListener<'a> {
    inner: &'a mut SourceInner,
    mode: ParseMode,
    append_window_start: TimeDelta,
    append_window_end: TimeDelta,
    timestamp_offset: &'a mut TimeDelta,
    negotiation_error: Option<NegotiationError>,
}

impl ParserListener for ParseListener<'_> {
    fn on_init_done(&mut self, params: &InitParameters) {
        debug!("on_init_done duration={:?}", params.duration);
        debug_assert_eq!(self.inner.state, State::PendingParserInit);
        self.inner.state = State::ParserInitialized;
        self.inner.auto_update_timestamp_offset = params.auto_update_timestamp_offset;
        if let Some(init_cb) = self.inner.init_cb.take() {
            init_cb(params);
        }
    }

    fn on_new_configs(&mut self, tracks: MediaTracks, text_configs: &TextTrackConfigMap) -> bool {
        debug_assert!(self.inner.state >= State::PendingParserConfig);

        let mut tracks = tracks;
        let append_in_progress = self.mode == ParseMode::Append;
        let inner = &mut *self.inner;
        let mut ctx = NegotiationContext {
            append_in_progress,
            frame_processor: inner.frame_processor.as_mut(),
            stream_factory: inner.stream_factory.as_mut(),
            media_log: inner.media_log.as_ref(),
            new_text_track: inner.new_text_track_cb.as_mut(),
        };

        match inner.negotiator.negotiate(&mut tracks, text_configs, &mut ctx) {
            Ok(()) => {
                if inner.state == State::PendingParserConfig {
                    inner.state = State::PendingParserInit;
                }
                match inner.tracks_watcher.as_mut() {
                    Some(watcher) => watcher(tracks),
                    None => warn!("No tracks watcher set, dropping {} negotiated tracks", tracks.len()),
                }
                true
            }
            Err(error) => {
                debug!("Init segment rejected: {}", error);
                self.negotiation_error = Some(error);
                false
            }
        }
    }

    fn on_new_buffers(&mut self, buffers: &BufferQueueMap) -> bool {
        debug!("on_new_buffers buffer_queues={}", buffers.len());
        debug_assert_eq!(self.inner.state, State::ParserInitialized);

        self.inner.segment.record_buffers(buffers);

        let offset_before_processing = *self.timestamp_offset;
        let mut new_timestamp_offset = offset_before_processing;
        if self.inner.auto_update_timestamp_offset {
            if let Some(min_end) = buffers.values().filter_map(|queue| end_timestamp(queue)).min() {
                new_timestamp_offset += min_end;
            }
        }

        if !self.inner.frame_processor.process_frames(
            buffers,
            self.append_window_start,
            self.append_window_end,
            self.timestamp_offset,
        ) {
            return false;
        }

        // Leave the offset alone if the frame processor already moved it.
        if self.inner.auto_update_timestamp_offset
            && *self.timestamp_offset == offset_before_processing
        {
            *self.timestamp_offset = new_timestamp_offset;
        }
        true
    }

    fn on_new_media_segment(&mut self) {
        debug!("on_new_media_segment");
        debug_assert_eq!(self.inner.state, State::ParserInitialized);
        self.inner.segment.start_segment();
    }

    fn on_end_of_media_segment(&mut self) {
        debug!("on_end_of_media_segment");
        let track_ids = self.inner.negotiator.media_track_ids();
        self.inner
            .segment
            .end_segment(track_ids, self.inner.media_log.as_ref());
    }
}
