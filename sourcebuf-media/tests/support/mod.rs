//! Fakes of the source state collaborators shared by the integration tests

#![allow(dead_code)]

use bytes::Bytes;
use parking_lot::{Mutex, MutexGuard};
use sourcebuf_core::{
    BufferLimits, DecodeTimestamp, MediaLog, MediaLogLevel, MediaLogProperty, Ranges, TimeDelta,
};
use sourcebuf_media::*;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

// ============================================================================
// MEDIA LOG
// ============================================================================

/// Media log keeping every entry
#[derive(Debug, Default)]
pub struct TestLog {
    messages: Mutex<Vec<(MediaLogLevel, String)>>,
    properties: Mutex<BTreeMap<String, MediaLogProperty>>,
}

impl TestLog {
    pub fn messages(&self) -> Vec<(MediaLogLevel, String)> {
        self.messages.lock().clone()
    }

    pub fn messages_at(&self, level: MediaLogLevel) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages.lock().iter().any(|(_, m)| m.contains(needle))
    }

    pub fn property(&self, name: &str) -> Option<MediaLogProperty> {
        self.properties.lock().get(name).cloned()
    }
}

impl MediaLog for TestLog {
    fn add_message(&self, level: MediaLogLevel, message: &str) {
        self.messages.lock().push((level, message.to_string()));
    }

    fn set_property(&self, name: &str, value: MediaLogProperty) {
        self.properties.lock().insert(name.to_string(), value);
    }
}

// ============================================================================
// STORAGE ENGINE
// ============================================================================

/// Observable state of a fake storage engine
#[derive(Debug, Default)]
pub struct StreamState {
    pub calls: Vec<String>,
    pub audio_configs: Vec<AudioDecoderConfig>,
    pub video_configs: Vec<VideoDecoderConfig>,
    pub text_config: Option<TextTrackConfig>,
    pub reject_configs: bool,
    pub buffered_size: usize,
    pub ranges: Ranges<TimeDelta>,
    pub highest_pts: TimeDelta,
    pub buffered_duration: TimeDelta,
    pub evictions: Vec<(DecodeTimestamp, usize)>,
    pub evict_fails: bool,
    pub memory_limit: Option<usize>,
    pub seek_waiting: bool,
    pub shutdowns: usize,
}

#[derive(Debug)]
pub struct FakeStream {
    kind: TrackKind,
    media_track_id: String,
    state: Mutex<StreamState>,
}

impl FakeStream {
    pub fn new(kind: TrackKind, media_track_id: &str) -> Self {
        Self {
            kind,
            media_track_id: media_track_id.to_string(),
            state: Mutex::new(StreamState::default()),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, StreamState> {
        self.state.lock()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    fn record(&self, call: &str) {
        self.state.lock().calls.push(call.to_string());
    }
}

impl TrackStream for FakeStream {
    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn media_track_id(&self) -> MediaTrackId {
        self.media_track_id.clone()
    }

    fn update_audio_config(&self, config: &AudioDecoderConfig, _media_log: &dyn MediaLog) -> bool {
        let mut state = self.state.lock();
        state.audio_configs.push(config.clone());
        !state.reject_configs
    }

    fn update_video_config(&self, config: &VideoDecoderConfig, _media_log: &dyn MediaLog) -> bool {
        let mut state = self.state.lock();
        state.video_configs.push(config.clone());
        !state.reject_configs
    }

    fn update_text_config(&self, config: &TextTrackConfig, _media_log: &dyn MediaLog) {
        self.state.lock().text_config = Some(config.clone());
    }

    fn text_track_config(&self) -> Option<TextTrackConfig> {
        self.state.lock().text_config.clone()
    }

    fn buffered_size(&self) -> usize {
        self.state.lock().buffered_size
    }

    fn evict_coded_frames(&self, media_time: DecodeTimestamp, new_data_size: usize) -> bool {
        let mut state = self.state.lock();
        state.evictions.push((media_time, new_data_size));
        !state.evict_fails
    }

    fn buffered_ranges(&self, _duration: TimeDelta) -> Ranges<TimeDelta> {
        self.state.lock().ranges.clone()
    }

    fn remove(&self, _start: TimeDelta, _end: TimeDelta, _duration: TimeDelta) {
        self.record("remove");
    }

    fn highest_presentation_timestamp(&self) -> TimeDelta {
        self.state.lock().highest_pts
    }

    fn buffered_duration(&self) -> TimeDelta {
        self.state.lock().buffered_duration
    }

    fn start_returning_data(&self) {
        self.record("start_returning_data");
    }

    fn abort_reads(&self) {
        self.record("abort_reads");
    }

    fn seek(&self, _time: TimeDelta) {
        self.record("seek");
    }

    fn complete_pending_read_if_possible(&self) {
        self.record("complete_pending_read_if_possible");
    }

    fn on_set_duration(&self, _duration: TimeDelta) {
        self.record("on_set_duration");
    }

    fn mark_end_of_stream(&self) {
        self.record("mark_end_of_stream");
    }

    fn unmark_end_of_stream(&self) {
        self.record("unmark_end_of_stream");
    }

    fn shutdown(&self) {
        let mut state = self.state.lock();
        state.shutdowns += 1;
        state.calls.push("shutdown".to_string());
    }

    fn set_memory_limit(&self, memory_limit: usize) {
        self.state.lock().memory_limit = Some(memory_limit);
    }

    fn is_seek_waiting_for_data(&self) -> bool {
        self.state.lock().seek_waiting
    }
}

/// Observable state of the fake storage engine factory
#[derive(Debug, Default)]
pub struct FactoryState {
    pub created: Vec<Arc<FakeStream>>,
    pub fail_kinds: Vec<TrackKind>,
}

impl FactoryState {
    pub fn created_of(&self, kind: TrackKind) -> Vec<Arc<FakeStream>> {
        self.created
            .iter()
            .filter(|stream| stream.kind() == kind)
            .cloned()
            .collect()
    }
}

pub fn fake_factory(state: Arc<Mutex<FactoryState>>) -> Box<dyn StreamFactory + Send> {
    Box::new(move |kind: TrackKind| -> Option<StreamHandle> {
        let mut state = state.lock();
        if state.fail_kinds.contains(&kind) {
            return None;
        }
        let media_track_id = format!("{}-{}", kind, state.created.len() + 1);
        let stream = Arc::new(FakeStream::new(kind, &media_track_id));
        state.created.push(Arc::clone(&stream));
        Some(stream as StreamHandle)
    })
}

// ============================================================================
// FRAME PROCESSOR
// ============================================================================

/// One recorded `process_frames` call
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedDelivery {
    pub track_ids: Vec<TrackId>,
    pub append_window_start: TimeDelta,
    pub append_window_end: TimeDelta,
    pub timestamp_offset: TimeDelta,
}

/// Observable state of the fake frame processor
#[derive(Debug, Default)]
pub struct ProcessorState {
    pub tracks: BTreeMap<TrackId, StreamHandle>,
    pub calls: Vec<String>,
    pub reject_add_kinds: Vec<TrackKind>,
    pub reject_update: bool,
    pub reject_frames: bool,
    pub offset_override: Option<TimeDelta>,
    pub processed: Vec<ProcessedDelivery>,
    pub random_access_marks: usize,
    pub resets: usize,
    pub sequence_mode: Option<bool>,
    pub group_start: Option<TimeDelta>,
    pub audio_config_updates: Vec<AudioDecoderConfig>,
}

#[derive(Debug)]
pub struct FakeFrameProcessor(pub Arc<Mutex<ProcessorState>>);

impl FrameProcessor for FakeFrameProcessor {
    fn add_track(&mut self, id: TrackId, stream: StreamHandle) -> bool {
        let mut state = self.0.lock();
        state.calls.push(format!("add_track {}", id));
        if state.reject_add_kinds.contains(&stream.kind()) {
            return false;
        }
        state.tracks.insert(id, stream);
        true
    }

    fn update_track(&mut self, old_id: TrackId, new_id: TrackId) -> bool {
        let mut state = self.0.lock();
        state.calls.push(format!("update_track {} {}", old_id, new_id));
        if state.reject_update {
            return false;
        }
        match state.tracks.remove(&old_id) {
            Some(stream) => {
                state.tracks.insert(new_id, stream);
                true
            }
            None => false,
        }
    }

    fn remove_track(&mut self, id: TrackId) {
        let mut state = self.0.lock();
        state.calls.push(format!("remove_track {}", id));
        state.tracks.remove(&id);
    }

    fn process_frames(
        &mut self,
        buffers: &BufferQueueMap,
        append_window_start: TimeDelta,
        append_window_end: TimeDelta,
        timestamp_offset: &mut TimeDelta,
    ) -> bool {
        let mut state = self.0.lock();
        state.processed.push(ProcessedDelivery {
            track_ids: buffers.keys().copied().collect(),
            append_window_start,
            append_window_end,
            timestamp_offset: *timestamp_offset,
        });
        if state.reject_frames {
            return false;
        }
        if let Some(offset) = state.offset_override {
            *timestamp_offset = offset;
        }
        true
    }

    fn reset(&mut self) {
        self.0.lock().resets += 1;
    }

    fn set_sequence_mode(&mut self, sequence_mode: bool) {
        self.0.lock().sequence_mode = Some(sequence_mode);
    }

    fn set_group_start_timestamp_if_in_sequence_mode(&mut self, timestamp_offset: TimeDelta) {
        self.0.lock().group_start = Some(timestamp_offset);
    }

    fn set_all_track_buffers_need_random_access_point(&mut self) {
        self.0.lock().random_access_marks += 1;
    }

    fn on_possible_audio_config_update(&mut self, config: &AudioDecoderConfig) {
        self.0.lock().audio_config_updates.push(config.clone());
    }
}

// ============================================================================
// PARSER
// ============================================================================

/// One callback the scripted parser makes
#[derive(Debug, Clone)]
pub enum ParserEvent {
    Configs(MediaTracks, TextTrackConfigMap),
    InitDone(InitParameters),
    StartSegment,
    EndSegment,
    Buffers(BufferQueueMap),
    Fail,
}

/// Observable state of the scripted parser
#[derive(Debug, Default)]
pub struct ParserScript {
    pub options: Option<ParserOptions>,
    pub appends: VecDeque<Vec<ParserEvent>>,
    pub flushes: VecDeque<Vec<ParserEvent>>,
    pub parsed_bytes: Vec<usize>,
    pub flush_count: usize,
}

/// Parser replaying one queued event list per `parse` or `flush` call
#[derive(Debug)]
pub struct ScriptedParser(pub Arc<Mutex<ParserScript>>);

fn play(events: Vec<ParserEvent>, listener: &mut dyn ParserListener) -> bool {
    for event in events {
        let ok = match event {
            ParserEvent::Configs(tracks, text) => listener.on_new_configs(tracks, &text),
            ParserEvent::InitDone(params) => {
                listener.on_init_done(&params);
                true
            }
            ParserEvent::StartSegment => {
                listener.on_new_media_segment();
                true
            }
            ParserEvent::EndSegment => {
                listener.on_end_of_media_segment();
                true
            }
            ParserEvent::Buffers(buffers) => listener.on_new_buffers(&buffers),
            ParserEvent::Fail => false,
        };
        if !ok {
            return false;
        }
    }
    true
}

impl StreamParser for ScriptedParser {
    fn init(&mut self, options: ParserOptions) {
        self.0.lock().options = Some(options);
    }

    fn parse(&mut self, data: &[u8], listener: &mut dyn ParserListener) -> bool {
        let events = {
            let mut script = self.0.lock();
            script.parsed_bytes.push(data.len());
            script.appends.pop_front().unwrap_or_default()
        };
        play(events, listener)
    }

    fn flush(&mut self, listener: &mut dyn ParserListener) {
        let events = {
            let mut script = self.0.lock();
            script.flush_count += 1;
            script.flushes.pop_front().unwrap_or_default()
        };
        play(events, listener);
    }
}

// ============================================================================
// BUILDERS
// ============================================================================

pub fn aac() -> AudioDecoderConfig {
    AudioDecoderConfig::new(AudioCodec::Aac, 44100, 2)
}

pub fn opus() -> AudioDecoderConfig {
    AudioDecoderConfig::new(AudioCodec::Opus, 48000, 2)
}

pub fn h264() -> VideoDecoderConfig {
    VideoDecoderConfig::new(VideoCodec::H264, 640, 360)
}

pub fn vp9() -> VideoDecoderConfig {
    VideoDecoderConfig::new(VideoCodec::Vp9, 640, 360)
}

pub fn audio_video(audio_id: TrackId, video_id: TrackId) -> MediaTracks {
    let mut tracks = MediaTracks::new();
    tracks.add_audio_track(aac(), audio_id, "", "und");
    tracks.add_video_track(h264(), video_id, "", "und");
    tracks
}

pub fn audio_only(audio_id: TrackId) -> MediaTracks {
    let mut tracks = MediaTracks::new();
    tracks.add_audio_track(aac(), audio_id, "", "und");
    tracks
}

pub fn no_text() -> TextTrackConfigMap {
    TextTrackConfigMap::new()
}

pub fn subtitles(entries: &[(TrackId, &str, &str)]) -> TextTrackConfigMap {
    entries
        .iter()
        .map(|&(id, label, language)| {
            (
                id,
                TextTrackConfig::new(TextKind::Subtitles, label, language, &id.to_string()),
            )
        })
        .collect()
}

pub fn ms(millis: i64) -> TimeDelta {
    TimeDelta::from_millis(millis)
}

pub fn frame(timestamp_ms: i64, duration_ms: i64) -> StreamParserBuffer {
    StreamParserBuffer::new(
        ms(timestamp_ms),
        ms(duration_ms),
        true,
        Bytes::from_static(b"frame"),
    )
}

pub fn deliveries(batches: Vec<(TrackId, Vec<StreamParserBuffer>)>) -> BufferQueueMap {
    batches.into_iter().collect()
}

pub fn init_done(auto_update_timestamp_offset: bool) -> InitParameters {
    InitParameters {
        duration: Some(TimeDelta::from_secs(10)),
        auto_update_timestamp_offset,
    }
}

// ============================================================================
// HARNESS
// ============================================================================

/// A source state wired to fakes, with handles to inspect them
pub struct Harness {
    pub state: SourceState,
    pub parser: Arc<Mutex<ParserScript>>,
    pub processor: Arc<Mutex<ProcessorState>>,
    pub factory: Arc<Mutex<FactoryState>>,
    pub log: Arc<TestLog>,
    pub watched: Arc<Mutex<Vec<MediaTracks>>>,
    pub init_calls: Arc<Mutex<Vec<InitParameters>>>,
    pub new_text_tracks: Arc<Mutex<Vec<(String, TextTrackConfig)>>>,
    pub timestamp_offset: TimeDelta,
}

impl Harness {
    /// Source state initialized for `codecs` with text tracks enabled
    pub fn new(codecs: &str) -> Self {
        Self::with_limits(codecs, BufferLimits::unlimited(), true)
    }

    pub fn with_limits(codecs: &str, limits: BufferLimits, text_tracks: bool) -> Self {
        let mut harness = Self::uninitialized(limits);
        harness.init(codecs, text_tracks);
        harness
    }

    pub fn uninitialized(limits: BufferLimits) -> Self {
        let parser = Arc::new(Mutex::new(ParserScript::default()));
        let processor = Arc::new(Mutex::new(ProcessorState::default()));
        let factory = Arc::new(Mutex::new(FactoryState::default()));
        let log = Arc::new(TestLog::default());

        let mut state = SourceState::new(
            Box::new(ScriptedParser(Arc::clone(&parser))),
            Box::new(FakeFrameProcessor(Arc::clone(&processor))),
            fake_factory(Arc::clone(&factory)),
            Arc::clone(&log) as Arc<dyn MediaLog>,
            limits,
        );

        let watched = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&watched);
        state.set_tracks_watcher(Box::new(move |tracks: MediaTracks| sink.lock().push(tracks)));

        Self {
            state,
            parser,
            processor,
            factory,
            log,
            watched,
            init_calls: Arc::new(Mutex::new(Vec::new())),
            new_text_tracks: Arc::new(Mutex::new(Vec::new())),
            timestamp_offset: TimeDelta::ZERO,
        }
    }

    pub fn init(&mut self, codecs: &str, text_tracks: bool) {
        let init_calls = Arc::clone(&self.init_calls);
        let init_cb: InitCallback =
            Box::new(move |params: &InitParameters| init_calls.lock().push(params.clone()));

        let new_text_track_cb: Option<NewTextTrackCallback> = if text_tracks {
            let sink = Arc::clone(&self.new_text_tracks);
            Some(Box::new(move |stream: &StreamHandle, config: &TextTrackConfig| {
                sink.lock().push((stream.media_track_id(), config.clone()));
            }))
        } else {
            None
        };

        self.state.init(init_cb, codecs, new_text_track_cb);
    }

    /// Append with the full append window, replaying `events`
    pub fn append(&mut self, events: Vec<ParserEvent>) -> SourceResult<()> {
        self.append_in_window(events, TimeDelta::ZERO, TimeDelta::MAX)
    }

    pub fn append_in_window(
        &mut self,
        events: Vec<ParserEvent>,
        append_window_start: TimeDelta,
        append_window_end: TimeDelta,
    ) -> SourceResult<()> {
        self.parser.lock().appends.push_back(events);
        let mut offset = self.timestamp_offset;
        let result = self.state.append(
            b"appended bytes",
            append_window_start,
            append_window_end,
            &mut offset,
        );
        self.timestamp_offset = offset;
        result
    }

    /// Negotiate `tracks` and finish parser initialization
    pub fn negotiate(&mut self, tracks: MediaTracks, text: TextTrackConfigMap, auto_update: bool) {
        self.append(vec![
            ParserEvent::Configs(tracks, text),
            ParserEvent::InitDone(init_done(auto_update)),
        ])
        .expect("initial negotiation");
    }

    pub fn created(&self, kind: TrackKind) -> Vec<Arc<FakeStream>> {
        self.factory.lock().created_of(kind)
    }

    pub fn stream(&self, kind: TrackKind, id: TrackId) -> StreamHandle {
        self.state
            .stream(kind, id)
            .unwrap_or_else(|| panic!("no {} track {}", kind, id))
    }
}
