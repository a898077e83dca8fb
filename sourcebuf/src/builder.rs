//! Source state construction

use sourcebuf_core::{BufferLimits, CoreError, CoreResult, MediaLog};
use sourcebuf_media::{
    FrameProcessor, InitCallback, InitParameters, MediaTracks, NewTextTrackCallback, SourceState,
    StreamFactory, StreamHandle, StreamParser, TextTrackConfig, TracksWatcher,
};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Fluent builder wiring a [`SourceState`] to its collaborators
///
/// The parser, frame processor and stream factory are required. Without a
/// media log, entries go to `tracing` (or nowhere without the `diagnostics`
/// feature).
pub struct SourceStateBuilder {
    expected_codecs: String,
    parser: Option<Box<dyn StreamParser>>,
    frame_processor: Option<Box<dyn FrameProcessor>>,
    stream_factory: Option<Box<dyn StreamFactory + Send>>,
    media_log: Option<Arc<dyn MediaLog>>,
    buffer_limits: BufferLimits,
    init_cb: Option<InitCallback>,
    new_text_track_cb: Option<NewTextTrackCallback>,
    tracks_watcher: Option<TracksWatcher>,
}

impl SourceStateBuilder {
    /// Start a builder for a source buffer created with `expected_codecs`
    pub fn new(expected_codecs: &str) -> Self {
        Self {
            expected_codecs: expected_codecs.to_string(),
            parser: None,
            frame_processor: None,
            stream_factory: None,
            media_log: None,
            buffer_limits: BufferLimits::unlimited(),
            init_cb: None,
            new_text_track_cb: None,
            tracks_watcher: None,
        }
    }

    /// Set the byte stream parser (required)
    pub fn parser(mut self, parser: Box<dyn StreamParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Set the frame processor (required)
    pub fn frame_processor(mut self, frame_processor: Box<dyn FrameProcessor>) -> Self {
        self.frame_processor = Some(frame_processor);
        self
    }

    /// Set the storage engine factory (required)
    pub fn stream_factory<F>(mut self, stream_factory: F) -> Self
    where
        F: StreamFactory + Send + 'static,
    {
        self.stream_factory = Some(Box::new(stream_factory));
        self
    }

    /// Set the media log
    pub fn media_log(mut self, media_log: Arc<dyn MediaLog>) -> Self {
        self.media_log = Some(media_log);
        self
    }

    /// Set per-track buffer limits
    pub fn buffer_limits(mut self, buffer_limits: BufferLimits) -> Self {
        self.buffer_limits = buffer_limits;
        self
    }

    /// Run `callback` once the parser has finished initializing
    pub fn on_init_done<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&InitParameters) + Send + 'static,
    {
        self.init_cb = Some(Box::new(callback));
        self
    }

    /// Accept text tracks, reporting each new one to `callback`
    pub fn on_new_text_track<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&StreamHandle, &TextTrackConfig) + Send + 'static,
    {
        self.new_text_track_cb = Some(Box::new(callback));
        self
    }

    /// Receive the tracks of every accepted init segment
    pub fn tracks_watcher<F>(mut self, watcher: F) -> Self
    where
        F: FnMut(MediaTracks) + Send + 'static,
    {
        self.tracks_watcher = Some(Box::new(watcher));
        self
    }

    /// Build and initialize the source state
    pub fn build(self) -> CoreResult<SourceState> {
        let parser = self.parser.ok_or_else(|| missing("parser"))?;
        let frame_processor = self.frame_processor.ok_or_else(|| missing("frame_processor"))?;
        let stream_factory = self.stream_factory.ok_or_else(|| missing("stream_factory"))?;
        let media_log = self.media_log.unwrap_or_else(default_media_log);

        debug!("Building source state for codecs \"{}\"", self.expected_codecs);
        let mut state = SourceState::new(
            parser,
            frame_processor,
            stream_factory,
            media_log,
            self.buffer_limits,
        );
        if let Some(watcher) = self.tracks_watcher {
            state.set_tracks_watcher(watcher);
        }
        let init_cb = self
            .init_cb
            .unwrap_or_else(|| Box::new(|_params: &InitParameters| {}));
        state.init(init_cb, &self.expected_codecs, self.new_text_track_cb);
        Ok(state)
    }
}

impl fmt::Debug for SourceStateBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceStateBuilder")
            .field("expected_codecs", &self.expected_codecs)
            .field("parser", &self.parser)
            .field("frame_processor", &self.frame_processor)
            .field("stream_factory", &self.stream_factory.is_some())
            .field("media_log", &self.media_log)
            .field("buffer_limits", &self.buffer_limits)
            .field("init_cb", &self.init_cb.is_some())
            .field("new_text_track_cb", &self.new_text_track_cb.is_some())
            .field("tracks_watcher", &self.tracks_watcher.is_some())
            .finish()
    }
}

fn missing(field: &str) -> CoreError {
    CoreError::MissingConfiguration {
        field: field.to_string(),
    }
}

#[cfg(feature = "diagnostics")]
fn default_media_log() -> Arc<dyn MediaLog> {
    Arc::new(sourcebuf_diagnostics::TracingMediaLog::default())
}

#[cfg(not(feature = "diagnostics"))]
fn default_media_log() -> Arc<dyn MediaLog> {
    Arc::new(sourcebuf_core::NullMediaLog)
}
