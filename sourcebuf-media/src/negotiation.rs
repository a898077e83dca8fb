//! Track negotiation
//!
//! Each init segment the parser reports is checked against the codecs the
//! source buffer was created for and reconciled with the tracks negotiated
//! so far. The first accepted init segment creates one storage engine per
//! track; later ones may only rebind bytestream ids to the existing engines.
//!
//! Failures come in two strengths. Hard failures stop negotiation on the
//! spot; if they happen while negotiating the first init segment, every
//! engine created during the call is unregistered, shut down and forgotten.
//! Failing to create or register a text track is hard as well. Soft failures
//! (rejected configs, text track mismatches) let the remaining tracks be
//! processed and still fail the init segment at the end.

use crate::codecs::{ExpectedCodecs, TextTrackConfig};
use crate::error::NegotiationError;
use crate::frame_processor::FrameProcessor;
use crate::stream::{StreamFactory, StreamHandle};
use crate::track_table::TrackTable;
use crate::tracks::{MediaTracks, TextTrackConfigMap, TrackId, TrackKind};
use sourcebuf_core::{BufferLimits, MediaLog, MediaLogLevel};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Callback notified of every text track created during negotiation
pub type NewTextTrackCallback = Box<dyn FnMut(&StreamHandle, &TextTrackConfig) + Send>;

/// Collaborators negotiation works through
pub struct NegotiationContext<'a> {
    /// Whether the init segment arrived during an append rather than a flush
    pub append_in_progress: bool,
    /// Frame processor tracks are registered with
    pub frame_processor: &'a mut dyn FrameProcessor,
    /// Factory for new storage engines
    pub stream_factory: &'a mut dyn StreamFactory,
    /// Media log for user-facing diagnostics
    pub media_log: &'a dyn MediaLog,
    /// Text track notification, if text tracks are wanted
    pub new_text_track: Option<&'a mut NewTextTrackCallback>,
}

/// Owner of the negotiated tracks of one source buffer
#[derive(Debug)]
pub struct TrackNegotiator {
    audio: TrackTable,
    video: TrackTable,
    text: TrackTable,
    expected_codecs: ExpectedCodecs,
    buffer_limits: BufferLimits,
    first_init_segment_received: bool,
}

impl TrackNegotiator {
    /// Create a negotiator with no tracks and no codec expectations
    pub fn new(buffer_limits: BufferLimits) -> Self {
        Self {
            audio: TrackTable::new(TrackKind::Audio),
            video: TrackTable::new(TrackKind::Video),
            text: TrackTable::new(TrackKind::Text),
            expected_codecs: ExpectedCodecs::default(),
            buffer_limits,
            first_init_segment_received: false,
        }
    }

    /// Codecs every init segment must match
    pub fn set_expected_codecs(&mut self, expected_codecs: ExpectedCodecs) {
        self.expected_codecs = expected_codecs;
    }

    /// Codecs every init segment must match
    pub fn expected_codecs(&self) -> &ExpectedCodecs {
        &self.expected_codecs
    }

    /// Whether an init segment got past track creation
    pub fn first_init_segment_received(&self) -> bool {
        self.first_init_segment_received
    }

    /// Table holding the tracks of `kind`
    pub fn table(&self, kind: TrackKind) -> &TrackTable {
        match kind {
            TrackKind::Audio => &self.audio,
            TrackKind::Video => &self.video,
            TrackKind::Text => &self.text,
        }
    }

    fn table_mut(&mut self, kind: TrackKind) -> &mut TrackTable {
        match kind {
            TrackKind::Audio => &mut self.audio,
            TrackKind::Video => &mut self.video,
            TrackKind::Text => &mut self.text,
        }
    }

    /// Every storage engine: audio, then video, then text, each by id
    pub fn streams(&self) -> impl Iterator<Item = &StreamHandle> + '_ {
        self.audio
            .streams()
            .chain(self.video.streams())
            .chain(self.text.streams())
    }

    /// Audio and video storage engines
    pub fn media_streams(&self) -> impl Iterator<Item = &StreamHandle> + '_ {
        self.audio.streams().chain(self.video.streams())
    }

    /// Audio and video bytestream ids
    pub fn media_track_ids(&self) -> Vec<TrackId> {
        let mut ids = self.audio.ids();
        ids.extend(self.video.ids());
        ids
    }

    /// Negotiate one init segment
    ///
    /// On success each track in `tracks` carries the media track id of its
    /// storage engine.
    ///
    /// # Panics
    ///
    /// If track ids are unique but no append is in progress.
    pub fn negotiate(
        &mut self,
        tracks: &mut MediaTracks,
        text_configs: &TextTrackConfigMap,
        ctx: &mut NegotiationContext<'_>,
    ) -> Result<(), NegotiationError> {
        debug!(
            "on_new_configs expected_audio={:?} expected_video={:?} tracks={}",
            self.expected_codecs.audio,
            self.expected_codecs.video,
            tracks.len()
        );

        if let Some(track_id) = find_duplicate_track_id(tracks, text_configs) {
            ctx.media_log
                .add_message(MediaLogLevel::Error, "Duplicate bytestream track ids detected");
            for track in tracks.tracks() {
                let message = format!(
                    "{} track bytestream track id={}",
                    track.kind(),
                    track.bytestream_track_id()
                );
                ctx.media_log.add_message(MediaLogLevel::Debug, &message);
            }
            return Err(NegotiationError::DuplicateTrackIds { track_id });
        }
        assert!(
            ctx.append_in_progress,
            "init segments can only be negotiated during an append"
        );

        let first_pass = !self.first_init_segment_received;
        let mut created = Vec::new();
        let outcome = self.reconcile(tracks, text_configs, ctx, &mut created);

        let soft_failure = match outcome {
            Ok(soft_failure) => soft_failure,
            Err(error) => {
                ctx.media_log
                    .add_message(MediaLogLevel::Error, &error.to_string());
                if first_pass {
                    self.roll_back(created, ctx.frame_processor);
                }
                return Err(error);
            }
        };

        ctx.frame_processor
            .set_all_track_buffers_need_random_access_point();

        if first_pass {
            self.first_init_segment_received = true;
            self.apply_buffer_limits(ctx.media_log);
        }

        debug!(
            "on_new_configs: {}",
            if soft_failure.is_none() { "success" } else { "failed" }
        );
        match soft_failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Everything before the random access point marking
    ///
    /// `Err` is a hard failure, `Ok(Some(_))` the first soft failure.
    fn reconcile(
        &mut self,
        tracks: &mut MediaTracks,
        text_configs: &TextTrackConfigMap,
        ctx: &mut NegotiationContext<'_>,
        created: &mut Vec<(TrackKind, TrackId)>,
    ) -> Result<Option<NegotiationError>, NegotiationError> {
        let mut soft_failure = None;
        let mut expected_audio = self.expected_codecs.audio.clone();
        let mut expected_video = self.expected_codecs.video.clone();

        for index in 0..tracks.len() {
            let kind = tracks.tracks()[index].kind();
            let track_id = tracks.tracks()[index].bytestream_track_id();

            match kind {
                TrackKind::Audio => {
                    let config = tracks
                        .audio_config(track_id)
                        .cloned()
                        .ok_or(NegotiationError::MissingDecoderConfig { kind, track_id })?;
                    debug!("Audio track_id={} config: {}", track_id, config);

                    let position = expected_audio
                        .iter()
                        .position(|codec| *codec == config.codec)
                        .ok_or_else(|| NegotiationError::UnexpectedCodec {
                            kind,
                            codec: config.codec.name().to_string(),
                        })?;
                    expected_audio.remove(position);

                    let stream =
                        self.stream_for(kind, track_id, config.codec.name(), ctx, created)?;
                    tracks.tracks_mut()[index].set_id(stream.media_track_id());
                    ctx.frame_processor.on_possible_audio_config_update(&config);
                    if !stream.update_audio_config(&config, ctx.media_log) {
                        record_soft_failure(
                            &mut soft_failure,
                            ctx.media_log,
                            NegotiationError::ConfigUpdateFailed { kind, track_id },
                        );
                    }
                }
                TrackKind::Video => {
                    let config = tracks
                        .video_config(track_id)
                        .cloned()
                        .ok_or(NegotiationError::MissingDecoderConfig { kind, track_id })?;
                    debug!("Video track_id={} config: {}", track_id, config);

                    let position = expected_video
                        .iter()
                        .position(|codec| *codec == config.codec)
                        .ok_or_else(|| NegotiationError::UnexpectedCodec {
                            kind,
                            codec: config.codec.name().to_string(),
                        })?;
                    expected_video.remove(position);

                    let stream =
                        self.stream_for(kind, track_id, config.codec.name(), ctx, created)?;
                    tracks.tracks_mut()[index].set_id(stream.media_track_id());
                    if !stream.update_video_config(&config, ctx.media_log) {
                        record_soft_failure(
                            &mut soft_failure,
                            ctx.media_log,
                            NegotiationError::ConfigUpdateFailed { kind, track_id },
                        );
                    }
                }
                TrackKind::Text => {
                    return Err(NegotiationError::UnsupportedTrackKind { kind, track_id });
                }
            }
        }

        if !expected_audio.is_empty() || !expected_video.is_empty() {
            let codecs: Vec<String> = expected_audio
                .iter()
                .map(|codec| codec.name().to_string())
                .chain(expected_video.iter().map(|codec| codec.name().to_string()))
                .collect();
            for codec in &codecs {
                let message = format!("Initialization segment misses expected {} track.", codec);
                ctx.media_log.add_message(MediaLogLevel::Error, &message);
            }
            return Err(NegotiationError::MissingExpectedCodecs { codecs });
        }

        if let Some(error) = self.reconcile_text_tracks(text_configs, ctx, created)? {
            record_soft_failure(&mut soft_failure, ctx.media_log, error);
        }

        if self.audio.is_empty() && self.video.is_empty() {
            debug!("on_new_configs: couldn't find a valid audio or video stream");
            return Err(NegotiationError::NoMediaTracks);
        }

        Ok(soft_failure)
    }

    /// Storage engine for an audio or video track
    ///
    /// Creates and registers one on the first pass. Afterwards the id must
    /// name an existing track, unless the kind has exactly one track, which
    /// is then rebound to `track_id`.
    fn stream_for(
        &mut self,
        kind: TrackKind,
        track_id: TrackId,
        codec_name: &str,
        ctx: &mut NegotiationContext<'_>,
        created: &mut Vec<(TrackKind, TrackId)>,
    ) -> Result<StreamHandle, NegotiationError> {
        if !self.first_init_segment_received {
            if self.table(kind).contains(track_id) {
                return Err(NegotiationError::UnexpectedTrack { kind, track_id });
            }
            let stream = ctx
                .stream_factory
                .create_stream(kind)
                .ok_or(NegotiationError::StreamCreationFailed { kind })?;
            if !ctx.frame_processor.add_track(track_id, Arc::clone(&stream)) {
                stream.shutdown();
                return Err(NegotiationError::TrackRegistrationFailed { kind, track_id });
            }
            if let Err(stream) = self.table_mut(kind).insert(track_id, Arc::clone(&stream)) {
                ctx.frame_processor.remove_track(track_id);
                stream.shutdown();
                return Err(NegotiationError::UnexpectedTrack { kind, track_id });
            }
            created.push((kind, track_id));

            ctx.media_log
                .set_property(&format!("found_{}_stream", kind), true.into());
            ctx.media_log
                .set_property(&format!("{}_codec_name", kind), codec_name.into());
            return Ok(stream);
        }

        let table = self.table_mut(kind);
        if table.len() > 1 {
            return table
                .get(track_id)
                .cloned()
                .ok_or(NegotiationError::UnexpectedTrack { kind, track_id });
        }

        let (old_id, stream) = table
            .sole()
            .map(|(id, stream)| (id, Arc::clone(stream)))
            .ok_or(NegotiationError::UnexpectedTrack { kind, track_id })?;
        if old_id != track_id {
            debug!("Remapping {} track {} to {}", kind, old_id, track_id);
            if !ctx.frame_processor.update_track(old_id, track_id) {
                warn!("Frame processor refused to remap {} track {} to {}", kind, old_id, track_id);
            }
            table.remap(old_id, track_id);
        }
        Ok(stream)
    }

    /// Create text tracks on first sight, otherwise check them against the
    /// negotiated ones
    ///
    /// Creating or registering a text track is a hard failure; mismatches
    /// with the negotiated text tracks are soft.
    fn reconcile_text_tracks(
        &mut self,
        text_configs: &TextTrackConfigMap,
        ctx: &mut NegotiationContext<'_>,
        created: &mut Vec<(TrackKind, TrackId)>,
    ) -> Result<Option<NegotiationError>, NegotiationError> {
        let kind = TrackKind::Text;
        if self.text.is_empty() {
            for (&track_id, config) in text_configs {
                let stream = ctx
                    .stream_factory
                    .create_stream(kind)
                    .ok_or(NegotiationError::StreamCreationFailed { kind })?;
                if !ctx.frame_processor.add_track(track_id, Arc::clone(&stream)) {
                    stream.shutdown();
                    return Err(NegotiationError::TrackRegistrationFailed { kind, track_id });
                }
                stream.update_text_config(config, ctx.media_log);
                if self.text.insert(track_id, Arc::clone(&stream)).is_err() {
                    ctx.frame_processor.remove_track(track_id);
                    stream.shutdown();
                    return Err(NegotiationError::UnexpectedTextTrack { track_id });
                }
                created.push((kind, track_id));
                if let Some(callback) = ctx.new_text_track.as_deref_mut() {
                    (*callback)(&stream, config);
                }
            }
            return Ok(None);
        }

        let text_count = self.text.len();
        if text_configs.len() != text_count {
            return Ok(Some(NegotiationError::TextTrackCountChanged {
                expected: text_count,
                actual: text_configs.len(),
            }));
        }

        if text_count == 1 {
            let Some((&new_id, new_config)) = text_configs.iter().next() else {
                return Ok(None);
            };
            let Some((old_id, stream)) = self
                .text
                .sole()
                .map(|(id, stream)| (id, Arc::clone(stream)))
            else {
                return Ok(None);
            };

            let unchanged = stream
                .text_track_config()
                .map_or(false, |old| new_config.with_id(&old.id).matches(&old));
            if !unchanged {
                return Ok(Some(NegotiationError::TextTrackConfigMismatch { track_id: new_id }));
            }
            if new_id != old_id {
                if !ctx.frame_processor.update_track(old_id, new_id) {
                    return Ok(Some(NegotiationError::TextTrackRemapFailed { old_id, new_id }));
                }
                self.text.remap(old_id, new_id);
            }
            return Ok(None);
        }

        for (&track_id, new_config) in text_configs {
            let Some(stream) = self.text.get(track_id) else {
                return Ok(Some(NegotiationError::UnexpectedTextTrack { track_id }));
            };
            let unchanged = stream
                .text_track_config()
                .map_or(false, |old| new_config.matches(&old));
            if !unchanged {
                return Ok(Some(NegotiationError::TextTrackConfigMismatch { track_id }));
            }
        }
        Ok(None)
    }

    fn apply_buffer_limits(&self, media_log: &dyn MediaLog) {
        let limits = [
            (&self.audio, self.buffer_limits.audio_buffer_size_limit),
            (&self.video, self.buffer_limits.video_buffer_size_limit),
        ];
        for (table, limit) in limits {
            if let Some(limit) = limit {
                let message = format!(
                    "Custom {} per-track SourceBuffer size limit={}",
                    table.kind(),
                    limit
                );
                media_log.add_message(MediaLogLevel::Info, &message);
                for stream in table.streams() {
                    stream.set_memory_limit(limit);
                }
            }
        }
    }

    /// Undo the tracks created by a failed first negotiation
    fn roll_back(
        &mut self,
        created: Vec<(TrackKind, TrackId)>,
        frame_processor: &mut dyn FrameProcessor,
    ) {
        if created.is_empty() {
            return;
        }
        debug!("Rolling back {} track(s) from failed negotiation", created.len());
        for (kind, track_id) in created.into_iter().rev() {
            frame_processor.remove_track(track_id);
            if let Some(stream) = self.table_mut(kind).remove(track_id) {
                stream.shutdown();
            }
        }
    }
}

/// First bytestream id used by more than one track, across all kinds
fn find_duplicate_track_id(
    tracks: &MediaTracks,
    text_configs: &TextTrackConfigMap,
) -> Option<TrackId> {
    let mut seen = HashSet::new();
    tracks
        .tracks()
        .iter()
        .map(|track| track.bytestream_track_id())
        .chain(text_configs.keys().copied())
        .find(|&id| !seen.insert(id))
}

fn record_soft_failure(
    slot: &mut Option<NegotiationError>,
    media_log: &dyn MediaLog,
    error: NegotiationError,
) {
    media_log.add_message(MediaLogLevel::Error, &error.to_string());
    if slot.is_none() {
        *slot = Some(error);
    }
}
