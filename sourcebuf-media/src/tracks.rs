//! Track descriptions and coded frame types

use crate::codecs::{AudioDecoderConfig, TextTrackConfig, VideoDecoderConfig};
use bytes::Bytes;
use sourcebuf_core::{DecodeTimestamp, TimeDelta};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Bytestream track identifier, scoped to one init segment
pub type TrackId = u32;

/// Stable identifier a storage engine assigns to its track
pub type MediaTrackId = String;

/// Track kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TrackKind {
    /// Audio track
    Audio,
    /// Video track
    Video,
    /// Text track
    Text,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrackKind::Audio => "audio",
            TrackKind::Video => "video",
            TrackKind::Text => "text",
        };
        f.write_str(name)
    }
}

/// One track of an init segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaTrack {
    kind: TrackKind,
    bytestream_track_id: TrackId,
    id: MediaTrackId,
    label: String,
    language: String,
}

impl MediaTrack {
    /// Track kind
    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    /// Identifier within the current init segment
    pub fn bytestream_track_id(&self) -> TrackId {
        self.bytestream_track_id
    }

    /// Identifier of the storage engine backing this track
    ///
    /// Empty until the track has been negotiated.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Bind the track to a storage engine's identifier
    pub fn set_id(&mut self, id: MediaTrackId) {
        self.id = id;
    }

    /// Label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Language tag
    pub fn language(&self) -> &str {
        &self.language
    }
}

/// The audio and video tracks of one init segment with their decoder configs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaTracks {
    tracks: Vec<MediaTrack>,
    audio_configs: HashMap<TrackId, AudioDecoderConfig>,
    video_configs: HashMap<TrackId, VideoDecoderConfig>,
}

impl MediaTracks {
    /// Create an empty track set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an audio track
    pub fn add_audio_track(
        &mut self,
        config: AudioDecoderConfig,
        bytestream_track_id: TrackId,
        label: &str,
        language: &str,
    ) -> &mut MediaTrack {
        self.audio_configs.insert(bytestream_track_id, config);
        self.push(TrackKind::Audio, bytestream_track_id, label, language)
    }

    /// Add a video track
    pub fn add_video_track(
        &mut self,
        config: VideoDecoderConfig,
        bytestream_track_id: TrackId,
        label: &str,
        language: &str,
    ) -> &mut MediaTrack {
        self.video_configs.insert(bytestream_track_id, config);
        self.push(TrackKind::Video, bytestream_track_id, label, language)
    }

    /// Add a track of arbitrary kind without a decoder config
    ///
    /// Parsers never report text tracks this way; negotiation rejects them.
    pub fn add_track(
        &mut self,
        kind: TrackKind,
        bytestream_track_id: TrackId,
        label: &str,
        language: &str,
    ) -> &mut MediaTrack {
        self.push(kind, bytestream_track_id, label, language)
    }

    fn push(
        &mut self,
        kind: TrackKind,
        bytestream_track_id: TrackId,
        label: &str,
        language: &str,
    ) -> &mut MediaTrack {
        self.tracks.push(MediaTrack {
            kind,
            bytestream_track_id,
            id: MediaTrackId::new(),
            label: label.to_string(),
            language: language.to_string(),
        });
        let last = self.tracks.len() - 1;
        &mut self.tracks[last]
    }

    /// Tracks in the order the parser reported them
    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    pub(crate) fn tracks_mut(&mut self) -> &mut [MediaTrack] {
        &mut self.tracks
    }

    /// Audio config of a track
    pub fn audio_config(&self, id: TrackId) -> Option<&AudioDecoderConfig> {
        self.audio_configs.get(&id)
    }

    /// Video config of a track
    pub fn video_config(&self, id: TrackId) -> Option<&VideoDecoderConfig> {
        self.video_configs.get(&id)
    }

    /// Number of tracks
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether there are no tracks
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

/// Text track configs of one init segment, keyed by bytestream id
pub type TextTrackConfigMap = BTreeMap<TrackId, TextTrackConfig>;

/// One coded frame emitted by the parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamParserBuffer {
    /// Presentation timestamp
    pub timestamp: TimeDelta,
    /// Frame duration
    pub duration: TimeDelta,
    /// Decode timestamp
    pub decode_timestamp: DecodeTimestamp,
    /// Whether the frame is a random access point
    pub is_key_frame: bool,
    /// Coded payload
    pub data: Bytes,
}

impl StreamParserBuffer {
    /// Create a frame whose decode time equals its presentation time
    pub fn new(timestamp: TimeDelta, duration: TimeDelta, is_key_frame: bool, data: Bytes) -> Self {
        Self {
            timestamp,
            duration,
            decode_timestamp: DecodeTimestamp::from_presentation_time(timestamp),
            is_key_frame,
            data,
        }
    }

    /// Presentation end time
    pub fn end_timestamp(&self) -> TimeDelta {
        self.timestamp + self.duration
    }
}

/// Frames of one track in one delivery
pub type BufferQueue = Vec<StreamParserBuffer>;

/// One delivery of frames, keyed by bytestream id
pub type BufferQueueMap = BTreeMap<TrackId, BufferQueue>;

/// End time of a batch: its last frame's timestamp plus duration
pub fn end_timestamp(queue: &[StreamParserBuffer]) -> Option<TimeDelta> {
    queue.last().map(StreamParserBuffer::end_timestamp)
}
