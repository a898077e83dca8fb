//! Codec identifiers and decoder configurations
//!
//! A source buffer is created with a codec string such as
//! `"avc1.42E01E, mp4a.40.2"`. Each entry is classified as an audio or video
//! codec here, and the resulting lists are what every init segment is
//! checked against.

use bytes::Bytes;
use std::fmt;

/// Audio codecs a source buffer can be created for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioCodec {
    /// MPEG-4 AAC
    Aac,
    /// MPEG-1 Layer III
    Mp3,
    /// Opus
    Opus,
    /// Vorbis
    Vorbis,
    /// FLAC
    Flac,
    /// Dolby Digital
    Ac3,
    /// Dolby Digital Plus
    Eac3,
}

impl AudioCodec {
    /// Classify a single codec id, or `None` if it is not an audio codec
    pub fn from_codec_id(codec_id: &str) -> Option<Self> {
        let id = codec_id.to_ascii_lowercase();
        match id.as_str() {
            "aac" => Some(AudioCodec::Aac),
            "mp3" | "mp4a.69" | "mp4a.6b" | "mp4a.40.34" => Some(AudioCodec::Mp3),
            "opus" => Some(AudioCodec::Opus),
            "vorbis" => Some(AudioCodec::Vorbis),
            "flac" | "fla_" | "flac_" => Some(AudioCodec::Flac),
            "ac-3" | "mp4a.a5" => Some(AudioCodec::Ac3),
            "ec-3" | "mp4a.a6" => Some(AudioCodec::Eac3),
            _ if id.starts_with("mp4a.40.") || id == "mp4a.67" || id == "mp4a.66" => {
                Some(AudioCodec::Aac)
            }
            _ => None,
        }
    }

    /// Human-readable codec name
    pub fn name(&self) -> &'static str {
        match self {
            AudioCodec::Aac => "aac",
            AudioCodec::Mp3 => "mp3",
            AudioCodec::Opus => "opus",
            AudioCodec::Vorbis => "vorbis",
            AudioCodec::Flac => "flac",
            AudioCodec::Ac3 => "ac3",
            AudioCodec::Eac3 => "eac3",
        }
    }
}

impl fmt::Display for AudioCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Video codecs a source buffer can be created for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoCodec {
    /// H.264 / AVC
    H264,
    /// H.265 / HEVC
    Hevc,
    /// VP8
    Vp8,
    /// VP9
    Vp9,
    /// AV1
    Av1,
    /// Theora
    Theora,
}

impl VideoCodec {
    /// Classify a single codec id, or `None` if it is not a video codec
    pub fn from_codec_id(codec_id: &str) -> Option<Self> {
        let id = codec_id.to_ascii_lowercase();
        match id.as_str() {
            "vp8" | "vp8.0" => Some(VideoCodec::Vp8),
            "vp9" | "vp9.0" => Some(VideoCodec::Vp9),
            "theora" => Some(VideoCodec::Theora),
            _ if id.starts_with("avc1.") || id.starts_with("avc3.") || id == "avc1" => {
                Some(VideoCodec::H264)
            }
            _ if id.starts_with("hev1.") || id.starts_with("hvc1.") => Some(VideoCodec::Hevc),
            _ if id.starts_with("vp09.") => Some(VideoCodec::Vp9),
            _ if id.starts_with("av01.") => Some(VideoCodec::Av1),
            _ => None,
        }
    }

    /// Human-readable codec name
    pub fn name(&self) -> &'static str {
        match self {
            VideoCodec::H264 => "h264",
            VideoCodec::Hevc => "hevc",
            VideoCodec::Vp8 => "vp8",
            VideoCodec::Vp9 => "vp9",
            VideoCodec::Av1 => "av1",
            VideoCodec::Theora => "theora",
        }
    }
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Split a codec string into trimmed, unquoted, non-empty codec ids
pub fn parse_codec_string(codecs: &str) -> Vec<String> {
    codecs
        .split(',')
        .map(|id| id.trim().trim_matches('"').trim())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// Codec lists a source buffer was created for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectedCodecs {
    /// Expected audio codecs, one entry per expected audio track
    pub audio: Vec<AudioCodec>,
    /// Expected video codecs, one entry per expected video track
    pub video: Vec<VideoCodec>,
    /// Codec ids that were neither audio nor video
    pub unrecognized: Vec<String>,
}

impl ExpectedCodecs {
    /// Classify every id of a codec string
    pub fn parse(codecs: &str) -> Self {
        let mut expected = Self::default();
        for codec_id in parse_codec_string(codecs) {
            if let Some(codec) = AudioCodec::from_codec_id(&codec_id) {
                expected.audio.push(codec);
            } else if let Some(codec) = VideoCodec::from_codec_id(&codec_id) {
                expected.video.push(codec);
            } else {
                expected.unrecognized.push(codec_id);
            }
        }
        expected
    }
}

/// Audio decoder configuration reported by the parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDecoderConfig {
    /// Codec
    pub codec: AudioCodec,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u8,
    /// Codec-specific setup data
    pub extra_data: Bytes,
}

impl AudioDecoderConfig {
    /// Create a config without codec setup data
    pub fn new(codec: AudioCodec, sample_rate: u32, channels: u8) -> Self {
        Self {
            codec,
            sample_rate,
            channels,
            extra_data: Bytes::new(),
        }
    }

    /// Whether the config describes something decodable
    pub fn is_valid(&self) -> bool {
        self.sample_rate > 0 && self.channels > 0
    }
}

impl fmt::Display for AudioDecoderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "codec: {} sample_rate: {} channels: {} extra_data: {} bytes",
            self.codec,
            self.sample_rate,
            self.channels,
            self.extra_data.len()
        )
    }
}

/// Video decoder configuration reported by the parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDecoderConfig {
    /// Codec
    pub codec: VideoCodec,
    /// Coded width in pixels
    pub width: u32,
    /// Coded height in pixels
    pub height: u32,
    /// Codec-specific setup data
    pub extra_data: Bytes,
}

impl VideoDecoderConfig {
    /// Create a config without codec setup data
    pub fn new(codec: VideoCodec, width: u32, height: u32) -> Self {
        Self {
            codec,
            width,
            height,
            extra_data: Bytes::new(),
        }
    }

    /// Whether the config describes something decodable
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl fmt::Display for VideoDecoderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "codec: {} coded_size: {}x{} extra_data: {} bytes",
            self.codec,
            self.width,
            self.height,
            self.extra_data.len()
        )
    }
}

/// Text track kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextKind {
    /// Subtitles
    Subtitles,
    /// Captions
    Captions,
    /// Descriptions
    Descriptions,
    /// Metadata
    Metadata,
}

/// Text track configuration reported by the parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextTrackConfig {
    /// Text track kind
    pub kind: TextKind,
    /// Label
    pub label: String,
    /// Language tag
    pub language: String,
    /// In-band track id
    pub id: String,
}

impl TextTrackConfig {
    /// Create a text track config
    pub fn new(kind: TextKind, label: &str, language: &str, id: &str) -> Self {
        Self {
            kind,
            label: label.to_string(),
            language: language.to_string(),
            id: id.to_string(),
        }
    }

    /// Whether every attribute equals `other`'s
    pub fn matches(&self, other: &TextTrackConfig) -> bool {
        self == other
    }

    /// This config with `id` replaced
    pub fn with_id(&self, id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..self.clone()
        }
    }
}
