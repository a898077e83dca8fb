//! Negotiation and append error types
//!
//! [`NegotiationError`] describes why an init segment was rejected.
//! [`SourceError`] is what an append reports to its caller; a rejected init
//! segment surfaces as the cause of a parse failure.

use crate::tracks::{TrackId, TrackKind};
use thiserror::Error;

/// Reasons an init segment is rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    /// The same bytestream id was used by more than one track
    #[error("Duplicate bytestream track id {track_id} in initialization segment")]
    DuplicateTrackIds {
        /// First id found twice
        track_id: TrackId,
    },

    /// A track uses a codec the source buffer was not created for
    #[error("Initialization segment has unexpected {kind} codec {codec}")]
    UnexpectedCodec {
        /// Track kind
        kind: TrackKind,
        /// Codec name
        codec: String,
    },

    /// Expected codecs were left without a matching track
    #[error("Initialization segment misses expected track(s) with codec(s): {}", .codecs.join(", "))]
    MissingExpectedCodecs {
        /// Unmatched codec names
        codecs: Vec<String>,
    },

    /// A track was reported without a decoder config
    #[error("Missing decoder config for {kind} track {track_id}")]
    MissingDecoderConfig {
        /// Track kind
        kind: TrackKind,
        /// Bytestream id
        track_id: TrackId,
    },

    /// The storage engine factory returned nothing
    #[error("Failed to create {kind} stream")]
    StreamCreationFailed {
        /// Track kind
        kind: TrackKind,
    },

    /// The frame processor refused a new track
    #[error("Failed to register {kind} track {track_id} with the frame processor")]
    TrackRegistrationFailed {
        /// Track kind
        kind: TrackKind,
        /// Bytestream id
        track_id: TrackId,
    },

    /// A track did not match any previously negotiated track
    #[error("Got unexpected {kind} track id {track_id}")]
    UnexpectedTrack {
        /// Track kind
        kind: TrackKind,
        /// Bytestream id
        track_id: TrackId,
    },

    /// A track kind that cannot appear in the media track set
    #[error("Error: unsupported track type {kind} for track {track_id}")]
    UnsupportedTrackKind {
        /// Track kind
        kind: TrackKind,
        /// Bytestream id
        track_id: TrackId,
    },

    /// A storage engine rejected a decoder config
    #[error("Failed to apply {kind} config to track {track_id}")]
    ConfigUpdateFailed {
        /// Track kind
        kind: TrackKind,
        /// Bytestream id
        track_id: TrackId,
    },

    /// A later init segment changed the number of text tracks
    #[error("The number of text track configs changed: expected {expected}, got {actual}")]
    TextTrackCountChanged {
        /// Number of negotiated text tracks
        expected: usize,
        /// Number of text tracks in the new init segment
        actual: usize,
    },

    /// A text track changed kind, label or language
    #[error("New text track config for track ID {track_id} does not match old one")]
    TextTrackConfigMismatch {
        /// Bytestream id
        track_id: TrackId,
    },

    /// The frame processor refused to remap the single text track
    #[error("Failed to remap text track {old_id} to {new_id}")]
    TextTrackRemapFailed {
        /// Previously negotiated id
        old_id: TrackId,
        /// Id in the new init segment
        new_id: TrackId,
    },

    /// A text track id was not negotiated before
    #[error("Unexpected text track configuration for track ID {track_id}")]
    UnexpectedTextTrack {
        /// Bytestream id
        track_id: TrackId,
    },

    /// Neither audio nor video tracks were negotiated
    #[error("No audio or video tracks in initialization segment")]
    NoMediaTracks,
}

impl NegotiationError {
    /// Get error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            NegotiationError::DuplicateTrackIds { .. } => "DUPLICATE_TRACK_IDS",
            NegotiationError::UnexpectedCodec { .. } => "UNEXPECTED_CODEC",
            NegotiationError::MissingExpectedCodecs { .. } => "MISSING_EXPECTED_CODECS",
            NegotiationError::MissingDecoderConfig { .. } => "MISSING_DECODER_CONFIG",
            NegotiationError::StreamCreationFailed { .. } => "STREAM_CREATION_FAILED",
            NegotiationError::TrackRegistrationFailed { .. } => "TRACK_REGISTRATION_FAILED",
            NegotiationError::UnexpectedTrack { .. } => "UNEXPECTED_TRACK",
            NegotiationError::UnsupportedTrackKind { .. } => "UNSUPPORTED_TRACK_KIND",
            NegotiationError::ConfigUpdateFailed { .. } => "CONFIG_UPDATE_FAILED",
            NegotiationError::TextTrackCountChanged { .. } => "TEXT_TRACK_COUNT_CHANGED",
            NegotiationError::TextTrackConfigMismatch { .. } => "TEXT_TRACK_CONFIG_MISMATCH",
            NegotiationError::TextTrackRemapFailed { .. } => "TEXT_TRACK_REMAP_FAILED",
            NegotiationError::UnexpectedTextTrack { .. } => "UNEXPECTED_TEXT_TRACK",
            NegotiationError::NoMediaTracks => "NO_MEDIA_TRACKS",
        }
    }

    /// Get error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            NegotiationError::DuplicateTrackIds { .. } => ErrorCategory::Identity,
            NegotiationError::UnexpectedCodec { .. } => ErrorCategory::Codec,
            NegotiationError::MissingExpectedCodecs { .. } => ErrorCategory::Codec,
            NegotiationError::MissingDecoderConfig { .. } => ErrorCategory::Config,
            NegotiationError::StreamCreationFailed { .. } => ErrorCategory::Storage,
            NegotiationError::TrackRegistrationFailed { .. } => ErrorCategory::Storage,
            NegotiationError::UnexpectedTrack { .. } => ErrorCategory::Identity,
            NegotiationError::UnsupportedTrackKind { .. } => ErrorCategory::Identity,
            NegotiationError::ConfigUpdateFailed { .. } => ErrorCategory::Config,
            NegotiationError::TextTrackCountChanged { .. } => ErrorCategory::Text,
            NegotiationError::TextTrackConfigMismatch { .. } => ErrorCategory::Text,
            NegotiationError::TextTrackRemapFailed { .. } => ErrorCategory::Text,
            NegotiationError::UnexpectedTextTrack { .. } => ErrorCategory::Text,
            NegotiationError::NoMediaTracks => ErrorCategory::Identity,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Track ids or track sets that do not line up
    Identity,
    /// Codec expectations not met
    Codec,
    /// Decoder configs missing or rejected
    Config,
    /// Storage engine creation or registration
    Storage,
    /// Text track reconciliation
    Text,
    /// Byte stream parsing
    Parse,
    /// Calls made in the wrong state
    State,
}

/// Error type for appends
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    /// The parser rejected the appended bytes
    #[error(
        "Append: stream parsing failed. Data size={data_size} \
         append_window_start={window_start} append_window_end={window_end}"
    )]
    ParseFailed {
        /// Number of bytes appended
        data_size: usize,
        /// Append window start in seconds
        window_start: f64,
        /// Append window end in seconds
        window_end: f64,
        /// Rejected init segment, if that is what failed the parse
        #[source]
        cause: Option<NegotiationError>,
    },

    /// Data was appended before the source state was initialized
    #[error("Append before initialization")]
    NotInitialized,
}

/// Result type alias for appends
pub type SourceResult<T> = Result<T, SourceError>;

impl SourceError {
    /// Get error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            SourceError::ParseFailed { .. } => "PARSE_FAILED",
            SourceError::NotInitialized => "NOT_INITIALIZED",
        }
    }

    /// Get error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            SourceError::ParseFailed { cause: Some(cause), .. } => cause.category(),
            SourceError::ParseFailed { cause: None, .. } => ErrorCategory::Parse,
            SourceError::NotInitialized => ErrorCategory::State,
        }
    }

    /// Rejected init segment behind this error, if any
    pub fn negotiation_error(&self) -> Option<&NegotiationError> {
        match self {
            SourceError::ParseFailed { cause, .. } => cause.as_ref(),
            SourceError::NotInitialized => None,
        }
    }
}
