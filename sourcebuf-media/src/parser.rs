//! Stream parser interface
//!
//! The parser turns appended bytes into init segments, coded frames and
//! media segment boundaries. It reports them synchronously through the
//! [`ParserListener`] handed to each [`StreamParser::parse`] or
//! [`StreamParser::flush`] call; the listener is the only way back into the
//! source state while parsing.

use crate::tracks::{BufferQueueMap, MediaTracks, TextTrackConfigMap};
use sourcebuf_core::TimeDelta;
use std::fmt::Debug;

/// Options fixed when the parser is initialized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserOptions {
    /// Skip text tracks instead of reporting them
    pub ignore_text_tracks: bool,
}

/// Parameters reported once the first init segment has been parsed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitParameters {
    /// Stream duration, if the container declares one
    pub duration: Option<TimeDelta>,
    /// Whether the timestamp offset should advance with each frame delivery
    pub auto_update_timestamp_offset: bool,
}

/// Byte-level media parser
pub trait StreamParser: Send + Debug {
    /// Prepare the parser; called once before any parse
    fn init(&mut self, options: ParserOptions);

    /// Parse `data`, reporting events to `listener`; false on malformed input
    fn parse(&mut self, data: &[u8], listener: &mut dyn ParserListener) -> bool;

    /// Drop partially parsed state, reporting any completed frames
    fn flush(&mut self, listener: &mut dyn ParserListener);
}

/// Callbacks a parser makes while parsing
pub trait ParserListener {
    /// Parser finished its first init segment
    fn on_init_done(&mut self, params: &InitParameters);

    /// A new init segment was parsed; false rejects it
    fn on_new_configs(&mut self, tracks: MediaTracks, text_configs: &TextTrackConfigMap) -> bool;

    /// Coded frames were parsed; false aborts parsing
    fn on_new_buffers(&mut self, buffers: &BufferQueueMap) -> bool;

    /// A media segment started
    fn on_new_media_segment(&mut self);

    /// The current media segment ended
    fn on_end_of_media_segment(&mut self);
}
