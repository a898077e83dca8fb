//! Integration tests for the shared primitives
//!
//! Exercises the public surface the media crate builds on: media time,
//! range sets, buffer limit configuration and the media log contract.

use sourcebuf_core::*;
use parking_lot::Mutex;
use std::collections::HashMap;

fn ms(millis: i64) -> TimeDelta {
    TimeDelta::from_millis(millis)
}

// ============================================================================
// MEDIA TIME
// ============================================================================

#[test]
fn test_time_arithmetic_saturates() {
    assert_eq!(ms(1_500) + ms(500), TimeDelta::from_secs(2));
    assert_eq!(TimeDelta::MAX + ms(1), TimeDelta::MAX);
    assert_eq!(-ms(250), TimeDelta::from_micros(-250_000));

    let mut offset = ms(100);
    offset += ms(5);
    offset -= ms(10);
    assert_eq!(offset, ms(95));
}

#[test]
fn test_time_conversions() {
    assert_eq!(TimeDelta::from_secs_f64(1.25), ms(1_250));
    assert_eq!(ms(2_500).as_secs_f64(), 2.5);
    assert!(TimeDelta::ZERO.is_zero());
    assert_eq!(
        DecodeTimestamp::from_presentation_time(ms(40)),
        DecodeTimestamp::from_micros(40_000)
    );
}

#[test]
fn test_time_serialization() {
    let json = serde_json::to_string(&ms(3)).unwrap();
    assert_eq!(json, "3000");
    let parsed: TimeDelta = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, ms(3));
}

// ============================================================================
// RANGES
// ============================================================================

#[test]
fn test_ranges_merge_touching_intervals() {
    let mut ranges = Ranges::new();
    ranges.add(ms(0), ms(1_000));
    ranges.add(ms(2_000), ms(3_000));
    assert_eq!(ranges.len(), 2);

    ranges.add(ms(1_000), ms(2_000));
    assert_eq!(ranges.len(), 1);
    assert_eq!(ranges.last(), Some((ms(0), ms(3_000))));
}

#[test]
fn test_ranges_intersection() {
    let mut a = Ranges::new();
    a.add(ms(0), ms(4_000));
    a.add(ms(6_000), ms(9_000));
    let b = Ranges::single(ms(3_000), ms(7_000));

    let both = a.intersection_with(&b);
    let intervals: Vec<_> = both.iter().collect();
    assert_eq!(intervals, vec![(ms(3_000), ms(4_000)), (ms(6_000), ms(7_000))]);
    assert_eq!(b.intersection_with(&a), both);
}

#[test]
fn test_ranges_reject_inverted_interval() {
    let mut ranges = Ranges::new();
    let error = ranges.try_add(ms(5), ms(1)).unwrap_err();
    assert_eq!(error.error_code(), "INVALID_RANGE");
    assert!(ranges.is_empty());
    assert_eq!(ranges.try_add(ms(1), ms(5)).unwrap(), 1);
}

// ============================================================================
// BUFFER LIMITS
// ============================================================================

#[test]
fn test_buffer_limits_from_lookup() {
    let vars: HashMap<&str, &str> = [
        (AUDIO_BUFFER_SIZE_LIMIT_ENV, " 65536 "),
        (VIDEO_BUFFER_SIZE_LIMIT_ENV, "lots"),
    ]
    .into_iter()
    .collect();

    let limits = BufferLimits::from_lookup(|name| vars.get(name).map(|v| v.to_string()));
    assert_eq!(limits.audio_buffer_size_limit, Some(65_536));
    assert_eq!(limits.video_buffer_size_limit, None);
    assert_eq!(BufferLimits::from_lookup(|_| None), BufferLimits::unlimited());
}

// ============================================================================
// MEDIA LOG
// ============================================================================

#[derive(Debug, Default)]
struct CollectingLog(Mutex<Vec<String>>);

impl MediaLog for CollectingLog {
    fn add_message(&self, level: MediaLogLevel, message: &str) {
        self.0.lock().push(format!("{}: {}", level, message));
    }

    fn set_property(&self, _name: &str, _value: MediaLogProperty) {}
}

#[test]
fn test_log_limiter_caps_entries() {
    let log = CollectingLog::default();
    let mut limiter = LogLimiter::new(3);

    let forwarded = (0..5)
        .filter(|_| limiter.log(&log, MediaLogLevel::Debug, "no coded frames"))
        .count();

    assert_eq!(forwarded, 3);
    assert!(limiter.is_exhausted());
    let messages = log.0.lock().clone();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0], "debug: no coded frames");
    assert!(messages[2].ends_with(LOG_LIMIT_SUFFIX));
}

#[test]
fn test_null_log_accepts_everything() {
    let log = NullMediaLog;
    log.add_message(MediaLogLevel::Error, "ignored");
    log.set_property("found_audio_stream", true.into());
}
