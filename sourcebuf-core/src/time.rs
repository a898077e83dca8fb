//! Media time types
//!
//! Presentation times, durations and timestamp offsets are all expressed as
//! [`TimeDelta`], a signed microsecond count. Offsets may legitimately be
//! negative, so unsigned `std::time::Duration` is not used here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

const MICROS_PER_SECOND: i64 = 1_000_000;
const MICROS_PER_MILLI: i64 = 1_000;

/// Signed media time in microseconds
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TimeDelta(i64);

impl TimeDelta {
    /// Zero time
    pub const ZERO: TimeDelta = TimeDelta(0);

    /// Largest representable time
    pub const MAX: TimeDelta = TimeDelta(i64::MAX);

    /// Create from microseconds
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    /// Create from milliseconds
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis.saturating_mul(MICROS_PER_MILLI))
    }

    /// Create from whole seconds
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs.saturating_mul(MICROS_PER_SECOND))
    }

    /// Create from fractional seconds, rounding to the nearest microsecond
    pub fn from_secs_f64(secs: f64) -> Self {
        Self((secs * MICROS_PER_SECOND as f64).round() as i64)
    }

    /// Microsecond count
    pub const fn as_micros(self) -> i64 {
        self.0
    }

    /// Time in fractional seconds
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / MICROS_PER_SECOND as f64
    }

    /// Whether this is exactly zero
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl Add for TimeDelta {
    type Output = TimeDelta;

    fn add(self, rhs: TimeDelta) -> TimeDelta {
        TimeDelta(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for TimeDelta {
    fn add_assign(&mut self, rhs: TimeDelta) {
        *self = *self + rhs;
    }
}

impl Sub for TimeDelta {
    type Output = TimeDelta;

    fn sub(self, rhs: TimeDelta) -> TimeDelta {
        TimeDelta(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for TimeDelta {
    fn sub_assign(&mut self, rhs: TimeDelta) {
        *self = *self - rhs;
    }
}

impl Neg for TimeDelta {
    type Output = TimeDelta;

    fn neg(self) -> TimeDelta {
        TimeDelta(self.0.saturating_neg())
    }
}

impl fmt::Display for TimeDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.as_secs_f64())
    }
}

/// Decode-order timestamp
///
/// Kept distinct from [`TimeDelta`] so decode and presentation times are not
/// mixed up by accident.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct DecodeTimestamp(TimeDelta);

impl DecodeTimestamp {
    /// Reinterpret a presentation time as a decode time
    pub const fn from_presentation_time(time: TimeDelta) -> Self {
        Self(time)
    }

    /// Create from microseconds
    pub const fn from_micros(micros: i64) -> Self {
        Self(TimeDelta::from_micros(micros))
    }

    /// Underlying time value
    pub const fn to_presentation_time(self) -> TimeDelta {
        self.0
    }

    /// Time in fractional seconds
    pub fn as_secs_f64(self) -> f64 {
        self.0.as_secs_f64()
    }
}

impl fmt::Display for DecodeTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
