//! Buffered range intersection across tracks
//!
//! The buffered ranges of a source buffer are the time spans for which every
//! track has data. Once the stream has ended, each track's last range is
//! treated as reaching the end of the longest track, so a track that simply
//! stopped earlier does not truncate the result.

use sourcebuf_core::{Ranges, TimeDelta};

/// Intersect the buffered ranges of several tracks
///
/// An empty input yields an empty result.
pub fn compute_ranges_intersection(
    track_ranges: &[Ranges<TimeDelta>],
    ended: bool,
) -> Ranges<TimeDelta> {
    if track_ranges.is_empty() {
        return Ranges::new();
    }

    let highest_end = track_ranges
        .iter()
        .filter_map(Ranges::last)
        .map(|(_, end)| end)
        .fold(TimeDelta::ZERO, TimeDelta::max);

    let mut intersection = Ranges::single(TimeDelta::ZERO, highest_end);
    for ranges in track_ranges {
        intersection = match (ended, ranges.last()) {
            (true, Some((last_start, _))) => {
                let mut extended = ranges.clone();
                extended.add(last_start, highest_end);
                intersection.intersection_with(&extended)
            }
            _ => intersection.intersection_with(ranges),
        };
    }
    intersection
}
