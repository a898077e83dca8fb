//! Proportional eviction across tracks
//!
//! Before new data is appended, each track is asked to free a share of the
//! incoming size proportional to how much it currently buffers.

use crate::stream::StreamHandle;
use sourcebuf_core::DecodeTimestamp;
use tracing::debug;

/// Share of `new_data_size` a track buffering `size` of `total` bytes frees
///
/// Rounds down, so the shares may add up to slightly less than requested.
pub fn eviction_share(new_data_size: usize, size: usize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    let share = new_data_size as u128 * size as u128 / total as u128;
    share as usize
}

/// Ask every track to free its share of `new_data_size` bytes
///
/// Tracks that buffer nothing are skipped. Every remaining track is asked even
/// after one fails; the result is true only if all of them succeed.
pub fn evict_coded_frames<'a, I>(streams: I, media_time: DecodeTimestamp, new_data_size: usize) -> bool
where
    I: IntoIterator<Item = &'a StreamHandle>,
{
    let sized: Vec<(&StreamHandle, usize)> = streams
        .into_iter()
        .map(|stream| (stream, stream.buffered_size()))
        .collect();
    let total: usize = sized.iter().map(|(_, size)| size).sum();

    debug!(
        "evict_coded_frames media_time={} new_data_size={} total_buffered_size={}",
        media_time, new_data_size, total
    );

    if total == 0 {
        return true;
    }

    let mut success = true;
    for (stream, size) in sized {
        if size == 0 {
            continue;
        }
        let target = eviction_share(new_data_size, size, total);
        debug!(
            "Trying to evict {} bytes from {} track {} buffering {} bytes",
            target,
            stream.kind(),
            stream.media_track_id(),
            size
        );
        success &= stream.evict_coded_frames(media_time, target);
    }

    debug!("evict_coded_frames result={}", success);
    success
}
