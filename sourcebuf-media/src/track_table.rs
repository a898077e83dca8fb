//! Per-kind table of storage engines
//!
//! Storage handles live in an arena slot that never moves. Bytestream ids
//! map to slots, so remapping a track to a new id rewrites one map entry and
//! leaves the handle untouched.

use crate::stream::StreamHandle;
use crate::tracks::{TrackId, TrackKind};
use std::collections::BTreeMap;

/// Stable arena index of a stored track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackSlot(usize);

/// Storage engines of one track kind, keyed by bytestream id
#[derive(Debug)]
pub struct TrackTable {
    kind: TrackKind,
    slots: Vec<Option<StreamHandle>>,
    ids: BTreeMap<TrackId, TrackSlot>,
}

impl TrackTable {
    /// Create an empty table for `kind`
    pub fn new(kind: TrackKind) -> Self {
        Self {
            kind,
            slots: Vec::new(),
            ids: BTreeMap::new(),
        }
    }

    /// Kind of track stored here
    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    /// Number of tracks
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the table holds no track
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Whether `id` is mapped
    pub fn contains(&self, id: TrackId) -> bool {
        self.ids.contains_key(&id)
    }

    /// Storage engine mapped to `id`
    pub fn get(&self, id: TrackId) -> Option<&StreamHandle> {
        self.ids
            .get(&id)
            .and_then(|slot| self.slots[slot.0].as_ref())
    }

    /// Store `stream` under `id`
    ///
    /// Hands the stream back if `id` is already taken.
    pub fn insert(&mut self, id: TrackId, stream: StreamHandle) -> Result<TrackSlot, StreamHandle> {
        if self.ids.contains_key(&id) {
            return Err(stream);
        }
        let slot = TrackSlot(self.slots.len());
        self.slots.push(Some(stream));
        self.ids.insert(id, slot);
        Ok(slot)
    }

    /// Move the track stored under `old_id` to `new_id`
    ///
    /// Fails if `old_id` is unknown or `new_id` is already taken.
    pub fn remap(&mut self, old_id: TrackId, new_id: TrackId) -> bool {
        if old_id == new_id {
            return self.ids.contains_key(&old_id);
        }
        if self.ids.contains_key(&new_id) {
            return false;
        }
        match self.ids.remove(&old_id) {
            Some(slot) => {
                self.ids.insert(new_id, slot);
                true
            }
            None => false,
        }
    }

    /// Remove and return the track stored under `id`
    pub fn remove(&mut self, id: TrackId) -> Option<StreamHandle> {
        let slot = self.ids.remove(&id)?;
        self.slots[slot.0].take()
    }

    /// The only track, if exactly one is stored
    pub fn sole(&self) -> Option<(TrackId, &StreamHandle)> {
        if self.ids.len() != 1 {
            return None;
        }
        self.iter().next()
    }

    /// Tracks in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = (TrackId, &StreamHandle)> + '_ {
        self.ids
            .iter()
            .filter_map(move |(&id, slot)| self.slots[slot.0].as_ref().map(|s| (id, s)))
    }

    /// Storage engines in ascending id order
    pub fn streams(&self) -> impl Iterator<Item = &StreamHandle> + '_ {
        self.iter().map(|(_, stream)| stream)
    }

    /// Mapped ids in ascending order
    pub fn ids(&self) -> Vec<TrackId> {
        self.ids.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::{AudioDecoderConfig, TextTrackConfig, VideoDecoderConfig};
    use crate::stream::TrackStream;
    use sourcebuf_core::{DecodeTimestamp, MediaLog, Ranges, TimeDelta};
    use std::sync::Arc;

    #[derive(Debug)]
    struct Inert(&'static str);

    impl TrackStream for Inert {
        fn kind(&self) -> TrackKind {
            TrackKind::Audio
        }
        fn media_track_id(&self) -> String {
            self.0.to_string()
        }
        fn update_audio_config(&self, _: &AudioDecoderConfig, _: &dyn MediaLog) -> bool {
            true
        }
        fn update_video_config(&self, _: &VideoDecoderConfig, _: &dyn MediaLog) -> bool {
            true
        }
        fn update_text_config(&self, _: &TextTrackConfig, _: &dyn MediaLog) {}
        fn text_track_config(&self) -> Option<TextTrackConfig> {
            None
        }
        fn buffered_size(&self) -> usize {
            0
        }
        fn evict_coded_frames(&self, _: DecodeTimestamp, _: usize) -> bool {
            true
        }
        fn buffered_ranges(&self, _: TimeDelta) -> Ranges<TimeDelta> {
            Ranges::new()
        }
        fn remove(&self, _: TimeDelta, _: TimeDelta, _: TimeDelta) {}
        fn highest_presentation_timestamp(&self) -> TimeDelta {
            TimeDelta::ZERO
        }
        fn buffered_duration(&self) -> TimeDelta {
            TimeDelta::ZERO
        }
        fn start_returning_data(&self) {}
        fn abort_reads(&self) {}
        fn seek(&self, _: TimeDelta) {}
        fn complete_pending_read_if_possible(&self) {}
        fn on_set_duration(&self, _: TimeDelta) {}
        fn mark_end_of_stream(&self) {}
        fn unmark_end_of_stream(&self) {}
        fn shutdown(&self) {}
        fn set_memory_limit(&self, _: usize) {}
        fn is_seek_waiting_for_data(&self) -> bool {
            false
        }
    }

    fn handle(name: &'static str) -> StreamHandle {
        Arc::new(Inert(name))
    }

    #[test]
    fn test_insert_rejects_duplicate_id() {
        let mut table = TrackTable::new(TrackKind::Audio);
        assert!(table.insert(1, handle("a")).is_ok());
        assert!(table.insert(1, handle("b")).is_err());
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(1).unwrap().media_track_id(), "a");
    }

    #[test]
    fn test_remap_keeps_handle() {
        let mut table = TrackTable::new(TrackKind::Video);
        table.insert(3, handle("v")).unwrap();
        let before = Arc::clone(table.get(3).unwrap());

        assert!(table.remap(3, 9));
        assert!(!table.contains(3));
        assert!(Arc::ptr_eq(&before, table.get(9).unwrap()));
        assert_eq!(table.ids(), vec![9]);
    }

    #[test]
    fn test_remap_refuses_taken_or_unknown_ids() {
        let mut table = TrackTable::new(TrackKind::Video);
        table.insert(1, handle("a")).unwrap();
        table.insert(2, handle("b")).unwrap();

        assert!(!table.remap(1, 2));
        assert!(!table.remap(5, 6));
        assert_eq!(table.ids(), vec![1, 2]);
    }

    #[test]
    fn test_sole_and_remove() {
        let mut table = TrackTable::new(TrackKind::Text);
        assert!(table.sole().is_none());

        table.insert(4, handle("t")).unwrap();
        assert_eq!(table.sole().map(|(id, _)| id), Some(4));

        table.insert(5, handle("u")).unwrap();
        assert!(table.sole().is_none());

        assert!(table.remove(4).is_some());
        assert_eq!(table.sole().map(|(id, _)| id), Some(5));
        assert_eq!(table.streams().count(), 1);
    }
}
