use std::collections::HashMap;

use crate::record::{CacheLookup, DayState};
use crate::DayId;

/// What we know about each day, plus a change counter.
///
/// Renderers only get `&RecordCache`. Writes go through the live window
/// synchronizer (for days inside the window) and the lazy resolver (for
/// everything else), and both bump the version once per logical batch.
#[derive(Debug, Default)]
pub struct RecordCache {
    days: HashMap<DayId, DayState>,
    version: u64,
}

impl RecordCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opaque change token. Equal versions mean nothing visible changed.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// `None` means unresolved, which is different from `Some(Absent)`.
    pub fn get(&self, id: DayId) -> Option<&DayState> {
        self.days.get(&id)
    }

    pub fn lookup(&self, id: DayId) -> CacheLookup<'_> {
        match self.days.get(&id) {
            None => CacheLookup::Unresolved,
            Some(DayState::Absent) => CacheLookup::Absent,
            Some(DayState::Present(entry)) => CacheLookup::Present(entry),
        }
    }

    /// Known in any state, present or confirmed absent.
    pub fn is_resolved(&self, id: DayId) -> bool {
        self.days.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub(crate) fn set(&mut self, id: DayId, state: DayState) {
        self.days.insert(id, state);
    }

    /// Returns whether anything was removed.
    pub(crate) fn delete(&mut self, id: DayId) -> bool {
        self.days.remove(&id).is_some()
    }

    pub(crate) fn bump_version(&mut self) {
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DayEntry;

    fn day(s: &str) -> DayId {
        s.parse().unwrap()
    }

    #[test]
    fn unknown_and_absent_are_distinct() {
        let mut cache = RecordCache::new();
        let id = day("2024-06-01");

        assert!(cache.get(id).is_none());
        assert!(cache.lookup(id).is_unresolved());

        cache.set(id, DayState::Absent);
        assert_eq!(cache.get(id), Some(&DayState::Absent));
        assert_eq!(cache.lookup(id).exists(), Some(false));
        assert!(cache.is_resolved(id));
    }

    #[test]
    fn delete_reports_whether_anything_was_cached() {
        let mut cache = RecordCache::new();
        let id = day("2024-06-01");

        assert!(!cache.delete(id));
        cache.set(
            id,
            DayState::Present(DayEntry {
                cover_ref: None,
                title: Some("hi".to_string()),
            }),
        );
        assert_eq!(cache.lookup(id).title(), Some("hi"));
        assert!(cache.delete(id));
        assert!(cache.lookup(id).is_unresolved());
        assert!(cache.is_empty());
    }

    #[test]
    fn writes_do_not_bump_on_their_own() {
        let mut cache = RecordCache::new();
        cache.set(day("2024-06-01"), DayState::Absent);
        cache.set(day("2024-06-02"), DayState::Absent);
        assert_eq!(cache.version(), 0);

        cache.bump_version();
        assert_eq!(cache.version(), 1);
        assert_eq!(cache.len(), 2);
    }
}
