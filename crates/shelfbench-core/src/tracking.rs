//! Change tracking.
//!
//! Tracked queries register every materialized row here: an identity map
//! keyed by entity kind and id, holding the values the row had when it was
//! read. `detect_changes` diffs current values against those snapshots.

use std::collections::{BTreeMap, HashMap};

use crate::catalog::EntityKind;
use crate::model::{Id, Record, Value};

/// Lifecycle state of a tracked entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    /// Values match the snapshot taken when the row was read.
    Unchanged,
    /// Values differ from the snapshot.
    Modified,
}

#[derive(Debug, Clone)]
struct TrackedEntry {
    original: Vec<Value>,
    state: EntityState,
}

/// Identity map plus original-value snapshots.
#[derive(Debug, Default)]
pub struct ChangeTracker {
    entries: HashMap<(EntityKind, Id), TrackedEntry>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `record`.
    ///
    /// Returns `false` if the identity is already tracked; the existing
    /// snapshot is kept.
    pub fn attach(&mut self, record: &Record) -> bool {
        let key = (record.kind(), record.id());
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(
            key,
            TrackedEntry {
                original: record.snapshot(),
                state: EntityState::Unchanged,
            },
        );
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_tracked(&self, kind: EntityKind, id: Id) -> bool {
        self.entries.contains_key(&(kind, id))
    }

    pub fn state(&self, kind: EntityKind, id: Id) -> Option<EntityState> {
        self.entries.get(&(kind, id)).map(|e| e.state)
    }

    /// Compare current values to the snapshots and mark differing entries
    /// `Modified`. Untracked records are ignored. Returns how many entries
    /// are modified afterwards.
    pub fn detect_changes<'a>(&mut self, records: impl IntoIterator<Item = &'a Record>) -> usize {
        for record in records {
            if let Some(entry) = self.entries.get_mut(&(record.kind(), record.id())) {
                entry.state = if entry.original == record.snapshot() {
                    EntityState::Unchanged
                } else {
                    EntityState::Modified
                };
            }
        }
        self.modified().count()
    }

    /// Identities currently marked `Modified`.
    pub fn modified(&self) -> impl Iterator<Item = (EntityKind, Id)> + '_ {
        self.entries
            .iter()
            .filter(|(_, e)| e.state == EntityState::Modified)
            .map(|(key, _)| *key)
    }

    /// Tracked entries per entity kind.
    pub fn count_by_kind(&self) -> BTreeMap<EntityKind, usize> {
        let mut counts = BTreeMap::new();
        for (kind, _) in self.entries.keys() {
            *counts.entry(*kind).or_insert(0) += 1;
        }
        counts
    }

    /// Detach everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Book, CommentReaction, ReactionType};

    fn book(title: &str) -> Record {
        Record::Book(Book {
            id: 7,
            title: title.to_string(),
            author_id: 1,
        })
    }

    #[test]
    fn test_attach_is_identity_resolved() {
        let mut tracker = ChangeTracker::new();
        assert!(tracker.attach(&book("Book 1")));
        assert!(!tracker.attach(&book("Book 1 (again)")));
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.state(EntityKind::Book, 7), Some(EntityState::Unchanged));
    }

    #[test]
    fn test_detect_changes() {
        let mut tracker = ChangeTracker::new();
        tracker.attach(&book("Book 1"));

        assert_eq!(tracker.detect_changes([&book("Book 1")]), 0);
        assert_eq!(tracker.detect_changes([&book("Renamed")]), 1);
        assert_eq!(tracker.state(EntityKind::Book, 7), Some(EntityState::Modified));
        assert_eq!(tracker.modified().collect::<Vec<_>>(), vec![(EntityKind::Book, 7)]);

        // reverting the value clears the flag
        assert_eq!(tracker.detect_changes([&book("Book 1")]), 0);
    }

    #[test]
    fn test_same_id_different_kind_are_distinct() {
        let mut tracker = ChangeTracker::new();
        tracker.attach(&book("Book 1"));
        tracker.attach(&Record::CommentReaction(CommentReaction {
            id: 7,
            reaction_type: ReactionType::Wow,
            comment_id: 3,
        }));

        assert_eq!(tracker.len(), 2);
        let counts = tracker.count_by_kind();
        assert_eq!(counts[&EntityKind::Book], 1);
        assert_eq!(counts[&EntityKind::CommentReaction], 1);

        tracker.clear();
        assert!(tracker.is_empty());
    }
}
