//! Sessions: one connection plus its change tracker.

use crate::error::Result;
use crate::model::Record;
use crate::query::{AuthorGraph, AuthorQuery};
use crate::store::Store;
use crate::tracking::ChangeTracker;

/// A unit of work over one store connection.
///
/// Dropping the session releases the connection and forgets every tracked
/// entity.
pub struct Session {
    store: Box<dyn Store>,
    tracker: ChangeTracker,
}

impl Session {
    pub fn new(store: Box<dyn Store>) -> Self {
        Self {
            store,
            tracker: ChangeTracker::new(),
        }
    }

    pub fn store(&mut self) -> &mut dyn Store {
        self.store.as_mut()
    }

    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut ChangeTracker {
        &mut self.tracker
    }

    /// Borrow the store and the tracker at the same time.
    pub(crate) fn parts(&mut self) -> (&mut dyn Store, &mut ChangeTracker) {
        (self.store.as_mut(), &mut self.tracker)
    }

    /// Run an author query.
    pub fn query(&mut self, query: &AuthorQuery) -> Result<Vec<AuthorGraph>> {
        query.load(self)
    }

    /// Diff the given graphs against the tracked snapshots.
    pub fn detect_changes(&mut self, graphs: &[AuthorGraph]) -> usize {
        let records: Vec<Record> = graphs.iter().flat_map(AuthorGraph::records).collect();
        self.tracker.detect_changes(&records)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        tracing::debug!(tracked = self.tracker.len(), "session released");
    }
}
