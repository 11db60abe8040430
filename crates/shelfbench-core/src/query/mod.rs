//! Author query variants.
//!
//! An [`AuthorQuery`] loads authors with a chosen set of nested
//! collections. Two orthogonal switches pick the execution strategy:
//!
//! - [`SplitMode`]: one `LEFT JOIN` chain over every included table, or one
//!   statement per table.
//! - [`TrackingMode`]: register every loaded entity with the session's
//!   [`ChangeTracker`](crate::tracking::ChangeTracker), or return detached
//!   rows.

mod graph;
mod sql;

pub use graph::{AuthorGraph, BookGraph, ChapterGraph, CommentGraph, ReviewGraph};

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::catalog::EntityKind;
use crate::error::{Error, Result};
use crate::model::{Id, Record};
use crate::session::Session;

use graph::GraphBuilder;

/// How child collections are fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitMode {
    /// One joined statement.
    #[default]
    Single,
    /// One statement per included collection.
    Split,
}

/// Whether loaded entities are attached to the change tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackingMode {
    #[default]
    Tracking,
    NoTracking,
}

/// Navigation collections to load alongside each author.
///
/// Including a nested collection includes its ancestors too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Include {
    kinds: BTreeSet<EntityKind>,
}

impl Include {
    /// Authors only.
    pub fn none() -> Self {
        Self {
            kinds: BTreeSet::from([EntityKind::Author]),
        }
    }

    /// Every collection in the schema.
    pub fn all() -> Self {
        Self {
            kinds: EntityKind::ALL.into_iter().collect(),
        }
    }

    fn with(mut self, kind: EntityKind) -> Self {
        self.kinds.insert(kind);
        self.kinds.extend(kind.ancestors());
        self
    }

    pub fn achievements(self) -> Self {
        self.with(EntityKind::Achievement)
    }

    pub fn books(self) -> Self {
        self.with(EntityKind::Book)
    }

    pub fn chapters(self) -> Self {
        self.with(EntityKind::Chapter)
    }

    pub fn comments(self) -> Self {
        self.with(EntityKind::Comment)
    }

    pub fn comment_reactions(self) -> Self {
        self.with(EntityKind::CommentReaction)
    }

    pub fn reviews(self) -> Self {
        self.with(EntityKind::Review)
    }

    pub fn review_reactions(self) -> Self {
        self.with(EntityKind::ReviewReaction)
    }

    pub fn contains(&self, kind: EntityKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Included kinds, parents first.
    pub fn kinds(&self) -> Vec<EntityKind> {
        self.kinds.iter().copied().collect()
    }
}

impl Default for Include {
    fn default() -> Self {
        Self::none()
    }
}

/// A query over authors and their included collections.
#[derive(Debug, Clone, Default)]
pub struct AuthorQuery {
    include: Include,
    author_id: Option<Id>,
    split: SplitMode,
    tracking: TrackingMode,
}

impl AuthorQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(mut self, include: Include) -> Self {
        self.include = include;
        self
    }

    /// Restrict to one author.
    pub fn where_id(mut self, author_id: Id) -> Self {
        self.author_id = Some(author_id);
        self
    }

    /// Fetch each collection with its own statement.
    pub fn as_split_query(self) -> Self {
        self.with_split(SplitMode::Split)
    }

    /// Return detached rows.
    pub fn as_no_tracking(self) -> Self {
        self.with_tracking(TrackingMode::NoTracking)
    }

    pub fn with_split(mut self, split: SplitMode) -> Self {
        self.split = split;
        self
    }

    pub fn with_tracking(mut self, tracking: TrackingMode) -> Self {
        self.tracking = tracking;
        self
    }

    pub fn split_mode(&self) -> SplitMode {
        self.split
    }

    pub fn tracking_mode(&self) -> TrackingMode {
        self.tracking
    }

    /// Load every matching author.
    pub fn to_list(&self, session: &mut Session) -> Result<Vec<AuthorGraph>> {
        session.query(self)
    }

    /// Load the first matching author, if any.
    pub fn first_or_default(&self, session: &mut Session) -> Result<Option<AuthorGraph>> {
        Ok(session.query(self)?.into_iter().next())
    }

    pub(crate) fn load(&self, session: &mut Session) -> Result<Vec<AuthorGraph>> {
        let (store, tracker) = session.parts();
        let dialect = store.dialect();
        let kinds = self.include.kinds();
        let tracking = self.tracking == TrackingMode::Tracking;
        let mut builder = GraphBuilder::default();

        let mut absorb = |record: Record| {
            if builder.contains(&record) {
                return;
            }
            if tracking {
                tracker.attach(&record);
            }
            builder.add(record);
        };

        match self.split {
            SplitMode::Single => {
                let (sql, params) = sql::single_query(&kinds, self.author_id, dialect);
                tracing::debug!(%sql, "single query");
                let width: usize = kinds.iter().map(EntityKind::column_count).sum();

                for row in store.fetch(&sql, &params)? {
                    if row.len() != width {
                        return Err(Error::InvalidData(format!(
                            "expected {width} columns, got {}",
                            row.len()
                        )));
                    }
                    let mut offset = 0;
                    for &kind in &kinds {
                        let end = offset + kind.column_count();
                        if let Some(record) = Record::decode(kind, &row[offset..end])? {
                            absorb(record);
                        }
                        offset = end;
                    }
                }
            }
            SplitMode::Split => {
                for &kind in &kinds {
                    let (sql, params) = sql::split_query(kind, self.author_id, dialect);
                    tracing::debug!(%sql, "split query");
                    for row in store.fetch(&sql, &params)? {
                        if let Some(record) = Record::decode(kind, &row)? {
                            absorb(record);
                        }
                    }
                }
            }
        }

        Ok(builder.build())
    }
}

/// The benchmarked query variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// One author with achievements and books.chapters, joined.
    WithoutSplitQuery,
    /// One author with achievements and books.chapters, split.
    WithSplitQuery,
    /// All authors with achievements and books.chapters, tracked.
    WithoutNoTracking,
    /// All authors with achievements and books.chapters, detached.
    WithNoTracking,
}

impl Variant {
    pub const ALL: [Variant; 4] = [
        Variant::WithoutSplitQuery,
        Variant::WithSplitQuery,
        Variant::WithoutNoTracking,
        Variant::WithNoTracking,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Variant::WithoutSplitQuery => "without_split_query",
            Variant::WithSplitQuery => "with_split_query",
            Variant::WithoutNoTracking => "without_no_tracking",
            Variant::WithNoTracking => "with_no_tracking",
        }
    }

    /// Build the query. `author_id` is only used by the single-author variants.
    pub fn query(&self, author_id: Id) -> AuthorQuery {
        let include = Include::none().achievements().chapters();
        let query = AuthorQuery::new().include(include);
        match self {
            Variant::WithoutSplitQuery => query.where_id(author_id),
            Variant::WithSplitQuery => query.where_id(author_id).as_split_query(),
            Variant::WithoutNoTracking => query,
            Variant::WithNoTracking => query.as_no_tracking(),
        }
    }

    /// Whether the variant loads one author (`first_or_default`) rather
    /// than all of them (`to_list`).
    pub fn is_single_author(&self) -> bool {
        matches!(self, Variant::WithoutSplitQuery | Variant::WithSplitQuery)
    }

    /// Execute the variant, returning the number of loaded entities.
    pub fn run(&self, session: &mut Session, author_id: Id) -> Result<usize> {
        let query = self.query(author_id);
        let graphs: Vec<AuthorGraph> = if self.is_single_author() {
            query.first_or_default(session)?.into_iter().collect()
        } else {
            query.to_list(session)?
        };
        Ok(graphs.iter().map(AuthorGraph::entity_count).sum())
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Variant::ALL
            .into_iter()
            .find(|v| v.name() == s)
            .ok_or_else(|| Error::Config(format!("unknown query variant {s:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_include_pulls_in_ancestors() {
        let include = Include::none().comment_reactions();
        assert_eq!(
            include.kinds(),
            vec![
                EntityKind::Author,
                EntityKind::Book,
                EntityKind::Chapter,
                EntityKind::Comment,
                EntityKind::CommentReaction
            ]
        );
        assert!(!include.contains(EntityKind::Review));
        assert_eq!(Include::all().kinds().len(), 8);
    }

    #[test]
    fn test_query_flags() {
        let query = AuthorQuery::new();
        assert_eq!(query.split_mode(), SplitMode::Single);
        assert_eq!(query.tracking_mode(), TrackingMode::Tracking);

        let query = query.as_split_query().as_no_tracking();
        assert_eq!(query.split_mode(), SplitMode::Split);
        assert_eq!(query.tracking_mode(), TrackingMode::NoTracking);
    }

    #[test]
    fn test_variant_names_round_trip() {
        for variant in Variant::ALL {
            assert_eq!(variant.name().parse::<Variant>().unwrap(), variant);
        }
        assert!("with_everything".parse::<Variant>().is_err());
    }

    #[test]
    fn test_variant_queries() {
        let q = Variant::WithSplitQuery.query(101);
        assert_eq!(q.split_mode(), SplitMode::Split);
        assert_eq!(q.author_id, Some(101));
        assert!(q.include.contains(EntityKind::Chapter));
        assert!(q.include.contains(EntityKind::Achievement));
        assert!(!q.include.contains(EntityKind::Comment));

        let q = Variant::WithNoTracking.query(101);
        assert_eq!(q.tracking_mode(), TrackingMode::NoTracking);
        assert_eq!(q.author_id, None);
    }
}
