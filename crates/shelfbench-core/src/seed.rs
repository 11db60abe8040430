//! Deterministic seed data generation.
//!
//! Seeding runs level by level. Each stage builds one level's rows in
//! memory, persists them as a single committed batch, and hands the
//! store-assigned ids to the next stage as parent references:
//!
//! 1. authors, then one achievement batch covering every author;
//! 2. for each author in turn: books → chapters → comments → comment
//!    reactions → reviews → review reactions.
//!
//! Working per author keeps the largest in-memory batch at one author's
//! share of a level instead of the whole cross product.
//!
//! Nothing is retried or rolled back: the first store error aborts the run
//! and earlier committed levels stay in place.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::catalog::EntityKind;
use crate::config::SeedVolumes;
use crate::error::{Error, Result};
use crate::model::{Id, PendingRow, ReactionType};
use crate::store::Store;

/// Outcome of a seed run.
#[derive(Debug, Clone, Default)]
pub struct SeedReport {
    /// Rows inserted per entity.
    pub rows: BTreeMap<EntityKind, u64>,
    /// Committed batches.
    pub batches: u64,
    /// Wall-clock time of the run.
    pub elapsed: Duration,
    /// The store already held data and nothing was written.
    pub skipped: bool,
}

impl SeedReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    /// Total rows inserted.
    pub fn total_rows(&self) -> u64 {
        self.rows.values().sum()
    }

    /// Rows inserted for one entity.
    pub fn rows_for(&self, kind: EntityKind) -> u64 {
        self.rows.get(&kind).copied().unwrap_or(0)
    }

    /// Calculate rows per second.
    pub fn rows_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.total_rows() as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

/// Seed `store` unless it already holds books.
///
/// Only the Book table is inspected. A run that failed after committing
/// books but before finishing the lower levels leaves a store this check
/// treats as fully seeded.
pub fn seed_if_empty(store: &mut dyn Store, volumes: &SeedVolumes) -> Result<SeedReport> {
    if store.any(EntityKind::Book)? {
        info!("books present, skipping seed");
        return Ok(SeedReport::skipped());
    }
    Seeder::new(volumes.clone()).run(store)
}

/// Build `per_parent` rows under every parent, parent by parent.
///
/// `make` receives the 1-based position within the parent and the parent id.
fn children(
    parents: &[Id],
    per_parent: usize,
    mut make: impl FnMut(usize, Id) -> String,
) -> Vec<PendingRow> {
    let mut rows = Vec::with_capacity(parents.len() * per_parent);
    for &parent_id in parents {
        for i in 1..=per_parent {
            rows.push(PendingRow::child(make(i, parent_id), parent_id));
        }
    }
    rows
}

/// Staged generator driven by a single seeded RNG.
pub struct Seeder {
    volumes: SeedVolumes,
    rng: StdRng,
    report: SeedReport,
}

impl Seeder {
    pub fn new(volumes: SeedVolumes) -> Self {
        let rng = StdRng::seed_from_u64(volumes.random_seed);
        Self {
            volumes,
            rng,
            report: SeedReport::default(),
        }
    }

    /// Generate and persist the whole dataset.
    pub fn run(mut self, store: &mut dyn Store) -> Result<SeedReport> {
        let started = Instant::now();
        let v = self.volumes.clone();
        info!(
            authors = v.authors,
            books_per_author = v.books_per_author,
            seed = v.random_seed,
            "seeding database"
        );

        let authors = self.stage(
            store,
            EntityKind::Author,
            (1..=v.authors)
                .map(|i| PendingRow::root(format!("Author {i}")))
                .collect(),
        )?;

        let achievements = children(&authors, v.achievements_per_author, |i, _| {
            format!("Achievement {i}")
        });
        self.stage(store, EntityKind::Achievement, achievements)?;

        for (position, &author_id) in authors.iter().enumerate() {
            let books = self.stage(
                store,
                EntityKind::Book,
                children(&[author_id], v.books_per_author, |i, author| {
                    format!("Book {i} by Author {author}")
                }),
            )?;

            let chapters = self.stage(
                store,
                EntityKind::Chapter,
                children(&books, v.chapters_per_book, |i, _| format!("Chapter {i}")),
            )?;

            let comments = self.stage(
                store,
                EntityKind::Comment,
                children(&chapters, v.comments_per_chapter, |i, _| format!("Comment {i}")),
            )?;

            let reactions = children(&comments, v.reactions_per_comment, |_, _| {
                self.draw_reaction().as_str().to_string()
            });
            self.stage(store, EntityKind::CommentReaction, reactions)?;

            let reviews = self.stage(
                store,
                EntityKind::Review,
                children(&books, v.reviews_per_book, |i, _| format!("Review {i}")),
            )?;

            let reactions = children(&reviews, v.reactions_per_review, |_, _| {
                self.draw_reaction().as_str().to_string()
            });
            self.stage(store, EntityKind::ReviewReaction, reactions)?;

            info!(author = position + 1, of = authors.len(), "author seeded");
        }

        self.report.elapsed = started.elapsed();
        info!(
            rows = self.report.total_rows(),
            batches = self.report.batches,
            elapsed_ms = self.report.elapsed.as_millis() as u64,
            rows_per_second = self.report.rows_per_second() as u64,
            "seed complete"
        );
        Ok(self.report)
    }

    fn draw_reaction(&mut self) -> ReactionType {
        ReactionType::from_draw(self.rng.gen_range(0..3))
    }

    /// Persist one level and collect its ids.
    fn stage(
        &mut self,
        store: &mut dyn Store,
        kind: EntityKind,
        rows: Vec<PendingRow>,
    ) -> Result<Vec<Id>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids = store.insert_batch(kind, &rows)?;
        if ids.len() != rows.len() {
            return Err(Error::InvalidData(format!(
                "{kind} batch of {} rows returned {} ids",
                rows.len(),
                ids.len()
            )));
        }

        *self.report.rows.entry(kind).or_insert(0) += ids.len() as u64;
        self.report.batches += 1;
        debug!(entity = %kind, rows = ids.len(), "batch committed");
        Ok(ids)
    }
}
