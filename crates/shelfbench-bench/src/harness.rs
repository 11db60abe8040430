//! Benchmark harness helpers.
//!
//! Loads settings, prepares the database, and times query variants outside
//! criterion for the CLI.

use std::path::Path;
use std::time::{Duration, Instant};

use shelfbench_core::model::Id;
use shelfbench_core::{
    library_schema, seed_if_empty, verify, Database, EntityKind, Error, Result, SeedReport,
    Session, Settings, Variant, VerifyReport,
};

/// Settings plus the database they point at.
pub struct BenchContext {
    pub settings: Settings,
    pub database: Database,
}

impl BenchContext {
    pub fn new(settings: Settings) -> Result<Self> {
        let database = Database::from_settings(&settings)?;
        Ok(Self { settings, database })
    }

    /// Load settings from `config`, or from the default search path.
    pub fn load(config: Option<&Path>) -> Result<Self> {
        let settings = match config {
            Some(path) => Settings::load(path)?,
            None => Settings::from_default_location()?,
        };
        let ctx = Self::new(settings)?;
        tracing::info!(database = ?ctx.database.db_type(), "configuration loaded");
        Ok(ctx)
    }

    /// Open a session on the configured database.
    pub fn session(&self) -> Result<Session> {
        self.database.session()
    }

    /// Create missing tables and seed when the Book table is empty.
    pub fn prepare(&self, session: &mut Session) -> Result<SeedReport> {
        session.store().apply_schema(&library_schema())?;
        let report = seed_if_empty(session.store(), &self.settings.seed)?;
        if !report.skipped {
            tracing::info!(
                rows = report.total_rows(),
                batches = report.batches,
                elapsed_ms = report.elapsed.as_millis() as u64,
                rows_per_sec = report.rows_per_second() as u64,
                "seed complete"
            );
        }
        Ok(report)
    }

    /// Check row counts and parent references against the configured volumes.
    pub fn verify(&self, session: &mut Session) -> Result<VerifyReport> {
        verify(session.store(), &self.settings.seed)
    }
}

/// Lowest author id, the target of the single-author variants.
pub fn first_author_id(session: &mut Session) -> Result<Id> {
    let rows = session
        .store()
        .fetch("SELECT MIN(\"id\") FROM \"author\"", &[])?;
    rows.first()
        .and_then(|row| row.first())
        .and_then(|value| value.as_id())
        .ok_or_else(|| Error::InvalidData("no authors in the database".to_string()))
}

/// Delete every author; cascading foreign keys empty the other tables.
pub fn reset(session: &mut Session) -> Result<u64> {
    let deleted = session.store().execute("DELETE FROM \"author\"", &[])?;
    for kind in EntityKind::ALL {
        let remaining = session.store().count(kind)?;
        if remaining != 0 {
            return Err(Error::InvalidData(format!(
                "{remaining} {kind} rows survived the reset"
            )));
        }
    }
    session.tracker_mut().clear();
    Ok(deleted)
}

/// Wall-clock timings of repeated runs of one variant.
#[derive(Debug, Clone)]
pub struct RunStats {
    pub variant: Variant,
    pub iterations: usize,
    /// Entities loaded by the last iteration.
    pub entities: usize,
    pub total: Duration,
    pub min: Duration,
    pub max: Duration,
}

impl RunStats {
    pub fn mean(&self) -> Duration {
        if self.iterations == 0 {
            Duration::ZERO
        } else {
            let nanos = self.total.as_nanos() / self.iterations as u128;
            Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
        }
    }
}

/// Run `variant` `iterations` times on one session.
///
/// The session's tracker is not cleared between iterations, so tracked
/// variants pay identity resolution against earlier loads after the first.
pub fn time_variant(
    session: &mut Session,
    variant: Variant,
    author_id: Id,
    iterations: usize,
) -> Result<RunStats> {
    let mut stats = RunStats {
        variant,
        iterations,
        entities: 0,
        total: Duration::ZERO,
        min: Duration::MAX,
        max: Duration::ZERO,
    };

    for _ in 0..iterations {
        let start = Instant::now();
        stats.entities = variant.run(session, author_id)?;
        let elapsed = start.elapsed();

        stats.total += elapsed;
        stats.min = stats.min.min(elapsed);
        stats.max = stats.max.max(elapsed);
    }
    if iterations == 0 {
        stats.min = Duration::ZERO;
    }

    tracing::debug!(
        variant = %variant,
        iterations,
        entities = stats.entities,
        mean_us = stats.mean().as_micros() as u64,
        "variant timed"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelfbench_core::{DbType, SeedVolumes};

    fn context(dir: &tempfile::TempDir) -> BenchContext {
        let path = dir.path().join("bench.db");
        let settings = Settings::default()
            .with_database(DbType::Sqlite)
            .with_connection_string(DbType::Sqlite, path.display().to_string())
            .with_seed(SeedVolumes {
                authors: 2,
                achievements_per_author: 2,
                books_per_author: 2,
                chapters_per_book: 2,
                comments_per_chapter: 1,
                reactions_per_comment: 1,
                reviews_per_book: 1,
                reactions_per_review: 1,
                ..SeedVolumes::default()
            });
        BenchContext::new(settings).unwrap()
    }

    #[test]
    fn test_prepare_seeds_once() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);

        let mut session = ctx.session().unwrap();
        assert!(!ctx.prepare(&mut session).unwrap().skipped);
        assert!(ctx.prepare(&mut session).unwrap().skipped);
        assert!(ctx.verify(&mut session).unwrap().is_consistent());
    }

    #[test]
    fn test_first_author_requires_data() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        let mut session = ctx.session().unwrap();
        session.store().apply_schema(&library_schema()).unwrap();

        assert!(matches!(
            first_author_id(&mut session),
            Err(Error::InvalidData(_))
        ));
        ctx.prepare(&mut session).unwrap();
        assert!(first_author_id(&mut session).is_ok());
    }

    #[test]
    fn test_time_variant() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        let mut session = ctx.session().unwrap();
        ctx.prepare(&mut session).unwrap();
        let author_id = first_author_id(&mut session).unwrap();

        let stats = time_variant(&mut session, Variant::WithSplitQuery, author_id, 3).unwrap();
        assert_eq!(stats.iterations, 3);
        // 1 author, 2 achievements, 2 books, 4 chapters
        assert_eq!(stats.entities, 9);
        assert!(stats.min <= stats.mean() && stats.mean() <= stats.max);

        let stats = time_variant(&mut session, Variant::WithNoTracking, author_id, 0).unwrap();
        assert_eq!(stats.mean(), Duration::ZERO);
        assert_eq!(stats.min, Duration::ZERO);
    }

    #[test]
    fn test_mean_beyond_u32_iterations() {
        let stats = RunStats {
            variant: Variant::WithNoTracking,
            iterations: u32::MAX as usize + 1,
            entities: 0,
            total: Duration::from_secs(1 << 32),
            min: Duration::from_secs(1),
            max: Duration::from_secs(1),
        };
        assert_eq!(stats.mean(), Duration::from_secs(1));
    }

    #[test]
    fn test_reset_empties_every_table() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        let mut session = ctx.session().unwrap();
        ctx.prepare(&mut session).unwrap();

        assert_eq!(reset(&mut session).unwrap(), 2);
        for kind in EntityKind::ALL {
            assert_eq!(session.store().count(kind).unwrap(), 0);
        }
        // an empty store seeds again
        assert!(!ctx.prepare(&mut session).unwrap().skipped);
    }
}
