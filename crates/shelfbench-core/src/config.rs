//! Harness configuration loaded from `appsettings.json`.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::EntityKind;
use crate::error::{Error, Result};

/// Name of the configuration file.
pub const SETTINGS_FILE: &str = "appsettings.json";

/// Default RNG seed for data generation.
pub const DEFAULT_RANDOM_SEED: u64 = 42;

/// Which database the connection string points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DbType {
    #[default]
    Postgres,
    Sqlite,
}

impl DbType {
    /// Key under `ConnectionStrings` holding this database's connection string.
    pub fn connection_key(&self) -> &'static str {
        match self {
            DbType::Postgres => "PostgresConnection",
            DbType::Sqlite => "SqliteConnection",
        }
    }
}

/// Row volumes for the seed generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SeedVolumes {
    pub authors: usize,
    pub achievements_per_author: usize,
    pub books_per_author: usize,
    pub chapters_per_book: usize,
    pub comments_per_chapter: usize,
    pub reactions_per_comment: usize,
    pub reviews_per_book: usize,
    pub reactions_per_review: usize,
    pub random_seed: u64,
}

impl Default for SeedVolumes {
    fn default() -> Self {
        Self {
            authors: 100,
            achievements_per_author: 20,
            books_per_author: 100,
            chapters_per_book: 30,
            comments_per_chapter: 50,
            reactions_per_comment: 50,
            reviews_per_book: 100,
            reactions_per_review: 100,
            random_seed: DEFAULT_RANDOM_SEED,
        }
    }
}

impl SeedVolumes {
    /// Row count every table holds after one complete seed pass.
    pub fn expected_counts(&self) -> BTreeMap<EntityKind, u64> {
        let authors = self.authors as u64;
        let books = authors * self.books_per_author as u64;
        let chapters = books * self.chapters_per_book as u64;
        let comments = chapters * self.comments_per_chapter as u64;
        let reviews = books * self.reviews_per_book as u64;

        BTreeMap::from([
            (EntityKind::Author, authors),
            (EntityKind::Achievement, authors * self.achievements_per_author as u64),
            (EntityKind::Book, books),
            (EntityKind::Chapter, chapters),
            (EntityKind::Comment, comments),
            (EntityKind::CommentReaction, comments * self.reactions_per_comment as u64),
            (EntityKind::Review, reviews),
            (EntityKind::ReviewReaction, reviews * self.reactions_per_review as u64),
        ])
    }
}

/// Contents of `appsettings.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Settings {
    #[serde(default)]
    pub database: DbType,
    #[serde(default)]
    pub connection_strings: HashMap<String, String>,
    #[serde(default)]
    pub seed: SeedVolumes,
}

impl Settings {
    /// Find `appsettings.json` next to the executable, then in the working directory.
    pub fn locate() -> Result<PathBuf> {
        let exe = std::env::current_exe()?;
        let base_dir = exe.parent().map(Path::to_path_buf).unwrap_or_default();
        let current_dir = std::env::current_dir()?;
        locate_in(&base_dir, &current_dir)
    }

    /// Parse settings from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Parse settings from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Locate and parse settings from the default location.
    pub fn from_default_location() -> Result<Self> {
        let path = Self::locate()?;
        tracing::debug!(path = %path.display(), "loading settings");
        Self::load(path)
    }

    /// Connection string for the configured database.
    pub fn connection_string(&self) -> Result<&str> {
        let key = self.database.connection_key();
        self.connection_strings
            .get(key)
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| Error::Config(format!("ConnectionStrings.{key} is not set")))
    }

    /// Set the database type.
    pub fn with_database(mut self, database: DbType) -> Self {
        self.database = database;
        self
    }

    /// Set a connection string for a database type.
    pub fn with_connection_string(mut self, database: DbType, value: impl Into<String>) -> Self {
        self.connection_strings
            .insert(database.connection_key().to_string(), value.into());
        self
    }

    /// Set the seed volumes.
    pub fn with_seed(mut self, seed: SeedVolumes) -> Self {
        self.seed = seed;
        self
    }
}

/// Search `base_dir` then `current_dir` for the settings file.
pub fn locate_in(base_dir: &Path, current_dir: &Path) -> Result<PathBuf> {
    [base_dir, current_dir]
        .into_iter()
        .map(|dir| dir.join(SETTINGS_FILE))
        .find(|path| path.is_file())
        .ok_or_else(|| Error::ConfigNotFound {
            base_dir: base_dir.to_path_buf(),
            current_dir: current_dir.to_path_buf(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_volumes() {
        let volumes = SeedVolumes::default();
        assert_eq!(volumes.authors, 100);
        assert_eq!(volumes.random_seed, 42);

        let counts = volumes.expected_counts();
        assert_eq!(counts[&EntityKind::Achievement], 2_000);
        assert_eq!(counts[&EntityKind::Book], 10_000);
        assert_eq!(counts[&EntityKind::Chapter], 300_000);
        assert_eq!(counts[&EntityKind::Review], 1_000_000);
    }

    #[test]
    fn test_parse_settings() {
        let settings = Settings::from_json(
            r#"{
                "Database": "Sqlite",
                "ConnectionStrings": {
                    "PostgresConnection": "postgres://localhost/shelfbench",
                    "SqliteConnection": "shelfbench.db"
                },
                "Seed": { "Authors": 3, "BooksPerAuthor": 2 }
            }"#,
        )
        .unwrap();

        assert_eq!(settings.database, DbType::Sqlite);
        assert_eq!(settings.connection_string().unwrap(), "shelfbench.db");
        assert_eq!(settings.seed.authors, 3);
        assert_eq!(settings.seed.books_per_author, 2);
        // unspecified volumes keep their defaults
        assert_eq!(settings.seed.chapters_per_book, 30);
    }

    #[test]
    fn test_database_defaults_to_postgres() {
        let settings = Settings::from_json(
            r#"{ "ConnectionStrings": { "PostgresConnection": "postgres://localhost/db" } }"#,
        )
        .unwrap();
        assert_eq!(settings.database, DbType::Postgres);
        assert_eq!(settings.connection_string().unwrap(), "postgres://localhost/db");
    }

    #[test]
    fn test_missing_connection_string() {
        let settings = Settings::default().with_database(DbType::Sqlite);
        assert!(matches!(settings.connection_string(), Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(Settings::from_json("{"), Err(Error::ConfigJson(_))));
    }

    #[test]
    fn test_locate_prefers_base_dir() {
        let base = tempfile::tempdir().unwrap();
        let cwd = tempfile::tempdir().unwrap();
        std::fs::write(base.path().join(SETTINGS_FILE), "{}").unwrap();
        std::fs::write(cwd.path().join(SETTINGS_FILE), "{}").unwrap();

        let found = locate_in(base.path(), cwd.path()).unwrap();
        assert_eq!(found, base.path().join(SETTINGS_FILE));
    }

    #[test]
    fn test_locate_falls_back_to_current_dir() {
        let base = tempfile::tempdir().unwrap();
        let cwd = tempfile::tempdir().unwrap();
        std::fs::write(cwd.path().join(SETTINGS_FILE), "{}").unwrap();

        let found = locate_in(base.path(), cwd.path()).unwrap();
        assert_eq!(found, cwd.path().join(SETTINGS_FILE));
    }

    #[test]
    fn test_locate_reports_both_dirs() {
        let base = tempfile::tempdir().unwrap();
        let cwd = tempfile::tempdir().unwrap();

        let err = locate_in(base.path(), cwd.path()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains(&base.path().display().to_string()));
        assert!(message.contains(&cwd.path().display().to_string()));
    }
}
