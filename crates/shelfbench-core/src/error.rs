//! Core error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the harness core.
#[derive(Debug, Error)]
pub enum Error {
    /// No configuration file in any of the searched directories.
    #[error(
        "configuration file not found. Looked in:\n{}\n{}",
        base_dir.display(),
        current_dir.display()
    )]
    ConfigNotFound {
        base_dir: PathBuf,
        current_dir: PathBuf,
    },

    /// Configuration file present but unusable.
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed.
    #[error("invalid configuration json: {0}")]
    ConfigJson(#[from] serde_json::Error),

    /// SQLite error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// PostgreSQL error.
    #[cfg(feature = "postgres")]
    #[error("postgres error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// Schema declaration error.
    #[error("schema error: {0}")]
    Schema(String),

    /// Stored data did not match the declared schema.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the core.
pub type Result<T> = std::result::Result<T, Error>;
