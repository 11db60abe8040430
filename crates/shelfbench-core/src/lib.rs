//! shelfbench core.
//!
//! Schema, seed generator, and query variants for benchmarking change
//! tracking and split queries over a nested library schema:
//!
//! - **catalog**: eight entities, seven cascading one-to-many relations, DDL
//! - **seed**: staged, deterministic bulk data generation
//! - **query**: author graphs loaded with single or split statements,
//!   tracked or detached
//! - **store**: SQLite and (feature `postgres`) PostgreSQL connections

pub mod catalog;
pub mod config;
pub mod error;
pub mod model;
pub mod query;
pub mod seed;
pub mod session;
pub mod store;
pub mod tracking;
pub mod verify;

pub use catalog::{library_schema, EntityKind, Schema};
pub use config::{DbType, SeedVolumes, Settings};
pub use error::{Error, Result};
pub use query::{AuthorGraph, AuthorQuery, Include, SplitMode, TrackingMode, Variant};
pub use seed::{seed_if_empty, SeedReport, Seeder};
pub use session::Session;
pub use store::{Database, SqliteStore, Store};
pub use tracking::{ChangeTracker, EntityState};
pub use verify::{verify, VerifyReport};
