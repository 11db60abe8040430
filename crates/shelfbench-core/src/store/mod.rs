//! Storage backends.
//!
//! A [`Store`] is one open connection to a relational database. The seed
//! generator and the query variants only talk to this trait, so SQLite and
//! PostgreSQL run the same code paths.

pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use sqlite::SqliteStore;

#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;

use crate::catalog::{Dialect, EntityKind, Schema};
use crate::config::{DbType, Settings};
use crate::error::{Error, Result};
use crate::model::{Id, PendingRow, Value};
use crate::session::Session;

/// One connection to a relational store.
pub trait Store {
    /// SQL dialect spoken by this store.
    fn dialect(&self) -> Dialect;

    /// Execute a statement, returning the number of affected rows.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Run a query and return every row as a vector of column values.
    fn fetch(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Vec<Value>>>;

    /// Insert `rows` into the table of `kind` inside one transaction and
    /// commit. Returns the store-assigned ids in the order of `rows`.
    fn insert_batch(&mut self, kind: EntityKind, rows: &[PendingRow]) -> Result<Vec<Id>>;

    /// Create every table and index of `schema` that does not exist yet.
    fn apply_schema(&mut self, schema: &Schema) -> Result<()> {
        schema.validate()?;
        for statement in schema.create_statements(self.dialect()) {
            tracing::debug!(sql = %statement, "applying schema");
            self.execute(&statement, &[])?;
        }
        Ok(())
    }

    /// Number of rows in the table of `kind`.
    fn count(&mut self, kind: EntityKind) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM \"{}\"", kind.table());
        single_integer(self.fetch(&sql, &[])?).map(|n| n as u64)
    }

    /// Whether the table of `kind` holds at least one row.
    fn any(&mut self, kind: EntityKind) -> Result<bool> {
        let sql = format!("SELECT \"id\" FROM \"{}\" LIMIT 1", kind.table());
        Ok(!self.fetch(&sql, &[])?.is_empty())
    }

    /// Delete one row; descendants go with it through `ON DELETE CASCADE`.
    fn delete(&mut self, kind: EntityKind, id: Id) -> Result<u64> {
        let sql = format!(
            "DELETE FROM \"{}\" WHERE \"id\" = {}",
            kind.table(),
            self.dialect().placeholder(1)
        );
        self.execute(&sql, &[Value::Int(id)])
    }

    /// Rows of `kind` whose foreign key resolves to no parent row.
    fn orphan_count(&mut self, kind: EntityKind) -> Result<u64> {
        let Some((parent, fk)) = kind.parent() else {
            return Ok(0);
        };
        let sql = format!(
            "SELECT COUNT(*) FROM \"{child}\" c LEFT JOIN \"{parent}\" p \
             ON c.\"{fk}\" = p.\"id\" WHERE p.\"id\" IS NULL",
            child = kind.table(),
            parent = parent.table(),
        );
        single_integer(self.fetch(&sql, &[])?).map(|n| n as u64)
    }
}

pub(crate) fn single_integer(rows: Vec<Vec<Value>>) -> Result<i64> {
    rows.first()
        .and_then(|row| row.first())
        .and_then(Value::as_id)
        .ok_or_else(|| Error::InvalidData("expected a single integer result".to_string()))
}

/// Connection factory for the configured database.
///
/// Every unit of work acquires its own [`Session`]; the connection is
/// released when the session is dropped.
#[derive(Debug, Clone)]
pub struct Database {
    db_type: DbType,
    connection_string: String,
}

impl Database {
    pub fn new(db_type: DbType, connection_string: impl Into<String>) -> Self {
        Self {
            db_type,
            connection_string: connection_string.into(),
        }
    }

    /// Build from loaded settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(settings.database, settings.connection_string()?))
    }

    pub fn db_type(&self) -> DbType {
        self.db_type
    }

    /// Open a raw connection.
    pub fn connect(&self) -> Result<Box<dyn Store>> {
        match self.db_type {
            DbType::Sqlite if sqlite::is_in_memory(&self.connection_string) => Err(Error::Config(
                "an in-memory SQLite database does not outlive its session; use a file path"
                    .to_string(),
            )),
            DbType::Sqlite => Ok(Box::new(SqliteStore::open(&self.connection_string)?)),
            #[cfg(feature = "postgres")]
            DbType::Postgres => Ok(Box::new(PostgresStore::connect(&self.connection_string)?)),
            #[cfg(not(feature = "postgres"))]
            DbType::Postgres => Err(Error::Config(
                "Postgres support requires the `postgres` feature".to_string(),
            )),
        }
    }

    /// Acquire a session owning a fresh connection.
    pub fn session(&self) -> Result<Session> {
        tracing::debug!(database = ?self.db_type(), "opening session");
        Ok(Session::new(self.connect()?))
    }

    /// Run one unit of work in its own session.
    pub fn with_session<T>(&self, work: impl FnOnce(&mut Session) -> Result<T>) -> Result<T> {
        let mut session = self.session()?;
        work(&mut session)
    }
}
