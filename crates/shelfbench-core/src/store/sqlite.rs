//! SQLite store.

use rusqlite::types::{ToSqlOutput, Type, ValueRef};
use rusqlite::{params, params_from_iter, Connection, ToSql};

use crate::catalog::{Dialect, EntityKind};
use crate::error::Result;
use crate::model::{Id, PendingRow, Value};

use super::Store;

/// A single SQLite connection with foreign keys enforced.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open the database named by a connection string.
    ///
    /// Accepts a bare path, `:memory:`, `sqlite:` / `sqlite://` URLs and the
    /// `Data Source=` form.
    pub fn open(connection_string: &str) -> Result<Self> {
        let conn = if is_in_memory(connection_string) {
            Connection::open_in_memory()?
        } else {
            Connection::open(database_path(connection_string))?
        };
        Self::with_connection(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        // cascade deletes only fire with foreign keys on, per connection
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }
}

impl Store for SqliteStore {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        let affected = self.conn.execute(sql, params_from_iter(params.iter()))?;
        Ok(affected as u64)
    }

    fn fetch(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Vec<Value>>> {
        let mut stmt = self.conn.prepare(sql)?;
        let width = stmt.column_count();

        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                (0..width)
                    .map(|i| value_from_ref(i, row.get_ref(i)?))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn insert_batch(&mut self, kind: EntityKind, rows: &[PendingRow]) -> Result<Vec<Id>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let sql = match kind.parent() {
            Some((_, fk)) => format!(
                "INSERT INTO \"{}\" (\"{}\", \"{}\") VALUES (?1, ?2)",
                kind.table(),
                kind.text_column(),
                fk
            ),
            None => format!(
                "INSERT INTO \"{}\" (\"{}\") VALUES (?1)",
                kind.table(),
                kind.text_column()
            ),
        };

        let tx = self.conn.transaction()?;
        let mut ids = Vec::with_capacity(rows.len());
        {
            let mut stmt = tx.prepare(&sql)?;
            for row in rows {
                match row.parent_id {
                    Some(parent_id) => stmt.execute(params![&row.value, parent_id])?,
                    None => stmt.execute(params![&row.value])?,
                };
                ids.push(tx.last_insert_rowid());
            }
        }
        tx.commit()?;
        Ok(ids)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::from(rusqlite::types::Null),
            Value::Int(v) => ToSqlOutput::from(*v),
            Value::Text(s) => ToSqlOutput::from(s.as_str()),
        })
    }
}

fn value_from_ref(index: usize, value: ValueRef<'_>) -> rusqlite::Result<Value> {
    match value {
        ValueRef::Null => Ok(Value::Null),
        ValueRef::Integer(v) => Ok(Value::Int(v)),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(|s| Value::Text(s.to_string()))
            .map_err(rusqlite::Error::Utf8Error),
        ValueRef::Real(_) => Err(rusqlite::Error::InvalidColumnType(
            index,
            String::new(),
            Type::Real,
        )),
        ValueRef::Blob(_) => Err(rusqlite::Error::InvalidColumnType(
            index,
            String::new(),
            Type::Blob,
        )),
    }
}

/// Whether the connection string names a private in-memory database.
pub(crate) fn is_in_memory(connection_string: &str) -> bool {
    database_path(connection_string) == ":memory:"
}

fn database_path(connection_string: &str) -> &str {
    let trimmed = connection_string.trim();
    let data_source = trimmed.split(';').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("Data Source")
            .then(|| value.trim())
    });
    if let Some(path) = data_source {
        return path;
    }
    trimmed
        .strip_prefix("sqlite://")
        .or_else(|| trimmed.strip_prefix("sqlite:"))
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::library_schema;

    fn store() -> SqliteStore {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.apply_schema(&library_schema()).unwrap();
        store
    }

    #[test]
    fn test_database_path() {
        assert_eq!(database_path("shelfbench.db"), "shelfbench.db");
        assert_eq!(database_path("Data Source=bench.db;"), "bench.db");
        assert_eq!(database_path("sqlite://bench.db"), "bench.db");
        assert_eq!(database_path("sqlite::memory:"), ":memory:");
        assert_eq!(database_path("Data Source=x.db;Mode=ReadWrite"), "x.db");
        assert_eq!(database_path("Mode=ReadWrite; Data Source = x.db ;"), "x.db");
        assert_eq!(database_path("data source=x.db"), "x.db");
        assert!(is_in_memory("Data Source=:memory:;Cache=Shared"));
        assert!(!is_in_memory("bench.db"));
    }

    #[test]
    fn test_insert_batch_returns_ids_in_order() {
        let mut store = store();
        let ids = store
            .insert_batch(
                EntityKind::Author,
                &[PendingRow::root("Author 1"), PendingRow::root("Author 2")],
            )
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids[0] < ids[1]);

        let rows = store
            .fetch("SELECT \"id\", \"name\" FROM \"author\" ORDER BY \"id\"", &[])
            .unwrap();
        assert_eq!(rows[0], vec![Value::Int(ids[0]), Value::Text("Author 1".into())]);
        assert_eq!(rows[1], vec![Value::Int(ids[1]), Value::Text("Author 2".into())]);
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let mut store = store();
        let result = store.insert_batch(EntityKind::Book, &[PendingRow::child("Orphan", 999)]);
        assert!(result.is_err());
        assert_eq!(store.count(EntityKind::Book).unwrap(), 0);
    }

    #[test]
    fn test_any_and_count() {
        let mut store = store();
        assert!(!store.any(EntityKind::Author).unwrap());
        store
            .insert_batch(EntityKind::Author, &[PendingRow::root("Author 1")])
            .unwrap();
        assert!(store.any(EntityKind::Author).unwrap());
        assert_eq!(store.count(EntityKind::Author).unwrap(), 1);
    }

    #[test]
    fn test_delete_cascades() {
        let mut store = store();
        let authors = store
            .insert_batch(EntityKind::Author, &[PendingRow::root("Author 1")])
            .unwrap();
        let books = store
            .insert_batch(EntityKind::Book, &[PendingRow::child("Book 1", authors[0])])
            .unwrap();
        store
            .insert_batch(EntityKind::Review, &[PendingRow::child("Review 1", books[0])])
            .unwrap();

        assert_eq!(store.delete(EntityKind::Author, authors[0]).unwrap(), 1);
        assert_eq!(store.count(EntityKind::Book).unwrap(), 0);
        assert_eq!(store.count(EntityKind::Review).unwrap(), 0);
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let mut store = store();
        assert!(store.insert_batch(EntityKind::Author, &[]).unwrap().is_empty());
    }
}
