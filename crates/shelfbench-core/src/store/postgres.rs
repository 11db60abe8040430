//! PostgreSQL store.
//!
//! Enable with `--features postgres`. The store owns a Tokio runtime and
//! blocks on every call, so each batch write is awaited before the caller
//! moves on to the next level.

use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{Column, PgPool, Postgres, Row, TypeInfo};
use tokio::runtime::Runtime;

use crate::catalog::{Dialect, EntityKind};
use crate::error::{Error, Result};
use crate::model::{Id, PendingRow, Value};

use super::Store;

/// Rows per multi-row `INSERT`, well under the 65535 bind-parameter limit.
pub const INSERT_CHUNK_SIZE: usize = 1_000;

/// PostgreSQL store backed by a single-connection pool.
pub struct PostgresStore {
    pool: PgPool,
    rt: Runtime,
}

impl PostgresStore {
    /// Connect using a `postgres://` URL.
    pub fn connect(database_url: &str) -> Result<Self> {
        let rt = Runtime::new()?;
        let pool = rt.block_on(async {
            PgPoolOptions::new()
                .max_connections(1)
                .connect(database_url)
                .await
        })?;
        Ok(Self { pool, rt })
    }
}

impl Drop for PostgresStore {
    fn drop(&mut self) {
        self.rt.block_on(self.pool.close());
    }
}

impl Store for PostgresStore {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        self.rt.block_on(async {
            let result = bind_all(sqlx::query(sql), params)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected())
        })
    }

    fn fetch(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Vec<Value>>> {
        self.rt.block_on(async {
            let rows = bind_all(sqlx::query(sql), params)
                .fetch_all(&self.pool)
                .await?;
            rows.iter().map(decode_row).collect()
        })
    }

    fn insert_batch(&mut self, kind: EntityKind, rows: &[PendingRow]) -> Result<Vec<Id>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let fk = kind.parent().map(|(_, fk)| fk);
        self.rt.block_on(async {
            let mut tx = self.pool.begin().await?;
            let mut ids = Vec::with_capacity(rows.len());

            for chunk in rows.chunks(INSERT_CHUNK_SIZE) {
                let sql = insert_sql(kind, fk, chunk.len());
                let mut query = sqlx::query(&sql);
                for row in chunk {
                    query = query.bind(&row.value);
                    if fk.is_some() {
                        query = query.bind(row.parent_id);
                    }
                }

                let returned = query.fetch_all(&mut *tx).await?;
                let mut chunk_ids = returned
                    .iter()
                    .map(|r| r.try_get::<i64, _>(0))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                // sequence values are handed out in VALUES order
                chunk_ids.sort_unstable();
                ids.extend(chunk_ids);
            }

            tx.commit().await?;
            tracing::debug!(entity = %kind, rows = ids.len(), "batch committed");
            Ok(ids)
        })
    }
}

fn insert_sql(kind: EntityKind, fk: Option<&str>, rows: usize) -> String {
    let width = if fk.is_some() { 2 } else { 1 };
    let values = (0..rows)
        .map(|row| {
            let markers = (1..=width)
                .map(|col| Dialect::Postgres.placeholder(row * width + col))
                .collect::<Vec<_>>()
                .join(", ");
            format!("({markers})")
        })
        .collect::<Vec<_>>()
        .join(", ");

    let columns = match fk {
        Some(fk) => format!("\"{}\", \"{}\"", kind.text_column(), fk),
        None => format!("\"{}\"", kind.text_column()),
    };
    format!(
        "INSERT INTO \"{}\" ({columns}) VALUES {values} RETURNING \"id\"",
        kind.table()
    )
}

fn bind_all<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &'q [Value],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            Value::Null => query.bind(None::<i64>),
            Value::Int(v) => query.bind(*v),
            Value::Text(s) => query.bind(s.as_str()),
        };
    }
    query
}

fn decode_row(row: &PgRow) -> Result<Vec<Value>> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, column)| -> Result<Value> {
            let value = match column.type_info().name() {
                "INT8" => row.try_get::<Option<i64>, _>(i)?.map(Value::Int),
                "INT4" => row.try_get::<Option<i32>, _>(i)?.map(|v| Value::Int(v.into())),
                "INT2" => row.try_get::<Option<i16>, _>(i)?.map(|v| Value::Int(v.into())),
                "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => {
                    row.try_get::<Option<String>, _>(i)?.map(Value::Text)
                }
                other => {
                    return Err(Error::InvalidData(format!(
                        "unsupported column type {other} in column {}",
                        column.name()
                    )))
                }
            };
            Ok(value.unwrap_or(Value::Null))
        })
        .collect()
}
