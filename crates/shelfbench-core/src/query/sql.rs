//! SQL text for the single and split loading strategies.

use crate::catalog::{Dialect, EntityKind};
use crate::model::{Id, Value};

/// Alias of an entity's table inside generated queries.
fn alias(kind: EntityKind) -> String {
    format!("t{}", kind.ordinal())
}

fn select_columns(kind: EntityKind) -> String {
    let a = alias(kind);
    match kind.parent() {
        Some((_, fk)) => format!("{a}.\"id\", {a}.\"{}\", {a}.\"{fk}\"", kind.text_column()),
        None => format!("{a}.\"id\", {a}.\"{}\"", kind.text_column()),
    }
}

fn root_filter(author_id: Option<Id>, dialect: Dialect) -> (String, Vec<Value>) {
    match author_id {
        Some(id) => (
            format!(" WHERE {}.\"id\" = {}", alias(EntityKind::Author), dialect.placeholder(1)),
            vec![Value::Int(id)],
        ),
        None => (String::new(), Vec::new()),
    }
}

/// One statement joining every included table onto `author`.
///
/// `kinds` must be parent-first and start with `Author`. Rows multiply
/// across sibling collections; the caller de-duplicates.
pub(crate) fn single_query(
    kinds: &[EntityKind],
    author_id: Option<Id>,
    dialect: Dialect,
) -> (String, Vec<Value>) {
    let columns = kinds
        .iter()
        .map(|&k| select_columns(k))
        .collect::<Vec<_>>()
        .join(", ");

    let mut sql = format!(
        "SELECT {columns} FROM \"{}\" {}",
        EntityKind::Author.table(),
        alias(EntityKind::Author)
    );
    for &kind in kinds {
        if let Some((parent, fk)) = kind.parent() {
            sql.push_str(&format!(
                " LEFT JOIN \"{}\" {a} ON {a}.\"{fk}\" = {}.\"id\"",
                kind.table(),
                alias(parent),
                a = alias(kind),
            ));
        }
    }

    let (filter, params) = root_filter(author_id, dialect);
    sql.push_str(&filter);

    let order = kinds
        .iter()
        .map(|&k| format!("{}.\"id\"", alias(k)))
        .collect::<Vec<_>>()
        .join(", ");
    sql.push_str(&format!(" ORDER BY {order}"));
    (sql, params)
}

/// One statement loading a single table, joined up to `author` so the
/// root filter applies.
pub(crate) fn split_query(
    kind: EntityKind,
    author_id: Option<Id>,
    dialect: Dialect,
) -> (String, Vec<Value>) {
    let mut sql = format!(
        "SELECT {} FROM \"{}\" {}",
        select_columns(kind),
        kind.table(),
        alias(kind)
    );

    let mut child = kind;
    while let Some((parent, fk)) = child.parent() {
        sql.push_str(&format!(
            " INNER JOIN \"{}\" {p} ON {}.\"{fk}\" = {p}.\"id\"",
            parent.table(),
            alias(child),
            p = alias(parent),
        ));
        child = parent;
    }

    let (filter, params) = root_filter(author_id, dialect);
    sql.push_str(&filter);

    let mut path: Vec<EntityKind> = kind.ancestors();
    path.reverse();
    path.push(kind);
    let order = path
        .iter()
        .map(|&k| format!("{}.\"id\"", alias(k)))
        .collect::<Vec<_>>()
        .join(", ");
    sql.push_str(&format!(" ORDER BY {order}"));
    (sql, params)
}
