//! Schema catalog.
//!
//! Declares the eight library entities, the cascading one-to-many relations
//! between them, and renders the DDL for each supported dialect.

mod entity;
mod relation;
mod schema;

pub use entity::{EntityDef, EntityKind, FieldDef, ScalarType};
pub use relation::{DeleteBehavior, RelationDef};
pub use schema::{library_schema, Dialect, Schema};
