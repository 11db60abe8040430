//! Schema bundle and DDL rendering.

use std::collections::HashSet;

use crate::error::{Error, Result};

use super::entity::{EntityDef, EntityKind, ScalarType};
use super::relation::{DeleteBehavior, RelationDef};

/// SQL flavour a statement is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

impl Dialect {
    /// Positional parameter marker, 1-based.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Sqlite => format!("?{index}"),
            Dialect::Postgres => format!("${index}"),
        }
    }

    fn identity_column(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "INTEGER PRIMARY KEY AUTOINCREMENT",
            Dialect::Postgres => "BIGSERIAL PRIMARY KEY",
        }
    }

    fn reference_type(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "INTEGER",
            Dialect::Postgres => "BIGINT",
        }
    }
}

/// A complete schema: entities plus the relations between them.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub entities: Vec<EntityDef>,
    pub relations: Vec<RelationDef>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity.
    pub fn with_entity(mut self, entity: EntityDef) -> Self {
        self.entities.push(entity);
        self
    }

    /// Add a relation.
    pub fn with_relation(mut self, relation: RelationDef) -> Self {
        self.relations.push(relation);
        self
    }

    /// Look up an entity definition.
    pub fn entity(&self, kind: EntityKind) -> Option<&EntityDef> {
        self.entities.iter().find(|e| e.kind == kind)
    }

    /// Relations whose parent is `kind`.
    pub fn children_of(&self, kind: EntityKind) -> impl Iterator<Item = &RelationDef> {
        self.relations.iter().filter(move |r| r.parent == kind)
    }

    /// The relation through which `kind` references its parent, if any.
    pub fn parent_relation(&self, kind: EntityKind) -> Option<&RelationDef> {
        self.relations.iter().find(|r| r.child == kind)
    }

    /// Check that every relation refers to declared entities and fields.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for entity in &self.entities {
            if !seen.insert(entity.kind) {
                return Err(Error::Schema(format!("entity {} declared twice", entity.kind)));
            }
        }

        let mut names = HashSet::new();
        for relation in &self.relations {
            if !names.insert((relation.parent, relation.name.as_str())) {
                return Err(Error::Schema(format!(
                    "relation {}.{} declared twice",
                    relation.parent, relation.name
                )));
            }
            if self.entity(relation.parent).is_none() {
                return Err(Error::Schema(format!(
                    "relation {} references undeclared parent {}",
                    relation.name, relation.parent
                )));
            }
            let child = self.entity(relation.child).ok_or_else(|| {
                Error::Schema(format!(
                    "relation {} references undeclared child {}",
                    relation.name, relation.child
                ))
            })?;
            match child.field(&relation.foreign_key) {
                Some(field) if field.ty == ScalarType::Id => {}
                Some(_) => {
                    return Err(Error::Schema(format!(
                        "foreign key {}.{} is not an id column",
                        relation.child, relation.foreign_key
                    )))
                }
                None => {
                    return Err(Error::Schema(format!(
                        "foreign key {}.{} is not declared",
                        relation.child, relation.foreign_key
                    )))
                }
            }
        }
        Ok(())
    }

    /// Render `CREATE TABLE` and `CREATE INDEX` statements, parents first.
    pub fn create_statements(&self, dialect: Dialect) -> Vec<String> {
        let mut entities: Vec<&EntityDef> = self.entities.iter().collect();
        entities.sort_by_key(|e| e.kind);

        let mut statements = Vec::new();
        for entity in entities {
            let table = entity.kind.table();
            let mut columns = Vec::with_capacity(entity.fields.len());
            let mut indexes = Vec::new();

            for field in &entity.fields {
                if field.name == entity.identity_field {
                    columns.push(format!("\"{}\" {}", field.name, dialect.identity_column()));
                    continue;
                }

                let reference = self
                    .parent_relation(entity.kind)
                    .filter(|r| r.foreign_key == field.name);

                match (field.ty, reference) {
                    (ScalarType::Id, Some(rel)) => {
                        columns.push(format!(
                            "\"{}\" {} NOT NULL REFERENCES \"{}\"(\"id\") ON DELETE {}",
                            field.name,
                            dialect.reference_type(),
                            rel.parent.table(),
                            rel.on_delete.sql()
                        ));
                        indexes.push(format!(
                            "CREATE INDEX IF NOT EXISTS \"idx_{table}_{name}\" ON \"{table}\"(\"{name}\")",
                            name = field.name
                        ));
                    }
                    (ScalarType::Id, None) => columns.push(format!(
                        "\"{}\" {} NOT NULL",
                        field.name,
                        dialect.reference_type()
                    )),
                    (ScalarType::Text, _) => {
                        columns.push(format!("\"{}\" TEXT NOT NULL", field.name))
                    }
                }
            }

            statements.push(format!(
                "CREATE TABLE IF NOT EXISTS \"{table}\" (\n    {}\n)",
                columns.join(",\n    ")
            ));
            statements.extend(indexes);
        }
        statements
    }
}

/// The library schema: eight tables, seven cascading one-to-many relations.
pub fn library_schema() -> Schema {
    let schema = EntityKind::ALL.iter().fold(Schema::new(), |schema, &kind| {
        schema.with_entity(EntityDef::for_kind(kind))
    });

    let relations = [
        ("achievements", EntityKind::Achievement),
        ("books", EntityKind::Book),
        ("chapters", EntityKind::Chapter),
        ("reviews", EntityKind::Review),
        ("comments", EntityKind::Comment),
        ("reactions", EntityKind::ReviewReaction),
        ("reactions", EntityKind::CommentReaction),
    ];

    relations.into_iter().fold(schema, |schema, (name, child)| {
        let Some((parent, fk)) = child.parent() else {
            return schema;
        };
        schema.with_relation(
            RelationDef::one_to_many(name, parent, child, fk)
                .with_on_delete(DeleteBehavior::Cascade),
        )
    })
}
