//! Relation definitions between entities.

use super::entity::EntityKind;

/// Behavior when a referenced entity is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteBehavior {
    /// Delete related entities.
    Cascade,
    /// Prevent deletion if related entities exist.
    Restrict,
}

impl DeleteBehavior {
    /// SQL `ON DELETE` action.
    pub fn sql(&self) -> &'static str {
        match self {
            DeleteBehavior::Cascade => "CASCADE",
            DeleteBehavior::Restrict => "RESTRICT",
        }
    }
}

/// A one-to-many relation: `child.foreign_key` references `parent.id`.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationDef {
    /// Navigation name on the parent (unique per parent).
    pub name: String,
    /// Referenced entity.
    pub parent: EntityKind,
    /// Referencing entity.
    pub child: EntityKind,
    /// Foreign-key field on the child.
    pub foreign_key: String,
    /// Delete behavior.
    pub on_delete: DeleteBehavior,
}

impl RelationDef {
    /// Create a one-to-many relation.
    pub fn one_to_many(
        name: impl Into<String>,
        parent: EntityKind,
        child: EntityKind,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            parent,
            child,
            foreign_key: foreign_key.into(),
            on_delete: DeleteBehavior::Restrict,
        }
    }

    /// Set delete behavior.
    pub fn with_on_delete(mut self, on_delete: DeleteBehavior) -> Self {
        self.on_delete = on_delete;
        self
    }

    /// Check if deleting the parent removes the children.
    pub fn cascades(&self) -> bool {
        self.on_delete == DeleteBehavior::Cascade
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_to_many_defaults_to_restrict() {
        let rel =
            RelationDef::one_to_many("books", EntityKind::Author, EntityKind::Book, "author_id");
        assert_eq!(rel.on_delete, DeleteBehavior::Restrict);
        assert!(!rel.cascades());

        let rel = rel.with_on_delete(DeleteBehavior::Cascade);
        assert!(rel.cascades());
        assert_eq!(rel.on_delete.sql(), "CASCADE");
    }
}
