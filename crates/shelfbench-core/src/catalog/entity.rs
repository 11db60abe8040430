//! Entity definitions.

use std::fmt;

/// The eight tables of the library schema.
///
/// Declaration order is the seeding order, so sorting by `EntityKind`
/// always lists a parent before any of its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Author,
    Achievement,
    Book,
    Chapter,
    Comment,
    CommentReaction,
    Review,
    ReviewReaction,
}

impl EntityKind {
    /// Every entity kind, parents first.
    pub const ALL: [EntityKind; 8] = [
        EntityKind::Author,
        EntityKind::Achievement,
        EntityKind::Book,
        EntityKind::Chapter,
        EntityKind::Comment,
        EntityKind::CommentReaction,
        EntityKind::Review,
        EntityKind::ReviewReaction,
    ];

    /// Entity name as used in logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Author => "Author",
            EntityKind::Achievement => "Achievement",
            EntityKind::Book => "Book",
            EntityKind::Chapter => "Chapter",
            EntityKind::Comment => "Comment",
            EntityKind::CommentReaction => "CommentReaction",
            EntityKind::Review => "Review",
            EntityKind::ReviewReaction => "ReviewReaction",
        }
    }

    /// Backing table name.
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Author => "author",
            EntityKind::Achievement => "achievement",
            EntityKind::Book => "book",
            EntityKind::Chapter => "chapter",
            EntityKind::Comment => "comment",
            EntityKind::CommentReaction => "comment_reaction",
            EntityKind::Review => "review",
            EntityKind::ReviewReaction => "review_reaction",
        }
    }

    /// The single text attribute every entity carries.
    pub fn text_column(&self) -> &'static str {
        match self {
            EntityKind::Author => "name",
            EntityKind::Achievement | EntityKind::Book | EntityKind::Chapter => "title",
            EntityKind::Comment | EntityKind::Review => "content",
            EntityKind::CommentReaction | EntityKind::ReviewReaction => "type",
        }
    }

    /// Parent entity and the foreign-key column pointing at it.
    pub fn parent(&self) -> Option<(EntityKind, &'static str)> {
        match self {
            EntityKind::Author => None,
            EntityKind::Achievement => Some((EntityKind::Author, "author_id")),
            EntityKind::Book => Some((EntityKind::Author, "author_id")),
            EntityKind::Chapter => Some((EntityKind::Book, "book_id")),
            EntityKind::Comment => Some((EntityKind::Chapter, "chapter_id")),
            EntityKind::CommentReaction => Some((EntityKind::Comment, "comment_id")),
            EntityKind::Review => Some((EntityKind::Book, "book_id")),
            EntityKind::ReviewReaction => Some((EntityKind::Review, "review_id")),
        }
    }

    /// Number of selected columns: id, text, and the foreign key if any.
    pub fn column_count(&self) -> usize {
        if self.parent().is_some() {
            3
        } else {
            2
        }
    }

    /// Chain of ancestors from the direct parent up to `Author`.
    pub fn ancestors(&self) -> Vec<EntityKind> {
        let mut chain = Vec::new();
        let mut current = *self;
        while let Some((parent, _)) = current.parent() {
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// Position in [`EntityKind::ALL`].
    pub fn ordinal(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Column types used by the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    /// Store-assigned 64-bit identifier or a reference to one.
    Id,
    /// UTF-8 text.
    Text,
}

/// A column definition.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub ty: ScalarType,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: ScalarType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A table definition: identity column plus declared fields.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDef {
    pub kind: EntityKind,
    pub identity_field: String,
    pub fields: Vec<FieldDef>,
}

impl EntityDef {
    /// Create an entity definition with only its identity column.
    pub fn new(kind: EntityKind, identity_field: impl Into<String>) -> Self {
        let identity_field = identity_field.into();
        Self {
            kind,
            fields: vec![FieldDef::new(identity_field.clone(), ScalarType::Id)],
            identity_field,
        }
    }

    /// Add a field.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Build the definition implied by the entity's column metadata.
    pub fn for_kind(kind: EntityKind) -> Self {
        let def = Self::new(kind, "id")
            .with_field(FieldDef::new(kind.text_column(), ScalarType::Text));
        match kind.parent() {
            Some((_, fk)) => def.with_field(FieldDef::new(fk, ScalarType::Id)),
            None => def,
        }
    }
}
