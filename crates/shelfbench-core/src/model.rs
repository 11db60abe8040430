//! Row types for the library entities.

use std::fmt;
use std::str::FromStr;

use crate::catalog::EntityKind;
use crate::error::{Error, Result};

/// Store-assigned identifier.
pub type Id = i64;

/// A single column value as exchanged with a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Int(i64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_id(&self) -> Option<Id> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Reaction left on a comment or a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReactionType {
    Like,
    Love,
    Wow,
}

impl ReactionType {
    pub const ALL: [ReactionType; 3] = [ReactionType::Like, ReactionType::Love, ReactionType::Wow];

    /// Map a uniform draw from `0..3`; anything past 1 is `Wow`.
    pub fn from_draw(draw: u32) -> Self {
        match draw {
            0 => ReactionType::Like,
            1 => ReactionType::Love,
            _ => ReactionType::Wow,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionType::Like => "Like",
            ReactionType::Love => "Love",
            ReactionType::Wow => "Wow",
        }
    }
}

impl fmt::Display for ReactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Like" => Ok(ReactionType::Like),
            "Love" => Ok(ReactionType::Love),
            "Wow" => Ok(ReactionType::Wow),
            other => Err(Error::InvalidData(format!("unknown reaction type {other:?}"))),
        }
    }
}

/// A row waiting to be inserted: its text attribute and parent reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRow {
    pub value: String,
    pub parent_id: Option<Id>,
}

impl PendingRow {
    pub fn root(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            parent_id: None,
        }
    }

    pub fn child(value: impl Into<String>, parent_id: Id) -> Self {
        Self {
            value: value.into(),
            parent_id: Some(parent_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: Id,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Achievement {
    pub id: Id,
    pub title: String,
    pub author_id: Id,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub id: Id,
    pub title: String,
    pub author_id: Id,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub id: Id,
    pub title: String,
    pub book_id: Id,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: Id,
    pub content: String,
    pub chapter_id: Id,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentReaction {
    pub id: Id,
    pub reaction_type: ReactionType,
    pub comment_id: Id,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub id: Id,
    pub content: String,
    pub book_id: Id,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewReaction {
    pub id: Id,
    pub reaction_type: ReactionType,
    pub review_id: Id,
}

/// A decoded row of any entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Author(Author),
    Achievement(Achievement),
    Book(Book),
    Chapter(Chapter),
    Comment(Comment),
    CommentReaction(CommentReaction),
    Review(Review),
    ReviewReaction(ReviewReaction),
}

impl Record {
    /// Decode `kind.column_count()` columns laid out as `id, text[, parent_id]`.
    ///
    /// Returns `None` when the id column is NULL, which is how an unmatched
    /// `LEFT JOIN` side shows up.
    pub fn decode(kind: EntityKind, columns: &[Value]) -> Result<Option<Record>> {
        if columns.len() != kind.column_count() {
            return Err(Error::InvalidData(format!(
                "{kind} expects {} columns, got {}",
                kind.column_count(),
                columns.len()
            )));
        }

        if columns[0].is_null() {
            return Ok(None);
        }
        let id = columns[0].as_id().ok_or_else(|| {
            Error::InvalidData(format!("{kind}.id is not an integer: {:?}", columns[0]))
        })?;
        let text = columns[1]
            .as_text()
            .ok_or_else(|| {
                Error::InvalidData(format!("{kind}.{} is not text", kind.text_column()))
            })?
            .to_string();
        let parent = || {
            columns[2]
                .as_id()
                .ok_or_else(|| Error::InvalidData(format!("{kind} {id} has no parent reference")))
        };

        let record = match kind {
            EntityKind::Author => Record::Author(Author { id, name: text }),
            EntityKind::Achievement => Record::Achievement(Achievement {
                id,
                title: text,
                author_id: parent()?,
            }),
            EntityKind::Book => Record::Book(Book {
                id,
                title: text,
                author_id: parent()?,
            }),
            EntityKind::Chapter => Record::Chapter(Chapter {
                id,
                title: text,
                book_id: parent()?,
            }),
            EntityKind::Comment => Record::Comment(Comment {
                id,
                content: text,
                chapter_id: parent()?,
            }),
            EntityKind::CommentReaction => Record::CommentReaction(CommentReaction {
                id,
                reaction_type: text.parse()?,
                comment_id: parent()?,
            }),
            EntityKind::Review => Record::Review(Review {
                id,
                content: text,
                book_id: parent()?,
            }),
            EntityKind::ReviewReaction => Record::ReviewReaction(ReviewReaction {
                id,
                reaction_type: text.parse()?,
                review_id: parent()?,
            }),
        };
        Ok(Some(record))
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Record::Author(_) => EntityKind::Author,
            Record::Achievement(_) => EntityKind::Achievement,
            Record::Book(_) => EntityKind::Book,
            Record::Chapter(_) => EntityKind::Chapter,
            Record::Comment(_) => EntityKind::Comment,
            Record::CommentReaction(_) => EntityKind::CommentReaction,
            Record::Review(_) => EntityKind::Review,
            Record::ReviewReaction(_) => EntityKind::ReviewReaction,
        }
    }

    pub fn id(&self) -> Id {
        match self {
            Record::Author(r) => r.id,
            Record::Achievement(r) => r.id,
            Record::Book(r) => r.id,
            Record::Chapter(r) => r.id,
            Record::Comment(r) => r.id,
            Record::CommentReaction(r) => r.id,
            Record::Review(r) => r.id,
            Record::ReviewReaction(r) => r.id,
        }
    }

    /// Non-key values, used as the change-tracking snapshot.
    pub fn snapshot(&self) -> Vec<Value> {
        fn pair(text: &str, parent: Id) -> Vec<Value> {
            vec![Value::Text(text.to_string()), Value::Int(parent)]
        }

        match self {
            Record::Author(r) => vec![Value::Text(r.name.clone())],
            Record::Achievement(r) => pair(&r.title, r.author_id),
            Record::Book(r) => pair(&r.title, r.author_id),
            Record::Chapter(r) => pair(&r.title, r.book_id),
            Record::Comment(r) => pair(&r.content, r.chapter_id),
            Record::CommentReaction(r) => pair(r.reaction_type.as_str(), r.comment_id),
            Record::Review(r) => pair(&r.content, r.book_id),
            Record::ReviewReaction(r) => pair(r.reaction_type.as_str(), r.review_id),
        }
    }
}
