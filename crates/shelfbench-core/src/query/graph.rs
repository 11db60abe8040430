//! Materialized author graphs and their assembly from flat rows.

use std::collections::{BTreeMap, HashMap};

use crate::model::{
    Achievement, Author, Book, Chapter, Comment, CommentReaction, Id, Record, Review,
    ReviewReaction,
};

/// An author with whichever collections the query included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorGraph {
    pub author: Author,
    pub achievements: Vec<Achievement>,
    pub books: Vec<BookGraph>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookGraph {
    pub book: Book,
    pub chapters: Vec<ChapterGraph>,
    pub reviews: Vec<ReviewGraph>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterGraph {
    pub chapter: Chapter,
    pub comments: Vec<CommentGraph>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentGraph {
    pub comment: Comment,
    pub reactions: Vec<CommentReaction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewGraph {
    pub review: Review,
    pub reactions: Vec<ReviewReaction>,
}

impl AuthorGraph {
    /// Every entity in the graph, flattened, parents first.
    pub fn records(&self) -> Vec<Record> {
        let mut out = vec![Record::Author(self.author.clone())];
        out.extend(self.achievements.iter().cloned().map(Record::Achievement));
        for book in &self.books {
            out.push(Record::Book(book.book.clone()));
            for chapter in &book.chapters {
                out.push(Record::Chapter(chapter.chapter.clone()));
                for comment in &chapter.comments {
                    out.push(Record::Comment(comment.comment.clone()));
                    out.extend(comment.reactions.iter().cloned().map(Record::CommentReaction));
                }
            }
            for review in &book.reviews {
                out.push(Record::Review(review.review.clone()));
                out.extend(review.reactions.iter().cloned().map(Record::ReviewReaction));
            }
        }
        out
    }

    /// Number of entities in the graph, the author included.
    pub fn entity_count(&self) -> usize {
        1 + self.achievements.len()
            + self
                .books
                .iter()
                .map(|b| {
                    1 + b
                        .chapters
                        .iter()
                        .map(|c| {
                            1 + c.comments.iter().map(|m| 1 + m.reactions.len()).sum::<usize>()
                        })
                        .sum::<usize>()
                        + b.reviews.iter().map(|r| 1 + r.reactions.len()).sum::<usize>()
                })
                .sum::<usize>()
    }
}

/// Collects de-duplicated rows per entity kind, then nests them.
#[derive(Debug, Default)]
pub(crate) struct GraphBuilder {
    authors: BTreeMap<Id, Author>,
    achievements: BTreeMap<Id, Achievement>,
    books: BTreeMap<Id, Book>,
    chapters: BTreeMap<Id, Chapter>,
    comments: BTreeMap<Id, Comment>,
    comment_reactions: BTreeMap<Id, CommentReaction>,
    reviews: BTreeMap<Id, Review>,
    review_reactions: BTreeMap<Id, ReviewReaction>,
}

impl GraphBuilder {
    /// Whether a row with this identity was already collected.
    pub(crate) fn contains(&self, record: &Record) -> bool {
        let id = record.id();
        match record {
            Record::Author(_) => self.authors.contains_key(&id),
            Record::Achievement(_) => self.achievements.contains_key(&id),
            Record::Book(_) => self.books.contains_key(&id),
            Record::Chapter(_) => self.chapters.contains_key(&id),
            Record::Comment(_) => self.comments.contains_key(&id),
            Record::CommentReaction(_) => self.comment_reactions.contains_key(&id),
            Record::Review(_) => self.reviews.contains_key(&id),
            Record::ReviewReaction(_) => self.review_reactions.contains_key(&id),
        }
    }

    /// Collect a row; later duplicates of the same identity are ignored.
    pub(crate) fn add(&mut self, record: Record) {
        match record {
            Record::Author(r) => {
                self.authors.entry(r.id).or_insert(r);
            }
            Record::Achievement(r) => {
                self.achievements.entry(r.id).or_insert(r);
            }
            Record::Book(r) => {
                self.books.entry(r.id).or_insert(r);
            }
            Record::Chapter(r) => {
                self.chapters.entry(r.id).or_insert(r);
            }
            Record::Comment(r) => {
                self.comments.entry(r.id).or_insert(r);
            }
            Record::CommentReaction(r) => {
                self.comment_reactions.entry(r.id).or_insert(r);
            }
            Record::Review(r) => {
                self.reviews.entry(r.id).or_insert(r);
            }
            Record::ReviewReaction(r) => {
                self.review_reactions.entry(r.id).or_insert(r);
            }
        }
    }

    /// Nest children under their parents, everything in id order.
    pub(crate) fn build(self) -> Vec<AuthorGraph> {
        let mut comment_reactions = group(self.comment_reactions, |r| r.comment_id);
        let mut comments = group(self.comments, |c| c.chapter_id);
        let mut review_reactions = group(self.review_reactions, |r| r.review_id);
        let mut reviews = group(self.reviews, |r| r.book_id);
        let mut chapters = group(self.chapters, |c| c.book_id);
        let mut books = group(self.books, |b| b.author_id);
        let mut achievements = group(self.achievements, |a| a.author_id);

        self.authors
            .into_values()
            .map(|author| AuthorGraph {
                achievements: achievements.remove(&author.id).unwrap_or_default(),
                books: books
                    .remove(&author.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|book| BookGraph {
                        chapters: chapters
                            .remove(&book.id)
                            .unwrap_or_default()
                            .into_iter()
                            .map(|chapter| ChapterGraph {
                                comments: comments
                                    .remove(&chapter.id)
                                    .unwrap_or_default()
                                    .into_iter()
                                    .map(|comment| CommentGraph {
                                        reactions: comment_reactions
                                            .remove(&comment.id)
                                            .unwrap_or_default(),
                                        comment,
                                    })
                                    .collect(),
                                chapter,
                            })
                            .collect(),
                        reviews: reviews
                            .remove(&book.id)
                            .unwrap_or_default()
                            .into_iter()
                            .map(|review| ReviewGraph {
                                reactions: review_reactions.remove(&review.id).unwrap_or_default(),
                                review,
                            })
                            .collect(),
                        book,
                    })
                    .collect(),
                author,
            })
            .collect()
    }
}

fn group<T>(rows: BTreeMap<Id, T>, parent: impl Fn(&T) -> Id) -> HashMap<Id, Vec<T>> {
    let mut grouped: HashMap<Id, Vec<T>> = HashMap::new();
    for row in rows.into_values() {
        grouped.entry(parent(&row)).or_default().push(row);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReactionType;

    #[test]
    fn test_build_nests_and_dedups() {
        let mut builder = GraphBuilder::default();
        let author = Record::Author(Author {
            id: 1,
            name: "Author 1".into(),
        });
        builder.add(author.clone());
        builder.add(author.clone());
        assert!(builder.contains(&author));

        for id in [11, 10] {
            builder.add(Record::Book(Book {
                id,
                title: format!("Book {id}"),
                author_id: 1,
            }));
        }
        builder.add(Record::Review(Review {
            id: 5,
            content: "Review 1".into(),
            book_id: 10,
        }));
        builder.add(Record::ReviewReaction(ReviewReaction {
            id: 9,
            reaction_type: ReactionType::Love,
            review_id: 5,
        }));

        let graphs = builder.build();
        assert_eq!(graphs.len(), 1);
        let graph = &graphs[0];
        assert_eq!(graph.books.len(), 2);
        // id order regardless of arrival order
        assert_eq!(graph.books[0].book.id, 10);
        assert_eq!(graph.books[0].reviews[0].reactions.len(), 1);
        assert!(graph.books[1].reviews.is_empty());
        assert_eq!(graph.entity_count(), 5);
        assert_eq!(graph.records().len(), 5);
    }
}
