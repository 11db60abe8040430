//! Integration tests for author queries against a seeded SQLite store.

use shelfbench_core::catalog::library_schema;
use shelfbench_core::model::{Id, Value};
use shelfbench_core::{
    seed_if_empty, AuthorQuery, Database, DbType, EntityKind, EntityState, Include, SeedVolumes,
    Session, Variant,
};

struct Fixture {
    _dir: tempfile::TempDir,
    database: Database,
}

fn volumes() -> SeedVolumes {
    SeedVolumes {
        authors: 3,
        achievements_per_author: 2,
        books_per_author: 2,
        chapters_per_book: 3,
        comments_per_chapter: 2,
        reactions_per_comment: 2,
        reviews_per_book: 2,
        reactions_per_review: 3,
        ..SeedVolumes::default()
    }
}

fn seeded() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("query.db");
    let database = Database::new(DbType::Sqlite, path.display().to_string());
    database
        .with_session(|session| {
            session.store().apply_schema(&library_schema())?;
            seed_if_empty(session.store(), &volumes())
        })
        .unwrap();
    Fixture {
        _dir: dir,
        database,
    }
}

fn first_author(session: &mut Session) -> Id {
    session
        .store()
        .fetch("SELECT MIN(\"id\") FROM \"author\"", &[])
        .unwrap()[0][0]
        .as_id()
        .unwrap()
}

#[test]
fn test_single_and_split_load_the_same_graph() {
    let fixture = seeded();
    let mut session = fixture.database.session().unwrap();
    let author_id = first_author(&mut session);

    for include in [
        Include::all(),
        Include::none().achievements().chapters(),
        Include::none().review_reactions(),
        Include::none(),
    ] {
        let query = AuthorQuery::new()
            .include(include)
            .where_id(author_id)
            .as_no_tracking();
        let single = query.to_list(&mut session).unwrap();
        let split = query.clone().as_split_query().to_list(&mut session).unwrap();
        assert_eq!(single, split);
        assert_eq!(single.len(), 1);
    }
}

#[test]
fn test_full_graph_shape() {
    let fixture = seeded();
    let mut session = fixture.database.session().unwrap();
    let author_id = first_author(&mut session);

    let graph = AuthorQuery::new()
        .include(Include::all())
        .where_id(author_id)
        .first_or_default(&mut session)
        .unwrap()
        .unwrap();

    assert_eq!(graph.author.id, author_id);
    assert_eq!(graph.achievements.len(), 2);
    assert_eq!(graph.books.len(), 2);
    for book in &graph.books {
        assert_eq!(book.book.author_id, author_id);
        assert_eq!(book.chapters.len(), 3);
        assert_eq!(book.reviews.len(), 2);
        for chapter in &book.chapters {
            assert_eq!(chapter.comments.len(), 2);
            assert!(chapter.comments.iter().all(|c| c.reactions.len() == 2));
        }
        assert!(book.reviews.iter().all(|r| r.reactions.len() == 3));
    }

    // 1 + 2 achievements + 2 * (1 + 3 * (1 + 2 * 3) + 2 * (1 + 3))
    assert_eq!(graph.entity_count(), 1 + 2 + 2 * (1 + 21 + 8));
}

#[test]
fn test_first_or_default_missing_author() {
    let fixture = seeded();
    let mut session = fixture.database.session().unwrap();

    let graph = AuthorQuery::new()
        .include(Include::all())
        .where_id(-1)
        .first_or_default(&mut session)
        .unwrap();
    assert!(graph.is_none());
}

#[test]
fn test_author_without_children_still_loads() {
    let fixture = seeded();
    let mut session = fixture.database.session().unwrap();
    let lonely = session
        .store()
        .insert_batch(
            EntityKind::Author,
            &[shelfbench_core::model::PendingRow::root("Author without books")],
        )
        .unwrap()[0];

    for query in [
        AuthorQuery::new().include(Include::all()).where_id(lonely),
        AuthorQuery::new()
            .include(Include::all())
            .where_id(lonely)
            .as_split_query(),
    ] {
        let graph = query.first_or_default(&mut session).unwrap().unwrap();
        assert!(graph.books.is_empty());
        assert!(graph.achievements.is_empty());
        assert_eq!(graph.entity_count(), 1);
    }
}

#[test]
fn test_tracking_attaches_each_entity_once() {
    let fixture = seeded();
    let mut session = fixture.database.session().unwrap();

    let graphs = AuthorQuery::new()
        .include(Include::none().achievements().chapters())
        .to_list(&mut session)
        .unwrap();
    assert_eq!(graphs.len(), 3);

    let loaded: usize = graphs.iter().map(|g| g.entity_count()).sum();
    // 3 authors, 6 achievements, 6 books, 18 chapters
    assert_eq!(loaded, 33);
    assert_eq!(session.tracker().len(), loaded);

    let first = &graphs[0];
    assert!(session.tracker().is_tracked(EntityKind::Author, first.author.id));
    assert!(session
        .tracker()
        .is_tracked(EntityKind::Chapter, first.books[0].chapters[0].chapter.id));
    assert!(!session.tracker().is_tracked(EntityKind::Author, -1));

    let by_kind = session.tracker().count_by_kind();
    assert_eq!(by_kind[&EntityKind::Author], 3);
    assert_eq!(by_kind[&EntityKind::Chapter], 18);
    assert!(!by_kind.contains_key(&EntityKind::Comment));

    // loading again resolves to the same tracked identities
    AuthorQuery::new()
        .include(Include::none().achievements().chapters())
        .as_split_query()
        .to_list(&mut session)
        .unwrap();
    assert_eq!(session.tracker().len(), loaded);
}

#[test]
fn test_no_tracking_attaches_nothing() {
    let fixture = seeded();
    let mut session = fixture.database.session().unwrap();

    let graphs = AuthorQuery::new()
        .include(Include::all())
        .as_no_tracking()
        .to_list(&mut session)
        .unwrap();
    assert_eq!(graphs.len(), 3);
    assert!(session.tracker().is_empty());

    // the session entry point behaves the same as the query's own
    let query = AuthorQuery::new().include(Include::all()).as_no_tracking();
    assert_eq!(session.query(&query).unwrap(), graphs);
    assert!(!session.tracker().is_tracked(EntityKind::Author, graphs[0].author.id));
}

#[test]
fn test_detect_changes_after_mutation() {
    let fixture = seeded();
    let mut session = fixture.database.session().unwrap();
    let author_id = first_author(&mut session);

    let mut graphs = AuthorQuery::new()
        .include(Include::none().chapters())
        .where_id(author_id)
        .to_list(&mut session)
        .unwrap();
    assert_eq!(session.detect_changes(&graphs), 0);

    graphs[0].author.name = "Renamed".to_string();
    let chapter_id = graphs[0].books[0].chapters[0].chapter.id;
    graphs[0].books[0].chapters[0].chapter.title = "Prologue".to_string();

    assert_eq!(session.detect_changes(&graphs), 2);
    assert_eq!(
        session.tracker().state(EntityKind::Author, author_id),
        Some(EntityState::Modified)
    );
    assert_eq!(
        session.tracker().state(EntityKind::Chapter, chapter_id),
        Some(EntityState::Modified)
    );

    // nothing is written back
    let stored = session
        .store()
        .fetch(
            "SELECT \"name\" FROM \"author\" WHERE \"id\" = ?1",
            &[Value::Int(author_id)],
        )
        .unwrap();
    assert_ne!(stored[0][0].as_text(), Some("Renamed"));
}

#[test]
fn test_variants_load_expected_entity_counts() {
    let fixture = seeded();
    let author_id = fixture
        .database
        .with_session(|session| Ok(first_author(session)))
        .unwrap();

    // 1 author, 2 achievements, 2 books, 6 chapters
    let single = 11;
    for variant in Variant::ALL {
        let loaded = fixture
            .database
            .with_session(|session| variant.run(session, author_id))
            .unwrap();
        if variant.is_single_author() {
            assert_eq!(loaded, single, "{variant}");
        } else {
            assert_eq!(loaded, 3 * single, "{variant}");
        }
    }
}

#[test]
fn test_sessions_are_independent() {
    let fixture = seeded();
    let mut first = fixture.database.session().unwrap();
    let mut second = fixture.database.session().unwrap();

    AuthorQuery::new().to_list(&mut first).unwrap();
    assert_eq!(first.tracker().len(), 3);
    assert!(second.tracker().is_empty());

    AuthorQuery::new().as_no_tracking().to_list(&mut second).unwrap();
    assert!(second.tracker().is_empty());
}
