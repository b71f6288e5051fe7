use docstore_core::DocstoreResult;
use docstore_core::index::{Index, IndexOptions};
use docstore_core::search::{Query, SearchOptions};
use docstore_core::store::Store;
use docstore_core::trash::Trash;
use docstore_core::write::{WriteOptions, Writer};
use tempfile::TempDir;

async fn seeded(tmpdir: &TempDir) -> DocstoreResult<Store> {
    let store = Store::open_at(tmpdir.path().join("docs.db")).await?;
    let writer = Writer::new(&store);

    writer
        .write(
            "/work/project-alpha",
            "Rewriting the dashboard in TypeScript with strict mode",
            &WriteOptions::default().tags(["work", "frontend"]).source("jira"),
        )
        .await?;
    writer
        .write(
            "/work/project-beta",
            "Async Rust services and error handling patterns",
            &WriteOptions::default().tags(["work", "rust"]).source("jira"),
        )
        .await?;
    writer
        .write(
            "/work/notes/standup",
            "Discussed Rust tooling and the TypeScript migration",
            &WriteOptions::default().tags(["work"]).doc_type("meeting"),
        )
        .await?;
    writer
        .write(
            "/personal/journal",
            "Walked by the river, read about gardening",
            &WriteOptions::default().tags(["personal"]),
        )
        .await?;
    writer
        .write(
            "/workshop/bench",
            "Woodworking bench plans",
            &WriteOptions::default().tags(["hobby"]),
        )
        .await?;

    Ok(store)
}

fn paths(page: &docstore_core::search::SearchPage) -> Vec<&str> {
    page.documents.iter().map(|r| r.document.path.as_str()).collect()
}

#[tokio::test]
async fn folder_listing_and_keyword_search() -> DocstoreResult<()> {
    let tmpdir = TempDir::new().unwrap();
    let store = Store::open_at(tmpdir.path().join("docs.db")).await?;
    let writer = Writer::new(&store);

    writer
        .write(
            "/work/project-alpha",
            "Planning the TypeScript rewrite",
            &WriteOptions::default().tags(["work"]),
        )
        .await?;
    writer
        .write(
            "/personal/journal",
            "Quiet day",
            &WriteOptions::default().tags(["personal"]),
        )
        .await?;

    let listing = Index::new(&store)
        .list(&IndexOptions {
            folder: Some("/work".into()),
            ..Default::default()
        })
        .await?;
    assert_eq!(listing.total, 1);
    assert_eq!(listing.documents.len(), 1);

    let page = Query::new(&store)
        .search("TypeScript", &SearchOptions::default())
        .await?;
    assert_eq!(page.total, 1);
    assert_eq!(paths(&page), vec!["/work/project-alpha"]);

    Ok(())
}

#[tokio::test]
async fn full_text_hits_carry_snippet_and_rank() -> DocstoreResult<()> {
    let tmpdir = TempDir::new().unwrap();
    let store = seeded(&tmpdir).await?;

    let page = Query::new(&store)
        .search("typescript", &SearchOptions::default())
        .await?;

    assert_eq!(page.total, 2);
    for hit in &page.documents {
        assert!(hit.snippet.contains("<mark>TypeScript</mark>"), "{}", hit.snippet);
        assert!(hit.rank.is_some());
    }

    Ok(())
}

#[tokio::test]
async fn list_all_agrees_with_index_total() -> DocstoreResult<()> {
    let tmpdir = TempDir::new().unwrap();
    let store = seeded(&tmpdir).await?;
    let query = Query::new(&store);

    let star = query.search("*", &SearchOptions::default()).await?;
    let blank = query.search("  ", &SearchOptions::default()).await?;
    let index = Index::new(&store).list(&IndexOptions::default()).await?;

    assert_eq!(star.total, 5);
    assert_eq!(blank.total, star.total);
    assert_eq!(index.total, star.total);

    // newest first
    assert_eq!(star.documents[0].document.path, "/workshop/bench");
    for hit in &star.documents {
        assert!(hit.rank.is_none());
        assert!(!hit.snippet.contains("<mark>"));
    }

    Ok(())
}

#[tokio::test]
async fn tag_filter_requires_every_tag() -> DocstoreResult<()> {
    let tmpdir = TempDir::new().unwrap();
    let store = seeded(&tmpdir).await?;
    let query = Query::new(&store);

    let options = SearchOptions {
        tags: vec!["work".into(), "rust".into()],
        ..Default::default()
    };
    let page = query.search("*", &options).await?;
    assert_eq!(page.total, 1);
    assert_eq!(paths(&page), vec!["/work/project-beta"]);

    let options = SearchOptions {
        tags: vec!["work".into()],
        limit: Some(1),
        offset: Some(1),
        ..Default::default()
    };
    let page = query.search("*", &options).await?;
    assert_eq!(page.total, 3);
    assert_eq!(page.documents.len(), 1);

    let options = SearchOptions {
        tags: vec!["work".into()],
        ..Default::default()
    };
    let page = query.search("rust", &options).await?;
    assert_eq!(page.total, 2);

    Ok(())
}

#[tokio::test]
async fn folder_filter_respects_segment_boundaries() -> DocstoreResult<()> {
    let tmpdir = TempDir::new().unwrap();
    let store = seeded(&tmpdir).await?;
    let query = Query::new(&store);

    let options = SearchOptions {
        folder: Some("/work".into()),
        ..Default::default()
    };
    let page = query.search("*", &options).await?;
    assert_eq!(page.total, 3);
    assert!(!paths(&page).contains(&"/workshop/bench"));

    let options = SearchOptions {
        folder: Some("/work/notes/".into()),
        ..Default::default()
    };
    let page = query.search("*", &options).await?;
    assert_eq!(paths(&page), vec!["/work/notes/standup"]);

    let options = SearchOptions {
        folder: Some("/".into()),
        ..Default::default()
    };
    assert_eq!(query.search("*", &options).await?.total, 5);

    Ok(())
}

#[tokio::test]
async fn source_and_type_filters() -> DocstoreResult<()> {
    let tmpdir = TempDir::new().unwrap();
    let store = seeded(&tmpdir).await?;
    let query = Query::new(&store);

    let options = SearchOptions {
        source: Some("jira".into()),
        ..Default::default()
    };
    assert_eq!(query.search("*", &options).await?.total, 2);

    let options = SearchOptions {
        doc_type: Some("meeting".into()),
        ..Default::default()
    };
    let page = query.search("rust", &options).await?;
    assert_eq!(paths(&page), vec!["/work/notes/standup"]);

    Ok(())
}

#[tokio::test]
async fn pagination_keeps_total() -> DocstoreResult<()> {
    let tmpdir = TempDir::new().unwrap();
    let store = seeded(&tmpdir).await?;
    let query = Query::new(&store);

    let first = query
        .search("*", &SearchOptions { limit: Some(2), ..Default::default() })
        .await?;
    let second = query
        .search(
            "*",
            &SearchOptions {
                limit: Some(2),
                offset: Some(2),
                ..Default::default()
            },
        )
        .await?;
    let past_end = query
        .search(
            "*",
            &SearchOptions {
                offset: Some(50),
                ..Default::default()
            },
        )
        .await?;

    assert_eq!(first.total, 5);
    assert_eq!(second.total, 5);
    assert_eq!(first.documents.len(), 2);
    assert_eq!(second.documents.len(), 2);
    assert!(past_end.documents.is_empty());
    assert_eq!(past_end.total, 5);

    let mut seen: Vec<&str> = paths(&first);
    seen.extend(paths(&second));
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), 4);

    Ok(())
}

#[tokio::test]
async fn query_syntax() -> DocstoreResult<()> {
    let tmpdir = TempDir::new().unwrap();
    let store = seeded(&tmpdir).await?;
    let query = Query::new(&store);
    let all = SearchOptions::default();

    let phrase = query.search("\"error handling\"", &all).await?;
    assert_eq!(paths(&phrase), vec!["/work/project-beta"]);

    let prefix = query.search("garden*", &all).await?;
    assert_eq!(paths(&prefix), vec!["/personal/journal"]);

    let both = query.search("rust AND typescript", &all).await?;
    assert_eq!(paths(&both), vec!["/work/notes/standup"]);

    let either = query.search("woodworking OR gardening", &all).await?;
    assert_eq!(either.total, 2);

    let without = query.search("rust NOT typescript", &all).await?;
    assert_eq!(paths(&without), vec!["/work/project-beta"]);

    // stray punctuation must not surface as a syntax error
    let messy = query.search("rust) AND (", &all).await?;
    assert_eq!(messy.total, 2);

    Ok(())
}

#[tokio::test]
async fn updates_and_trash_are_reflected() -> DocstoreResult<()> {
    let tmpdir = TempDir::new().unwrap();
    let store = seeded(&tmpdir).await?;
    let query = Query::new(&store);
    let all = SearchOptions::default();

    Writer::new(&store)
        .write("/personal/journal", "Nothing about plants today", &WriteOptions::default())
        .await?;
    assert_eq!(query.search("gardening", &all).await?.total, 0);
    assert_eq!(query.search("plants", &all).await?.total, 1);

    Trash::new(&store).delete("/work/project-alpha").await?;
    let page = query.search("typescript", &all).await?;
    assert_eq!(paths(&page), vec!["/work/notes/standup"]);
    assert_eq!(query.search("*", &all).await?.total, 4);

    Trash::new(&store).restore("/work/project-alpha").await?;
    assert_eq!(query.search("typescript", &all).await?.total, 2);

    Ok(())
}

#[tokio::test]
async fn suggest_completes_active_paths() -> DocstoreResult<()> {
    let tmpdir = TempDir::new().unwrap();
    let store = seeded(&tmpdir).await?;
    let query = Query::new(&store);

    let suggestions = query.suggest("/work/p", None).await?;
    assert_eq!(suggestions, vec!["/work/project-alpha", "/work/project-beta"]);

    let limited = query.suggest("work", Some(2)).await?;
    assert_eq!(limited.len(), 2);

    Trash::new(&store).delete("/work/project-beta").await?;
    assert_eq!(
        query.suggest("/work/p", None).await?,
        vec!["/work/project-alpha"]
    );

    Ok(())
}

#[tokio::test]
async fn not_excludes_instead_of_including() -> DocstoreResult<()> {
    let tmpdir = TempDir::new().unwrap();
    let store = Store::open_at(tmpdir.path().join("docs.db")).await?;
    let writer = Writer::new(&store);
    let query = Query::new(&store);
    let all = SearchOptions::default();

    writer.write("/a", "draft about rust", &WriteOptions::default()).await?;
    writer.write("/b", "final about go", &WriteOptions::default()).await?;
    writer.write("/c", "something else", &WriteOptions::default()).await?;

    let page = query.search("NOT draft", &all).await?;
    assert_eq!(page.total, 2);
    for hit in &page.documents {
        assert!(!hit.snippet.contains("draft"), "{}", hit.snippet);
        assert!(hit.rank.is_none());
    }
    let mut found = paths(&page);
    found.sort_unstable();
    assert_eq!(found, vec!["/b", "/c"]);

    let page = query.search("NOT draft about", &all).await?;
    assert_eq!(paths(&page), vec!["/b"]);

    let page = query.search("about AND NOT draft", &all).await?;
    assert_eq!(paths(&page), vec!["/b"]);

    let page = query.search("NOT draft NOT final", &all).await?;
    assert_eq!(paths(&page), vec!["/c"]);

    let page = query.search("NOT draft OR rust", &all).await?;
    assert_eq!(page.total, 3);

    // no FTS5 form exists for these; they must not turn into `draft`
    for raw in ["(NOT draft)", "else OR NOT draft"] {
        let page = query.search(raw, &all).await?;
        assert_eq!(page.total, 0, "{raw}");
    }

    let scoped = SearchOptions {
        folder: Some("/b".into()),
        ..Default::default()
    };
    assert_eq!(paths(&query.search("NOT draft", &scoped).await?), vec!["/b"]);

    Ok(())
}

#[tokio::test]
async fn operator_only_queries_match_nothing() -> DocstoreResult<()> {
    let tmpdir = TempDir::new().unwrap();
    let store = seeded(&tmpdir).await?;
    let query = Query::new(&store);

    for raw in ["AND", "OR", "NOT", "()", "**", "AND OR NOT"] {
        let page = query.search(raw, &SearchOptions::default()).await?;
        assert_eq!(page.total, 0, "{raw}");
        assert!(page.documents.is_empty(), "{raw}");
    }

    Ok(())
}
