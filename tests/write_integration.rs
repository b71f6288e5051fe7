use docstore_core::domain::{DocumentError, DocumentId, Metadata, MetadataValue};
use docstore_core::read::Reader;
use docstore_core::store::Store;
use docstore_core::trash::Trash;
use docstore_core::write::{WriteAction, WriteOptions, Writer};
use docstore_core::{DocstoreError, DocstoreResult};
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use std::collections::HashSet;
use std::path::Path;
use tempfile::TempDir;

async fn open_store(tmpdir: &TempDir) -> DocstoreResult<Store> {
    Store::open_at(tmpdir.path().join("docs.db")).await
}

/// Counts rows of `table` belonging to `id`, read straight from the file.
async fn rows_for(db: &Path, table: &str, column: &str, id: DocumentId) -> DocstoreResult<i64> {
    let pool = SqlitePool::connect_with(SqliteConnectOptions::new().filename(db)).await?;
    let sql = format!("SELECT COUNT(*) FROM {table} WHERE {column} = ?");
    let count = sqlx::query_scalar(&sql)
        .bind(id.to_string())
        .fetch_one(&pool)
        .await?;
    pool.close().await;
    Ok(count)
}

#[tokio::test]
async fn first_write_creates_version_one() -> DocstoreResult<()> {
    let tmpdir = TempDir::new().unwrap();
    let store = open_store(&tmpdir).await?;
    let writer = Writer::new(&store);

    let outcome = writer
        .write("/work/plan", "# Launch Plan\nship it", &WriteOptions::default())
        .await?;

    assert_eq!(outcome.action, WriteAction::Created);
    assert_eq!(outcome.version, 1);
    assert_eq!(outcome.previous_version, None);
    assert_eq!(outcome.path, "/work/plan");

    let doc = Reader::new(&store).read("/work/plan").await?.into_inner().unwrap();
    assert_eq!(doc.id, outcome.id);
    assert_eq!(doc.title, "Launch Plan");
    assert_eq!(doc.content, "# Launch Plan\nship it");
    assert!(doc.tags.is_empty());
    assert!(doc.state.is_active());
    assert_eq!(doc.created_at, doc.updated_at);

    Ok(())
}

#[tokio::test]
async fn update_snapshots_previous_content() -> DocstoreResult<()> {
    let tmpdir = TempDir::new().unwrap();
    let store = open_store(&tmpdir).await?;
    let writer = Writer::new(&store);
    let reader = Reader::new(&store);

    let first = writer.write("/notes/a", "first draft", &WriteOptions::default()).await?;
    let second = writer.write("/notes/a", "second draft", &WriteOptions::default()).await?;

    assert_eq!(second.action, WriteAction::Updated);
    assert_eq!(second.id, first.id);
    assert_eq!(second.version, 2);
    assert_eq!(second.previous_version, Some(1));

    let doc = reader.read("/notes/a").await?.into_inner().unwrap();
    assert_eq!(doc.content, "second draft");
    assert_eq!(doc.version, 2);
    assert!(doc.updated_at >= doc.created_at);

    let history = reader.history("/notes/a").await?.into_inner();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].version, 1);
    assert_eq!(history[0].content, "first draft");
    assert_eq!(history[0].document_id, first.id);

    Ok(())
}

#[tokio::test]
async fn omitted_fields_keep_stored_values() -> DocstoreResult<()> {
    let tmpdir = TempDir::new().unwrap();
    let store = open_store(&tmpdir).await?;
    let writer = Writer::new(&store);

    let mut metadata = Metadata::new();
    metadata.insert("priority".into(), MetadataValue::from(3));
    metadata.insert("pinned".into(), true.into());

    let options = WriteOptions::default()
        .title("Reading List")
        .tags(["books", " books ", "", "later"])
        .metadata(metadata.clone())
        .source("web")
        .doc_type("list");
    writer.write("/lists/reading", "dune", &options).await?;

    writer
        .write("/lists/reading", "dune\nfoundation", &WriteOptions::default())
        .await?;

    let doc = Reader::new(&store).read("/lists/reading").await?.into_inner().unwrap();
    assert_eq!(doc.title, "Reading List");
    assert_eq!(doc.tags, vec!["books", "later"]);
    assert_eq!(doc.metadata, Some(metadata));
    assert_eq!(doc.source.as_deref(), Some("web"));
    assert_eq!(doc.doc_type.as_deref(), Some("list"));

    writer
        .write(
            "/lists/reading",
            "dune",
            &WriteOptions::default().tags(Vec::<String>::new()).title("Books"),
        )
        .await?;

    let doc = Reader::new(&store).read("/lists/reading").await?.into_inner().unwrap();
    assert_eq!(doc.title, "Books");
    assert!(doc.tags.is_empty());
    assert_eq!(doc.version, 3);

    Ok(())
}

#[tokio::test]
async fn title_falls_back_to_last_segment() -> DocstoreResult<()> {
    let tmpdir = TempDir::new().unwrap();
    let store = open_store(&tmpdir).await?;
    let writer = Writer::new(&store);

    writer
        .write("work//ideas/", "no heading here", &WriteOptions::default())
        .await?;

    let doc = Reader::new(&store).read("/work/ideas").await?.into_inner().unwrap();
    assert_eq!(doc.path, "/work/ideas");
    assert_eq!(doc.title, "ideas");

    Ok(())
}

#[tokio::test]
async fn blank_input_is_rejected() -> DocstoreResult<()> {
    let tmpdir = TempDir::new().unwrap();
    let store = open_store(&tmpdir).await?;
    let writer = Writer::new(&store);

    let err = writer
        .write("   ", "content", &WriteOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DocstoreError::Validation(DocumentError::EmptyPath)
    ));

    let err = writer
        .write("/a", " \n ", &WriteOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DocstoreError::Validation(DocumentError::EmptyContent)
    ));

    assert!(Reader::new(&store).read("/a").await?.is_none());

    Ok(())
}

#[tokio::test]
async fn writing_over_trashed_path_starts_fresh() -> DocstoreResult<()> {
    let tmpdir = TempDir::new().unwrap();
    let store = open_store(&tmpdir).await?;
    let writer = Writer::new(&store);
    let reader = Reader::new(&store);

    let db = tmpdir.path().join("docs.db");

    let old = writer.write("/p", "v1", &WriteOptions::default()).await?;
    writer.write("/p", "v2", &WriteOptions::default()).await?;
    writer.write("/p", "v3", &WriteOptions::default()).await?;
    assert!(Trash::new(&store).delete("/p").await?.success);
    assert_eq!(rows_for(&db, "document_versions", "document_id", old.id).await?, 2);

    let fresh = writer.write("/p", "brand new", &WriteOptions::default()).await?;

    assert_eq!(fresh.action, WriteAction::Created);
    assert_eq!(fresh.version, 1);
    assert_ne!(fresh.id, old.id);
    assert!(reader.history("/p").await?.is_empty());

    // the tombstone and every snapshot of it are gone
    assert_eq!(rows_for(&db, "document_versions", "document_id", old.id).await?, 0);
    assert_eq!(rows_for(&db, "documents", "id", old.id).await?, 0);

    let current = reader.read_version("/p", 1).await?.into_inner().unwrap();
    assert_eq!(current.content(), "brand new");
    assert!(reader.read_version("/p", 2).await?.is_none());
    assert!(reader.read_version("/p", 3).await?.is_none());

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writes_to_one_path_serialize() -> DocstoreResult<()> {
    let tmpdir = TempDir::new().unwrap();
    let store = open_store(&tmpdir).await?;

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            Writer::new(&store)
                .write("/shared", &format!("edit {i}"), &WriteOptions::default())
                .await
        }));
    }

    let mut versions = HashSet::new();
    for handle in handles {
        let outcome = handle.await.unwrap()?;
        versions.insert(outcome.version);
    }

    assert_eq!(versions, (1..=8).collect::<HashSet<i64>>());

    let reader = Reader::new(&store);
    let doc = reader.read("/shared").await?.into_inner().unwrap();
    assert_eq!(doc.version, 8);

    let history = reader.history("/shared").await?.into_inner();
    let recorded: Vec<i64> = history.iter().map(|v| v.version).collect();
    assert_eq!(recorded, (1..=7).rev().collect::<Vec<i64>>());

    Ok(())
}
