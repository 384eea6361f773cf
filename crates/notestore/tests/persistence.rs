//! Notes persisted through the SQLite provider.

use notestore::store::{DatabaseExt, SqliteProvider};
use notestore::{Note, NoteStore};
use notestore_testkit::{generators, SqliteFixture};
use proptest::prelude::*;

#[tokio::test]
async fn test_notes_survive_reopen() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let fixture = SqliteFixture::new();

    let store = fixture.ready_store().await;
    store.create("Buy milk").await.unwrap();
    store.create("Walk dog").await.unwrap();
    drop(store);

    let reopened = fixture.ready_store().await;
    assert!(reopened.notes().is_empty());
    assert_eq!(
        reopened.read().await.unwrap(),
        vec![Note::new("Buy milk"), Note::new("Walk dog")]
    );
}

#[tokio::test]
async fn test_setup_creates_database_file() {
    let fixture = SqliteFixture::new();
    let report = fixture.ready_store().await.setup().await.unwrap();

    assert_eq!(report.provider, "sqlite");
    assert_eq!(report.upgraded_from, None);
    assert!(fixture.provider().database_path("nuxtTodo").exists());
}

#[tokio::test]
async fn test_stored_record_is_keyed_by_title() {
    let dir = tempfile::tempdir().unwrap();
    let store = NoteStore::with_provider(SqliteProvider::new(dir.path()));
    store.setup().await.unwrap();
    store.create("keyed").await.unwrap();

    let db = store.handle().unwrap();
    let value = db.get("nuxtTodo", "keyed").await.unwrap();
    assert_eq!(value, Some(serde_json::json!({ "title": "keyed" })));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn test_created_titles_are_read_back(titles in generators::distinct_titles(6)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let fixture = SqliteFixture::new();
            let store = fixture.ready_store().await;
            for title in &titles {
                store.create(title).await.unwrap();
            }

            let listed = store.reload().await.unwrap();
            prop_assert_eq!(listed.len(), titles.len());
            for title in &titles {
                prop_assert!(listed.contains(&Note::new(title.as_str())));
            }
            Ok::<(), TestCaseError>(())
        })?;
    }
}
