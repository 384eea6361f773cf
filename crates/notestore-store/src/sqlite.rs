//! SQLite implementation of the Provider and Database traits.
//!
//! This is the production backend. Each database is one SQLite file under
//! the provider's root directory. It uses rusqlite with bundled SQLite,
//! wrapped in async via tokio::spawn_blocking.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{ffi, params, Connection, OptionalExtension, Transaction};

use crate::error::{poisoned, Result, StoreError};
use crate::migration;
use crate::record::{decode_value, encode_value, extract_key, StoredRecord};
use crate::traits::{
    Database, Provider, Request, Response, SchemaEditor, TransactionMode, UpgradeFn,
    VersionChange,
};

/// File extension of database files.
const FILE_EXTENSION: &str = "sqlite3";

/// SQLite-based provider.
#[derive(Debug, Clone)]
pub struct SqliteProvider {
    root: PathBuf,
}

impl SqliteProvider {
    /// Serve databases from files under `root`.
    ///
    /// The directory is created on first open if it does not exist.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Directory holding the database files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing database `name`.
    pub fn database_path(&self, name: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", encode_file_stem(name), FILE_EXTENSION))
    }
}

/// Percent-encode everything outside `[A-Za-z0-9_-]` so any database name
/// maps to one safe file name.
fn encode_file_stem(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    for byte in name.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            stem.push(byte as char);
        } else {
            stem.push_str(&format!("%{:02X}", byte));
        }
    }
    stem
}

/// Run a blocking closure on the tokio blocking pool.
async fn blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {}", e)))?
}

/// Stored user-facing version; 0 if the database was never upgraded.
fn stored_version(conn: &Connection) -> Result<u32> {
    let version: Option<u32> = conn
        .query_row("SELECT version FROM database_info WHERE id = 1", [], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(version.unwrap_or(0))
}

/// Schema editor bound to the version-change transaction.
struct SqliteSchemaEditor<'a, 'conn> {
    tx: &'a Transaction<'conn>,
}

impl SchemaEditor for SqliteSchemaEditor<'_, '_> {
    fn object_store_names(&self) -> Result<Vec<String>> {
        list_object_stores(self.tx)
    }

    fn create_object_store(&mut self, name: &str, key_path: &str) -> Result<()> {
        self.tx
            .execute(
                "INSERT INTO object_stores (name, key_path) VALUES (?1, ?2)",
                params![name, key_path],
            )
            .map_err(|e| map_insert_error(e, name, name))?;
        Ok(())
    }
}

/// Map a primary key violation on insert to a constraint error.
fn map_insert_error(e: rusqlite::Error, store: &str, key: &str) -> StoreError {
    match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            StoreError::Constraint {
                store: store.to_string(),
                key: key.to_string(),
            }
        }
        other => StoreError::Database(other),
    }
}

fn list_object_stores(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM object_stores ORDER BY name")?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(names)
}

/// Every record of `store` in key order.
fn scan_records(conn: &Connection, store: &str) -> Result<Vec<StoredRecord>> {
    let mut stmt =
        conn.prepare("SELECT key, value FROM records WHERE store = ?1 ORDER BY key")?;
    let rows = stmt
        .query_map(params![store], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(|(key, bytes)| {
            Ok(StoredRecord {
                key,
                value: decode_value(&bytes)?,
            })
        })
        .collect()
}

/// Key path of `store`, or not-found.
fn key_path_of(conn: &Connection, store: &str) -> Result<String> {
    conn.query_row(
        "SELECT key_path FROM object_stores WHERE name = ?1",
        params![store],
        |row| row.get(0),
    )
    .optional()?
    .ok_or_else(|| StoreError::NotFound(format!("object store {}", store)))
}

#[async_trait]
impl Provider for SqliteProvider {
    fn name(&self) -> &str {
        "sqlite"
    }

    /// Available when the root is a directory or does not exist yet; `open`
    /// creates it.
    fn is_available(&self) -> bool {
        self.root.is_dir() || !self.root.exists()
    }

    async fn open(
        &self,
        name: &str,
        version: u32,
        upgrade: UpgradeFn,
    ) -> Result<Arc<dyn Database>> {
        if version == 0 {
            return Err(StoreError::InvalidVersion(version));
        }

        let root = self.root.clone();
        let path = self.database_path(name);
        let db_name = name.to_string();

        let conn = blocking(move || {
            fs::create_dir_all(&root)?;
            let mut conn = Connection::open(&path)?;
            migration::migrate(&mut conn)?;

            let current = stored_version(&conn)?;
            if version < current {
                return Err(StoreError::Version {
                    requested: version,
                    current,
                });
            }

            if version > current {
                let tx = conn.transaction()?;
                let change = VersionChange {
                    old_version: current,
                    new_version: version,
                };

                // An error here drops `tx`, rolling the schema edits back
                upgrade(change, &mut SqliteSchemaEditor { tx: &tx })?;

                tx.execute(
                    "INSERT INTO database_info (id, name, version) VALUES (1, ?1, ?2)
                     ON CONFLICT(id) DO UPDATE SET version = excluded.version",
                    params![&db_name, version],
                )?;
                tx.commit()?;

                tracing::debug!(
                    "upgraded database {} at {} from v{} to v{}",
                    db_name,
                    path.display(),
                    current,
                    version
                );
            }

            Ok(conn)
        })
        .await?;

        Ok(Arc::new(SqliteDatabase {
            name: name.to_string(),
            version,
            conn: Arc::new(Mutex::new(conn)),
        }))
    }

    async fn delete_database(&self, name: &str) -> Result<()> {
        let path = self.database_path(name);

        blocking(move || match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        })
        .await
    }
}

/// Handle to an opened SQLite database.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteDatabase {
    name: String,
    version: u32,
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDatabase {
    /// Execute a blocking operation on the connection.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        blocking(move || {
            let mut conn = conn.lock().map_err(poisoned)?;
            f(&mut conn)
        })
        .await
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> u32 {
        self.version
    }

    async fn object_store_names(&self) -> Result<Vec<String>> {
        self.with_conn(|conn| list_object_stores(conn)).await
    }

    async fn transaction(
        &self,
        store: &str,
        mode: TransactionMode,
        requests: Vec<Request>,
    ) -> Result<Vec<Response>> {
        if mode == TransactionMode::ReadOnly && requests.iter().any(Request::is_write) {
            return Err(StoreError::ReadOnly(store.to_string()));
        }

        let store = store.to_string();

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let key_path = key_path_of(&tx, &store)?;
            let mut responses = Vec::with_capacity(requests.len());

            for request in requests {
                let response = match request {
                    Request::Add(value) => {
                        let key = extract_key(&value, &key_path)?;
                        let bytes = encode_value(&value)?;

                        tx.execute(
                            "INSERT INTO records (store, key, value) VALUES (?1, ?2, ?3)",
                            params![&store, &key, bytes],
                        )
                        .map_err(|e| map_insert_error(e, &store, &key))?;
                        Response::Added(key)
                    }
                    Request::Get(key) => {
                        let bytes: Option<Vec<u8>> = tx
                            .query_row(
                                "SELECT value FROM records WHERE store = ?1 AND key = ?2",
                                params![&store, &key],
                                |row| row.get(0),
                            )
                            .optional()?;
                        Response::Record(bytes.as_deref().map(decode_value).transpose()?)
                    }
                    Request::Count => {
                        let count: i64 = tx.query_row(
                            "SELECT COUNT(*) FROM records WHERE store = ?1",
                            params![&store],
                            |row| row.get(0),
                        )?;
                        Response::Count(count as u64)
                    }
                    Request::Scan => Response::Records(scan_records(&tx, &store)?),
                };
                responses.push(response);
            }

            match mode {
                TransactionMode::ReadWrite => tx.commit()?,
                TransactionMode::ReadOnly => tx.rollback()?,
            }
            Ok(responses)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{on_upgrade, DatabaseExt};
    use proptest::prelude::*;
    use serde_json::json;

    fn create_notes_store() -> UpgradeFn {
        on_upgrade(|_, schema| schema.create_object_store("notes", "title"))
    }

    #[test]
    fn test_file_stem_encoding() {
        assert_eq!(encode_file_stem("nuxtTodo"), "nuxtTodo");
        assert_eq!(encode_file_stem("a/b c"), "a%2Fb%20c");
    }

    #[tokio::test]
    async fn test_insert_and_get_record() {
        let dir = tempfile::tempdir().unwrap();
        let provider = SqliteProvider::new(dir.path());
        let db = provider.open("db", 1, create_notes_store()).await.unwrap();

        let key = db.add("notes", json!({ "title": "Buy milk" })).await.unwrap();
        assert_eq!(key, "Buy milk");

        let value = db.get("notes", "Buy milk").await.unwrap().unwrap();
        assert_eq!(value, json!({ "title": "Buy milk" }));
    }

    #[tokio::test]
    async fn test_duplicate_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let provider = SqliteProvider::new(dir.path());
        let db = provider.open("db", 1, create_notes_store()).await.unwrap();

        db.add("notes", json!({ "title": "same" })).await.unwrap();
        let err = db.add("notes", json!({ "title": "same" })).await.unwrap_err();
        assert!(matches!(err, StoreError::Constraint { .. }));
        assert_eq!(db.count("notes").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_batch_rolls_back_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let provider = SqliteProvider::new(dir.path());
        let db = provider.open("db", 1, create_notes_store()).await.unwrap();

        let result = db
            .transaction(
                "notes",
                TransactionMode::ReadWrite,
                vec![
                    Request::Add(json!({ "title": "kept?" })),
                    Request::Add(json!({ "name": "no key" })),
                ],
            )
            .await;
        assert!(matches!(result, Err(StoreError::Data(_))));
        assert_eq!(db.count("notes").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_store_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let provider = SqliteProvider::new(dir.path());
        let db = provider.open("db", 1, create_notes_store()).await.unwrap();

        let err = db.count("missing").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        let err = db.scan("missing").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_records_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let provider = SqliteProvider::new(dir.path());

        {
            let db = provider.open("db", 4, create_notes_store()).await.unwrap();
            db.add("notes", json!({ "title": "Walk dog" })).await.unwrap();
            db.add("notes", json!({ "title": "Buy milk" })).await.unwrap();
        }

        let db = provider
            .open("db", 4, on_upgrade(|_, _| panic!("already at v4")))
            .await
            .unwrap();

        let keys: Vec<String> = db
            .open_cursor("notes")
            .collect()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.key)
            .collect();
        assert_eq!(keys, vec!["Buy milk", "Walk dog"]);
    }

    #[tokio::test]
    async fn test_upgrade_sees_old_version() {
        let dir = tempfile::tempdir().unwrap();
        let provider = SqliteProvider::new(dir.path());
        provider.open("db", 1, create_notes_store()).await.unwrap();

        let (tx, rx) = std::sync::mpsc::channel();
        let db = provider
            .open(
                "db",
                2,
                on_upgrade(move |change, schema| {
                    tx.send(change).ok();
                    assert_eq!(schema.object_store_names()?, vec!["notes"]);
                    schema.create_object_store("tags", "name")
                }),
            )
            .await
            .unwrap();

        let change = rx.recv().unwrap();
        assert_eq!(change.old_version, 1);
        assert_eq!(change.new_version, 2);
        assert_eq!(db.object_store_names().await.unwrap(), vec!["notes", "tags"]);
    }

    #[tokio::test]
    async fn test_failed_upgrade_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let provider = SqliteProvider::new(dir.path());

        let result = provider
            .open(
                "db",
                1,
                on_upgrade(|_, schema| {
                    schema.create_object_store("notes", "title")?;
                    schema.create_object_store("notes", "title")
                }),
            )
            .await;
        assert!(matches!(result, Err(StoreError::Constraint { .. })));

        // Nothing was committed, so the next open upgrades from scratch
        let db = provider.open("db", 1, create_notes_store()).await.unwrap();
        assert_eq!(db.object_store_names().await.unwrap(), vec!["notes"]);
    }

    #[tokio::test]
    async fn test_downgrade_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let provider = SqliteProvider::new(dir.path());
        provider.open("db", 4, create_notes_store()).await.unwrap();

        let result = provider.open("db", 3, on_upgrade(|_, _| Ok(()))).await;
        assert!(matches!(
            result,
            Err(StoreError::Version {
                requested: 3,
                current: 4
            })
        ));
    }

    #[tokio::test]
    async fn test_delete_database() {
        let dir = tempfile::tempdir().unwrap();
        let provider = SqliteProvider::new(dir.path());
        {
            let db = provider.open("db", 1, create_notes_store()).await.unwrap();
            db.add("notes", json!({ "title": "x" })).await.unwrap();
        }

        assert!(provider.database_path("db").exists());
        provider.delete_database("db").await.unwrap();
        assert!(!provider.database_path("db").exists());

        // Deleting again is not an error
        provider.delete_database("db").await.unwrap();
    }

    #[tokio::test]
    async fn test_availability_check_leaves_filesystem_alone() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("stores");
        let provider = SqliteProvider::new(&root);

        assert!(provider.is_available());
        assert!(!provider.root().exists());

        provider.open("db", 1, create_notes_store()).await.unwrap();
        assert!(provider.root().is_dir());
    }

    #[test]
    fn test_file_root_unavailable() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let provider = SqliteProvider::new(file.path());
        assert!(!provider.is_available());
    }

    #[tokio::test]
    async fn test_duplicate_within_batch_is_constraint() {
        let dir = tempfile::tempdir().unwrap();
        let provider = SqliteProvider::new(dir.path());
        let db = provider.open("db", 1, create_notes_store()).await.unwrap();

        let err = db
            .transaction(
                "notes",
                TransactionMode::ReadWrite,
                vec![
                    Request::Add(json!({ "title": "twin" })),
                    Request::Add(json!({ "title": "twin" })),
                ],
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StoreError::Constraint { ref store, ref key } if store == "notes" && key == "twin"
        ));
        assert_eq!(db.count("notes").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cursor_ignores_writes_after_first_step() {
        let dir = tempfile::tempdir().unwrap();
        let provider = SqliteProvider::new(dir.path());
        let db = provider.open("db", 1, create_notes_store()).await.unwrap();
        db.add("notes", json!({ "title": "m" })).await.unwrap();

        let mut cursor = db.open_cursor("notes");
        assert_eq!(cursor.advance().await.unwrap().unwrap().key, "m");

        db.add("notes", json!({ "title": "a" })).await.unwrap();
        db.add("notes", json!({ "title": "z" })).await.unwrap();
        assert!(cursor.advance().await.unwrap().is_none());

        let keys: Vec<String> = db
            .scan("notes")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.key)
            .collect();
        assert_eq!(keys, vec!["a", "m", "z"]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn test_scan_returns_keys_sorted(
            titles in prop::collection::hash_set("[a-zA-Z0-9 ]{1,12}", 1..16)
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let dir = tempfile::tempdir().unwrap();
            let provider = SqliteProvider::new(dir.path());

            let keys = rt.block_on(async {
                let db = provider.open("db", 1, create_notes_store()).await.unwrap();
                for title in &titles {
                    db.add("notes", json!({ "title": title })).await.unwrap();
                }
                db.scan("notes").await.unwrap()
            })
            .into_iter()
            .map(|r| r.key)
            .collect::<Vec<_>>();

            let mut expected: Vec<String> = titles.into_iter().collect();
            expected.sort();
            prop_assert_eq!(keys, expected);
        }
    }
}
