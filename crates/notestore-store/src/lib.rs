//! # Notestore Store
//!
//! A local, versioned key-value database behind a trait-based interface,
//! with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! A [`Provider`] opens named databases at a version. When the requested
//! version is newer than the stored one, an upgrade callback runs inside
//! the version-change transaction and may create object stores. An opened
//! [`Database`] executes transactions (ordered batches of [`Request`]s)
//! against a store and exposes a key-ordered [`Cursor`].
//!
//! ## Key Types
//!
//! - [`Provider`] / [`Database`] - The async traits for all storage operations
//! - [`SqliteProvider`] - SQLite-based persistent storage, one file per database
//! - [`MemoryProvider`] - In-memory storage for tests
//! - [`ProviderChain`] - Picks the first available provider
//!
//! ## Usage
//!
//! ```rust,no_run
//! use notestore_store::{on_upgrade, DatabaseExt, Provider, SqliteProvider};
//! use serde_json::json;
//!
//! async fn example() {
//!     let provider = SqliteProvider::new("data");
//!     let db = provider
//!         .open("notes", 1, on_upgrade(|_, schema| {
//!             schema.create_object_store("notes", "title")
//!         }))
//!         .await
//!         .unwrap();
//!
//!     db.add("notes", json!({ "title": "Buy milk" })).await.unwrap();
//!
//!     let mut cursor = db.open_cursor("notes");
//!     while let Some(record) = cursor.advance().await.unwrap() {
//!         println!("{}", record.key);
//!     }
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Unique keys**: Adding a record whose key exists fails with `Constraint`
//! - **Atomic batches**: A failing request discards every write in its transaction
//! - **Forward-only versions**: Opening below the stored version fails

pub mod chain;
pub mod cursor;
pub mod error;
pub mod memory;
pub mod migration;
pub mod record;
pub mod sqlite;
pub mod traits;

pub use chain::ProviderChain;
pub use cursor::Cursor;
pub use error::{Result, StoreError};
pub use memory::{MemoryDatabase, MemoryProvider};
pub use record::{extract_key, Key, StoredRecord};
pub use sqlite::{SqliteDatabase, SqliteProvider};
pub use traits::{
    on_upgrade, Database, DatabaseExt, Provider, Request, Response, SchemaEditor,
    TransactionMode, UpgradeFn, VersionChange,
};
