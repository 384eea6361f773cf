//! # Notestore
//!
//! Persist a short list of note titles in a local, versioned key-value
//! database and keep an observable in-memory copy.
//!
//! ## Overview
//!
//! [`NoteStore`] exposes four operations:
//!
//! - **setup**: open the database, creating the notes store on first open
//! - **create**: validate a title and insert it, newest note first in memory
//! - **read**: walk the store with a cursor, appending every note in memory
//! - **notes**: snapshot (or [`NoteStore::subscribe`] for changes)
//!
//! Storage is pluggable: the store resolves the first available provider
//! from a [`store::ProviderChain`]. [`store::SqliteProvider`] keeps one file per
//! database; [`store::MemoryProvider`] is the in-memory fake for tests.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use notestore::NoteStore;
//! use notestore::store::SqliteProvider;
//!
//! async fn example() {
//!     let notes = NoteStore::with_provider(SqliteProvider::new("data"));
//!     notes.setup().await.unwrap();
//!
//!     notes.create("Buy milk").await.unwrap();
//!     notes.create("Walk dog").await.unwrap();
//!
//!     // Newest first
//!     assert_eq!(notes.notes()[0].title, "Walk dog");
//!
//!     // Mirror the store in key order
//!     let all = notes.reload().await.unwrap();
//!     assert_eq!(all[0].title, "Buy milk");
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `notestore::core` - Note type, validation, schema constants
//! - `notestore::store` - Providers, databases, cursors

pub mod adapter;
pub mod config;
pub mod error;
pub mod notes;

pub use notestore_core as core;
pub use notestore_store as store;

pub use adapter::{NoteStore, SetupReport};
pub use config::NoteStoreConfig;
pub use error::{NoteStoreError, Result};
pub use notes::NotesList;

pub use notestore_core::{Note, ValidationError, DATABASE_NAME, KEY_PATH, SCHEMA_VERSION};
