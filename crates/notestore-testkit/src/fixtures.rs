//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use notestore::{NoteStore, NoteStoreConfig};
use notestore_store::{MemoryProvider, ProviderChain, SqliteProvider};
use tempfile::TempDir;

use crate::gate::{Gate, GatedProvider};

/// A test fixture with a shared in-memory provider.
///
/// Every store built from the same fixture sees the same databases, like
/// several page loads against one browser profile.
pub struct TestFixture {
    pub provider: MemoryProvider,
    pub config: NoteStoreConfig,
}

impl TestFixture {
    /// Create a new fixture with the default config.
    pub fn new() -> Self {
        Self {
            provider: MemoryProvider::new(),
            config: NoteStoreConfig::default(),
        }
    }

    /// A fresh, not yet set up, note store.
    pub fn store(&self) -> NoteStore {
        NoteStore::new(
            ProviderChain::single(self.provider.clone()),
            self.config.clone(),
        )
    }

    /// A note store that has completed `setup`.
    pub async fn ready_store(&self) -> NoteStore {
        let store = self.store();
        store.setup().await.expect("setup failed");
        store
    }

    /// A ready note store whose writes wait at the returned gate.
    pub async fn gated_store(&self) -> (NoteStore, Arc<Gate>) {
        let gate = Gate::closed();
        let provider = GatedProvider::new(self.provider.clone(), Arc::clone(&gate));
        let store = NoteStore::new(ProviderChain::single(provider), self.config.clone());
        store.setup().await.expect("setup failed");
        (store, gate)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A fixture backed by SQLite files in a temporary directory.
///
/// The directory is removed when the fixture is dropped.
pub struct SqliteFixture {
    pub dir: TempDir,
    pub config: NoteStoreConfig,
}

impl SqliteFixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create temp dir"),
            config: NoteStoreConfig::default(),
        }
    }

    pub fn provider(&self) -> SqliteProvider {
        SqliteProvider::new(self.dir.path())
    }

    /// A fresh note store over the fixture's directory.
    pub fn store(&self) -> NoteStore {
        NoteStore::new(ProviderChain::single(self.provider()), self.config.clone())
    }

    /// A note store that has completed `setup`.
    pub async fn ready_store(&self) -> NoteStore {
        let store = self.store();
        store.setup().await.expect("setup failed");
        store
    }
}

impl Default for SqliteFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notestore::Note;

    #[tokio::test]
    async fn test_fixture_stores_share_databases() {
        let fixture = TestFixture::new();

        let first = fixture.ready_store().await;
        first.create("shared").await.unwrap();

        let second = fixture.ready_store().await;
        assert_eq!(second.read().await.unwrap(), vec![Note::new("shared")]);
    }

    #[tokio::test]
    async fn test_sqlite_fixture_persists() {
        let fixture = SqliteFixture::new();

        fixture.ready_store().await.create("on disk").await.unwrap();

        let reopened = fixture.ready_store().await;
        assert_eq!(reopened.count().await.unwrap(), 1);
    }
}
