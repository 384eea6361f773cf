//! The note store: persists note titles in a local versioned database and
//! keeps an observable in-memory list of the notes it has seen.
//!
//! The in-memory list is not kept in sync with the store. `create`
//! prepends the new note; `read` appends every stored record, so reading
//! twice lists each note twice unless [`NoteStore::clear_notes`] runs
//! first (or [`NoteStore::reload`] is used).

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use notestore_core::{validate_title, Note, ValidationError, KEY_PATH};
use notestore_store::{on_upgrade, Database, DatabaseExt, Provider, ProviderChain};
use tokio::sync::{oneshot, watch};

use crate::config::NoteStoreConfig;
use crate::error::{NoteStoreError, Result};
use crate::notes::NotesList;

/// Confirmation returned by a successful [`NoteStore::setup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupReport {
    /// Provider that served the database.
    pub provider: String,
    pub database: String,
    pub version: u32,
    /// Previous version if the open ran an upgrade (0 for a new database).
    pub upgraded_from: Option<u32>,
}

impl fmt::Display for SetupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "database {} v{} initialised ({})",
            self.database, self.version, self.provider
        )
    }
}

/// The note store adapter.
///
/// One instance owns one database handle, one saving flag and one notes
/// list. Several instances over the same database do not see each other's
/// in-memory lists.
pub struct NoteStore {
    /// Candidate providers, resolved on every `setup`.
    providers: ProviderChain,
    config: NoteStoreConfig,
    /// Set by `setup`, never closed.
    db: RwLock<Option<Arc<dyn Database>>>,
    /// True while a `create` transaction is in flight.
    saving: AtomicBool,
    notes: NotesList,
}

impl NoteStore {
    /// Create a note store. Nothing is opened until [`NoteStore::setup`].
    pub fn new(providers: ProviderChain, config: NoteStoreConfig) -> Self {
        Self {
            providers,
            config,
            db: RwLock::new(None),
            saving: AtomicBool::new(false),
            notes: NotesList::new(),
        }
    }

    /// Create a note store over a single provider with the default config.
    pub fn with_provider(provider: impl Provider + 'static) -> Self {
        Self::new(ProviderChain::single(provider), NoteStoreConfig::default())
    }

    pub fn config(&self) -> &NoteStoreConfig {
        &self.config
    }

    /// Whether `setup` has completed.
    pub fn is_ready(&self) -> bool {
        self.db
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Whether a `create` is in flight.
    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    /// The opened database handle, if `setup` has completed.
    pub fn handle(&self) -> Option<Arc<dyn Database>> {
        self.db
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn database(&self) -> Result<Arc<dyn Database>> {
        self.handle().ok_or(NoteStoreError::NotInitialized)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Open the database, creating the notes store on first open.
    ///
    /// Not idempotent: every call reopens the database and replaces the
    /// handle.
    pub async fn setup(&self) -> Result<SetupReport> {
        let provider = self.providers.resolve().ok_or_else(|| {
            tracing::warn!("no database provider available in {:?}", self.providers);
            NoteStoreError::Unavailable
        })?;

        let store_name = self.config.store_name().to_string();
        let (upgraded_tx, mut upgraded_rx) = oneshot::channel();

        let upgrade = on_upgrade(move |change, schema| {
            let _ = upgraded_tx.send(change.old_version);
            if !schema.object_store_names()?.contains(&store_name) {
                schema.create_object_store(&store_name, KEY_PATH)?;
            }
            Ok(())
        });

        let db = provider
            .open(
                &self.config.database_name,
                self.config.schema_version,
                upgrade,
            )
            .await
            .map_err(|e| {
                tracing::warn!(
                    "failed to open database {}: {}",
                    self.config.database_name,
                    e
                );
                NoteStoreError::Open(e)
            })?;

        let report = SetupReport {
            provider: provider.name().to_string(),
            database: db.name().to_string(),
            version: db.version(),
            upgraded_from: upgraded_rx.try_recv().ok(),
        };

        *self.db.write().unwrap_or_else(PoisonError::into_inner) = Some(db);
        tracing::info!("{}", report);

        Ok(report)
    }

    /// Persist a new note and prepend it to the in-memory list.
    ///
    /// The title must be non-empty after trimming; it is stored exactly as
    /// given. Fails with `SaveInProgress` while another `create` on this
    /// instance has not settled.
    pub async fn create(&self, title: &str) -> Result<Note> {
        validate_title(title)?;
        let db = self.database()?;
        let _saving = SavingGuard::acquire(&self.saving)?;

        let note = Note::new(title);

        match db.add(self.config.store_name(), note.to_record()).await {
            Ok(_) => {
                self.notes.prepend(note.clone());
                tracing::debug!("saved note {:?}", note.key());
                Ok(note)
            }
            Err(e) => {
                tracing::warn!("failed to save note {:?}: {}", note.key(), e);
                Err(NoteStoreError::Transaction(e))
            }
        }
    }

    /// Append every stored note, in key order, to the in-memory list and
    /// return the full list.
    ///
    /// The store is read in one read-only transaction; notes saved while the
    /// list is being filled are not included.
    pub async fn read(&self) -> Result<Vec<Note>> {
        self.read_with(|_| {}).await
    }

    /// Like [`NoteStore::read`], then pass the full list to `on_done`.
    ///
    /// `on_done` is not called if the scan fails.
    pub async fn read_with<F>(&self, on_done: F) -> Result<Vec<Note>>
    where
        F: FnOnce(&[Note]),
    {
        let db = self.database()?;
        let mut cursor = db.open_cursor(self.config.store_name());
        let mut scanned = 0usize;

        while let Some(record) = cursor
            .advance()
            .await
            .map_err(NoteStoreError::Transaction)?
        {
            self.notes.append(Note::from_record(&record.value)?);
            scanned += 1;
        }

        let notes = self.notes.snapshot();
        tracing::debug!("read {} stored notes, list holds {}", scanned, notes.len());

        on_done(&notes);
        Ok(notes)
    }

    /// Empty the in-memory list. The store is untouched.
    pub fn clear_notes(&self) {
        self.notes.clear();
    }

    /// Clear the in-memory list, then read, so the list mirrors the store.
    pub async fn reload(&self) -> Result<Vec<Note>> {
        self.clear_notes();
        self.read().await
    }

    /// Number of notes persisted in the store.
    pub async fn count(&self) -> Result<u64> {
        let db = self.database()?;
        db.count(self.config.store_name())
            .await
            .map_err(NoteStoreError::Transaction)
    }

    /// Snapshot of the in-memory list.
    pub fn notes(&self) -> Vec<Note> {
        self.notes.snapshot()
    }

    /// Receiver notified whenever the in-memory list changes.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Note>> {
        self.notes.subscribe()
    }
}

/// Holds the saving flag until the `create` that set it settles.
struct SavingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SavingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> std::result::Result<Self, ValidationError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ValidationError::SaveInProgress)?;
        Ok(Self { flag })
    }
}

impl Drop for SavingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
