//! Configuration for the note store.

use notestore_core::{DATABASE_NAME, SCHEMA_VERSION};

/// Configuration for [`crate::NoteStore`].
///
/// The defaults match the fixed schema: database `nuxtTodo` at version 4,
/// one store of the same name. Records are always keyed by
/// [`notestore_core::KEY_PATH`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteStoreConfig {
    /// Database name. The object store uses the same name.
    pub database_name: String,
    /// Version the database is opened at.
    pub schema_version: u32,
}

impl NoteStoreConfig {
    /// Use a different database (and store) name.
    pub fn with_database_name(mut self, name: impl Into<String>) -> Self {
        self.database_name = name.into();
        self
    }

    /// Open at a different schema version.
    pub fn with_schema_version(mut self, version: u32) -> Self {
        self.schema_version = version;
        self
    }

    /// Name of the object store holding the notes.
    pub fn store_name(&self) -> &str {
        &self.database_name
    }
}

impl Default for NoteStoreConfig {
    fn default() -> Self {
        Self {
            database_name: DATABASE_NAME.to_string(),
            schema_version: SCHEMA_VERSION,
        }
    }
}
