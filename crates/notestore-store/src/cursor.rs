//! Cursor over an object store.
//!
//! A cursor walks a store one record at a time in ascending key order. The
//! first step reads the whole store in a single read-only transaction, so
//! the walk sees one consistent state: writes committed after that step are
//! not visited.

use std::collections::VecDeque;

use crate::error::Result;
use crate::record::{Key, StoredRecord};
use crate::traits::{Database, DatabaseExt};

/// Sequential iterator over a store's records.
pub struct Cursor<'a, D: Database + ?Sized> {
    db: &'a D,
    store: String,
    /// Loaded by the first `advance`.
    pending: Option<VecDeque<StoredRecord>>,
    position: Option<Key>,
}

impl<'a, D: Database + ?Sized> Cursor<'a, D> {
    /// Position a cursor before the first record of `store`.
    pub fn new(db: &'a D, store: &str) -> Self {
        Self {
            db,
            store: store.to_string(),
            pending: None,
            position: None,
        }
    }

    /// Step to the next record. Returns `None` once the store is exhausted.
    pub async fn advance(&mut self) -> Result<Option<StoredRecord>> {
        if self.pending.is_none() {
            let records = self.db.scan(&self.store).await?;
            self.pending = Some(records.into());
        }

        let next = self.pending.as_mut().and_then(VecDeque::pop_front);
        if let Some(record) = &next {
            self.position = Some(record.key.clone());
        }
        Ok(next)
    }

    /// Key of the record the cursor is positioned on.
    pub fn key(&self) -> Option<&str> {
        self.position.as_deref()
    }

    /// Drain the remaining records.
    pub async fn collect(mut self) -> Result<Vec<StoredRecord>> {
        let mut records = Vec::new();
        while let Some(record) = self.advance().await? {
            records.push(record);
        }
        Ok(records)
    }
}
