//! Provider and Database traits: the abstract interface of a local,
//! versioned key-value database.
//!
//! A [`Provider`] opens named databases at a version, running an upgrade
//! callback when the version moves forward. A [`Database`] holds object
//! stores and executes transactions against them. Implementations include
//! SQLite (production) and in-memory (for tests).

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::cursor::Cursor;
use crate::error::{Result, StoreError};
use crate::record::{Key, StoredRecord};

/// Scope of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMode {
    ReadOnly,
    ReadWrite,
}

/// One operation inside a transaction.
#[derive(Debug, Clone)]
pub enum Request {
    /// Insert a new record. Fails with a constraint error if the key exists.
    Add(Value),
    /// Fetch a record by key.
    Get(Key),
    /// Count records in the store.
    Count,
    /// Every record of the store, in ascending key order.
    Scan,
}

impl Request {
    /// Whether this request needs a read-write transaction.
    pub fn is_write(&self) -> bool {
        matches!(self, Request::Add(_))
    }
}

/// Outcome of one [`Request`], in the same position as the request.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Added(Key),
    Record(Option<Value>),
    Count(u64),
    Records(Vec<StoredRecord>),
}

/// Versions involved in an upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionChange {
    /// Version before the upgrade; 0 for a database that did not exist.
    pub old_version: u32,
    pub new_version: u32,
}

/// Schema operations available while an upgrade is running.
pub trait SchemaEditor {
    /// Names of the object stores that currently exist, sorted.
    fn object_store_names(&self) -> Result<Vec<String>>;

    /// Create an object store whose records are keyed by `key_path`.
    ///
    /// Fails with a constraint error if a store with that name exists.
    fn create_object_store(&mut self, name: &str, key_path: &str) -> Result<()>;
}

/// Callback run inside the version-change transaction.
///
/// Returning an error aborts the open and leaves the stored version
/// unchanged.
pub type UpgradeFn =
    Box<dyn FnOnce(VersionChange, &mut dyn SchemaEditor) -> Result<()> + Send + 'static>;

/// Box a closure as an [`UpgradeFn`].
pub fn on_upgrade<F>(f: F) -> UpgradeFn
where
    F: FnOnce(VersionChange, &mut dyn SchemaEditor) -> Result<()> + Send + 'static,
{
    Box::new(f)
}

/// A source of local persistent databases.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short identifier used in logs and errors.
    fn name(&self) -> &str;

    /// Whether this provider can serve databases in the current environment.
    fn is_available(&self) -> bool;

    /// Open (creating if needed) the named database at `version`.
    ///
    /// - `version` must be at least 1.
    /// - A version lower than the stored one fails with [`StoreError::Version`].
    /// - A higher version runs `upgrade` before the database is returned.
    async fn open(&self, name: &str, version: u32, upgrade: UpgradeFn)
        -> Result<Arc<dyn Database>>;

    /// Remove a database and all of its stores. Missing databases are ignored.
    async fn delete_database(&self, name: &str) -> Result<()>;
}

/// An opened database.
#[async_trait]
pub trait Database: Send + Sync {
    /// Database name.
    fn name(&self) -> &str;

    /// Version the database was opened at.
    fn version(&self) -> u32;

    /// Names of the object stores in this database, sorted.
    async fn object_store_names(&self) -> Result<Vec<String>>;

    /// Run `requests` against `store` as one transaction.
    ///
    /// Requests execute in order. If any request fails, none of the writes
    /// in the batch are kept and the error is returned. Write requests in a
    /// [`TransactionMode::ReadOnly`] transaction fail with
    /// [`StoreError::ReadOnly`].
    async fn transaction(
        &self,
        store: &str,
        mode: TransactionMode,
        requests: Vec<Request>,
    ) -> Result<Vec<Response>>;
}

/// Convenience wrappers for single-request transactions.
pub trait DatabaseExt: Database {
    /// Add one record in a read-write transaction, returning its key.
    fn add(&self, store: &str, value: Value)
        -> impl std::future::Future<Output = Result<Key>> + Send;

    /// Fetch one record in a read-only transaction.
    fn get(&self, store: &str, key: &str)
        -> impl std::future::Future<Output = Result<Option<Value>>> + Send;

    /// Count records in a read-only transaction.
    fn count(&self, store: &str) -> impl std::future::Future<Output = Result<u64>> + Send;

    /// Read every record of `store` in one read-only transaction.
    fn scan(&self, store: &str)
        -> impl std::future::Future<Output = Result<Vec<StoredRecord>>> + Send;

    /// Open a cursor over `store` in ascending key order.
    fn open_cursor<'a>(&'a self, store: &str) -> Cursor<'a, Self> {
        Cursor::new(self, store)
    }
}

impl<D: Database + ?Sized> DatabaseExt for D {
    async fn add(&self, store: &str, value: Value) -> Result<Key> {
        let responses = self
            .transaction(store, TransactionMode::ReadWrite, vec![Request::Add(value)])
            .await?;

        match responses.into_iter().next() {
            Some(Response::Added(key)) => Ok(key),
            other => Err(unexpected_response("add", other)),
        }
    }

    async fn get(&self, store: &str, key: &str) -> Result<Option<Value>> {
        let responses = self
            .transaction(
                store,
                TransactionMode::ReadOnly,
                vec![Request::Get(key.to_string())],
            )
            .await?;

        match responses.into_iter().next() {
            Some(Response::Record(value)) => Ok(value),
            other => Err(unexpected_response("get", other)),
        }
    }

    async fn count(&self, store: &str) -> Result<u64> {
        let responses = self
            .transaction(store, TransactionMode::ReadOnly, vec![Request::Count])
            .await?;

        match responses.into_iter().next() {
            Some(Response::Count(n)) => Ok(n),
            other => Err(unexpected_response("count", other)),
        }
    }

    async fn scan(&self, store: &str) -> Result<Vec<StoredRecord>> {
        let responses = self
            .transaction(store, TransactionMode::ReadOnly, vec![Request::Scan])
            .await?;

        match responses.into_iter().next() {
            Some(Response::Records(records)) => Ok(records),
            other => Err(unexpected_response("scan", other)),
        }
    }
}

fn unexpected_response(op: &str, got: Option<Response>) -> StoreError {
    StoreError::Task(format!("unexpected response to {}: {:?}", op, got))
}
