//! In-memory implementation of the Provider and Database traits.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence. Clones of a
//! provider share the same databases, so reopening a database sees what
//! earlier handles wrote.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{poisoned, Result, StoreError};
use crate::record::{extract_key, Key, StoredRecord};
use crate::traits::{
    Database, Provider, Request, Response, SchemaEditor, TransactionMode, UpgradeFn,
    VersionChange,
};

/// In-memory provider.
///
/// Thread-safe via RwLock.
#[derive(Clone)]
pub struct MemoryProvider {
    label: String,
    available: bool,
    databases: Arc<RwLock<HashMap<String, Arc<RwLock<DatabaseState>>>>>,
}

#[derive(Default)]
struct DatabaseState {
    /// 0 until the first successful upgrade.
    version: u32,
    stores: BTreeMap<String, ObjectStore>,
}

#[derive(Clone)]
struct ObjectStore {
    key_path: String,
    records: BTreeMap<Key, Value>,
}

impl MemoryProvider {
    /// Create a new provider with no databases.
    pub fn new() -> Self {
        Self::named("memory")
    }

    /// Create a new provider with a custom label.
    pub fn named(label: &str) -> Self {
        Self {
            label: label.to_string(),
            available: true,
            databases: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// A provider that reports itself unavailable and refuses to open.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::named("memory-unavailable")
        }
    }

    /// Names of the databases created so far.
    pub fn database_names(&self) -> Result<Vec<String>> {
        let databases = self.databases.read().map_err(poisoned)?;
        let mut names: Vec<String> = databases.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Schema edits applied to a copy of the stores, committed only if the
/// upgrade callback succeeds.
struct StagedSchema<'a> {
    stores: &'a mut BTreeMap<String, ObjectStore>,
}

impl SchemaEditor for StagedSchema<'_> {
    fn object_store_names(&self) -> Result<Vec<String>> {
        Ok(self.stores.keys().cloned().collect())
    }

    fn create_object_store(&mut self, name: &str, key_path: &str) -> Result<()> {
        if self.stores.contains_key(name) {
            return Err(StoreError::Constraint {
                store: name.to_string(),
                key: name.to_string(),
            });
        }
        self.stores.insert(
            name.to_string(),
            ObjectStore {
                key_path: key_path.to_string(),
                records: BTreeMap::new(),
            },
        );
        Ok(())
    }
}

#[async_trait]
impl Provider for MemoryProvider {
    fn name(&self) -> &str {
        &self.label
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn open(
        &self,
        name: &str,
        version: u32,
        upgrade: UpgradeFn,
    ) -> Result<Arc<dyn Database>> {
        if !self.available {
            return Err(StoreError::Unavailable(self.label.clone()));
        }
        if version == 0 {
            return Err(StoreError::InvalidVersion(version));
        }

        let state = {
            let mut databases = self.databases.write().map_err(poisoned)?;
            Arc::clone(databases.entry(name.to_string()).or_default())
        };

        {
            let mut current = state.write().map_err(poisoned)?;

            if version < current.version {
                return Err(StoreError::Version {
                    requested: version,
                    current: current.version,
                });
            }

            if version > current.version {
                let change = VersionChange {
                    old_version: current.version,
                    new_version: version,
                };
                let mut staged = current.stores.clone();
                upgrade(change, &mut StagedSchema { stores: &mut staged })?;

                current.stores = staged;
                current.version = version;
                tracing::debug!(
                    "upgraded in-memory database {} from v{} to v{}",
                    name,
                    change.old_version,
                    version
                );
            }
        }

        Ok(Arc::new(MemoryDatabase {
            name: name.to_string(),
            version,
            state,
        }))
    }

    async fn delete_database(&self, name: &str) -> Result<()> {
        let mut databases = self.databases.write().map_err(poisoned)?;
        databases.remove(name);
        Ok(())
    }
}

/// Handle to an in-memory database.
pub struct MemoryDatabase {
    name: String,
    version: u32,
    state: Arc<RwLock<DatabaseState>>,
}

#[async_trait]
impl Database for MemoryDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> u32 {
        self.version
    }

    async fn object_store_names(&self) -> Result<Vec<String>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.stores.keys().cloned().collect())
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

        let mut state = self.state.write().map_err(poisoned)?;
        let object_store = state
            .stores
            .get_mut(store)
            .ok_or_else(|| StoreError::NotFound(format!("object store {}", store)))?;

        // Work on a copy so a failing request discards the whole batch
        let mut records = object_store.records.clone();
        let mut responses = Vec::with_capacity(requests.len());

        for request in requests {
            let response = match request {
                Request::Add(value) => {
                    let key = extract_key(&value, &object_store.key_path)?;
                    if records.contains_key(&key) {
                        return Err(StoreError::Constraint {
                            store: store.to_string(),
                            key,
                        });
                    }
                    records.insert(key.clone(), value);
                    Response::Added(key)
                }
                Request::Get(key) => Response::Record(records.get(&key).cloned()),
                Request::Count => Response::Count(records.len() as u64),
                Request::Scan => Response::Records(
                    records
                        .iter()
                        .map(|(key, value)| StoredRecord {
                            key: key.clone(),
                            value: value.clone(),
                        })
                        .collect(),
                ),
            };
            responses.push(response);
        }

        if mode == TransactionMode::ReadWrite {
            object_store.records = records;
        }

        Ok(responses)
    }
}
