//! A provider wrapper that holds read-write transactions at a gate.
//!
//! Lets tests observe the window between a write being issued and it
//! settling, e.g. to check that a second `create` is refused while the first
//! is still in flight.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use notestore_store::{Database, Provider, Request, Response, Result, TransactionMode, UpgradeFn};
use tokio::sync::{Notify, Semaphore};

/// Gate shared between a [`GatedProvider`] and the test driving it.
///
/// Each read-write transaction waits for one permit. [`Gate::open`] lets
/// every current and future write through.
#[derive(Debug)]
pub struct Gate {
    permits: Semaphore,
    arrived: AtomicUsize,
    arrival: Notify,
}

impl Gate {
    /// A gate that holds every write until released.
    pub fn closed() -> Arc<Self> {
        Arc::new(Self {
            permits: Semaphore::new(0),
            arrived: AtomicUsize::new(0),
            arrival: Notify::new(),
        })
    }

    /// Let `n` held writes through.
    pub fn release(&self, n: usize) {
        self.permits.add_permits(n);
    }

    /// Stop holding writes altogether.
    pub fn open(&self) {
        self.permits.close();
    }

    /// Number of writes that have reached the gate so far.
    pub fn arrived(&self) -> usize {
        self.arrived.load(Ordering::Acquire)
    }

    /// Wait until at least `n` writes have reached the gate.
    pub async fn wait_for_arrivals(&self, n: usize) {
        loop {
            let notified = self.arrival.notified();
            if self.arrived() >= n {
                return;
            }
            notified.await;
        }
    }

    async fn pass(&self) {
        self.arrived.fetch_add(1, Ordering::AcqRel);
        self.arrival.notify_waiters();

        // A closed semaphore means the gate is open
        if let Ok(permit) = self.permits.acquire().await {
            permit.forget();
        }
    }
}

/// Provider whose databases hold read-write transactions at a [`Gate`].
pub struct GatedProvider {
    inner: Arc<dyn Provider>,
    gate: Arc<Gate>,
}

impl GatedProvider {
    pub fn new(inner: impl Provider + 'static, gate: Arc<Gate>) -> Self {
        Self {
            inner: Arc::new(inner),
            gate,
        }
    }
}

#[async_trait]
impl Provider for GatedProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    async fn open(
        &self,
        name: &str,
        version: u32,
        upgrade: UpgradeFn,
    ) -> Result<Arc<dyn Database>> {
        let inner = self.inner.open(name, version, upgrade).await?;
        Ok(Arc::new(GatedDatabase {
            inner,
            gate: Arc::clone(&self.gate),
        }))
    }

    async fn delete_database(&self, name: &str) -> Result<()> {
        self.inner.delete_database(name).await
    }
}

struct GatedDatabase {
    inner: Arc<dyn Database>,
    gate: Arc<Gate>,
}

#[async_trait]
impl Database for GatedDatabase {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn version(&self) -> u32 {
        self.inner.version()
    }

    async fn object_store_names(&self) -> Result<Vec<String>> {
        self.inner.object_store_names().await
    }

    async fn transaction(
        &self,
        store: &str,
        mode: TransactionMode,
        requests: Vec<Request>,
    ) -> Result<Vec<Response>> {
        if mode == TransactionMode::ReadWrite {
            self.gate.pass().await;
        }
        self.inner.transaction(store, mode, requests).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notestore_store::{on_upgrade, DatabaseExt, MemoryProvider};
    use serde_json::json;

    #[tokio::test]
    async fn test_gate_holds_writes_until_released() {
        let gate = Gate::closed();
        let provider = GatedProvider::new(MemoryProvider::new(), Arc::clone(&gate));
        let db = provider
            .open(
                "db",
                1,
                on_upgrade(|_, schema| schema.create_object_store("notes", "title")),
            )
            .await
            .unwrap();

        let writer = {
            let db = Arc::clone(&db);
            tokio::spawn(async move { db.add("notes", json!({ "title": "held" })).await })
        };

        gate.wait_for_arrivals(1).await;
        assert_eq!(db.count("notes").await.unwrap(), 0);

        gate.release(1);
        writer.await.unwrap().unwrap();
        assert_eq!(db.count("notes").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_open_gate_lets_writes_through() {
        let gate = Gate::closed();
        gate.open();
        let provider = GatedProvider::new(MemoryProvider::new(), Arc::clone(&gate));
        let db = provider
            .open(
                "db",
                1,
                on_upgrade(|_, schema| schema.create_object_store("notes", "title")),
            )
            .await
            .unwrap();

        db.add("notes", json!({ "title": "free" })).await.unwrap();
        assert_eq!(gate.arrived(), 1);
    }
}
