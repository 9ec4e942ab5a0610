//! Atomic access to the href store.
//!
//! Every mutation is a whole-store transform applied under the backend's
//! serialization, so two writers never interleave a read-modify-write.
//! Transforms are synchronous: network I/O happens before or after them,
//! never inside.

use async_trait::async_trait;
use tokio::sync::{Mutex, oneshot};

use crate::Error;
use crate::model::HrefStore;

/// A store transform. Returns the next store, or `None` to leave it unchanged.
pub type Transform = Box<dyn FnOnce(&HrefStore) -> Option<HrefStore> + Send + 'static>;

/// Serialized compare-and-update access to a persisted [`HrefStore`].
#[async_trait]
pub trait HrefStoreAccess: Send + Sync {
    /// Apply `transform` to the current store, persist the result and return it.
    async fn apply(&self, transform: Transform) -> Result<HrefStore, Error>;

    /// Read the current store without changing it.
    async fn snapshot(&self) -> Result<HrefStore, Error> {
        self.apply(Box::new(|_| None)).await
    }
}

/// Apply a transform that also reports a value computed from the store it saw.
pub async fn apply_with<T, F>(store: &dyn HrefStoreAccess, transform: F) -> Result<(HrefStore, T), Error>
where
    T: Send + 'static,
    F: FnOnce(&HrefStore) -> (Option<HrefStore>, T) + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let next = store
        .apply(Box::new(move |current| {
            let (next, out) = transform(current);
            let _ = tx.send(out);
            next
        }))
        .await?;

    let out = rx
        .await
        .map_err(|_| Error::StoreUnavailable("transform was dropped before running".into()))?;

    Ok((next, out))
}

/// In-process store guarded by an async mutex.
#[derive(Debug, Default)]
pub struct MemoryHrefStore {
    inner: Mutex<HrefStore>,
}

impl MemoryHrefStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(store: HrefStore) -> Self {
        Self { inner: Mutex::new(store) }
    }
}

#[async_trait]
impl HrefStoreAccess for MemoryHrefStore {
    async fn apply(&self, transform: Transform) -> Result<HrefStore, Error> {
        let mut guard = self.inner.lock().await;
        if let Some(next) = transform(&*guard) {
            *guard = next;
        }
        Ok(guard.clone())
    }
}
