//! Vector store facade
//!
//! Owns the store connection and walks it through
//! `Unconnected -> Connected -> Ready -> Closed`. Every public operation is
//! bounded by a caller-supplied timeout; when one call runs several
//! sub-operations they share a single deadline.

use crate::collection::{CollectionManager, CollectionStatus};
use crate::qdrant_store::QdrantConnector;
use crate::{CollectionDescriptor, StoreConnector, StoredPoint, VectorBackend};
use gat_core::{GatError, Item, Result, ScoredItem, VectorStoreConfig};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

/// Lifecycle state of a [`VectorStoreFacade`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    /// No connection opened yet
    Unconnected,
    /// Connection open, collection not yet confirmed
    Connected,
    /// Collection confirmed or created
    Ready,
    /// Terminal
    Closed,
}

enum Slot {
    Unconnected,
    Connected(Arc<dyn VectorBackend>),
    Ready(Arc<dyn VectorBackend>),
    Closed,
}

impl Slot {
    fn state(&self) -> StoreState {
        match self {
            Self::Unconnected => StoreState::Unconnected,
            Self::Connected(_) => StoreState::Connected,
            Self::Ready(_) => StoreState::Ready,
            Self::Closed => StoreState::Closed,
        }
    }
}

/// Entry point for all vector store access
///
/// The facade is the only owner of the connection and closes it exactly
/// once, either through [`close`](Self::close) or on drop. It can be shared
/// between tasks; the state lock is never held across an await.
pub struct VectorStoreFacade {
    connector: Box<dyn StoreConnector>,
    descriptor: CollectionDescriptor,
    slot: Mutex<Slot>,
}

impl VectorStoreFacade {
    pub fn new(connector: impl StoreConnector + 'static, descriptor: CollectionDescriptor) -> Self {
        Self {
            connector: Box::new(connector),
            descriptor,
            slot: Mutex::new(Slot::Unconnected),
        }
    }

    /// Facade over Qdrant for a collection of `dimension`-sized vectors
    pub fn from_config(config: &VectorStoreConfig, dimension: usize) -> Self {
        let descriptor = CollectionDescriptor::new(config.collection.clone(), dimension)
            .with_distance(config.distance);
        Self::new(QdrantConnector::from_config(config), descriptor)
    }

    pub fn descriptor(&self) -> &CollectionDescriptor {
        &self.descriptor
    }

    pub fn state(&self) -> StoreState {
        self.lock().state()
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current backend, opening the connection on first use
    fn connection(&self) -> Result<(Arc<dyn VectorBackend>, bool)> {
        let mut slot = self.lock();
        match &*slot {
            Slot::Closed => Err(GatError::ClosedStore),
            Slot::Ready(backend) => Ok((Arc::clone(backend), true)),
            Slot::Connected(backend) => Ok((Arc::clone(backend), false)),
            Slot::Unconnected => {
                let backend = self.connector.open()?;
                tracing::debug!(collection = %self.descriptor.name, "vector store connected");
                *slot = Slot::Connected(Arc::clone(&backend));
                Ok((backend, false))
            }
        }
    }

    fn mark_ready(&self) {
        let mut slot = self.lock();
        if let Slot::Connected(backend) = &*slot {
            let backend = Arc::clone(backend);
            *slot = Slot::Ready(backend);
            tracing::info!(collection = %self.descriptor.name, "vector store ready");
        }
    }

    /// Pre-flight round trip to the store
    pub async fn health(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let (backend, _) = self.connection()?;
        bounded(deadline, timeout, backend.health()).await
    }

    /// Open the connection if needed and make sure the collection exists
    ///
    /// Always re-checks the collection, even when already `Ready`.
    pub async fn ensure_ready(&self, timeout: Duration) -> Result<CollectionStatus> {
        let deadline = Instant::now() + timeout;
        let (backend, _) = self.connection()?;
        self.ensure_collection(backend.as_ref(), deadline, timeout)
            .await
    }

    async fn ensure_collection(
        &self,
        backend: &dyn VectorBackend,
        deadline: Instant,
        budget: Duration,
    ) -> Result<CollectionStatus> {
        let manager = CollectionManager::new(backend);
        let status = bounded(deadline, budget, manager.ensure_collection(&self.descriptor)).await?;
        self.mark_ready();
        Ok(status)
    }

    /// Backend for a read/write, confirming the collection first if needed
    async fn ready_backend(
        &self,
        deadline: Instant,
        budget: Duration,
    ) -> Result<Arc<dyn VectorBackend>> {
        let (backend, ready) = self.connection()?;
        if !ready {
            self.ensure_collection(backend.as_ref(), deadline, budget)
                .await?;
        }
        Ok(backend)
    }

    fn check_vector(&self, vector: &[f32], context: impl FnOnce() -> String) -> Result<()> {
        if self.state() == StoreState::Closed {
            return Err(GatError::ClosedStore);
        }
        if vector.len() != self.descriptor.dimension {
            return Err(GatError::DimensionMismatch {
                context: context(),
                expected: self.descriptor.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    /// Store one item with its embedding
    pub async fn upsert(&self, item: &Item, vector: Vec<f32>, timeout: Duration) -> Result<()> {
        self.check_vector(&vector, || format!("vector of item '{}'", item.id))?;

        let deadline = Instant::now() + timeout;
        let backend = self.ready_backend(deadline, timeout).await?;
        let point = StoredPoint {
            item: item.clone(),
            vector,
        };

        bounded(
            deadline,
            timeout,
            backend.upsert(&self.descriptor.name, vec![point]),
        )
        .await?;

        tracing::debug!(collection = %self.descriptor.name, item = %item.id, "upserted item");
        Ok(())
    }

    /// Nearest items to `vector`
    pub async fn search(
        &self,
        vector: Vec<f32>,
        limit: usize,
        timeout: Duration,
    ) -> Result<Vec<ScoredItem>> {
        self.check_vector(&vector, || "query vector".to_string())?;

        let deadline = Instant::now() + timeout;
        let backend = self.ready_backend(deadline, timeout).await?;
        if limit == 0 {
            return Ok(Vec::new());
        }

        bounded(
            deadline,
            timeout,
            backend.search(&self.descriptor.name, vector, limit as u64),
        )
        .await
    }

    /// Release the connection; idempotent and terminal
    pub fn close(&self) {
        let previous = std::mem::replace(&mut *self.lock(), Slot::Closed);
        match previous {
            Slot::Connected(backend) | Slot::Ready(backend) => {
                backend.close();
                tracing::debug!(collection = %self.descriptor.name, "vector store closed");
            }
            Slot::Unconnected | Slot::Closed => {}
        }
    }
}

impl Drop for VectorStoreFacade {
    fn drop(&mut self) {
        self.close();
    }
}

/// Run `fut` until `deadline`, reporting expiry as [`GatError::Timeout`]
async fn bounded<T, F>(deadline: Instant, budget: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout_at(deadline, fut)
        .await
        .map_err(|_| GatError::Timeout(budget))?
}
