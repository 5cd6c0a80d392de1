//! gat Vector - Embedding providers and vector store lifecycle
//!
//! Provides the embedding provider abstraction together with the
//! connection, collection and timeout handling for the vector store
//! (Qdrant) that holds item embeddings.

use async_trait::async_trait;
use gat_core::{DistanceMetric, Item, Result, ScoredItem};
use std::sync::Arc;

pub mod collection;
pub mod embedding;
pub mod facade;
pub mod index;
pub mod qdrant_store;

pub use collection::{CollectionManager, CollectionStatus};
pub use embedding::{
    create_embedding_provider, EmbeddingProvider, GeminiEmbedding, OpenAiEmbedding, ProviderKind,
};
pub use facade::{StoreState, VectorStoreFacade};
pub use index::SemanticIndex;
pub use qdrant_store::{QdrantConnection, QdrantConnector};

/// Shape of a named collection in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionDescriptor {
    pub name: String,
    pub dimension: usize,
    pub distance: DistanceMetric,
}

impl CollectionDescriptor {
    pub fn new(name: impl Into<String>, dimension: usize) -> Self {
        Self {
            name: name.into(),
            dimension,
            distance: DistanceMetric::Cosine,
        }
    }

    pub fn with_distance(mut self, distance: DistanceMetric) -> Self {
        self.distance = distance;
        self
    }
}

/// Vector parameters reported by the store for an existing collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionShape {
    pub dimension: usize,
    pub distance: Option<DistanceMetric>,
}

/// An item with its embedding, ready to be written
#[derive(Debug, Clone)]
pub struct StoredPoint {
    pub item: Item,
    pub vector: Vec<f32>,
}

/// Trait for vector database operations
///
/// One implementation talks to Qdrant; tests substitute an in-memory one.
#[async_trait]
pub trait VectorBackend: Send + Sync {
    /// Lightweight round trip to the server
    async fn health(&self) -> Result<()>;

    /// Whether a collection exists.
    ///
    /// `Ok(false)` is the only answer that means "absent"; any failure to
    /// find out must be an error.
    async fn collection_exists(&self, name: &str) -> Result<bool>;

    /// Vector params of an existing collection, if the store can report them
    async fn collection_shape(&self, name: &str) -> Result<Option<CollectionShape>>;

    /// Create a collection.
    ///
    /// Returns `false` when the store reports that the collection already
    /// exists, e.g. because a concurrent caller created it first.
    async fn create_collection(&self, descriptor: &CollectionDescriptor) -> Result<bool>;

    /// Insert or replace points
    async fn upsert(&self, collection: &str, points: Vec<StoredPoint>) -> Result<()>;

    /// Nearest neighbours of `vector`, in the store's order
    async fn search(&self, collection: &str, vector: Vec<f32>, limit: u64)
        -> Result<Vec<ScoredItem>>;

    /// Release transport resources; calling twice is a no-op
    fn close(&self);
}

/// Opens connections for a [`VectorStoreFacade`]
///
/// Opening must not require a round trip; the first network activity
/// happens on the first backend call.
pub trait StoreConnector: Send + Sync {
    fn open(&self) -> Result<Arc<dyn VectorBackend>>;
}
