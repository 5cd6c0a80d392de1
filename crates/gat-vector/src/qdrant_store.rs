//! Qdrant implementation for vector storage
//!
//! Provides connection management and collection/point operations
//! for item embeddings.

use crate::{CollectionDescriptor, CollectionShape, StoreConnector, StoredPoint, VectorBackend};
use async_trait::async_trait;
use gat_core::{DistanceMetric, GatError, Item, Result, ScoredItem, VectorStoreConfig};
use qdrant_client::qdrant::{
    vectors_config, CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder,
    UpsertPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use uuid::Uuid;

/// Builds [`QdrantConnection`]s from the vector store config
#[derive(Clone)]
pub struct QdrantConnector {
    url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl QdrantConnector {
    pub fn new(url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            api_key,
            timeout,
        }
    }

    /// Create from config
    pub fn from_config(config: &VectorStoreConfig) -> Self {
        Self::new(
            config.url(),
            config.api_key.clone(),
            Duration::from_secs(config.ready_timeout_secs.max(1)),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl StoreConnector for QdrantConnector {
    fn open(&self) -> Result<Arc<dyn VectorBackend>> {
        Ok(Arc::new(QdrantConnection::open(
            &self.url,
            self.api_key.as_deref(),
            self.timeout,
        )?))
    }
}

/// Qdrant vector store connection
///
/// The underlying gRPC channel connects lazily, so opening performs no
/// round trip.
pub struct QdrantConnection {
    client: RwLock<Option<Arc<Qdrant>>>,
    url: String,
}

impl QdrantConnection {
    /// Create a new Qdrant connection
    pub fn open(url: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self> {
        let mut builder = Qdrant::from_url(url)
            .timeout(timeout)
            .connect_timeout(timeout)
            .skip_compatibility_check();
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            builder = builder.api_key(key.to_string());
        }

        let client = builder
            .build()
            .map_err(|e| GatError::ConnectionError(format!("Qdrant connection failed: {e}")))?;

        tracing::debug!(url, "opened qdrant connection");

        Ok(Self {
            client: RwLock::new(Some(Arc::new(client))),
            url: url.to_string(),
        })
    }

    fn client(&self) -> Result<Arc<Qdrant>> {
        self.client
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .ok_or(GatError::ClosedStore)
    }

    /// Whether `close` has run
    pub fn is_closed(&self) -> bool {
        self.client
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_none()
    }
}

/// Payload stored with each vector
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ItemPayload {
    id: String,
    path: String,
    description: String,
}

/// Stable point id for an item id
///
/// Qdrant only accepts integer or UUID point ids, so arbitrary item ids
/// are mapped through UUIDv5.
pub fn point_id(item_id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, item_id.as_bytes())
}

fn to_qdrant_distance(metric: DistanceMetric) -> Distance {
    match metric {
        DistanceMetric::Cosine => Distance::Cosine,
        DistanceMetric::Euclidean => Distance::Euclid,
        DistanceMetric::Dot => Distance::Dot,
    }
}

fn from_qdrant_distance(raw: i32) -> Option<DistanceMetric> {
    match Distance::try_from(raw).ok()? {
        Distance::Cosine => Some(DistanceMetric::Cosine),
        Distance::Euclid => Some(DistanceMetric::Euclidean),
        Distance::Dot => Some(DistanceMetric::Dot),
        _ => None,
    }
}

fn is_already_exists(err: &qdrant_client::QdrantError) -> bool {
    err.to_string().to_lowercase().contains("already exists")
}

fn item_payload(item: &Item) -> HashMap<String, qdrant_client::qdrant::Value> {
    let payload = ItemPayload {
        id: item.id.clone(),
        path: item.path.clone(),
        description: item.description.clone(),
    };

    serde_json::to_value(&payload)
        .ok()
        .and_then(|v| v.as_object().cloned())
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, v.into()))
        .collect()
}

#[async_trait]
impl VectorBackend for QdrantConnection {
    async fn health(&self) -> Result<()> {
        let reply = self
            .client()?
            .health_check()
            .await
            .map_err(|e| GatError::ConnectionError(format!("Qdrant health check failed: {e}")))?;

        tracing::debug!(url = %self.url, version = %reply.version, "qdrant is healthy");
        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        self.client()?
            .collection_exists(name)
            .await
            .map_err(|e| {
                GatError::StoreUnavailable(format!("Failed to check collection '{name}': {e}"))
            })
    }

    async fn collection_shape(&self, name: &str) -> Result<Option<CollectionShape>> {
        let info = self.client()?.collection_info(name).await.map_err(|e| {
            GatError::StoreUnavailable(format!("Failed to read collection '{name}': {e}"))
        })?;

        let config = info
            .result
            .and_then(|r| r.config)
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config);

        // Named vector maps have no single dimension to compare against
        Ok(match config {
            Some(vectors_config::Config::Params(params)) => Some(CollectionShape {
                dimension: params.size as usize,
                distance: from_qdrant_distance(params.distance),
            }),
            _ => None,
        })
    }

    async fn create_collection(&self, descriptor: &CollectionDescriptor) -> Result<bool> {
        let request = CreateCollectionBuilder::new(&descriptor.name).vectors_config(
            VectorParamsBuilder::new(
                descriptor.dimension as u64,
                to_qdrant_distance(descriptor.distance),
            ),
        );

        match self.client()?.create_collection(request).await {
            Ok(_) => Ok(true),
            Err(e) if is_already_exists(&e) => Ok(false),
            Err(e) => Err(GatError::DatabaseError(format!(
                "Failed to create collection '{}': {e}",
                descriptor.name
            ))),
        }
    }

    async fn upsert(&self, collection: &str, points: Vec<StoredPoint>) -> Result<()> {
        let points: Vec<PointStruct> = points
            .into_iter()
            .map(|p| {
                PointStruct::new(
                    point_id(&p.item.id).to_string(),
                    p.vector,
                    item_payload(&p.item),
                )
            })
            .collect();

        self.client()?
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await
            .map_err(|e| GatError::DatabaseError(format!("Failed to upsert vector: {e}")))?;

        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<ScoredItem>> {
        let results = self
            .client()?
            .search_points(SearchPointsBuilder::new(collection, vector, limit).with_payload(true))
            .await
            .map_err(|e| GatError::DatabaseError(format!("Vector search failed: {e}")))?;

        let hits = results
            .result
            .into_iter()
            .map(|point| {
                let field = |key: &str| {
                    point
                        .payload
                        .get(key)
                        .and_then(|v| v.as_str())
                        .map(|s| s.to_string())
                        .unwrap_or_default()
                };

                ScoredItem {
                    item: Item {
                        id: field("id"),
                        path: field("path"),
                        description: field("description"),
                    },
                    score: point.score,
                }
            })
            .collect();

        Ok(hits)
    }

    fn close(&self) {
        let previous = self
            .client
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        if previous.is_some() {
            tracing::debug!(url = %self.url, "closed qdrant connection");
        }
    }
}
