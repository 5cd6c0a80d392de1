//! Semantic index over items
//!
//! Binds one embedding provider to one vector store facade. Built from
//! [`AppConfig`]; in `disabled` store mode nothing is constructed at all.

use crate::collection::CollectionStatus;
use crate::embedding::{create_embedding_provider, EmbeddingProvider};
use crate::facade::{StoreState, VectorStoreFacade};
use gat_core::{AppConfig, GatError, Item, Result, ScoredItem};
use std::time::Duration;

/// Embeds items and queries and keeps them in the vector store
pub struct SemanticIndex {
    provider: Box<dyn EmbeddingProvider>,
    store: VectorStoreFacade,
    health_timeout: Duration,
    ready_timeout: Duration,
}

impl SemanticIndex {
    /// Build the index from config
    ///
    /// Returns `Ok(None)` when the store is disabled. No network call is
    /// made either way.
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>> {
        if !config.vector_store.is_enabled() {
            tracing::info!("vector store disabled; memory features are off");
            return Ok(None);
        }

        let provider = create_embedding_provider(&config.embedding)?;

        if let Some(configured) = config.vector_store.dimension {
            if configured != provider.dimension() {
                return Err(GatError::DimensionMismatch {
                    context: format!(
                        "collection '{}' and {} model '{}'",
                        config.vector_store.collection,
                        provider.provider_name(),
                        provider.model()
                    ),
                    expected: configured,
                    actual: provider.dimension(),
                });
            }
        }

        let store = VectorStoreFacade::from_config(&config.vector_store, provider.dimension());
        Ok(Some(Self::new(
            provider,
            store,
            Duration::from_secs(config.vector_store.health_timeout_secs.max(1)),
            Duration::from_secs(config.vector_store.ready_timeout_secs.max(1)),
        )))
    }

    /// Assemble from parts
    ///
    /// The store's collection dimension must equal the provider's output size.
    pub fn new(
        provider: Box<dyn EmbeddingProvider>,
        store: VectorStoreFacade,
        health_timeout: Duration,
        ready_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            store,
            health_timeout,
            ready_timeout,
        }
    }

    pub fn provider(&self) -> &dyn EmbeddingProvider {
        self.provider.as_ref()
    }

    pub fn store(&self) -> &VectorStoreFacade {
        &self.store
    }

    pub fn state(&self) -> StoreState {
        self.store.state()
    }

    /// Pre-flight check of the store
    pub async fn health(&self) -> Result<()> {
        self.store.health(self.health_timeout).await
    }

    /// Connect and make sure the collection exists
    pub async fn ensure_ready(&self) -> Result<CollectionStatus> {
        self.store.ensure_ready(self.ready_timeout).await
    }

    /// Embed the item description and store it
    pub async fn index_item(&self, item: &Item) -> Result<()> {
        if self.store.state() == StoreState::Closed {
            return Err(GatError::ClosedStore);
        }
        let vector = self.provider.embed(&item.description).await?;
        self.store.upsert(item, vector, self.ready_timeout).await
    }

    /// Items closest to `text`
    pub async fn query(&self, text: &str, limit: usize) -> Result<Vec<ScoredItem>> {
        if self.store.state() == StoreState::Closed {
            return Err(GatError::ClosedStore);
        }
        let vector = self.provider.embed(text).await?;
        self.store.search(vector, limit, self.ready_timeout).await
    }

    pub fn close(&self) {
        self.store.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gat_core::StoreMode;

    #[test]
    fn test_disabled_mode_is_inert() {
        let mut config = AppConfig::default();
        config.vector_store.mode = StoreMode::Disabled;
        // An unsupported provider would fail if anything were built
        config.embedding.provider = "nonexistent".to_string();

        assert!(SemanticIndex::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn test_configured_dimension_must_match_provider() {
        let mut config = AppConfig::default();
        config.embedding.api_key = "test-key".to_string();
        config.vector_store.dimension = Some(768);

        let err = SemanticIndex::from_config(&config).err().unwrap();
        assert!(matches!(
            err,
            GatError::DimensionMismatch {
                expected: 768,
                actual: 1536,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_from_config_is_lazy() {
        let mut config = AppConfig::default();
        config.embedding.api_key = "test-key".to_string();
        config.vector_store.address = "http://127.0.0.1".to_string();
        config.vector_store.port = Some(9);

        let index = SemanticIndex::from_config(&config).unwrap().unwrap();
        assert_eq!(index.state(), StoreState::Unconnected);
        assert_eq!(index.store().descriptor().dimension, 1536);
        assert_eq!(index.store().descriptor().name, "gat-py-tools");

        index.close();
        assert_eq!(index.state(), StoreState::Closed);
        assert!(matches!(
            index.query("anything", 3).await,
            Err(GatError::ClosedStore)
        ));
    }
}
