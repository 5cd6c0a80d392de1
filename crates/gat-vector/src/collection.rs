//! Collection existence and shape management

use crate::{CollectionDescriptor, VectorBackend};
use gat_core::{GatError, Result};

/// Outcome of [`CollectionManager::ensure_collection`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    /// The collection was created by this call
    Created,
    /// The collection was already there
    Existing,
}

/// Guarantees a collection with the right dimension exists
///
/// Only a definite "absent" answer from the store leads to creation. A
/// failed existence check aborts instead, so that a transient error can
/// never produce a duplicate or wrong-shaped collection.
pub struct CollectionManager<'a> {
    backend: &'a dyn VectorBackend,
}

impl<'a> CollectionManager<'a> {
    pub fn new(backend: &'a dyn VectorBackend) -> Self {
        Self { backend }
    }

    /// Create the collection if it is absent, verify it otherwise
    pub async fn ensure_collection(
        &self,
        descriptor: &CollectionDescriptor,
    ) -> Result<CollectionStatus> {
        if descriptor.dimension == 0 {
            return Err(GatError::ConfigError(format!(
                "collection '{}' needs a positive dimension",
                descriptor.name
            )));
        }

        if self.backend.collection_exists(&descriptor.name).await? {
            self.verify(descriptor).await?;
            return Ok(CollectionStatus::Existing);
        }

        if self.backend.create_collection(descriptor).await? {
            tracing::info!(
                collection = %descriptor.name,
                dimension = descriptor.dimension,
                distance = %descriptor.distance,
                "created collection"
            );
            Ok(CollectionStatus::Created)
        } else {
            // Lost a creation race; the winner's shape is authoritative
            tracing::debug!(collection = %descriptor.name, "collection created concurrently");
            self.verify(descriptor).await?;
            Ok(CollectionStatus::Existing)
        }
    }

    async fn verify(&self, descriptor: &CollectionDescriptor) -> Result<()> {
        let Some(shape) = self.backend.collection_shape(&descriptor.name).await? else {
            tracing::warn!(
                collection = %descriptor.name,
                "collection does not report a single vector size; assuming compatible"
            );
            return Ok(());
        };

        if shape.dimension != descriptor.dimension {
            return Err(GatError::DimensionMismatch {
                context: format!("collection '{}'", descriptor.name),
                expected: descriptor.dimension,
                actual: shape.dimension,
            });
        }

        if let Some(distance) = shape.distance.filter(|d| *d != descriptor.distance) {
            tracing::warn!(
                collection = %descriptor.name,
                existing = %distance,
                requested = %descriptor.distance,
                "collection uses a different distance metric"
            );
        }

        Ok(())
    }
}
