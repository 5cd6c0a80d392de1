//! gat Core - Domain models, configuration, and shared error types
//!
//! This crate defines the types shared by every gat component:
//! - The error taxonomy used by embedding providers and the vector store
//! - Indexed item models and collection distance metrics
//! - Configuration management

pub mod config;

pub use config::{
    AppConfig, ChatProviderConfig, ConfigError, LoggingConfig, ProviderConfig, StoreMode, VectorStoreConfig,
};

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for gat operations
///
/// Every failure carries enough classification for the caller to decide
/// between retrying and aborting; see [`GatError::is_retryable`].
#[derive(Error, Debug)]
pub enum GatError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Authentication rejected by {provider}: {message}")]
    AuthError { provider: String, message: String },

    #[error("Transient error from {provider} (status {status}): {message}")]
    TransientError {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Request rejected by {provider} (status {status}): {message}")]
    InvalidRequest {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Empty result: {0}")]
    EmptyResult(String),

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("Vector store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Dimension mismatch for {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    #[error("Vector store is closed")]
    ClosedStore,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GatError {
    /// Whether a caller may reasonably retry the failed operation.
    ///
    /// Nothing in gat retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TransientError { .. }
                | Self::Timeout(_)
                | Self::ConnectionError(_)
                | Self::StoreUnavailable(_)
        )
    }
}

impl From<ConfigError> for GatError {
    fn from(err: ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GatError>;

// ============================================================================
// Indexed Items
// ============================================================================

/// An artifact tracked by the semantic index
///
/// The embedding is derived from `description` and persisted next to the
/// item, but it is not part of the item's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Unique within a collection
    pub id: String,

    /// Location of the artifact (e.g. a source file)
    pub path: String,

    /// Text that gets embedded
    pub description: String,
}

impl Item {
    pub fn new(
        id: impl Into<String>,
        path: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            description: description.into(),
        }
    }
}

/// An item returned from a similarity search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredItem {
    pub item: Item,
    pub score: f32,
}

// ============================================================================
// Collections
// ============================================================================

/// Similarity function used within a collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Cosine,
    Euclidean,
    Dot,
}

impl std::fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cosine => write!(f, "cosine"),
            Self::Euclidean => write!(f, "euclidean"),
            Self::Dot => write!(f, "dot"),
        }
    }
}

impl std::str::FromStr for DistanceMetric {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "euclidean" | "euclid" => Ok(Self::Euclidean),
            "dot" => Ok(Self::Dot),
            _ => Err(ConfigError::InvalidValue {
                key: "distance".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let transient = GatError::TransientError {
            provider: "openai".to_string(),
            status: 503,
            message: "overloaded".to_string(),
        };
        assert!(transient.is_retryable());
        assert!(GatError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(GatError::StoreUnavailable("down".to_string()).is_retryable());

        let auth = GatError::AuthError {
            provider: "openai".to_string(),
            message: "bad key".to_string(),
        };
        assert!(!auth.is_retryable());
        assert!(!GatError::ClosedStore.is_retryable());
        assert!(!GatError::UnsupportedProvider("cohere".to_string()).is_retryable());
    }

    #[test]
    fn test_dimension_mismatch_message() {
        let err = GatError::DimensionMismatch {
            context: "collection 'docs'".to_string(),
            expected: 1536,
            actual: 768,
        };
        assert_eq!(
            err.to_string(),
            "Dimension mismatch for collection 'docs': expected 1536, got 768"
        );
    }

    #[test]
    fn test_distance_metric_parse() {
        assert_eq!(
            "cosine".parse::<DistanceMetric>().unwrap(),
            DistanceMetric::Cosine
        );
        assert_eq!("DOT".parse::<DistanceMetric>().unwrap(), DistanceMetric::Dot);
        assert_eq!(
            "euclid".parse::<DistanceMetric>().unwrap(),
            DistanceMetric::Euclidean
        );
        assert!("manhattan".parse::<DistanceMetric>().is_err());
        assert_eq!(DistanceMetric::default(), DistanceMetric::Cosine);
    }

    #[test]
    fn test_item_serde_shape() {
        let item = Item::new("fn:parse", "src/parse.py", "Parses input files");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["id"], "fn:parse");
        assert_eq!(json["path"], "src/parse.py");
        assert_eq!(json["description"], "Parses input files");
    }
}
