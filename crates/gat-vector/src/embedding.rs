//! Embedding providers for generating vector representations
//!
//! Supports the OpenAI and Gemini embedding APIs behind one trait.
//! Each `embed` call issues exactly one HTTP request; nothing is cached,
//! batched or retried here.

use async_trait::async_trait;
use gat_core::{GatError, ProviderConfig, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const OPENAI_API_BASE_URL: &str = "https://api.openai.com/v1";
const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

// ============================================================================
// Embedding Trait
// ============================================================================

/// Capability shared by every embedding back-end
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate the embedding for a single text.
    ///
    /// The returned vector always has exactly [`dimension`](Self::dimension)
    /// elements; anything else is reported as an error.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Output dimension of the configured model
    fn dimension(&self) -> usize;

    /// Model identifier sent upstream
    fn model(&self) -> &str;

    /// Short provider name used in errors and logs
    fn provider_name(&self) -> &'static str;
}

/// Supported embedding vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAI,
    Gemini,
}

impl std::str::FromStr for ProviderKind {
    type Err = GatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "gemini" => Ok(Self::Gemini),
            _ => Err(GatError::UnsupportedProvider(s.to_string())),
        }
    }
}

impl ProviderKind {
    /// Native output size of well-known models
    pub fn native_dimension(self, model: &str) -> Option<usize> {
        let model = model.strip_prefix("models/").unwrap_or(model);
        match (self, model) {
            (Self::OpenAI, "text-embedding-3-small") => Some(1536),
            (Self::OpenAI, "text-embedding-3-large") => Some(3072),
            (Self::OpenAI, "text-embedding-ada-002") => Some(1536),
            (Self::Gemini, "text-embedding-004") => Some(768),
            (Self::Gemini, "embedding-001") => Some(768),
            (Self::Gemini, "gemini-embedding-001") => Some(3072),
            _ => None,
        }
    }
}

/// Output dimension plus the value to request upstream, if any
struct DimensionPlan {
    dimension: usize,
    requested: Option<usize>,
}

fn plan_dimension(kind: ProviderKind, config: &ProviderConfig) -> Result<DimensionPlan> {
    let native = kind.native_dimension(&config.model);
    match (config.dimension, native) {
        (Some(0), _) => Err(GatError::ConfigError(
            "embedding dimension must be positive".to_string(),
        )),
        (Some(explicit), native) => Ok(DimensionPlan {
            dimension: explicit,
            requested: (native != Some(explicit)).then_some(explicit),
        }),
        (None, Some(native)) => Ok(DimensionPlan {
            dimension: native,
            requested: None,
        }),
        (None, None) => Err(GatError::ConfigError(format!(
            "unknown embedding model '{}': set embedding.dimension explicitly",
            config.model
        ))),
    }
}

fn build_http_client(config: &ProviderConfig) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs.max(1)))
        .build()
        .map_err(|e| GatError::ConfigError(format!("Failed to build HTTP client: {e}")))
}

fn require_api_key(provider: &str, config: &ProviderConfig) -> Result<String> {
    if config.api_key.trim().is_empty() {
        return Err(GatError::ConfigError(format!("{provider} API key required")));
    }
    Ok(config.api_key.clone())
}

// ============================================================================
// Response normalization
// ============================================================================

/// Map a non-success HTTP status to the error taxonomy
fn classify_status(provider: &str, status: StatusCode, message: String) -> GatError {
    let code = status.as_u16();
    match code {
        401 | 403 => GatError::AuthError {
            provider: provider.to_string(),
            message,
        },
        408 | 429 => GatError::TransientError {
            provider: provider.to_string(),
            status: code,
            message,
        },
        _ if status.is_server_error() => GatError::TransientError {
            provider: provider.to_string(),
            status: code,
            message,
        },
        _ => GatError::InvalidRequest {
            provider: provider.to_string(),
            status: code,
            message,
        },
    }
}

/// Map a transport failure (no HTTP status) to the error taxonomy
fn classify_transport(provider: &str, err: reqwest::Error, timeout: Duration) -> GatError {
    if err.is_timeout() {
        GatError::Timeout(timeout)
    } else if err.is_connect() {
        GatError::ConnectionError(format!("{provider} unreachable: {err}"))
    } else {
        GatError::ConnectionError(format!("{provider} request failed: {err}"))
    }
}

/// Convert upstream values into a vector of the expected length
fn normalize_vector(provider: &str, values: Vec<f64>, expected: usize) -> Result<Vec<f32>> {
    if values.is_empty() {
        return Err(GatError::EmptyResult(format!(
            "{provider} returned an empty embedding"
        )));
    }
    if values.len() != expected {
        return Err(GatError::DimensionMismatch {
            context: format!("{provider} embedding"),
            expected,
            actual: values.len(),
        });
    }
    Ok(values.into_iter().map(|v| v as f32).collect())
}

/// Read the body of a successful response, classifying failures
async fn read_body(
    provider: &str,
    response: reqwest::Response,
    timeout: Duration,
) -> Result<String> {
    let status = response.status();
    let body = response.text().await;
    body_outcome(provider, status, body, |e| classify_transport(provider, e, timeout))
}

/// The status decides the error class; an unreadable body only loses the message
fn body_outcome<E: std::fmt::Display>(
    provider: &str,
    status: StatusCode,
    body: std::result::Result<String, E>,
    on_read_error: impl FnOnce(E) -> GatError,
) -> Result<String> {
    if status.is_success() {
        return body.map_err(on_read_error);
    }
    let message = match body {
        Ok(body) => error_message(&body),
        Err(e) => format!("unreadable error body: {e}"),
    };
    Err(classify_status(provider, status, message))
}

/// Vendor error envelope: `{"error": {"message": ...}}`
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.kind.or(envelope.error.status) {
            Some(kind) => format!("{} (type: {kind})", envelope.error.message),
            None => envelope.error.message,
        },
        Err(_) => body.to_string(),
    }
}

// ============================================================================
// OpenAI Embedding Provider
// ============================================================================

/// OpenAI embedding API client
pub struct OpenAiEmbedding {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    dimension: usize,
    requested_dimension: Option<usize>,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct OpenAiEmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingResponse {
    #[serde(default)]
    data: Vec<OpenAiEmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingData {
    embedding: Vec<f64>,
    #[serde(default)]
    index: usize,
}

impl OpenAiEmbedding {
    /// Create from config; performs no network I/O
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let api_key = require_api_key("OpenAI", config)?;
        let plan = plan_dimension(ProviderKind::OpenAI, config)?;

        Ok(Self {
            client: build_http_client(config)?,
            api_key,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| OPENAI_API_BASE_URL.to_string()),
            model: config.model.clone(),
            dimension: plan.dimension,
            requested_dimension: plan.requested,
            timeout: Duration::from_secs(config.timeout_secs.max(1)),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = OpenAiEmbeddingRequest {
            model: &self.model,
            input: [text],
            dimensions: self.requested_dimension,
        };

        tracing::debug!(model = %self.model, chars = text.len(), "requesting OpenAI embedding");

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| classify_transport("openai", e, self.timeout))?;

        let body = read_body("openai", response, self.timeout).await?;

        let result: OpenAiEmbeddingResponse = serde_json::from_str(&body).map_err(|e| {
            GatError::EmptyResult(format!("Failed to parse OpenAI embedding response: {e}"))
        })?;

        let first = result
            .data
            .into_iter()
            .min_by_key(|d| d.index)
            .ok_or_else(|| GatError::EmptyResult("No embedding returned".to_string()))?;

        normalize_vector("openai", first.embedding, self.dimension)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

// ============================================================================
// Gemini Embedding Provider
// ============================================================================

/// Gemini `embedContent` API client
pub struct GeminiEmbedding {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    dimension: usize,
    requested_dimension: Option<usize>,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiEmbeddingRequest<'a> {
    model: String,
    content: GeminiContent<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dimensionality: Option<usize>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: [GeminiPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GeminiEmbeddingResponse {
    embedding: Option<GeminiValues>,
}

#[derive(Debug, Deserialize)]
struct GeminiValues {
    #[serde(default)]
    values: Vec<f64>,
}

impl GeminiEmbedding {
    /// Create from config; performs no network I/O
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let api_key = require_api_key("Gemini", config)?;
        let plan = plan_dimension(ProviderKind::Gemini, config)?;
        let model = config
            .model
            .strip_prefix("models/")
            .unwrap_or(&config.model)
            .to_string();

        Ok(Self {
            client: build_http_client(config)?,
            api_key,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| GEMINI_API_BASE_URL.to_string()),
            model,
            dimension: plan.dimension,
            requested_dimension: plan.requested,
            timeout: Duration::from_secs(config.timeout_secs.max(1)),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = GeminiEmbeddingRequest {
            model: format!("models/{}", self.model),
            content: GeminiContent {
                parts: [GeminiPart { text }],
            },
            output_dimensionality: self.requested_dimension,
        };

        tracing::debug!(model = %self.model, chars = text.len(), "requesting Gemini embedding");

        let response = self
            .client
            .post(format!(
                "{}/models/{}:embedContent",
                self.base_url.trim_end_matches('/'),
                self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| classify_transport("gemini", e, self.timeout))?;

        let body = read_body("gemini", response, self.timeout).await?;

        let result: GeminiEmbeddingResponse = serde_json::from_str(&body).map_err(|e| {
            GatError::EmptyResult(format!("Failed to parse Gemini embedding response: {e}"))
        })?;

        let values = result
            .embedding
            .map(|e| e.values)
            .ok_or_else(|| GatError::EmptyResult("No embedding returned".to_string()))?;

        normalize_vector("gemini", values, self.dimension)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}

// ============================================================================
// Factory function
// ============================================================================

/// Create an embedding provider from config
///
/// Pure dispatch on the provider kind. No request is sent until the
/// first `embed` call.
pub fn create_embedding_provider(config: &ProviderConfig) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider.parse::<ProviderKind>()? {
        ProviderKind::OpenAI => Ok(Box::new(OpenAiEmbedding::from_config(config)?)),
        ProviderKind::Gemini => Ok(Box::new(GeminiEmbedding::from_config(config)?)),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn config(provider: &str, model: &str, base_url: Option<String>) -> ProviderConfig {
        ProviderConfig {
            provider: provider.to_string(),
            api_key: "test-key".to_string(),
            model: model.to_string(),
            dimension: None,
            base_url,
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_unreadable_error_body_keeps_status_class() {
        let read_failed: std::result::Result<String, &str> = Err("connection reset");
        let err = body_outcome("openai", StatusCode::UNAUTHORIZED, read_failed, |e| {
            GatError::ConnectionError(e.to_string())
        })
        .unwrap_err();
        assert!(matches!(err, GatError::AuthError { .. }));
        assert!(!err.is_retryable());

        let read_failed: std::result::Result<String, &str> = Err("connection reset");
        let err = body_outcome("openai", StatusCode::OK, read_failed, |e| {
            GatError::ConnectionError(e.to_string())
        })
        .unwrap_err();
        assert!(matches!(err, GatError::ConnectionError(_)));
    }

    #[test]
    fn test_openai_dimension() {
        let provider =
            OpenAiEmbedding::from_config(&config("openai", "text-embedding-3-small", None))
                .unwrap();
        assert_eq!(provider.dimension(), 1536);

        let provider =
            OpenAiEmbedding::from_config(&config("openai", "text-embedding-3-large", None))
                .unwrap();
        assert_eq!(provider.dimension(), 3072);
    }

    #[test]
    fn test_gemini_dimension() {
        let provider =
            GeminiEmbedding::from_config(&config("gemini", "models/text-embedding-004", None))
                .unwrap();
        assert_eq!(provider.dimension(), 768);
        assert_eq!(provider.model(), "text-embedding-004");
    }

    #[test]
    fn test_unknown_model_needs_explicit_dimension() {
        let mut cfg = config("openai", "my-finetune", None);
        assert!(matches!(
            OpenAiEmbedding::from_config(&cfg),
            Err(GatError::ConfigError(_))
        ));

        cfg.dimension = Some(512);
        let provider = OpenAiEmbedding::from_config(&cfg).unwrap();
        assert_eq!(provider.dimension(), 512);
        assert_eq!(provider.requested_dimension, Some(512));
    }

    #[test]
    fn test_native_dimension_override_is_not_forwarded() {
        let mut cfg = config("openai", "text-embedding-3-small", None);
        cfg.dimension = Some(1536);
        let provider = OpenAiEmbedding::from_config(&cfg).unwrap();
        assert_eq!(provider.requested_dimension, None);
    }

    #[test]
    fn test_factory_dispatch() {
        let openai = create_embedding_provider(&config("OpenAI", "text-embedding-3-small", None))
            .unwrap();
        assert_eq!(openai.provider_name(), "openai");

        let gemini =
            create_embedding_provider(&config("gemini", "text-embedding-004", None)).unwrap();
        assert_eq!(gemini.provider_name(), "gemini");
        assert_eq!(gemini.dimension(), 768);

        let err = create_embedding_provider(&config("cohere", "embed-v3", None))
            .err()
            .unwrap();
        assert!(matches!(err, GatError::UnsupportedProvider(ref p) if p == "cohere"));
    }

    #[test]
    fn test_factory_requires_api_key() {
        let mut cfg = config("openai", "text-embedding-3-small", None);
        cfg.api_key = String::new();
        assert!(matches!(
            create_embedding_provider(&cfg),
            Err(GatError::ConfigError(_))
        ));
    }

    #[test]
    fn test_status_classification() {
        let auth = classify_status("openai", StatusCode::UNAUTHORIZED, "bad key".into());
        assert!(matches!(auth, GatError::AuthError { .. }));
        assert!(!auth.is_retryable());

        let limited = classify_status("openai", StatusCode::TOO_MANY_REQUESTS, "slow".into());
        assert!(matches!(limited, GatError::TransientError { status: 429, .. }));
        assert!(limited.is_retryable());

        let server = classify_status("gemini", StatusCode::BAD_GATEWAY, "oops".into());
        assert!(server.is_retryable());

        let invalid = classify_status("gemini", StatusCode::BAD_REQUEST, "bad input".into());
        assert!(matches!(invalid, GatError::InvalidRequest { status: 400, .. }));
        assert!(!invalid.is_retryable());
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"error":{"message":"Incorrect API key","type":"invalid_request_error"}}"#;
        assert_eq!(
            error_message(body),
            "Incorrect API key (type: invalid_request_error)"
        );
        assert_eq!(error_message("upstream exploded"), "upstream exploded");
    }

    #[tokio::test]
    async fn test_openai_embed_orders_by_index_and_normalizes() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/embeddings")
                    .header("authorization", "Bearer test-key")
                    .json_body(json!({"model": "my-model", "input": ["hello"], "dimensions": 3}));
                then.status(200).json_body(json!({
                    "object": "list",
                    "data": [
                        {"object": "embedding", "index": 1, "embedding": [9.0, 9.0, 9.0]},
                        {"object": "embedding", "index": 0, "embedding": [0.5, -0.25, 1.0]}
                    ],
                    "model": "my-model"
                }));
            })
            .await;

        let mut cfg = config("openai", "my-model", Some(server.url("/v1")));
        cfg.dimension = Some(3);
        let provider = OpenAiEmbedding::from_config(&cfg).unwrap();

        let vector = provider.embed("hello").await.unwrap();
        assert_eq!(vector, vec![0.5f32, -0.25, 1.0]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_openai_auth_failure_is_classified() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/embeddings");
                then.status(401).json_body(json!({
                    "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
                }));
            })
            .await;

        let provider = OpenAiEmbedding::from_config(&config(
            "openai",
            "text-embedding-3-small",
            Some(server.base_url()),
        ))
        .unwrap();

        let err = provider.embed("hello").await.unwrap_err();
        match err {
            GatError::AuthError { provider, message } => {
                assert_eq!(provider, "openai");
                assert!(message.contains("Incorrect API key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_openai_server_error_is_retryable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/embeddings");
                then.status(503).body("service unavailable");
            })
            .await;

        let provider = OpenAiEmbedding::from_config(&config(
            "openai",
            "text-embedding-3-small",
            Some(server.base_url()),
        ))
        .unwrap();

        let err = provider.embed("hello").await.unwrap_err();
        assert!(matches!(err, GatError::TransientError { status: 503, .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_openai_empty_data_is_empty_result() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/embeddings");
                then.status(200).json_body(json!({"object": "list", "data": []}));
            })
            .await;

        let provider = OpenAiEmbedding::from_config(&config(
            "openai",
            "text-embedding-3-small",
            Some(server.base_url()),
        ))
        .unwrap();

        let err = provider.embed("hello").await.unwrap_err();
        assert!(matches!(err, GatError::EmptyResult(_)));
    }

    #[tokio::test]
    async fn test_openai_malformed_body_is_empty_result() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/embeddings");
                then.status(200).body("<html>proxy error</html>");
            })
            .await;

        let provider = OpenAiEmbedding::from_config(&config(
            "openai",
            "text-embedding-3-small",
            Some(server.base_url()),
        ))
        .unwrap();

        let err = provider.embed("hello").await.unwrap_err();
        assert!(matches!(err, GatError::EmptyResult(_)));
    }

    #[tokio::test]
    async fn test_wrong_length_is_never_padded() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/embeddings");
                then.status(200)
                    .json_body(json!({"data": [{"index": 0, "embedding": [0.1, 0.2]}]}));
            })
            .await;

        let provider = OpenAiEmbedding::from_config(&config(
            "openai",
            "text-embedding-3-small",
            Some(server.base_url()),
        ))
        .unwrap();

        let err = provider.embed("hello").await.unwrap_err();
        assert!(matches!(
            err,
            GatError::DimensionMismatch {
                expected: 1536,
                actual: 2,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_gemini_embed_request_shape() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/models/custom-embed:embedContent")
                    .header("x-goog-api-key", "test-key")
                    .json_body(json!({
                        "model": "models/custom-embed",
                        "content": {"parts": [{"text": "fn main() {}"}]},
                        "outputDimensionality": 4
                    }));
                then.status(200)
                    .json_body(json!({"embedding": {"values": [0.1, 0.2, 0.3, 0.4]}}));
            })
            .await;

        let mut cfg = config("gemini", "custom-embed", Some(server.base_url()));
        cfg.dimension = Some(4);
        let provider = GeminiEmbedding::from_config(&cfg).unwrap();

        let vector = provider.embed("fn main() {}").await.unwrap();
        assert_eq!(vector, vec![0.1f32, 0.2, 0.3, 0.4]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_gemini_missing_embedding_is_empty_result() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/models/text-embedding-004:embedContent");
                then.status(200).json_body(json!({}));
            })
            .await;

        let provider = GeminiEmbedding::from_config(&config(
            "gemini",
            "text-embedding-004",
            Some(server.base_url()),
        ))
        .unwrap();

        let err = provider.embed("hello").await.unwrap_err();
        assert!(matches!(err, GatError::EmptyResult(_)));
    }

    #[tokio::test]
    async fn test_gemini_permission_denied_is_auth_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/models/text-embedding-004:embedContent");
                then.status(403).json_body(json!({
                    "error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}
                }));
            })
            .await;

        let provider = GeminiEmbedding::from_config(&config(
            "gemini",
            "text-embedding-004",
            Some(server.base_url()),
        ))
        .unwrap();

        let err = provider.embed("hello").await.unwrap_err();
        assert!(matches!(err, GatError::AuthError { .. }));
        assert!(err.to_string().contains("PERMISSION_DENIED"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_connection_error() {
        // Port 9 (discard) on localhost is closed in test environments
        let provider = OpenAiEmbedding::from_config(&config(
            "openai",
            "text-embedding-3-small",
            Some("http://127.0.0.1:9".to_string()),
        ))
        .unwrap();

        let err = provider.embed("hello").await.unwrap_err();
        assert!(err.is_retryable(), "unexpected error: {err:?}");
    }
}
