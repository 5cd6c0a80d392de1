//! gat Configuration Management
//!
//! Handles the `~/.gat/config.toml` file and environment variable
//! overrides, with defaults that work against a local Qdrant instance.

use crate::DistanceMetric;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory under the user's home that holds gat state
pub const CONFIG_DIR_NAME: &str = ".gat";

/// Config file name inside [`CONFIG_DIR_NAME`]
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Address used when the store runs in bundled mode
pub const BUNDLED_QDRANT_URL: &str = "http://localhost:6334";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Chat model settings, kept so the file layout stays compatible
    pub chat_provider: ChatProviderConfig,

    /// Embedding provider configuration
    #[serde(alias = "embedding_provider")]
    pub embedding: ProviderConfig,

    /// Vector store connection and collection settings
    pub vector_store: VectorStoreConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config file from its default location
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_file(config_file_path()?)
    }

    /// Write the config to its default location
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Write the config as TOML, creating parent directories as needed
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            message: e.to_string(),
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::FileWriteError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(path, content).map_err(|e| ConfigError::FileWriteError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(self) -> Result<Self, ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Embedding provider
        if let Some(provider) = lookup("GAT_EMBEDDING_PROVIDER") {
            self.embedding.provider = provider;
        }
        if let Some(model) = lookup("GAT_EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        let key_var = match self.embedding.provider.to_lowercase().as_str() {
            "gemini" => "GEMINI_API_KEY",
            _ => "OPENAI_API_KEY",
        };
        if let Some(key) = lookup(key_var) {
            self.embedding.api_key = key;
        }

        // Qdrant
        if let Some(mode) = lookup("GAT_STORE_MODE") {
            self.vector_store.mode = mode.parse()?;
        }
        if let Some(url) = lookup("QDRANT_URL") {
            self.vector_store.address = url;
        }
        if let Some(port) = lookup("QDRANT_PORT") {
            let parsed = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "QDRANT_PORT".to_string(),
                value: port,
            })?;
            self.vector_store.port = Some(parsed);
        }
        if let Some(key) = lookup("QDRANT_API_KEY") {
            self.vector_store.api_key = Some(key).filter(|k| !k.is_empty());
        }
        if let Some(collection) = lookup("GAT_COLLECTION") {
            self.vector_store.collection = collection;
        }

        // Logging
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }

        self.validate()?;
        Ok(self)
    }

    /// Check values that serde cannot reject on its own
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vector_store.collection.trim().is_empty() {
            return Err(ConfigError::MissingRequired(
                "vector_store.collection".to_string(),
            ));
        }
        if self.vector_store.dimension == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "vector_store.dimension".to_string(),
                value: "0".to_string(),
            });
        }
        if self.embedding.dimension == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "embedding.dimension".to_string(),
                value: "0".to_string(),
            });
        }
        if self.vector_store.mode == StoreMode::External
            && self.vector_store.address.trim().is_empty()
        {
            return Err(ConfigError::MissingRequired(
                "vector_store.address".to_string(),
            ));
        }
        Ok(())
    }
}

/// Embedding provider configuration
///
/// `provider` stays a plain string so that an unknown vendor is reported
/// by the provider factory instead of failing the whole config parse.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider kind ("openai" or "gemini")
    pub provider: String,

    /// API key for the provider
    pub api_key: String,

    /// Embedding model identifier
    #[serde(alias = "default_model")]
    pub model: String,

    /// Output dimension override (defaults to the model's native size)
    pub dimension: Option<usize>,

    /// API base URL override (for proxies or compatible APIs)
    pub base_url: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            api_key: String::new(),
            model: "text-embedding-3-small".to_string(),
            dimension: None,
            base_url: None,
            timeout_secs: 30,
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("dimension", &self.dimension)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Chat model section of the config file
///
/// Nothing in gat talks to a chat model yet; the section is parsed and
/// written back unchanged.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatProviderConfig {
    pub provider: String,
    pub api_key: String,
    pub default_model: String,
}

impl Default for ChatProviderConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            api_key: String::new(),
            default_model: "gpt-4o-mini".to_string(),
        }
    }
}

impl std::fmt::Debug for ChatProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatProviderConfig")
            .field("provider", &self.provider)
            .field("api_key", &redact(&self.api_key))
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// How the vector store is provided
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreMode {
    /// Local instance on the default address, data under `~/.gat/qdrant`
    Bundled,
    /// Instance at the configured address
    #[default]
    External,
    /// No vector store; memory-backed features are off
    Disabled,
}

impl std::str::FromStr for StoreMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bundled" => Ok(Self::Bundled),
            "external" => Ok(Self::External),
            "disabled" => Ok(Self::Disabled),
            _ => Err(ConfigError::InvalidValue {
                key: "GAT_STORE_MODE".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for StoreMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bundled => write!(f, "bundled"),
            Self::External => write!(f, "external"),
            Self::Disabled => write!(f, "disabled"),
        }
    }
}

/// Vector store configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreConfig {
    /// Store mode
    pub mode: StoreMode,

    /// Qdrant gRPC address, with or without a port
    pub address: String,

    /// Port appended when `address` carries none
    pub port: Option<u16>,

    /// Qdrant API key
    pub api_key: Option<String>,

    /// Collection name
    pub collection: String,

    /// Vector dimension; must match the embedding provider when set
    pub dimension: Option<usize>,

    /// Distance metric used when creating the collection
    pub distance: DistanceMetric,

    /// Timeout for the pre-flight health check in seconds
    pub health_timeout_secs: u64,

    /// Timeout budget for connection + collection setup in seconds
    pub ready_timeout_secs: u64,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            mode: StoreMode::External,
            address: "http://localhost".to_string(),
            port: Some(6334),
            api_key: None,
            collection: "gat-py-tools".to_string(),
            dimension: None,
            distance: DistanceMetric::Cosine,
            health_timeout_secs: 2,
            ready_timeout_secs: 10,
        }
    }
}

impl VectorStoreConfig {
    /// Full URL the client should connect to
    pub fn url(&self) -> String {
        match self.mode {
            StoreMode::Bundled => BUNDLED_QDRANT_URL.to_string(),
            StoreMode::External | StoreMode::Disabled => {
                let address = self.address.trim_end_matches('/');
                match self.port {
                    Some(port) if !has_explicit_port(address) => format!("{address}:{port}"),
                    _ => address.to_string(),
                }
            }
        }
    }

    /// Whether the vector store subsystem is active at all
    pub fn is_enabled(&self) -> bool {
        self.mode != StoreMode::Disabled
    }
}

impl std::fmt::Debug for VectorStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStoreConfig")
            .field("mode", &self.mode)
            .field("address", &self.address)
            .field("port", &self.port)
            .field("api_key", &self.api_key.as_deref().map(redact))
            .field("collection", &self.collection)
            .field("dimension", &self.dimension)
            .field("distance", &self.distance)
            .field("health_timeout_secs", &self.health_timeout_secs)
            .field("ready_timeout_secs", &self.ready_timeout_secs)
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,

    /// Include file/line in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_location: false,
        }
    }
}

/// `~/.gat`
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR_NAME))
        .ok_or(ConfigError::NoHomeDirectory)
}

/// `~/.gat/config.toml`
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Data directory for a bundled Qdrant instance
pub fn bundled_data_dir() -> PathBuf {
    config_dir()
        .map(|dir| dir.join("qdrant"))
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Write a default config file unless one already exists
///
/// Returns the path of the config file and whether it was created.
pub fn ensure_config_file() -> Result<(PathBuf, bool), ConfigError> {
    let path = config_file_path()?;
    let created = ensure_config_file_at(&path)?;
    Ok((path, created))
}

/// Write a default config file at `path` unless one already exists
pub fn ensure_config_file_at(path: &Path) -> Result<bool, ConfigError> {
    if path.exists() {
        return Ok(false);
    }
    AppConfig::default().save_to(path)?;
    Ok(true)
}

fn has_explicit_port(address: &str) -> bool {
    let without_scheme = address
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(address);
    let authority = without_scheme.split('/').next().unwrap_or_default();
    authority
        .rsplit_once(':')
        .map(|(_, port)| !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config file {path}: {source}")]
    FileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Failed to serialize config: {message}")]
    SerializeError { message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Could not determine the home directory")]
    NoHomeDirectory,
}
