//! Configuration management for the CourseAlign retrieval core.
//!
//! This module handles loading configuration from TOML files and
//! environment variables, with sensible defaults for all settings.

use crate::core::error::{CourseAlignError, Result};
use crate::core::types::SimilarityMetric;
use crate::core::xdg::XdgDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Smallest accepted chunk window, in words
pub const MIN_CHUNK_WORDS: usize = 600;

/// Largest accepted chunk window, in words
pub const MAX_CHUNK_WORDS: usize = 900;

/// Upper bound on embedding request attempts
pub const MAX_RETRY_ATTEMPTS: u32 = 10;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub indexing: IndexingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Course registry keyed by course code
    #[serde(default)]
    pub courses: BTreeMap<String, CourseEntry>,
}

/// Indexing configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexingConfig {
    /// Words per chunk window
    #[serde(default = "default_chunk_words")]
    pub chunk_words: usize,

    /// Words shared by consecutive chunks
    #[serde(default = "default_overlap_words")]
    pub overlap_words: usize,

    /// Maximum source document size in MB
    #[serde(default = "default_max_document_size")]
    pub max_document_size_mb: usize,
}

/// Which embedding backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// OpenAI-compatible `/embeddings` endpoint
    #[default]
    OpenAi,
    /// Local feature hashing, no network
    Hashing,
}

impl fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbeddingProvider::OpenAi => write!(f, "openai"),
            EmbeddingProvider::Hashing => write!(f, "hashing"),
        }
    }
}

impl FromStr for EmbeddingProvider {
    type Err = CourseAlignError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(EmbeddingProvider::OpenAi),
            "hashing" => Ok(EmbeddingProvider::Hashing),
            other => Err(CourseAlignError::ConfigError(format!(
                "Unknown embedding provider '{other}' (expected 'openai' or 'hashing')"
            ))),
        }
    }
}

/// Embedding provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProvider,

    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for both indexing and querying
    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Texts per provider request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Total attempts for transient failures
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Base delay for exponential backoff
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Vector dimension of the hashing provider
    #[serde(default = "default_hashing_dimension")]
    pub hashing_dimension: usize,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Root directory for collection storage
    #[serde(default = "default_index_dir")]
    pub index_dir: PathBuf,

    /// Refuse to build collections missing from `[courses]`
    #[serde(default)]
    pub require_registered_courses: bool,
}

/// Search configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Default number of results to return
    #[serde(default = "default_k")]
    pub default_k: usize,

    /// Maximum query string length, in characters
    #[serde(default = "default_max_query_length")]
    pub max_query_length: usize,

    /// Similarity function recorded into newly built indexes
    #[serde(default)]
    pub metric: SimilarityMetric,
}

/// Limits configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitsConfig {
    /// Upper bound on one build, checked before the swap
    #[serde(default = "default_build_timeout")]
    pub build_timeout_sec: u64,
}

/// One entry of the course registry
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CourseEntry {
    #[serde(default)]
    pub title: Option<String>,
}

// Default value functions
fn default_chunk_words() -> usize {
    750
}

fn default_overlap_words() -> usize {
    150
}

fn default_max_document_size() -> usize {
    200
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_batch_size() -> usize {
    100
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}

fn default_hashing_dimension() -> usize {
    256
}

fn default_index_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_k() -> usize {
    12
}

fn default_max_query_length() -> usize {
    32_000
}

fn default_build_timeout() -> u64 {
    1800
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            chunk_words: default_chunk_words(),
            overlap_words: default_overlap_words(),
            max_document_size_mb: default_max_document_size(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            batch_size: default_batch_size(),
            timeout_secs: default_timeout_secs(),
            retry_attempts: default_retry_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            hashing_dimension: default_hashing_dimension(),
        }
    }
}

impl EmbeddingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            index_dir: default_index_dir(),
            require_registered_courses: false,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_k: default_k(),
            max_query_length: default_max_query_length(),
            metric: SimilarityMetric::default(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            build_timeout_sec: default_build_timeout(),
        }
    }
}

impl LimitsConfig {
    pub fn build_timeout(&self) -> Duration {
        Duration::from_secs(self.build_timeout_sec)
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            CourseAlignError::ConfigError(format!("Failed to read config file: {e}"))
        })?;

        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load config with priority: env vars > TOML > defaults
    pub fn load() -> Result<Self> {
        let xdg = XdgDirs::new();
        Self::load_with_xdg(&xdg)
    }

    /// Load config with explicit XDG directories
    ///
    /// Priority order:
    /// 1. COURSEALIGN_CONFIG env var
    /// 2. XDG config file (~/.config/coursealign/config.toml)
    /// 3. ./coursealign.toml in the working directory
    /// 4. Defaults
    pub fn load_with_xdg(xdg: &XdgDirs) -> Result<Self> {
        let mut config = if let Ok(config_path) = env::var("COURSEALIGN_CONFIG") {
            Self::from_file(config_path)?
        } else {
            let xdg_config = xdg.config_file();
            if xdg_config.exists() {
                Self::from_file(xdg_config)?
            } else if Path::new("coursealign.toml").exists() {
                Self::from_file("coursealign.toml")?
            } else {
                Self::default()
            }
        };

        // Default storage path lives under the XDG data directory
        if env::var("COURSEALIGN_DATA_DIR").is_err()
            && config.storage.index_dir == default_index_dir()
        {
            config.storage.index_dir = xdg.data_dir.clone();
        }

        config.merge_env()?;
        config.validate()?;

        Ok(config)
    }

    /// Merge configuration with environment variables
    ///
    /// Unparseable numeric values are ignored; an unknown provider
    /// name is an error since silently falling back would send the
    /// corpus to a different backend.
    pub fn merge_env(&mut self) -> Result<()> {
        if let Ok(chunk_words) = env::var("COURSEALIGN_CHUNK_WORDS") {
            if let Ok(words) = chunk_words.parse() {
                self.indexing.chunk_words = words;
            }
        }
        if let Ok(overlap) = env::var("COURSEALIGN_OVERLAP_WORDS") {
            if let Ok(words) = overlap.parse() {
                self.indexing.overlap_words = words;
            }
        }

        if let Ok(data_dir) = env::var("COURSEALIGN_DATA_DIR") {
            self.storage.index_dir = PathBuf::from(data_dir);
        }

        if let Ok(provider) = env::var("COURSEALIGN_EMBEDDING_PROVIDER") {
            self.embedding.provider = provider.parse()?;
        }
        if let Ok(model) = env::var("COURSEALIGN_EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        if let Ok(url) = env::var("COURSEALIGN_EMBEDDING_URL") {
            self.embedding.base_url = url;
        }

        if let Ok(default_k) = env::var("COURSEALIGN_DEFAULT_K") {
            if let Ok(k) = default_k.parse() {
                self.search.default_k = k;
            }
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        validate_window(self.indexing.chunk_words, self.indexing.overlap_words)?;

        if self.indexing.max_document_size_mb == 0 {
            return Err(CourseAlignError::ConfigError(
                "Max document size must be non-zero".to_string(),
            ));
        }

        if self.embedding.batch_size == 0 {
            return Err(CourseAlignError::ConfigError(
                "Embedding batch size must be non-zero".to_string(),
            ));
        }

        if self.embedding.retry_attempts == 0
            || self.embedding.retry_attempts > MAX_RETRY_ATTEMPTS
        {
            return Err(CourseAlignError::ConfigError(format!(
                "Embedding retry attempts must be between 1 and {MAX_RETRY_ATTEMPTS}"
            )));
        }

        if self.embedding.timeout_secs == 0 {
            return Err(CourseAlignError::ConfigError(
                "Embedding timeout must be non-zero".to_string(),
            ));
        }

        if self.embedding.provider == EmbeddingProvider::OpenAi {
            url::Url::parse(&self.embedding.base_url).map_err(|e| {
                CourseAlignError::ConfigError(format!(
                    "Invalid embedding base_url '{}': {e}",
                    self.embedding.base_url
                ))
            })?;
        }

        if self.embedding.provider == EmbeddingProvider::Hashing
            && self.embedding.hashing_dimension == 0
        {
            return Err(CourseAlignError::ConfigError(
                "Hashing dimension must be non-zero".to_string(),
            ));
        }

        if self.search.default_k == 0 {
            return Err(CourseAlignError::ConfigError(
                "Default k must be non-zero".to_string(),
            ));
        }

        if self.search.max_query_length == 0 {
            return Err(CourseAlignError::ConfigError(
                "Max query length must be non-zero".to_string(),
            ));
        }

        if self.limits.build_timeout_sec == 0 {
            return Err(CourseAlignError::ConfigError(
                "Build timeout must be non-zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Registry title of a course, if the course is registered
    pub fn course_title(&self, course_code: &str) -> Option<&str> {
        self.courses
            .get(course_code)
            .and_then(|entry| entry.title.as_deref())
    }

    pub fn is_registered(&self, course_code: &str) -> bool {
        self.courses.contains_key(course_code)
    }

    /// Log configuration (redacting sensitive values)
    pub fn log_config(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Chunk words: {}", self.indexing.chunk_words);
        tracing::info!("  Overlap words: {}", self.indexing.overlap_words);
        tracing::info!(
            "  Max document size: {} MB",
            self.indexing.max_document_size_mb
        );
        tracing::info!("  Embedding provider: {}", self.embedding.provider);
        tracing::info!("  Embedding model: {}", self.embedding.model);
        tracing::info!("  Embedding URL: {}", self.embedding.base_url);
        tracing::info!("  API key env: {}", self.embedding.api_key_env);
        tracing::info!("  Batch size: {}", self.embedding.batch_size);
        tracing::info!("  Index dir: {:?}", self.storage.index_dir);
        tracing::info!("  Default k: {}", self.search.default_k);
        tracing::info!("  Metric: {}", self.search.metric);
        tracing::info!("  Build timeout: {}s", self.limits.build_timeout_sec);
        tracing::info!("  Registered courses: {}", self.courses.len());
    }
}

/// Check a chunk window and overlap pair
///
/// Shared by config validation and per-build overrides.
pub fn validate_window(chunk_words: usize, overlap_words: usize) -> Result<()> {
    if !(MIN_CHUNK_WORDS..=MAX_CHUNK_WORDS).contains(&chunk_words) {
        return Err(CourseAlignError::ConfigError(format!(
            "Chunk words must be between {MIN_CHUNK_WORDS} and {MAX_CHUNK_WORDS}, got {chunk_words}"
        )));
    }

    if overlap_words >= chunk_words {
        return Err(CourseAlignError::ConfigError(format!(
            "Overlap ({overlap_words}) must be less than chunk words ({chunk_words})"
        )));
    }

    Ok(())
}
