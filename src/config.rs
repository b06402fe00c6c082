//! TOML-based configuration for docqa-server.
//!
//! This module provides declarative configuration for the server, the
//! persisted index, the LLM provider, and the query pipeline via a TOML
//! file (`docqa.toml`).
//!
//! # Hot Reloading
//!
//! Configuration changes are automatically detected and applied at runtime.
//! Use `ConfigManager` for thread-safe access to the current configuration.
//! Query and citation settings take effect on the next chat request; server
//! address and index directory changes require a restart.

use arc_swap::ArcSwap;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Root configuration structure loaded from docqa.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    pub index: IndexConfig,

    pub llm: LlmConfig,

    #[serde(default)]
    pub query: QueryConfig,

    #[serde(default)]
    pub citation: CitationConfig,

    #[serde(default)]
    pub feedback: FeedbackConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

// ============= Index Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Directory containing the persisted index (docstore.json + vectors.json)
    pub dir: PathBuf,

    /// Description of the indexed corpus, shown in the UI greeting
    #[serde(default = "default_app_description")]
    pub app_description: String,
}

fn default_app_description() -> String {
    "the indexed documents".to_string()
}

// ============= LLM Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum LlmConfig {
    OpenAI {
        /// Environment variable containing the API key
        #[serde(default = "default_openai_key_env")]
        api_key_env: String,

        #[serde(default = "default_openai_base")]
        api_base: String,

        #[serde(default = "default_openai_model")]
        model: String,

        #[serde(default = "default_openai_embedding_model")]
        embedding_model: String,

        #[serde(default = "default_temperature")]
        temperature: f32,
    },
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,

        model: String,

        embedding_model: String,
    },
}

fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_openai_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_temperature() -> f32 {
    0.0
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

impl LlmConfig {
    /// The synthesis model identifier for display purposes
    pub fn model_name(&self) -> &str {
        match self {
            LlmConfig::OpenAI { model, .. } => model,
            LlmConfig::Ollama { model, .. } => model,
        }
    }
}

// ============= Query Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Rewrite queries through a hypothetical-document (HyDE) transform
    #[serde(default)]
    pub enable_hyde: bool,

    /// Include the original query alongside the hypothetical passage
    /// when building the retrieval embedding
    #[serde(default = "default_true")]
    pub hyde_include_original: bool,

    /// Widen each retrieved node with its neighboring chunks
    #[serde(default)]
    pub enable_node_expander: bool,

    /// Number of nodes to retrieve per query
    #[serde(default = "default_similarity_top_k")]
    pub similarity_top_k: usize,

    /// Minimum cosine similarity for a node to be retrieved
    #[serde(default)]
    pub similarity_threshold: f32,
}

fn default_true() -> bool {
    true
}

fn default_similarity_top_k() -> usize {
    3
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            enable_hyde: false,
            hyde_include_original: default_true(),
            enable_node_expander: false,
            similarity_top_k: default_similarity_top_k(),
            similarity_threshold: 0.0,
        }
    }
}

// ============= Citation Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationConfig {
    /// Attribute answer spans to numbered source passages
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Size of each citation chunk in characters
    #[serde(default = "default_citation_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between adjacent citation chunks in characters
    #[serde(default = "default_citation_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Path to a custom citation QA template. Uses the built-in template
    /// when unset. The template must contain {context_str} and {query_str}.
    pub qa_template_path: Option<PathBuf>,
}

fn default_citation_chunk_size() -> usize {
    512
}

fn default_citation_chunk_overlap() -> usize {
    20
}

impl Default for CitationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            chunk_size: default_citation_chunk_size(),
            chunk_overlap: default_citation_chunk_overlap(),
            qa_template_path: None,
        }
    }
}

// ============= Feedback Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// JSONL file where feedback records are appended
    #[serde(default = "default_feedback_path")]
    pub path: PathBuf,
}

fn default_feedback_path() -> PathBuf {
    PathBuf::from("./data/feedback.jsonl")
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            path: default_feedback_path(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),

    #[error("Watch error: {0}")]
    WatchError(#[from] notify::Error),
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration for internal consistency and env var availability
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let LlmConfig::OpenAI { api_key_env, .. } = &self.llm {
            std::env::var(api_key_env)
                .map_err(|_| ConfigError::MissingEnvVar(api_key_env.clone()))?;
        }

        if self.query.similarity_top_k == 0 {
            return Err(ConfigError::ValidationError(
                "query.similarity_top_k must be greater than zero".to_string(),
            ));
        }

        if self.citation.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "citation.chunk_size must be greater than zero".to_string(),
            ));
        }

        if self.citation.chunk_overlap >= self.citation.chunk_size {
            return Err(ConfigError::ValidationError(format!(
                "citation.chunk_overlap ({}) must be smaller than citation.chunk_size ({})",
                self.citation.chunk_overlap, self.citation.chunk_size
            )));
        }

        if let Some(ref template_path) = self.citation.qa_template_path {
            if !template_path.exists() {
                return Err(ConfigError::ValidationError(format!(
                    "citation.qa_template_path does not exist: {}",
                    template_path.display()
                )));
            }
        }

        Ok(())
    }

    /// Resolve the API key for the configured provider, if it needs one
    pub fn api_key(&self) -> Result<Option<String>, ConfigError> {
        match &self.llm {
            LlmConfig::OpenAI { api_key_env, .. } => std::env::var(api_key_env)
                .map(Some)
                .map_err(|_| ConfigError::MissingEnvVar(api_key_env.clone())),
            LlmConfig::Ollama { .. } => Ok(None),
        }
    }

    /// Greeting message seeded into new chat sessions
    pub fn greeting(&self) -> String {
        format!("Ask me a question about {}!", self.index.app_description)
    }
}

// ============= Hot Reloading Configuration Manager =============

/// Thread-safe configuration manager with hot reloading support
pub struct ConfigManager {
    config: Arc<ArcSwap<AppConfig>>,
    config_path: PathBuf,
    watcher: RwLock<Option<RecommendedWatcher>>,
}

impl ConfigManager {
    /// Create a new configuration manager and load the initial config
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        // Convert to absolute path for reliable file watching
        let path = path.as_ref();
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(ConfigError::ReadError)?
                .join(path)
        };

        let config = AppConfig::load(&path)?;

        Ok(Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: path,
            watcher: RwLock::new(None),
        })
    }

    /// Create a config manager directly from a config (useful for testing).
    /// This won't have file watching capabilities.
    pub fn from_config(config: AppConfig) -> Self {
        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: PathBuf::from("test-config.toml"),
            watcher: RwLock::new(None),
        }
    }

    /// Get the current configuration (lockless read)
    pub fn config(&self) -> Arc<AppConfig> {
        self.config.load_full()
    }

    /// Manually reload the configuration from disk
    pub fn reload(&self) -> Result<(), ConfigError> {
        info!("Reloading configuration from {:?}", self.config_path);

        let new_config = AppConfig::load(&self.config_path)?;
        self.config.store(Arc::new(new_config));

        info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Start watching for configuration file changes
    pub fn start_watching(&self) -> Result<(), ConfigError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();

        let config_path = self.config_path.clone();
        let config_arc = Arc::clone(&self.config);

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        // Send reload signal (debounced in the receiver)
                        let _ = tx.send(());
                    }
                }
                Err(e) => {
                    error!("Config watcher error: {:?}", e);
                }
            }
        })?;

        // Watch the config file's parent directory
        if let Some(parent) = self.config_path.parent() {
            watcher.watch(parent, RecursiveMode::NonRecursive)?;
        }

        *self.watcher.write() = Some(watcher);

        tokio::spawn(async move {
            let mut last_reload = std::time::Instant::now();
            let debounce_duration = Duration::from_millis(500);

            while rx.recv().await.is_some() {
                if last_reload.elapsed() < debounce_duration {
                    continue;
                }

                // Wait a bit for file write to complete
                tokio::time::sleep(Duration::from_millis(100)).await;

                match AppConfig::load(&config_path) {
                    Ok(new_config) => {
                        config_arc.store(Arc::new(new_config));
                        info!("Configuration hot-reloaded successfully");
                        last_reload = std::time::Instant::now();
                    }
                    Err(e) => {
                        warn!(
                            "Failed to hot-reload config: {}. Keeping previous config.",
                            e
                        );
                    }
                }
            }
        });

        info!("Configuration hot-reload watcher started");
        Ok(())
    }

    /// Stop watching for configuration changes
    pub fn stop_watching(&self) {
        *self.watcher.write() = None;
        info!("Configuration hot-reload watcher stopped");
    }
}
