//! LLM client abstractions and provider management.

use crate::config::{AppConfig, LlmConfig};
use crate::types::{AppError, Result};
use async_trait::async_trait;

/// Generic LLM client trait for provider abstraction
///
/// All LLM providers implement this trait, allowing for easy swapping
/// between providers without changing application code.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a completion from a prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate with system prompt
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Stream a completion
    async fn stream(
        &self,
        prompt: &str,
    ) -> Result<Box<dyn futures::Stream<Item = Result<String>> + Send + Unpin>>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Text embedding trait for query-time embeddings
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts, preserving input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding model name/identifier
    fn model_name(&self) -> &str;
}

/// Provider enum for runtime selection
#[derive(Debug, Clone)]
pub enum Provider {
    /// OpenAI API provider (including compatible endpoints)
    OpenAI {
        api_key: String,
        api_base: String,
        model: String,
        embedding_model: String,
        temperature: f32,
    },

    /// Ollama local LLM provider
    Ollama {
        base_url: String,
        model: String,
        embedding_model: String,
    },
}

impl Provider {
    /// Create a chat client instance for this provider
    ///
    /// # Errors
    ///
    /// Returns an error if the provider's feature is not enabled or the
    /// connection fails.
    pub async fn create_client(&self) -> Result<Box<dyn LLMClient>> {
        match self {
            #[cfg(feature = "openai")]
            Provider::OpenAI {
                api_key,
                api_base,
                model,
                embedding_model,
                temperature,
            } => Ok(Box::new(super::openai::OpenAIClient::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
                embedding_model.clone(),
                *temperature,
            ))),

            #[cfg(feature = "ollama")]
            Provider::Ollama {
                base_url,
                model,
                embedding_model,
            } => Ok(Box::new(
                super::ollama::OllamaClient::new(
                    base_url.clone(),
                    model.clone(),
                    embedding_model.clone(),
                )
                .await?,
            )),

            #[allow(unreachable_patterns)]
            _ => Err(AppError::Config(format!(
                "Provider '{}' not enabled. Check feature flags.",
                self.name()
            ))),
        }
    }

    /// Create an embedder instance for this provider
    ///
    /// # Errors
    ///
    /// Returns an error if the provider's feature is not enabled or the
    /// connection fails.
    pub async fn create_embedder(&self) -> Result<Box<dyn Embedder>> {
        match self {
            #[cfg(feature = "openai")]
            Provider::OpenAI {
                api_key,
                api_base,
                model,
                embedding_model,
                temperature,
            } => Ok(Box::new(super::openai::OpenAIClient::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
                embedding_model.clone(),
                *temperature,
            ))),

            #[cfg(feature = "ollama")]
            Provider::Ollama {
                base_url,
                model,
                embedding_model,
            } => Ok(Box::new(
                super::ollama::OllamaClient::new(
                    base_url.clone(),
                    model.clone(),
                    embedding_model.clone(),
                )
                .await?,
            )),

            #[allow(unreachable_patterns)]
            _ => Err(AppError::Config(format!(
                "Provider '{}' not enabled. Check feature flags.",
                self.name()
            ))),
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAI { .. } => "OpenAI",
            Provider::Ollama { .. } => "Ollama",
        }
    }

    /// The synthesis model identifier
    pub fn model(&self) -> &str {
        match self {
            Provider::OpenAI { model, .. } => model,
            Provider::Ollama { model, .. } => model,
        }
    }
}

/// Factory trait for creating LLM clients and embedders
///
/// Allows swapping the real provider-backed factory for a mock in tests.
#[async_trait]
pub trait LLMClientFactoryTrait: Send + Sync {
    /// Create a chat client
    async fn create_client(&self) -> Result<Box<dyn LLMClient>>;

    /// Create an embedder
    async fn create_embedder(&self) -> Result<Box<dyn Embedder>>;

    /// The configured provider
    fn provider(&self) -> &Provider;
}

/// Configuration-based client factory
///
/// Resolves the provider from the `[llm]` section of the TOML config,
/// including the API key from the configured environment variable, and
/// creates clients/embedders on demand.
pub struct LLMClientFactory {
    provider: Provider,
}

impl LLMClientFactory {
    /// Create a new factory with the specified provider
    pub fn new(provider: Provider) -> Self {
        Self { provider }
    }

    /// Create a factory from the application configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the API key environment variable is not set.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let provider = match &config.llm {
            LlmConfig::OpenAI {
                api_key_env,
                api_base,
                model,
                embedding_model,
                temperature,
            } => {
                let api_key = std::env::var(api_key_env).map_err(|_| {
                    AppError::Config(format!(
                        "Environment variable '{}' is not set",
                        api_key_env
                    ))
                })?;
                Provider::OpenAI {
                    api_key,
                    api_base: api_base.clone(),
                    model: model.clone(),
                    embedding_model: embedding_model.clone(),
                    temperature: *temperature,
                }
            }
            LlmConfig::Ollama {
                base_url,
                model,
                embedding_model,
            } => Provider::Ollama {
                base_url: base_url.clone(),
                model: model.clone(),
                embedding_model: embedding_model.clone(),
            },
        };

        Ok(Self { provider })
    }
}

#[async_trait]
impl LLMClientFactoryTrait for LLMClientFactory {
    async fn create_client(&self) -> Result<Box<dyn LLMClient>> {
        self.provider.create_client().await
    }

    async fn create_embedder(&self) -> Result<Box<dyn Embedder>> {
        self.provider.create_embedder().await
    }

    fn provider(&self) -> &Provider {
        &self.provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_name_and_model() {
        let openai = Provider::OpenAI {
            api_key: "test".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            temperature: 0.0,
        };
        assert_eq!(openai.name(), "OpenAI");
        assert_eq!(openai.model(), "gpt-4o-mini");

        let ollama = Provider::Ollama {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
        };
        assert_eq!(ollama.name(), "Ollama");
        assert_eq!(ollama.model(), "llama3.2");
    }

    #[test]
    fn test_factory_from_ollama_config() {
        let config: AppConfig = toml::from_str(
            r#"
[index]
dir = "./data/index"

[llm]
provider = "ollama"
model = "llama3.2"
embedding_model = "nomic-embed-text"
"#,
        )
        .unwrap();

        let factory = LLMClientFactory::from_config(&config).unwrap();
        assert_eq!(factory.provider().name(), "Ollama");
    }

    #[test]
    fn test_factory_missing_api_key_env() {
        let config: AppConfig = toml::from_str(
            r#"
[index]
dir = "./data/index"

[llm]
provider = "openai"
api_key_env = "DOCQA_TEST_KEY_THAT_IS_NOT_SET"
"#,
        )
        .unwrap();

        let result = LLMClientFactory::from_config(&config);
        assert!(result.is_err());
    }
}
