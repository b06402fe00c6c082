//! # docqa-server
//!
//! A citation-aware RAG chat server. It loads a prebuilt vector index from
//! disk, answers questions over it through a configurable query pipeline,
//! and streams grounded answers with numbered source citations to a web UI.
//!
//! ## Overview
//!
//! docqa can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `docqa-server` binary
//! 2. **As a library** - Import the query pipeline into your own project
//!
//! ## Pipeline
//!
//! ```text
//! question ──► HyDE transform ──► retrieve ──► post-process ──► synthesize
//!              (optional)         (vector      (node           (citation or
//!                                  index)       expander)       plain QA)
//! ```
//!
//! Which stages run is decided entirely by `docqa.toml`; see
//! [`query::build_query_engine`].
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use docqa::{config::AppConfig, index::{Retriever, VectorIndex}};
//! use docqa::llm::LLMClientFactory;
//! use docqa::query::{build_query_engine, QueryBundle};
//! use std::sync::Arc;
//!
//! let config = AppConfig::load("docqa.toml")?;
//! let index = Arc::new(VectorIndex::load(&config.index.dir)?);
//! let factory = LLMClientFactory::from_config(&config)?;
//!
//! let llm = Arc::from(factory.create_client().await?);
//! let embedder = Arc::from(factory.create_embedder().await?);
//! let retriever = Retriever::new(index, embedder);
//!
//! let engine = build_query_engine(&config, retriever, llm)?;
//! let response = engine.query(&QueryBundle::new("What is HyDE?")).await?;
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `openai` | OpenAI API and compatible endpoints (default) |
//! | `ollama` | Local Ollama server |
//! | `ui` | Embedded web chat front-end (default) |
//!
//! ## Modules
//!
//! - [`api`] - HTTP handlers and routes (chat SSE, feedback, sessions)
//! - [`config`] - TOML configuration with hot reload
//! - [`index`] - persisted vector index and retriever
//! - [`llm`] - LLM and embedding provider clients
//! - [`query`] - HyDE transform, post-processors, query engines
//! - [`session`] - chat transcripts and feedback persistence
//! - [`types`] - common types and error handling

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Configuration utilities (TOML, hot reload).
pub mod config;
/// Persisted vector index and retrieval.
pub mod index;
/// LLM provider clients and abstractions.
pub mod llm;
/// Query transforms, post-processors, and engines.
pub mod query;
/// Chat sessions and feedback.
pub mod session;
/// Core types (requests, responses, errors).
pub mod types;
/// Embedded web UI assets.
#[cfg(feature = "ui")]
pub mod ui;

// Re-export commonly used types
pub use api::build_router;
pub use config::{AppConfig, ConfigManager};
pub use index::{Retriever, VectorIndex};
pub use llm::{Embedder, LLMClient, LLMClientFactory, LLMClientFactoryTrait, Provider};
pub use query::{build_query_engine, QueryBundle, QueryEngine};
pub use session::{FeedbackStore, SessionStore};
pub use types::{AppError, Result};

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// TOML configuration with hot-reload support
    pub config_manager: Arc<ConfigManager>,
    /// The loaded vector index
    pub index: Arc<VectorIndex>,
    /// LLM client factory (config-based, swappable for tests)
    pub llm_factory: Arc<dyn LLMClientFactoryTrait>,
    /// Active chat sessions
    pub sessions: Arc<SessionStore>,
    /// Feedback store
    pub feedback: Arc<FeedbackStore>,
}
