//! LLM Provider Clients and Abstractions
//!
//! This module provides a unified interface for interacting with the LLM
//! providers that back query rewriting, answer synthesis, and query-time
//! embeddings. Provider-specific implementations hide behind common traits
//! so the query pipeline can work with any supported backend.
//!
//! # Architecture
//!
//! - [`LLMClient`] - chat completion trait (blocking and streaming)
//! - [`Embedder`] - text embedding trait
//! - [`Provider`] - runtime provider selection
//! - [`LLMClientFactory`] - creates clients from the TOML configuration
//!
//! # Supported Providers
//!
//! Enable providers via Cargo features:
//! - `openai` - OpenAI API and compatible endpoints (default)
//! - `ollama` - Local Ollama server

/// Core LLM client and embedder traits, provider selection, factory.
pub mod client;

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "openai")]
pub mod openai;

pub use client::{Embedder, LLMClient, LLMClientFactory, LLMClientFactoryTrait, Provider};
