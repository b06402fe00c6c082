//! Shared test doubles for integration tests.
//!
//! Not every test file uses every helper.
#![allow(dead_code)]

use async_trait::async_trait;
use docqa::llm::{Embedder, LLMClient, LLMClientFactoryTrait, Provider};
use docqa::types::{AppError, Node, NodeMetadata, Result};
use futures::stream::{self, StreamExt};

// ============= Mock LLM Client =============

/// Mock LLM client with a fixed response.
pub struct MockLLMClient {
    response: String,
    should_fail: bool,
}

impl MockLLMClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            should_fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            response: String::new(),
            should_fail: true,
        }
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        if self.should_fail {
            return Err(AppError::LLM("Mock LLM failure".to_string()));
        }
        Ok(self.response.clone())
    }

    async fn generate_with_system(&self, _system: &str, _prompt: &str) -> Result<String> {
        if self.should_fail {
            return Err(AppError::LLM("Mock LLM failure".to_string()));
        }
        Ok(self.response.clone())
    }

    async fn stream(
        &self,
        _prompt: &str,
    ) -> Result<Box<dyn futures::Stream<Item = Result<String>> + Send + Unpin>> {
        if self.should_fail {
            return Err(AppError::LLM("Mock LLM failure".to_string()));
        }

        // Split response into chunks for streaming simulation
        let chunks: Vec<String> = self
            .response
            .chars()
            .collect::<Vec<_>>()
            .chunks(5)
            .map(|c| c.iter().collect())
            .collect();

        let stream = stream::iter(chunks.into_iter().map(Ok));
        Ok(Box::new(stream.boxed()))
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

// ============= Mock Embedder =============

/// Deterministic embedder: keyword hits map onto axis-aligned components,
/// with a constant bias so no text embeds to the zero vector.
pub struct MockEmbedder;

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let lower = text.to_lowercase();
        Ok(vec![
            if lower.contains("fox") { 1.0 } else { 0.0 },
            if lower.contains("cat") { 1.0 } else { 0.0 },
            if lower.contains("dog") { 1.0 } else { 0.0 },
            0.1,
        ])
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn model_name(&self) -> &str {
        "mock-embed"
    }
}

// ============= Mock LLM Factory =============

/// Factory producing mock clients; used to isolate API tests from any
/// external LLM service.
pub struct MockLLMFactory {
    provider: Provider,
    response: String,
    should_fail: bool,
}

impl MockLLMFactory {
    pub fn new(response: &str) -> Self {
        Self {
            provider: Provider::Ollama {
                base_url: "http://localhost:11434".to_string(),
                model: "mock".to_string(),
                embedding_model: "mock-embed".to_string(),
            },
            response: response.to_string(),
            should_fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new("")
        }
    }
}

#[async_trait]
impl LLMClientFactoryTrait for MockLLMFactory {
    async fn create_client(&self) -> Result<Box<dyn LLMClient>> {
        if self.should_fail {
            Ok(Box::new(MockLLMClient::failing()))
        } else {
            Ok(Box::new(MockLLMClient::new(&self.response)))
        }
    }

    async fn create_embedder(&self) -> Result<Box<dyn Embedder>> {
        Ok(Box::new(MockEmbedder))
    }

    fn provider(&self) -> &Provider {
        &self.provider
    }
}

// ============= Fixtures =============

/// Build a node compatible with [`MockEmbedder`] vectors.
pub fn node(id: &str, content: &str, embedding: Vec<f32>) -> Node {
    Node {
        id: id.to_string(),
        doc_id: "doc".to_string(),
        content: content.to_string(),
        metadata: NodeMetadata::default(),
        prev_id: None,
        next_id: None,
        embedding: Some(embedding),
    }
}

/// A small corpus matching the [`MockEmbedder`] keyword axes.
pub fn animal_nodes() -> Vec<Node> {
    vec![
        node("fox", "Foxes are small omnivorous canids.", vec![1.0, 0.0, 0.0, 0.1]),
        node("cat", "Cats are independent domestic felines.", vec![0.0, 1.0, 0.0, 0.1]),
        node("dog", "Dogs are loyal domestic canids.", vec![0.0, 0.0, 1.0, 0.1]),
    ]
}

/// Parse an SSE body into (event, data) pairs.
pub fn sse_events(body: &str) -> Vec<(String, serde_json::Value)> {
    let mut events = Vec::new();
    let mut current: Option<String> = None;

    for line in body.lines() {
        if let Some(name) = line.strip_prefix("event:") {
            current = Some(name.trim().to_string());
        } else if let Some(data) = line.strip_prefix("data:") {
            if let Some(name) = current.take() {
                if let Ok(value) = serde_json::from_str(data.trim()) {
                    events.push((name, value));
                }
            }
        }
    }

    events
}
