//! Query transforms.
//!
//! A transform turns the raw user question into a [`QueryBundle`]: the
//! question itself plus the strings whose embeddings drive retrieval.

use std::sync::Arc;

use async_trait::async_trait;

use crate::llm::LLMClient;
use crate::query::prompts::HYDE_PROMPT;
use crate::types::Result;

/// A query together with the strings used for retrieval embedding.
///
/// `embedding_strs` is never empty. For an untransformed query it is the
/// query itself; after a HyDE transform the hypothetical passage comes
/// first, optionally followed by the original query.
#[derive(Debug, Clone)]
pub struct QueryBundle {
    pub query_str: String,
    pub embedding_strs: Vec<String>,
}

impl QueryBundle {
    /// Bundle a query without any transform.
    pub fn new(query: impl Into<String>) -> Self {
        let query = query.into();
        Self {
            embedding_strs: vec![query.clone()],
            query_str: query,
        }
    }
}

/// Rewrites a query before retrieval.
#[async_trait]
pub trait QueryTransform: Send + Sync {
    async fn transform(&self, query: &str) -> Result<QueryBundle>;
}

/// Hypothetical Document Embedding (HyDE) transform.
///
/// Asks the LLM for a hypothetical answer passage and retrieves with that
/// passage's embedding, which tends to land closer to relevant corpus
/// chunks than the raw question does. The hypothetical passage is always
/// `embedding_strs[0]`, so callers can surface it to the user as the
/// ungrounded answer.
pub struct HydeTransform {
    llm: Arc<dyn LLMClient>,
    include_original: bool,
}

impl HydeTransform {
    pub fn new(llm: Arc<dyn LLMClient>, include_original: bool) -> Self {
        Self {
            llm,
            include_original,
        }
    }
}

#[async_trait]
impl QueryTransform for HydeTransform {
    async fn transform(&self, query: &str) -> Result<QueryBundle> {
        let prompt = HYDE_PROMPT.replace("{query_str}", query);
        let hypothetical = self.llm.generate(&prompt).await?;

        let mut embedding_strs = vec![hypothetical];
        if self.include_original {
            embedding_strs.push(query.to_string());
        }

        Ok(QueryBundle {
            query_str: query.to_string(),
            embedding_strs,
        })
    }
}
