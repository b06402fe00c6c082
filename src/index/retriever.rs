//! Query-time retrieval against the loaded index.

use std::sync::Arc;

use crate::index::store::VectorIndex;
use crate::llm::Embedder;
use crate::query::transform::QueryBundle;
use crate::types::{AppError, Result, ScoredNode};

/// Pairs the vector index with an embedding client.
///
/// A bundle may carry several embedding strings (e.g. a HyDE hypothetical
/// passage plus the original query); their embeddings are mean-pooled into
/// a single query vector before searching.
#[derive(Clone)]
pub struct Retriever {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    pub fn new(index: Arc<VectorIndex>, embedder: Arc<dyn Embedder>) -> Self {
        Self { index, embedder }
    }

    /// Retrieve the nodes most similar to the query bundle.
    pub async fn retrieve(
        &self,
        bundle: &QueryBundle,
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<ScoredNode>> {
        if bundle.embedding_strs.is_empty() {
            return Err(AppError::InvalidInput(
                "Query bundle has no embedding strings".to_string(),
            ));
        }

        let embeddings = self.embedder.embed_batch(&bundle.embedding_strs).await?;
        let query_embedding = mean_pool(&embeddings)?;

        Ok(self.index.search(&query_embedding, top_k, threshold))
    }

    /// The underlying index.
    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }
}

/// Average a set of equal-length vectors into one.
fn mean_pool(embeddings: &[Vec<f32>]) -> Result<Vec<f32>> {
    let first = embeddings
        .first()
        .ok_or_else(|| AppError::LLM("Embedder returned no vectors".to_string()))?;

    let dims = first.len();
    let mut pooled = vec![0.0f32; dims];

    for embedding in embeddings {
        if embedding.len() != dims {
            return Err(AppError::LLM(format!(
                "Embedder returned mixed dimensions: {} vs {}",
                embedding.len(),
                dims
            )));
        }
        for (acc, value) in pooled.iter_mut().zip(embedding.iter()) {
            *acc += value;
        }
    }

    let count = embeddings.len() as f32;
    for value in pooled.iter_mut() {
        *value /= count;
    }

    Ok(pooled)
}
