//! Citation-aware answer synthesis.
//!
//! The citation engine re-splits retrieved nodes into small, numbered
//! "citation chunks" before synthesis. The QA prompt presents each chunk as
//! `Source N:` and instructs the model to cite sources as `[N]`, so answer
//! spans can be traced back to specific passages. Chunk size controls how
//! granular citations are.

use std::sync::Arc;

use futures::StreamExt;
use text_splitter::{Characters, ChunkConfig, TextSplitter};

use crate::index::Retriever;
use crate::llm::LLMClient;
use crate::query::engine::{QueryEngine, QueryResponse};
use crate::query::postprocessor::NodePostprocessor;
use crate::query::prompts::PromptTemplate;
use crate::query::transform::QueryBundle;
use crate::types::{AppError, MetadataMode, Result, ScoredNode, SourceAttribution};

/// Tunables for the citation engine.
#[derive(Debug, Clone)]
pub struct CitationOptions {
    /// Number of nodes to retrieve per query.
    pub similarity_top_k: usize,
    /// Minimum similarity for a node to be retrieved.
    pub similarity_threshold: f32,
    /// Size of each citation chunk in characters.
    pub citation_chunk_size: usize,
    /// Overlap between adjacent citation chunks in characters.
    pub citation_chunk_overlap: usize,
    /// Metadata rendering for prompt context.
    pub metadata_mode: MetadataMode,
    /// QA template; must instruct the model to cite numbered sources.
    pub qa_template: PromptTemplate,
}

impl Default for CitationOptions {
    fn default() -> Self {
        Self {
            similarity_top_k: 3,
            similarity_threshold: 0.0,
            citation_chunk_size: 512,
            citation_chunk_overlap: 20,
            metadata_mode: MetadataMode::default(),
            qa_template: PromptTemplate::citation_qa(),
        }
    }
}

/// Re-splits nodes into numbered citation chunks.
pub struct CitationSplitter {
    splitter: TextSplitter<Characters>,
}

impl CitationSplitter {
    /// Create a splitter.
    ///
    /// # Errors
    ///
    /// Returns an error when the overlap is not smaller than the chunk size.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        let config = ChunkConfig::new(chunk_size)
            .with_overlap(chunk_overlap)
            .map_err(|e| AppError::Config(format!("Invalid citation chunk config: {}", e)))?;

        Ok(Self {
            splitter: TextSplitter::new(config),
        })
    }

    /// Split nodes into citation chunks with dense 1-based numbering.
    ///
    /// Numbering follows node order, then chunk order within a node, which
    /// is exactly the order chunks appear in the synthesis context.
    pub fn split(&self, nodes: &[ScoredNode], mode: MetadataMode) -> Vec<SourceAttribution> {
        let mut citations = Vec::new();
        let mut number = 1usize;

        for scored in nodes {
            let text = scored.node.text_for(mode);
            for chunk in self.splitter.chunks(&text) {
                citations.push(SourceAttribution {
                    number,
                    node_id: scored.node.id.clone(),
                    score: scored.score,
                    text: chunk.to_string(),
                    title: scored.node.metadata.title.clone(),
                    source: scored.node.metadata.source.clone(),
                });
                number += 1;
            }
        }

        citations
    }
}

/// Render citation chunks as the numbered context block of the QA prompt.
pub fn format_citation_context(citations: &[SourceAttribution]) -> String {
    citations
        .iter()
        .map(|c| format!("Source {}:\n{}", c.number, c.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Query engine that streams answers with numbered source citations.
pub struct CitationQueryEngine {
    retriever: Retriever,
    llm: Arc<dyn LLMClient>,
    postprocessors: Vec<Arc<dyn NodePostprocessor>>,
    options: CitationOptions,
    splitter: CitationSplitter,
}

impl CitationQueryEngine {
    pub fn new(
        retriever: Retriever,
        llm: Arc<dyn LLMClient>,
        postprocessors: Vec<Arc<dyn NodePostprocessor>>,
        options: CitationOptions,
    ) -> Result<Self> {
        let splitter =
            CitationSplitter::new(options.citation_chunk_size, options.citation_chunk_overlap)?;

        Ok(Self {
            retriever,
            llm,
            postprocessors,
            options,
            splitter,
        })
    }
}

#[async_trait::async_trait]
impl QueryEngine for CitationQueryEngine {
    async fn query(&self, bundle: &QueryBundle) -> Result<QueryResponse> {
        let mut nodes = self
            .retriever
            .retrieve(
                bundle,
                self.options.similarity_top_k,
                self.options.similarity_threshold,
            )
            .await?;

        for postprocessor in &self.postprocessors {
            let before = nodes.len();
            nodes = postprocessor.postprocess(nodes, bundle)?;
            tracing::debug!(
                postprocessor = postprocessor.name(),
                nodes_in = before,
                nodes_out = nodes.len(),
                "Post-processed retrieved nodes"
            );
        }

        let citations = self.splitter.split(&nodes, self.options.metadata_mode);
        let context = format_citation_context(&citations);
        let prompt = self.options.qa_template.format(&context, &bundle.query_str);

        let stream = self.llm.stream(&prompt).await?;

        Ok(QueryResponse {
            stream: stream.boxed(),
            sources: citations,
        })
    }
}
