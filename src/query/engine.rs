//! Query engines and the configuration-driven engine factory.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;

use crate::config::AppConfig;
use crate::index::Retriever;
use crate::llm::LLMClient;
use crate::query::citation::{CitationOptions, CitationQueryEngine};
use crate::query::postprocessor::{NodeExpander, NodePostprocessor};
use crate::query::prompts::PromptTemplate;
use crate::query::transform::QueryBundle;
use crate::types::{MetadataMode, Result, SourceAttribution};

/// A streaming answer plus the passages that grounded it.
pub struct QueryResponse {
    /// Answer tokens as they arrive from the model.
    pub stream: BoxStream<'static, Result<String>>,
    /// Numbered source passages. Empty when citations are disabled.
    pub sources: Vec<SourceAttribution>,
}

/// Turns a query bundle into a streaming, source-attributed answer.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    async fn query(&self, bundle: &QueryBundle) -> Result<QueryResponse>;
}

/// Plain retrieve-then-synthesize engine, used when citations are disabled.
pub struct RetrieverQueryEngine {
    retriever: Retriever,
    llm: Arc<dyn LLMClient>,
    postprocessors: Vec<Arc<dyn NodePostprocessor>>,
    qa_template: PromptTemplate,
    similarity_top_k: usize,
    similarity_threshold: f32,
    metadata_mode: MetadataMode,
}

impl RetrieverQueryEngine {
    pub fn new(
        retriever: Retriever,
        llm: Arc<dyn LLMClient>,
        postprocessors: Vec<Arc<dyn NodePostprocessor>>,
        qa_template: PromptTemplate,
        similarity_top_k: usize,
        similarity_threshold: f32,
    ) -> Self {
        Self {
            retriever,
            llm,
            postprocessors,
            qa_template,
            similarity_top_k,
            similarity_threshold,
            metadata_mode: MetadataMode::default(),
        }
    }
}

#[async_trait]
impl QueryEngine for RetrieverQueryEngine {
    async fn query(&self, bundle: &QueryBundle) -> Result<QueryResponse> {
        let mut nodes = self
            .retriever
            .retrieve(bundle, self.similarity_top_k, self.similarity_threshold)
            .await?;

        for postprocessor in &self.postprocessors {
            nodes = postprocessor.postprocess(nodes, bundle)?;
        }

        let context = nodes
            .iter()
            .map(|n| n.node.text_for(self.metadata_mode))
            .collect::<Vec<_>>()
            .join("\n\n");
        let prompt = self.qa_template.format(&context, &bundle.query_str);

        let stream = self.llm.stream(&prompt).await?;

        Ok(QueryResponse {
            stream: stream.boxed(),
            sources: Vec::new(),
        })
    }
}

/// Assemble a query engine from the application configuration.
///
/// This is where the config decides the pipeline shape: citation vs. plain
/// synthesis, whether the node expander runs, and which QA template is used.
pub fn build_query_engine(
    config: &AppConfig,
    retriever: Retriever,
    llm: Arc<dyn LLMClient>,
) -> Result<Box<dyn QueryEngine>> {
    let postprocessors: Vec<Arc<dyn NodePostprocessor>> = if config.query.enable_node_expander {
        vec![Arc::new(NodeExpander::new(Arc::clone(retriever.index())))]
    } else {
        Vec::new()
    };

    if config.citation.enabled {
        let qa_template = match &config.citation.qa_template_path {
            Some(path) => PromptTemplate::from_file(path)?,
            None => PromptTemplate::citation_qa(),
        };

        let options = CitationOptions {
            similarity_top_k: config.query.similarity_top_k,
            similarity_threshold: config.query.similarity_threshold,
            citation_chunk_size: config.citation.chunk_size,
            citation_chunk_overlap: config.citation.chunk_overlap,
            metadata_mode: MetadataMode::default(),
            qa_template,
        };

        let engine = CitationQueryEngine::new(retriever, llm, postprocessors, options)?;
        Ok(Box::new(engine))
    } else {
        let engine = RetrieverQueryEngine::new(
            retriever,
            llm,
            postprocessors,
            PromptTemplate::text_qa(),
            config.query.similarity_top_k,
            config.query.similarity_threshold,
        );
        Ok(Box::new(engine))
    }
}
