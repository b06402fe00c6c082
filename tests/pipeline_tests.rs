//! End-to-end query pipeline tests with mock providers.
//!
//! Exercises the HyDE transform, retrieval, node expansion, and citation
//! synthesis wired together the way the chat handler wires them.

mod common;

use std::sync::Arc;

use futures::StreamExt;

use common::{node, MockEmbedder, MockLLMClient};
use docqa::config::AppConfig;
use docqa::index::{Retriever, VectorIndex};
use docqa::llm::LLMClient;
use docqa::query::{build_query_engine, HydeTransform, QueryBundle, QueryTransform};

fn config(extra: &str) -> AppConfig {
    let toml = format!(
        r#"
[index]
dir = "./unused"

[llm]
provider = "ollama"
model = "mock"
embedding_model = "mock-embed"

{}
"#,
        extra
    );
    toml::from_str(&toml).unwrap()
}

fn retriever(nodes: Vec<docqa::types::Node>) -> Retriever {
    Retriever::new(
        Arc::new(VectorIndex::from_nodes(nodes).unwrap()),
        Arc::new(MockEmbedder),
    )
}

#[tokio::test]
async fn test_hyde_steers_retrieval() {
    // The question itself mentions no indexed keyword, but the hypothetical
    // passage the mock LLM writes does. Without the original query diluting
    // the pooled embedding, retrieval is driven entirely by the passage.
    let llm: Arc<dyn LLMClient> = Arc::new(MockLLMClient::new("A passage about the fox."));
    let hyde = HydeTransform::new(Arc::clone(&llm), false);

    let bundle = hyde
        .transform("What does that bushy-tailed animal eat?")
        .await
        .unwrap();
    assert_eq!(bundle.embedding_strs[0], "A passage about the fox.");

    let retriever = retriever(common::animal_nodes());
    let results = retriever.retrieve(&bundle, 1, 0.5).await.unwrap();
    assert_eq!(results[0].node.id, "fox");
}

#[tokio::test]
async fn test_full_pipeline_citation_mode() {
    let llm: Arc<dyn LLMClient> = Arc::new(MockLLMClient::new("Foxes eat berries [1]."));
    let engine =
        build_query_engine(&config(""), retriever(common::animal_nodes()), llm).unwrap();

    let mut response = engine
        .query(&QueryBundle::new("Tell me about the fox"))
        .await
        .unwrap();

    // All retrieved nodes become numbered citations, best hit first
    assert_eq!(response.sources.len(), 3);
    assert_eq!(response.sources[0].number, 1);
    assert_eq!(response.sources[0].node_id, "fox");
    assert_eq!(
        response.sources.iter().map(|s| s.number).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );

    let mut answer = String::new();
    while let Some(chunk) = response.stream.next().await {
        answer.push_str(&chunk.unwrap());
    }
    assert_eq!(answer, "Foxes eat berries [1].");
}

#[tokio::test]
async fn test_full_pipeline_with_node_expander() {
    // Three sibling chunks; retrieval hits the middle one, the expander
    // widens it to the full window.
    let mut first = node("c1", "Chunk one.", vec![0.0, 0.0, 0.0, 0.1]);
    let mut second = node("c2", "Chunk two about the fox.", vec![1.0, 0.0, 0.0, 0.1]);
    let mut third = node("c3", "Chunk three.", vec![0.0, 0.0, 0.0, 0.1]);
    first.next_id = Some("c2".to_string());
    second.prev_id = Some("c1".to_string());
    second.next_id = Some("c3".to_string());
    third.prev_id = Some("c2".to_string());

    let llm: Arc<dyn LLMClient> = Arc::new(MockLLMClient::new("answer [1]"));
    let engine = build_query_engine(
        &config("[query]\nenable_node_expander = true\nsimilarity_top_k = 1\nsimilarity_threshold = 0.5"),
        retriever(vec![first, second, third]),
        llm,
    )
    .unwrap();

    let response = engine
        .query(&QueryBundle::new("the fox"))
        .await
        .unwrap();

    let combined: String = response
        .sources
        .iter()
        .map(|s| s.text.clone())
        .collect::<Vec<_>>()
        .join(" ");
    assert!(combined.contains("Chunk one."));
    assert!(combined.contains("Chunk two about the fox."));
    assert!(combined.contains("Chunk three."));
}

#[tokio::test]
async fn test_citation_chunk_size_controls_granularity() {
    let long_content = "word ".repeat(100);
    let nodes = vec![node("long", long_content.trim(), vec![1.0, 0.0, 0.0, 0.1])];

    let llm: Arc<dyn LLMClient> = Arc::new(MockLLMClient::new("answer"));
    let engine = build_query_engine(
        &config("[citation]\nchunk_size = 64\nchunk_overlap = 0"),
        retriever(nodes),
        llm,
    )
    .unwrap();

    let response = engine
        .query(&QueryBundle::new("the fox"))
        .await
        .unwrap();

    // One long node splits into several numbered citation chunks
    assert!(response.sources.len() > 1);
    for source in &response.sources {
        assert_eq!(source.node_id, "long");
        assert!(source.text.len() <= 64);
    }
}

#[tokio::test]
async fn test_custom_qa_template_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let template_path = dir.path().join("qa.txt");
    std::fs::write(&template_path, "CUSTOM {context_str} | {query_str}").unwrap();

    let llm: Arc<dyn LLMClient> = Arc::new(MockLLMClient::new("answer"));
    let engine = build_query_engine(
        &config(&format!(
            "[citation]\nqa_template_path = \"{}\"",
            template_path.display()
        )),
        retriever(common::animal_nodes()),
        llm,
    )
    .unwrap();

    // Engine construction already validated the template; querying works
    let response = engine.query(&QueryBundle::new("the cat")).await.unwrap();
    assert!(!response.sources.is_empty());
}

#[tokio::test]
async fn test_plain_mode_returns_no_sources() {
    let llm: Arc<dyn LLMClient> = Arc::new(MockLLMClient::new("plain answer"));
    let engine = build_query_engine(
        &config("[citation]\nenabled = false"),
        retriever(common::animal_nodes()),
        llm,
    )
    .unwrap();

    let response = engine.query(&QueryBundle::new("the dog")).await.unwrap();
    assert!(response.sources.is_empty());
}
