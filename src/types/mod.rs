use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

// ============= API Request/Response Types =============

/// Request body for the chat endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatRequest {
    /// The user's question.
    pub message: String,
    /// Session to append the exchange to. A new session is created when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Static application metadata for the UI.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AppInfo {
    /// Human-readable description of the indexed corpus.
    pub description: String,
    /// Greeting message seeded into new sessions.
    pub greeting: String,
    /// Whether HyDE query rewriting is active.
    pub hyde_enabled: bool,
    /// Whether answers carry numbered citations.
    pub citations_enabled: bool,
    /// Synthesis model identifier.
    pub model: String,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// Number of nodes in the loaded index.
    pub index_nodes: usize,
    /// Embedding dimensionality of the loaded index.
    pub index_dimensions: usize,
}

/// Request body for recording feedback on an assistant message.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FeedbackRequest {
    pub session_id: String,
    pub message_id: String,
    /// true for thumbs-up, false for thumbs-down.
    pub is_good: bool,
    /// Optional reason, typically supplied with thumbs-down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A numbered source passage attributed to the answer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SourceAttribution {
    /// 1-based citation number as referenced in the answer text.
    pub number: usize,
    /// Identifier of the underlying index node.
    pub node_id: String,
    /// Retrieval score of the node this passage came from.
    pub score: f32,
    /// The cited passage text.
    pub text: String,
    /// Title of the source document, if known.
    pub title: Option<String>,
    /// Origin of the source document (path, URL), if known.
    pub source: Option<String>,
}

// ============= Message Types =============

/// A message in a chat session transcript.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

// ============= Index Types =============

/// A retrievable chunk of a source document.
///
/// Nodes carry sibling links (`prev_id`/`next_id`) so post-processors can
/// widen a hit to its surrounding context without re-reading the corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    /// Identifier of the source document this chunk was split from.
    pub doc_id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: NodeMetadata,
    /// Previous sibling chunk within the same document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_id: Option<String>,
    /// Next sibling chunk within the same document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_id: Option<String>,
    /// Dense embedding. Not persisted in the docstore; lives in the vector file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

/// Metadata attached to an index node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

/// How much metadata to inline when a node is rendered as model context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataMode {
    /// Content only.
    None,
    /// Title and source lines above the content.
    #[default]
    Llm,
    /// Every metadata key, including `extra`.
    All,
}

impl Node {
    /// Render this node as text for the given metadata mode.
    pub fn text_for(&self, mode: MetadataMode) -> String {
        let mut header = Vec::new();
        match mode {
            MetadataMode::None => {}
            MetadataMode::Llm | MetadataMode::All => {
                if let Some(title) = &self.metadata.title {
                    header.push(format!("title: {}", title));
                }
                if let Some(source) = &self.metadata.source {
                    header.push(format!("source: {}", source));
                }
                if mode == MetadataMode::All {
                    for (key, value) in &self.metadata.extra {
                        header.push(format!("{}: {}", key, value));
                    }
                }
            }
        }

        if header.is_empty() {
            self.content.clone()
        } else {
            format!("{}\n\n{}", header.join("\n"), self.content)
        }
    }
}

/// A node paired with its retrieval score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredNode {
    pub node: Node,
    pub score: f32,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Config(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Index(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::LLM(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::NotFound(msg) => (axum::http::StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (axum::http::StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_node() -> Node {
        Node {
            id: "n1".to_string(),
            doc_id: "d1".to_string(),
            content: "The quick brown fox.".to_string(),
            metadata: NodeMetadata {
                title: Some("Foxes".to_string()),
                source: Some("animals.md".to_string()),
                extra: BTreeMap::from([("lang".to_string(), "en".to_string())]),
            },
            prev_id: None,
            next_id: None,
            embedding: None,
        }
    }

    #[test]
    fn test_text_for_none_is_content_only() {
        let node = sample_node();
        assert_eq!(node.text_for(MetadataMode::None), "The quick brown fox.");
    }

    #[test]
    fn test_text_for_llm_includes_title_and_source() {
        let node = sample_node();
        let text = node.text_for(MetadataMode::Llm);
        assert!(text.starts_with("title: Foxes\nsource: animals.md"));
        assert!(text.ends_with("The quick brown fox."));
        assert!(!text.contains("lang:"));
    }

    #[test]
    fn test_text_for_all_includes_extra() {
        let node = sample_node();
        let text = node.text_for(MetadataMode::All);
        assert!(text.contains("lang: en"));
    }

    #[test]
    fn test_text_for_empty_metadata() {
        let node = Node {
            metadata: NodeMetadata::default(),
            ..sample_node()
        };
        assert_eq!(node.text_for(MetadataMode::Llm), "The quick brown fox.");
    }

    #[test]
    fn test_message_role_serde() {
        let json = serde_json::to_string(&MessageRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }
}
