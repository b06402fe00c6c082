//! On-disk index store and in-memory vector search.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{AppError, Node, Result, ScoredNode};

const DOCSTORE_FILE: &str = "docstore.json";
const VECTORS_FILE: &str = "vectors.json";

/// Serialized form of the docstore file.
#[derive(Debug, Serialize, Deserialize)]
struct DocStoreFile {
    nodes: Vec<Node>,
}

/// Serialized form of the vectors file.
#[derive(Debug, Serialize, Deserialize)]
struct VectorsFile {
    dimensions: usize,
    embeddings: HashMap<String, Vec<f32>>,
}

/// Statistics about a loaded index.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of nodes in the docstore.
    pub node_count: usize,
    /// Embedding dimensionality.
    pub dimensions: usize,
}

/// An immutable vector index loaded from a persisted store.
///
/// Uses cosine similarity for vector comparisons. The index is shared via
/// `Arc` after loading; it is never mutated by the server.
#[derive(Debug)]
pub struct VectorIndex {
    nodes: HashMap<String, Node>,
    embeddings: HashMap<String, Vec<f32>>,
    dimensions: usize,
}

impl VectorIndex {
    /// Build an index from nodes that carry their embeddings inline.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding dimensionalities disagree.
    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self> {
        let mut dimensions = 0usize;
        let mut embeddings = HashMap::with_capacity(nodes.len());
        let mut stored = HashMap::with_capacity(nodes.len());

        for mut node in nodes {
            if let Some(embedding) = node.embedding.take() {
                if dimensions == 0 {
                    dimensions = embedding.len();
                } else if embedding.len() != dimensions {
                    return Err(AppError::Index(format!(
                        "Node '{}' has embedding of dimension {} but index dimension is {}",
                        node.id,
                        embedding.len(),
                        dimensions
                    )));
                }
                embeddings.insert(node.id.clone(), embedding);
            }
            stored.insert(node.id.clone(), node);
        }

        Ok(Self {
            nodes: stored,
            embeddings,
            dimensions,
        })
    }

    /// Load a persisted index from a directory.
    ///
    /// # Errors
    ///
    /// Returns an error if either store file is missing or corrupt, or if
    /// any embedding's dimensionality disagrees with the store header.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();

        let docstore_path = dir.join(DOCSTORE_FILE);
        let docstore_json = std::fs::read_to_string(&docstore_path).map_err(|e| {
            AppError::Index(format!(
                "Failed to read docstore at {}: {}",
                docstore_path.display(),
                e
            ))
        })?;
        let docstore: DocStoreFile = serde_json::from_str(&docstore_json)
            .map_err(|e| AppError::Index(format!("Failed to parse docstore: {}", e)))?;

        let vectors_path = dir.join(VECTORS_FILE);
        let vectors_json = std::fs::read_to_string(&vectors_path).map_err(|e| {
            AppError::Index(format!(
                "Failed to read vector store at {}: {}",
                vectors_path.display(),
                e
            ))
        })?;
        let vectors: VectorsFile = serde_json::from_str(&vectors_json)
            .map_err(|e| AppError::Index(format!("Failed to parse vector store: {}", e)))?;

        for (id, embedding) in &vectors.embeddings {
            if embedding.len() != vectors.dimensions {
                return Err(AppError::Index(format!(
                    "Embedding for node '{}' has dimension {} but store declares {}",
                    id,
                    embedding.len(),
                    vectors.dimensions
                )));
            }
        }

        let nodes: HashMap<String, Node> = docstore
            .nodes
            .into_iter()
            .map(|n| (n.id.clone(), n))
            .collect();

        Ok(Self {
            nodes,
            embeddings: vectors.embeddings,
            dimensions: vectors.dimensions,
        })
    }

    /// Persist the index to a directory.
    ///
    /// Creates the directory if it doesn't exist. Used by index builders
    /// and test fixtures; the server itself only loads.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .map_err(|e| AppError::Index(format!("Failed to create index directory: {}", e)))?;

        let mut nodes: Vec<Node> = self.nodes.values().cloned().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        let docstore = DocStoreFile { nodes };
        let docstore_json = serde_json::to_string(&docstore)
            .map_err(|e| AppError::Index(format!("Failed to serialize docstore: {}", e)))?;
        std::fs::write(dir.join(DOCSTORE_FILE), docstore_json)
            .map_err(|e| AppError::Index(format!("Failed to write docstore: {}", e)))?;

        let vectors = VectorsFile {
            dimensions: self.dimensions,
            embeddings: self.embeddings.clone(),
        };
        let vectors_json = serde_json::to_string(&vectors)
            .map_err(|e| AppError::Index(format!("Failed to serialize vector store: {}", e)))?;
        std::fs::write(dir.join(VECTORS_FILE), vectors_json)
            .map_err(|e| AppError::Index(format!("Failed to write vector store: {}", e)))?;

        Ok(())
    }

    /// Search for nodes similar to the query embedding.
    ///
    /// Returns up to `top_k` results with score >= `threshold`, sorted by
    /// similarity score descending. Nodes without a stored embedding are
    /// skipped.
    pub fn search(&self, embedding: &[f32], top_k: usize, threshold: f32) -> Vec<ScoredNode> {
        let mut results: Vec<ScoredNode> = self
            .embeddings
            .iter()
            .filter_map(|(id, node_embedding)| {
                let score = Self::cosine_similarity(embedding, node_embedding);
                if score >= threshold {
                    self.nodes.get(id).map(|node| ScoredNode {
                        node: node.clone(),
                        score,
                    })
                } else {
                    None
                }
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(top_k);
        results
    }

    /// Get a node by ID.
    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Get the previous and next sibling of a node, where present.
    ///
    /// Dangling sibling links resolve to `None` rather than an error.
    pub fn neighbors(&self, id: &str) -> (Option<&Node>, Option<&Node>) {
        match self.nodes.get(id) {
            Some(node) => {
                let prev = node.prev_id.as_deref().and_then(|p| self.nodes.get(p));
                let next = node.next_id.as_deref().and_then(|n| self.nodes.get(n));
                (prev, next)
            }
            None => (None, None),
        }
    }

    /// Statistics about the loaded index.
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            node_count: self.nodes.len(),
            dimensions: self.dimensions,
        }
    }

    /// Number of nodes in the docstore.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Calculate cosine similarity between two vectors.
    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }

        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot_product / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeMetadata;

    fn test_node(id: &str, content: &str, embedding: Vec<f32>) -> Node {
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

    fn linked_nodes() -> Vec<Node> {
        let mut a = test_node("a", "first", vec![1.0, 0.0, 0.0]);
        let mut b = test_node("b", "second", vec![0.0, 1.0, 0.0]);
        let mut c = test_node("c", "third", vec![0.9, 0.1, 0.0]);
        a.next_id = Some("b".to_string());
        b.prev_id = Some("a".to_string());
        b.next_id = Some("c".to_string());
        c.prev_id = Some("b".to_string());
        vec![a, b, c]
    }

    #[test]
    fn test_from_nodes_and_search() {
        let index = VectorIndex::from_nodes(linked_nodes()).unwrap();

        let results = index.search(&[1.0, 0.0, 0.0], 10, 0.5);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].node.id, "a");
        assert_eq!(results[1].node.id, "c");
    }

    #[test]
    fn test_search_respects_top_k() {
        let index = VectorIndex::from_nodes(linked_nodes()).unwrap();

        let results = index.search(&[1.0, 0.0, 0.0], 1, 0.0);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].node.id, "a");
    }

    #[test]
    fn test_search_empty_index() {
        let index = VectorIndex::from_nodes(vec![]).unwrap();
        assert!(index.search(&[1.0, 0.0], 5, 0.0).is_empty());
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let nodes = vec![
            test_node("a", "first", vec![1.0, 0.0]),
            test_node("b", "second", vec![1.0, 0.0, 0.0]),
        ];
        assert!(VectorIndex::from_nodes(nodes).is_err());
    }

    #[test]
    fn test_neighbors() {
        let index = VectorIndex::from_nodes(linked_nodes()).unwrap();

        let (prev, next) = index.neighbors("b");
        assert_eq!(prev.unwrap().id, "a");
        assert_eq!(next.unwrap().id, "c");

        let (prev, next) = index.neighbors("a");
        assert!(prev.is_none());
        assert_eq!(next.unwrap().id, "b");
    }

    #[test]
    fn test_neighbors_dangling_link_skipped() {
        let mut node = test_node("a", "first", vec![1.0, 0.0]);
        node.next_id = Some("missing".to_string());
        let index = VectorIndex::from_nodes(vec![node]).unwrap();

        let (prev, next) = index.neighbors("a");
        assert!(prev.is_none());
        assert!(next.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join("docqa_test_index");
        let _ = std::fs::remove_dir_all(&dir);

        let index = VectorIndex::from_nodes(linked_nodes()).unwrap();
        index.save(&dir).unwrap();

        let loaded = VectorIndex::load(&dir).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.stats().dimensions, 3);

        let results = loaded.search(&[1.0, 0.0, 0.0], 10, 0.5);
        assert_eq!(results[0].node.id, "a");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_missing_dir_errors() {
        let result = VectorIndex::load("/nonexistent/docqa-index");
        assert!(result.is_err());
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((VectorIndex::cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 0.001);
        assert!(VectorIndex::cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 0.001);
        assert!((VectorIndex::cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 0.001);
    }
}
