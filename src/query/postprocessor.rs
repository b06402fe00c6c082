//! Node post-processors.
//!
//! A post-processor transforms or filters retrieved nodes before they are
//! handed to the answer synthesizer.

use std::collections::HashSet;
use std::sync::Arc;

use crate::index::VectorIndex;
use crate::query::transform::QueryBundle;
use crate::types::{Result, ScoredNode};

/// A pipeline stage that runs between retrieval and synthesis.
pub trait NodePostprocessor: Send + Sync {
    /// Name of this post-processor, for logging.
    fn name(&self) -> &'static str;

    /// Transform the retrieved nodes. Order of the returned vector is the
    /// order nodes will appear in the synthesis context.
    fn postprocess(&self, nodes: Vec<ScoredNode>, bundle: &QueryBundle) -> Result<Vec<ScoredNode>>;
}

/// Widens each retrieved node with its neighboring chunks.
///
/// Retrieval returns individual chunks, which are often too narrow to answer
/// from. The expander replaces each hit with the concatenation of its
/// previous sibling, itself, and its next sibling from the docstore, keeping
/// the hit's retrieval score. When adjacent hits expand into overlapping
/// windows, later hits whose seed chunk is already covered are dropped.
pub struct NodeExpander {
    index: Arc<VectorIndex>,
}

impl NodeExpander {
    pub fn new(index: Arc<VectorIndex>) -> Self {
        Self { index }
    }
}

impl NodePostprocessor for NodeExpander {
    fn name(&self) -> &'static str {
        "node-expander"
    }

    fn postprocess(
        &self,
        nodes: Vec<ScoredNode>,
        _bundle: &QueryBundle,
    ) -> Result<Vec<ScoredNode>> {
        let mut covered: HashSet<String> = HashSet::new();
        let mut expanded = Vec::with_capacity(nodes.len());

        for scored in nodes {
            if covered.contains(&scored.node.id) {
                continue;
            }

            let (prev, next) = self.index.neighbors(&scored.node.id);

            let mut content = String::new();
            let mut prev_id = scored.node.prev_id.clone();
            let mut next_id = scored.node.next_id.clone();

            if let Some(prev) = prev {
                covered.insert(prev.id.clone());
                content.push_str(&prev.content);
                content.push_str("\n\n");
                prev_id = prev.prev_id.clone();
            }

            covered.insert(scored.node.id.clone());
            content.push_str(&scored.node.content);

            if let Some(next) = next {
                covered.insert(next.id.clone());
                content.push_str("\n\n");
                content.push_str(&next.content);
                next_id = next.next_id.clone();
            }

            let mut node = scored.node;
            node.content = content;
            node.prev_id = prev_id;
            node.next_id = next_id;

            expanded.push(ScoredNode {
                node,
                score: scored.score,
            });
        }

        Ok(expanded)
    }
}
