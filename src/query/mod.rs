//! Query pipeline: transforms, post-processors, and query engines.
//!
//! A chat request flows through this module as follows:
//!
//! 1. **Transform** - the raw question becomes a [`QueryBundle`]. With HyDE
//!    enabled, an LLM writes a hypothetical answer passage and retrieval is
//!    driven by its embedding instead of (or alongside) the question's.
//! 2. **Retrieve** - the bundle's embedding strings are embedded, mean-pooled
//!    and searched against the vector index.
//! 3. **Post-process** - retrieved nodes pass through [`NodePostprocessor`]
//!    stages (e.g. the node expander widens hits with neighboring chunks).
//! 4. **Synthesize** - a [`QueryEngine`] formats a QA prompt and streams the
//!    LLM answer. The [`CitationQueryEngine`] additionally re-splits nodes
//!    into numbered citation chunks so answer spans can cite `[n]` sources.
//!
//! Which engine and stages are assembled is decided entirely by
//! configuration; see [`build_query_engine`].

pub mod citation;
pub mod engine;
pub mod postprocessor;
pub mod prompts;
pub mod transform;

pub use citation::CitationQueryEngine;
pub use engine::{build_query_engine, QueryEngine, QueryResponse, RetrieverQueryEngine};
pub use postprocessor::{NodeExpander, NodePostprocessor};
pub use prompts::PromptTemplate;
pub use transform::{HydeTransform, QueryBundle, QueryTransform};
