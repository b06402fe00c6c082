//! Persisted vector index.
//!
//! The server does not build indices; it loads a prebuilt one from disk.
//! A persisted index is a directory with two JSON files:
//!
//! - `docstore.json` - the nodes (chunk text, metadata, sibling links)
//! - `vectors.json` - embedding dimensionality and per-node embeddings
//!
//! [`VectorIndex`] owns both and answers cosine top-k searches.
//! [`Retriever`] pairs an index with an embedding client and turns a
//! query bundle into scored nodes.

pub mod retriever;
pub mod store;

pub use retriever::Retriever;
pub use store::{IndexStats, VectorIndex};
