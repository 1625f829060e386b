//! Graph-based poetry generation library.
//!
//! This crate derives a word affinity graph from a corpus and uses it to
//! augment sentences with bridge words:
//! - Word-level adjacency graph with weighted edges
//! - Sequential or chunked parallel corpus ingestion
//! - Maximum-weight two-hop bridge insertion
//! - Corpus I/O helpers
//!
//! The graph is built through a mutable builder and frozen before use, so
//! a built engine is immutable and can be shared freely between threads.

/// Affinity graph, tokenizer and poem generation.
pub mod model;

/// Error type for engine construction.
pub mod error;

/// I/O utilities (corpus loading, path helpers).
pub mod io;
