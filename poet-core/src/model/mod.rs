//! Top-level module for the graph poetry system.
//!
//! - Word tokenization and case folding (`tokenizer`)
//! - Weighted adjacency graph and its builder (`affinity_graph`)
//! - Per-word adjacency storage (`Vertex`)
//! - Poem generation over a built graph (`poet`)

/// Whitespace tokenizer and case folding.
pub mod tokenizer;

/// Weighted directed graph of word adjacencies.
///
/// Built once through `AffinityGraphBuilder`, then frozen into an
/// immutable `AffinityGraph`.
pub mod affinity_graph;

/// Internal representation of a single word and its adjacencies.
/// This module is not exposed publicly.
mod vertex;

/// High-level poem generator (`GraphPoet`).
pub mod poet;
