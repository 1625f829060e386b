use std::collections::HashMap;
use std::fmt;
use std::sync::mpsc;
use std::thread;

use log::{debug, warn};
use serde::Serialize;

use super::tokenizer::fold;
use super::vertex::Vertex;

/// Below this number of adjacent pairs, ingestion stays on the calling thread.
pub const PARALLEL_THRESHOLD: usize = 1 << 16;

/// Weighted directed graph of word adjacencies.
///
/// Vertices are folded (lowercase) words. The edge `a -> b` has weight `n`
/// when `b` immediately followed `a` exactly `n` times in the corpus.
/// Self-loops are allowed.
///
/// An `AffinityGraph` is obtained by freezing an [`AffinityGraphBuilder`]
/// and cannot be mutated afterwards, so it can be shared between threads
/// without any locking.
///
/// All queries are case-insensitive: the queried words are folded first.
///
/// # Invariants
/// - Every edge endpoint is a vertex of the graph
/// - Every edge weight is >= 1
/// - At most one edge per ordered pair of vertices
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct AffinityGraph {
	/// Vertices indexed by folded word.
	vertices: HashMap<String, Vertex>,
	/// Number of distinct edges.
	edge_count: usize,
}

impl AffinityGraph {
	/// Returns every `(target, weight)` for edges leaving `word`.
	///
	/// The iterator is empty if `word` is unknown or has no outgoing edge.
	pub fn outgoing_from(&self, word: &str) -> impl Iterator<Item = (&str, usize)> {
		self.vertices
			.get(&fold(word))
			.into_iter()
			.flat_map(|vertex| vertex.targets().iter().map(|(k, w)| (k.as_str(), *w)))
	}

	/// Returns every `(source, weight)` for edges entering `word`.
	///
	/// The iterator is empty if `word` is unknown or has no incoming edge.
	pub fn incoming_to(&self, word: &str) -> impl Iterator<Item = (&str, usize)> {
		self.vertices
			.get(&fold(word))
			.into_iter()
			.flat_map(|vertex| vertex.sources().iter().map(|(k, w)| (k.as_str(), *w)))
	}

	/// Weight of the edge `source -> target`, if it exists.
	pub fn weight(&self, source: &str, target: &str) -> Option<usize> {
		self.vertex(&fold(source))?.target_weight(&fold(target))
	}

	pub fn contains_vertex(&self, word: &str) -> bool {
		self.vertices.contains_key(&fold(word))
	}

	/// Iterates over all vertices, in no particular order.
	pub fn vertices(&self) -> impl Iterator<Item = &str> {
		self.vertices.keys().map(String::as_str)
	}

	pub fn vertex_count(&self) -> usize {
		self.vertices.len()
	}

	pub fn edge_count(&self) -> usize {
		self.edge_count
	}

	pub fn is_empty(&self) -> bool {
		self.vertices.is_empty()
	}

	/// Direct access to a vertex by its already folded key.
	pub(crate) fn vertex(&self, folded: &str) -> Option<&Vertex> {
		self.vertices.get(folded)
	}
}

impl fmt::Display for AffinityGraph {
	/// Diagnostic dump: sorted vertices, then one line per edge.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut vertices: Vec<&Vertex> = self.vertices.values().collect();
		vertices.sort_by(|a, b| a.key().cmp(b.key()));

		let names: Vec<&str> = vertices.iter().map(|v| v.key()).collect();
		writeln!(f, "vertices ({}): {}", names.len(), names.join(", "))?;
		writeln!(f, "edges ({}):", self.edge_count)?;
		for vertex in vertices {
			let mut targets: Vec<(&String, &usize)> = vertex.targets().iter().collect();
			targets.sort();
			for (target, weight) in targets {
				writeln!(f, "  {} -> {} ({})", vertex.key(), target, weight)?;
			}
		}
		Ok(())
	}
}

/// Mutable side of the affinity graph, used only while ingesting a corpus.
///
/// # Responsibilities
/// - Insert vertices and set or increment edge weights
/// - Build the graph from a token sequence, sequentially or in parallel chunks
/// - Merge partial builders (parallel ingestion)
/// - Freeze into an immutable [`AffinityGraph`]
///
/// Every word passed to the builder is folded before being stored.
#[derive(Clone, Debug, Default)]
pub struct AffinityGraphBuilder {
	graph: AffinityGraph,
}

impl AffinityGraphBuilder {
	/// Creates an empty builder.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds the graph with a single left-to-right pass over `tokens`.
	///
	/// The first token is registered as a vertex; every following token adds
	/// one to the edge from its predecessor. Tokens that are not valid words
	/// (empty or holding whitespace) are skipped and never become endpoints.
	pub fn from_tokens<I, S>(tokens: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut builder = Self::new();
		let mut previous: Option<String> = None;

		for token in tokens {
			let word = fold(token.as_ref());
			if !Self::is_word(&word) {
				warn!("ignoring invalid token {:?}", word);
				continue;
			}
			match &previous {
				Some(prev) => {
					builder.increment_folded(prev, &word);
				}
				None => {
					builder.vertex_mut(&word);
				}
			}
			previous = Some(word);
		}

		builder
	}

	/// Builds the graph from `tokens` using worker threads.
	///
	/// # Behavior
	/// - Splits the adjacent pairs into chunks (based on CPU cores * factor).
	/// - Consecutive chunks share one boundary token so that each pair is
	///   counted exactly once.
	/// - Each thread builds a partial graph, sent back over a channel and merged.
	///
	/// The result is identical to [`Self::from_tokens`]. Small inputs (under
	/// [`PARALLEL_THRESHOLD`] pairs) are built sequentially.
	pub fn from_tokens_parallel<S>(tokens: &[S]) -> Self
	where
		S: AsRef<str> + Sync,
	{
		let pairs = tokens.len().saturating_sub(1);
		if pairs < PARALLEL_THRESHOLD {
			return Self::from_tokens(tokens);
		}

		let cpus = num_cpus::get();
		let factor = 8;
		let chunks = cpus * factor;
		Self::from_chunks(tokens, pairs.div_ceil(chunks))
	}

	/// Parallel build with an explicit number of pairs per chunk.
	fn from_chunks<S>(tokens: &[S], chunk_size: usize) -> Self
	where
		S: AsRef<str> + Sync,
	{
		// Invalid tokens are dropped up front so that none sits on a chunk boundary
		let tokens: Vec<&str> = tokens.iter().map(|t| t.as_ref()).filter(|t| Self::is_word(t)).collect();
		let pairs = tokens.len().saturating_sub(1);
		if pairs == 0 || chunk_size == 0 {
			return Self::from_tokens(&tokens);
		}

		let (tx, rx) = mpsc::channel();
		let mut final_builder = Self::new();
		thread::scope(|scope| {
			for start in (0..pairs).step_by(chunk_size) {
				let end = (start + chunk_size).min(pairs);
				// Pairs start..end need tokens start..=end
				let chunk = &tokens[start..=end];
				let tx = tx.clone();

				scope.spawn(move || {
					let partial = Self::from_tokens(chunk);
					tx.send(partial).expect("Failed to send from thread");
				});
			}
			drop(tx);

			for partial in rx.iter() {
				final_builder.merge(&partial);
			}
		});

		debug!(
			"parallel ingestion: {} pairs in chunks of {} -> {} vertices, {} edges",
			pairs,
			chunk_size,
			final_builder.graph.vertex_count(),
			final_builder.graph.edge_count()
		);
		final_builder
	}

	/// Inserts `word` as a vertex if absent.
	///
	/// No effect if the vertex already exists. Empty words or words holding
	/// whitespace are not valid vertices and are ignored.
	pub fn add_vertex(&mut self, word: &str) {
		let word = fold(word);
		if !Self::is_word(&word) {
			warn!("ignoring invalid vertex {:?}", word);
			return;
		}
		self.vertex_mut(&word);
	}

	/// Sets the weight of the edge `source -> target`, replacing any previous weight.
	///
	/// Missing endpoints are inserted. Returns the previous weight, or 0 if the
	/// edge did not exist.
	///
	/// # Notes
	/// - A weight of 0 is not a valid edge weight: the graph is left unchanged
	///   and the current weight is returned.
	/// - Invalid words (empty or holding whitespace) are ignored and 0 is returned.
	pub fn set_edge(&mut self, source: &str, target: &str, weight: usize) -> usize {
		let (source, target) = (fold(source), fold(target));
		if !Self::is_word(&source) || !Self::is_word(&target) {
			warn!("ignoring edge with invalid endpoint {:?} -> {:?}", source, target);
			return 0;
		}
		if weight == 0 {
			warn!("ignoring zero weight for edge {:?} -> {:?}", source, target);
			return self.graph.vertex(&source).and_then(|v| v.target_weight(&target)).unwrap_or(0);
		}

		self.vertex_mut(&target).set_source(&source, weight);
		let previous = self.vertex_mut(&source).set_target(&target, weight);
		if previous == 0 {
			self.graph.edge_count += 1;
		}
		previous
	}

	/// Adds one to the edge `source -> target`, creating it with weight 1 if missing.
	///
	/// Returns the new weight.
	pub fn increment_edge(&mut self, source: &str, target: &str) -> usize {
		let (source, target) = (fold(source), fold(target));
		if !Self::is_word(&source) || !Self::is_word(&target) {
			warn!("ignoring edge with invalid endpoint {:?} -> {:?}", source, target);
			return 0;
		}
		self.increment_folded(&source, &target)
	}

	/// Merges another builder into this one.
	///
	/// Vertices are unioned and the weights of matching edges are summed.
	pub fn merge(&mut self, other: &Self) {
		for (key, vertex) in &other.graph.vertices {
			self.vertex_mut(key);
			for (target, weight) in vertex.targets() {
				self.vertex_mut(target).add_source(key, *weight);
				let merged = self.vertex_mut(key).add_target(target, *weight);
				if merged == *weight {
					self.graph.edge_count += 1;
				}
			}
		}
	}

	/// Ends construction. The returned graph can no longer be modified.
	pub fn freeze(self) -> AffinityGraph {
		self.graph
	}

	fn increment_folded(&mut self, source: &str, target: &str) -> usize {
		self.vertex_mut(target).add_source(source, 1);
		let weight = self.vertex_mut(source).add_target(target, 1);
		if weight == 1 {
			self.graph.edge_count += 1;
		}
		weight
	}

	/// Get or create the vertex for an already folded word.
	fn vertex_mut(&mut self, key: &str) -> &mut Vertex {
		self.graph.vertices.entry(key.to_owned()).or_insert_with(|| Vertex::new(key))
	}

	fn is_word(word: &str) -> bool {
		!word.is_empty() && !word.chars().any(char::is_whitespace)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sorted<'a>(iter: impl Iterator<Item = (&'a str, usize)>) -> Vec<(&'a str, usize)> {
		let mut items: Vec<_> = iter.collect();
		items.sort();
		items
	}

	#[test]
	fn add_vertex_is_idempotent() {
		let mut builder = AffinityGraphBuilder::new();
		builder.add_vertex("Word");
		builder.add_vertex("word");
		builder.add_vertex("WORD");
		let graph = builder.freeze();
		assert_eq!(graph.vertex_count(), 1);
		assert!(graph.contains_vertex("wOrD"));
		assert_eq!(graph.edge_count(), 0);
	}

	#[test]
	fn add_vertex_ignores_invalid_words() {
		let mut builder = AffinityGraphBuilder::new();
		builder.add_vertex("");
		builder.add_vertex("two words");
		assert!(builder.freeze().is_empty());
	}

	#[test]
	fn from_tokens_skips_invalid_tokens() {
		let graph = AffinityGraphBuilder::from_tokens(["", "two words", "a"]).freeze();
		assert_eq!(graph, AffinityGraphBuilder::from_tokens(["a"]).freeze());
		assert!(!graph.contains_vertex(""));
		assert_eq!(graph.edge_count(), 0);

		let bridged = AffinityGraphBuilder::from_tokens(["x", " ", "y"]).freeze();
		assert_eq!(bridged.weight("x", "y"), Some(1));
		assert_eq!(bridged.vertex_count(), 2);
	}

	#[test]
	fn set_edge_replaces_weight_and_returns_previous() {
		let mut builder = AffinityGraphBuilder::new();
		assert_eq!(builder.set_edge("a", "b", 3), 0);
		assert_eq!(builder.set_edge("A", "B", 5), 3);

		let graph = builder.freeze();
		assert_eq!(graph.weight("a", "b"), Some(5));
		assert_eq!(graph.edge_count(), 1);
		assert_eq!(sorted(graph.incoming_to("b")), vec![("a", 5)]);
	}

	#[test]
	fn set_edge_with_zero_weight_is_ignored() {
		let mut builder = AffinityGraphBuilder::new();
		builder.set_edge("a", "b", 2);
		assert_eq!(builder.set_edge("a", "b", 0), 2);
		assert_eq!(builder.set_edge("a", "c", 0), 0);

		let graph = builder.freeze();
		assert_eq!(graph.weight("a", "b"), Some(2));
		assert_eq!(graph.weight("a", "c"), None);
		assert!(!graph.contains_vertex("c"));
	}

	#[test]
	fn increment_edge_initializes_then_increments() {
		let mut builder = AffinityGraphBuilder::new();
		assert_eq!(builder.increment_edge("a", "b"), 1);
		assert_eq!(builder.increment_edge("a", "b"), 2);
		assert_eq!(builder.increment_edge("a", "a"), 1);

		let graph = builder.freeze();
		assert_eq!(graph.edge_count(), 2);
		assert_eq!(sorted(graph.outgoing_from("a")), vec![("a", 1), ("b", 2)]);
		assert_eq!(sorted(graph.incoming_to("a")), vec![("a", 1)]);
	}

	#[test]
	fn queries_on_unknown_vertex_are_empty() {
		let graph = AffinityGraphBuilder::from_tokens(["one", "two"]).freeze();
		assert_eq!(graph.outgoing_from("three").count(), 0);
		assert_eq!(graph.incoming_to("three").count(), 0);
		assert_eq!(graph.incoming_to("one").count(), 0);
		assert_eq!(graph.outgoing_from("two").count(), 0);
	}

	#[test]
	fn from_tokens_counts_adjacencies() {
		let graph = AffinityGraphBuilder::from_tokens(["Hello,", "HELLO,", "hello,", "goodbye!"]).freeze();
		assert_eq!(graph.vertex_count(), 2);
		assert_eq!(graph.edge_count(), 2);
		assert_eq!(sorted(graph.outgoing_from("hello,")), vec![("goodbye!", 1), ("hello,", 2)]);
	}

	#[test]
	fn from_tokens_single_and_empty() {
		let empty = AffinityGraphBuilder::from_tokens(Vec::<String>::new()).freeze();
		assert!(empty.is_empty());
		assert_eq!(empty.edge_count(), 0);

		let single = AffinityGraphBuilder::from_tokens(["Alone"]).freeze();
		assert_eq!(single.vertex_count(), 1);
		assert_eq!(single.edge_count(), 0);
		assert!(single.contains_vertex("alone"));
	}

	#[test]
	fn merge_sums_weights_and_unions_vertices() {
		let mut left = AffinityGraphBuilder::from_tokens(["a", "b", "a", "b"]);
		let right = AffinityGraphBuilder::from_tokens(["b", "a", "b", "c"]);
		left.merge(&right);

		let graph = left.freeze();
		assert_eq!(graph.weight("a", "b"), Some(3));
		assert_eq!(graph.weight("b", "a"), Some(2));
		assert_eq!(graph.weight("b", "c"), Some(1));
		assert_eq!(graph.edge_count(), 3);
		assert_eq!(graph.vertex_count(), 3);
		assert_eq!(sorted(graph.incoming_to("b")), vec![("a", 3)]);
	}

	#[test]
	fn chunked_build_matches_sequential_build() {
		let text = "the cat sat on the mat and the cat ate the rat on the mat";
		let tokens: Vec<&str> = text.split(' ').collect();
		let sequential = AffinityGraphBuilder::from_tokens(&tokens).freeze();

		for chunk_size in 1..tokens.len() + 2 {
			let chunked = AffinityGraphBuilder::from_chunks(&tokens, chunk_size).freeze();
			assert_eq!(chunked, sequential, "chunk size {}", chunk_size);
		}
	}

	#[test]
	fn chunked_build_skips_invalid_tokens_like_sequential_build() {
		let tokens = ["a", "", "b", "c d", "a", "b", " ", "c"];
		let sequential = AffinityGraphBuilder::from_tokens(tokens).freeze();
		assert_eq!(sequential.weight("a", "b"), Some(2));

		for chunk_size in 1..tokens.len() + 2 {
			let chunked = AffinityGraphBuilder::from_chunks(&tokens, chunk_size).freeze();
			assert_eq!(chunked, sequential, "chunk size {}", chunk_size);
		}
	}

	#[test]
	fn display_lists_sorted_vertices_and_edges() {
		let graph = AffinityGraphBuilder::from_tokens(["b", "a", "b"]).freeze();
		let dump = graph.to_string();
		assert!(dump.starts_with("vertices (2): a, b\n"));
		assert!(dump.contains("edges (2):"));
		assert!(dump.contains("  a -> b (1)"));
		assert!(dump.contains("  b -> a (1)"));
	}
}
