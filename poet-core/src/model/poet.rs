use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use log::{debug, trace};
use rand::prelude::IteratorRandom;

use crate::error::{PoetError, Result};
use crate::io;
use crate::model::affinity_graph::{AffinityGraph, AffinityGraphBuilder};
use crate::model::tokenizer::{fold, tokenize};

/// Strategy used to choose between bridge words of equal path weight.
///
/// # Variants
/// - `Lexical`: the lexicographically smallest word wins (deterministic).
/// - `Random`: one of the best words is picked uniformly at random.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
	#[default]
	Lexical,
	Random,
}

impl FromStr for TieBreak {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"lexical" => Ok(TieBreak::Lexical),
			"random" => Ok(TieBreak::Random),
			other => Err(format!("Tie-break must be 'lexical' or 'random', got '{}'", other)),
		}
	}
}

/// A graph-based poetry generator.
///
/// A `GraphPoet` is built once from a corpus, from which it derives an
/// [`AffinityGraph`] of word adjacencies. It then augments input text by
/// inserting, between each pair of adjacent input words `w1 w2`, the bridge
/// word `b` maximizing `weight(w1 -> b) + weight(b -> w2)`. When no such
/// two-edge path exists nothing is inserted.
///
/// Input words keep their original case, bridge words are lowercase and
/// the words of the poem are separated by a single space.
///
/// # Example
/// ```
/// use poet_core::model::poet::GraphPoet;
///
/// let poet = GraphPoet::from_corpus("This is a test of the Mugar Omni Theater sound system.");
/// assert_eq!(poet.poem("Test the system."), "Test of the system.");
/// ```
///
/// The graph is immutable once built: a `GraphPoet` can be shared between
/// threads (e.g. in an `Arc`) and queried concurrently.
#[derive(Debug, Clone, Default)]
pub struct GraphPoet {
	graph: AffinityGraph,
}

impl GraphPoet {
	/// Creates a poet from a corpus file.
	///
	/// # Errors
	/// Returns [`PoetError::SourceUnavailable`] if the file cannot be opened,
	/// read, or is not valid UTF-8. No poet is produced in that case.
	pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		let corpus = io::read_corpus(path).map_err(|source| PoetError::SourceUnavailable {
			origin: path.display().to_string(),
			source,
		})?;
		debug!("read corpus {} ({} bytes)", path.display(), corpus.len());
		Ok(Self::from_corpus(&corpus))
	}

	/// Creates a poet from any readable corpus source.
	///
	/// The whole stream is read before the graph is built.
	///
	/// # Errors
	/// Returns [`PoetError::SourceUnavailable`] if reading fails.
	pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
		let mut corpus = String::new();
		reader
			.read_to_string(&mut corpus)
			.map_err(|source| PoetError::SourceUnavailable { origin: "reader".to_owned(), source })?;
		Ok(Self::from_corpus(&corpus))
	}

	/// Creates a poet from the corpus text itself.
	///
	/// Large corpora are ingested in parallel, see
	/// [`AffinityGraphBuilder::from_tokens_parallel`].
	pub fn from_corpus(corpus: &str) -> Self {
		let tokens: Vec<&str> = tokenize(corpus).collect();
		let graph = AffinityGraphBuilder::from_tokens_parallel(&tokens).freeze();
		debug!(
			"built affinity graph: {} tokens, {} vertices, {} edges",
			tokens.len(),
			graph.vertex_count(),
			graph.edge_count()
		);
		Self { graph }
	}

	/// Wraps an already built graph.
	pub fn from_graph(graph: AffinityGraph) -> Self {
		Self { graph }
	}

	/// Read-only access to the affinity graph.
	pub fn graph(&self) -> &AffinityGraph {
		&self.graph
	}

	/// Generates a poem from `input` using the default tie-break.
	pub fn poem(&self, input: &str) -> String {
		self.poem_with(input, TieBreak::default())
	}

	/// Generates a poem from `input`.
	///
	/// # Behavior
	/// - Splits `input` into words (any whitespace).
	/// - Emits each input word unchanged.
	/// - Between two adjacent input words, emits the best bridge word if any.
	/// - Joins everything with single spaces.
	///
	/// Never fails: empty input gives an empty poem.
	pub fn poem_with(&self, input: &str, tie_break: TieBreak) -> String {
		let mut poem = String::with_capacity(input.len());
		let mut previous: Option<String> = None;

		for word in tokenize(input) {
			let folded = fold(word);
			if let Some(prev) = &previous {
				poem.push(' ');
				if let Some(bridge) = self.bridge_folded(prev, &folded, tie_break) {
					poem.push_str(bridge);
					poem.push(' ');
				}
			}
			poem.push_str(word);
			previous = Some(folded);
		}

		poem
	}

	/// Finds the bridge word between `first` and `second`, if any.
	///
	/// The returned word `b` maximizes `weight(first -> b) + weight(b -> second)`
	/// among all two-edge paths. Ties are resolved with `tie_break`.
	pub fn bridge(&self, first: &str, second: &str, tie_break: TieBreak) -> Option<&str> {
		self.bridge_folded(&fold(first), &fold(second), tie_break)
	}

	fn bridge_folded(&self, first: &str, second: &str, tie_break: TieBreak) -> Option<&str> {
		let source = self.graph.vertex(first)?;

		let mut best_weight = 0;
		let mut candidates: Vec<&str> = Vec::new();
		for (bridge, first_weight) in source.targets() {
			let Some(second_weight) = self.graph.vertex(bridge).and_then(|v| v.target_weight(second)) else {
				continue;
			};

			let weight = first_weight + second_weight;
			if weight > best_weight {
				best_weight = weight;
				candidates.clear();
				candidates.push(bridge);
			} else if weight == best_weight {
				candidates.push(bridge);
			}
		}

		let chosen = match tie_break {
			TieBreak::Lexical => candidates.iter().min().copied(),
			TieBreak::Random => candidates.iter().choose(&mut rand::rng()).copied(),
		};
		trace!("bridge {:?} -> {:?}: {:?} (weight {})", first, second, chosen, best_weight);
		chosen
	}
}

impl fmt::Display for GraphPoet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(&self.graph, f)
	}
}
