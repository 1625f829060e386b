use std::collections::HashMap;

use serde::Serialize;

/// A single word of the affinity graph together with its adjacencies.
///
/// A `Vertex` is identified by its folded (lowercase) `key` and stores
/// every observed adjacency in both directions:
/// - `targets`: words that followed this word, with their counts
/// - `sources`: words that preceded this word, with their counts
///
/// Keeping both sides makes `outgoing_from` and `incoming_to` queries
/// proportional to the vertex degree.
///
/// ## Invariants
/// - Every stored weight is strictly positive
/// - `a.targets[b] == b.sources[a]` for every edge `a -> b` (maintained by the graph)
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Vertex {
	/// Folded word identifying the vertex.
	key: String,
	/// Outgoing edges indexed by target word.
	/// Example: { "of" => 3, "the" => 1 }
	targets: HashMap<String, usize>,
	/// Incoming edges indexed by source word.
	sources: HashMap<String, usize>,
}

impl Vertex {
	/// Creates a vertex with no adjacencies.
	pub(crate) fn new(key: &str) -> Self {
		Self {
			key: key.to_owned(),
			targets: HashMap::new(),
			sources: HashMap::new(),
		}
	}

	pub(crate) fn key(&self) -> &str {
		&self.key
	}

	pub(crate) fn targets(&self) -> &HashMap<String, usize> {
		&self.targets
	}

	pub(crate) fn sources(&self) -> &HashMap<String, usize> {
		&self.sources
	}

	/// Weight of the edge toward `target`, if any.
	pub(crate) fn target_weight(&self, target: &str) -> Option<usize> {
		self.targets.get(target).copied()
	}

	/// Replaces the weight of the edge toward `target`.
	///
	/// Returns the previous weight, or 0 if the edge did not exist.
	pub(crate) fn set_target(&mut self, target: &str, weight: usize) -> usize {
		self.targets.insert(target.to_owned(), weight).unwrap_or(0)
	}

	/// Replaces the weight of the edge coming from `source`.
	pub(crate) fn set_source(&mut self, source: &str, weight: usize) {
		self.sources.insert(source.to_owned(), weight);
	}

	/// Adds `weight` to the edge toward `target`, creating it if missing.
	///
	/// Returns the resulting weight.
	pub(crate) fn add_target(&mut self, target: &str, weight: usize) -> usize {
		let entry = self.targets.entry(target.to_owned()).or_insert(0);
		*entry += weight;
		*entry
	}

	/// Adds `weight` to the edge coming from `source`, creating it if missing.
	pub(crate) fn add_source(&mut self, source: &str, weight: usize) {
		*self.sources.entry(source.to_owned()).or_insert(0) += weight;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn set_target_returns_previous_weight() {
		let mut vertex = Vertex::new("a");
		assert_eq!(vertex.set_target("b", 4), 0);
		assert_eq!(vertex.set_target("b", 2), 4);
		assert_eq!(vertex.target_weight("b"), Some(2));
	}

	#[test]
	fn add_target_accumulates() {
		let mut vertex = Vertex::new("a");
		assert_eq!(vertex.add_target("b", 1), 1);
		assert_eq!(vertex.add_target("b", 3), 4);
		assert_eq!(vertex.target_weight("b"), Some(4));
	}

	#[test]
	fn sources_are_independent_from_targets() {
		let mut vertex = Vertex::new("a");
		vertex.add_source("z", 2);
		assert!(vertex.targets().is_empty());
		assert_eq!(vertex.sources().get("z"), Some(&2));
		assert_eq!(vertex.key(), "a");
	}
}
