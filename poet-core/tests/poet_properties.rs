use poet_core::model::affinity_graph::AffinityGraphBuilder;
use poet_core::model::poet::GraphPoet;
use proptest::prelude::*;

fn word() -> impl Strategy<Value = String> {
	prop::sample::select(vec!["a", "B", "c", "the", "The", "cat", "sat.", "on", "MAT"]).prop_map(str::to_owned)
}

fn words(max: usize) -> impl Strategy<Value = Vec<String>> {
	prop::collection::vec(word(), 0..max)
}

proptest! {
	#[test]
	fn edge_weights_sum_to_pair_count(tokens in words(60)) {
		let graph = AffinityGraphBuilder::from_tokens(&tokens).freeze();
		let total: usize = graph.vertices().flat_map(|v| graph.outgoing_from(v)).map(|(_, w)| w).sum();
		prop_assert_eq!(total, tokens.len().saturating_sub(1));
		prop_assert!(graph.vertices().flat_map(|v| graph.outgoing_from(v)).all(|(_, w)| w >= 1));
	}

	#[test]
	fn overlapping_halves_merge_to_whole(tokens in words(60), split in 0usize..60) {
		prop_assume!(tokens.len() >= 2);
		let split = split % (tokens.len() - 1);

		let mut merged = AffinityGraphBuilder::from_tokens(&tokens[..=split]);
		merged.merge(&AffinityGraphBuilder::from_tokens(&tokens[split..]));
		prop_assert_eq!(merged.freeze(), AffinityGraphBuilder::from_tokens(&tokens).freeze());
	}

	#[test]
	fn poem_keeps_input_words_in_order(corpus in words(40), input in words(12)) {
		let poet = GraphPoet::from_corpus(&corpus.join(" "));
		let poem = poet.poem(&input.join("\n "));
		let output: Vec<&str> = poem.split(' ').filter(|w| !w.is_empty()).collect();

		prop_assert!(output.len() >= input.len());
		prop_assert!(output.len() <= (2 * input.len()).saturating_sub(1).max(input.len()));

		// Input words appear verbatim and in order; every extra word is a lowercase vertex
		let mut next = 0;
		for word in &output {
			if next < input.len() && *word == input[next] {
				next += 1;
			} else {
				prop_assert_eq!(word.to_lowercase(), word.to_string());
				prop_assert!(poet.graph().contains_vertex(word));
			}
		}
		prop_assert_eq!(next, input.len());
	}

	#[test]
	fn empty_corpus_poem_normalizes_whitespace(input in words(12)) {
		let poet = GraphPoet::from_corpus("");
		prop_assert_eq!(poet.poem(&input.join(" \t ")), input.join(" "));
	}
}
