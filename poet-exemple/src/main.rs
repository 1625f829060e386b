use std::env;

use log::info;
use poet_core::model::poet::{GraphPoet, TieBreak};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // First argument is the corpus file, the following ones are lines to augment
    let mut args = env::args().skip(1);
    let corpus = args.next().unwrap_or_else(|| "./data/mugar.txt".to_owned());
    let mut inputs: Vec<String> = args.collect();
    if inputs.is_empty() {
        inputs.push("Test the system.".to_owned());
    }

    // Fails with 'SourceUnavailable' if the corpus cannot be read
    let poet = GraphPoet::from_path(&corpus)?;
    info!(
        "corpus {}: {} words, {} adjacencies",
        corpus,
        poet.graph().vertex_count(),
        poet.graph().edge_count()
    );

    // Diagnostic dump of the affinity graph
    println!("{}", poet);

    for input in &inputs {
        // Default tie-break is deterministic (lexical order)
        println!("{} -> {}", input, poet.poem(input));
        // Random tie-break only matters when several bridges share the best weight
        println!("{} -> {} (random ties)", input, poet.poem_with(input, TieBreak::Random));
    }

    Ok(())
}
