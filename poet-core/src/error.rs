use std::io;

/// Errors raised while building a [`GraphPoet`](crate::model::poet::GraphPoet).
///
/// Poem generation itself never fails: once an engine exists, every input
/// string produces a poem.
#[derive(Debug, thiserror::Error)]
pub enum PoetError {
	/// The corpus could not be opened or read (including non UTF-8 content).
	#[error("corpus source unavailable ({origin}): {source}")]
	SourceUnavailable {
		origin: String,
		#[source]
		source: io::Error,
	},
}

pub type Result<T> = std::result::Result<T, PoetError>;
