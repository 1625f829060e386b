/// Splits text into words.
///
/// A word is a maximal run of non-whitespace characters. Punctuation is
/// kept as part of the word and the original case is preserved.
pub fn tokenize(text: &str) -> impl Iterator<Item = &str> {
	text.split_whitespace()
}

/// Returns the folded form of a word, used as vertex identity.
pub fn fold(word: &str) -> String {
	word.to_lowercase()
}
