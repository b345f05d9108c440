use unicode_segmentation::UnicodeSegmentation;

/// Cuts `text` to at most `max_graphemes` user-perceived characters and marks the cut with an
/// ellipsis. Text that already fits is returned unchanged.
pub fn truncate(text: &str, max_graphemes: usize) -> String {
	let trimmed = text.trim();

	match trimmed.grapheme_indices(true).nth(max_graphemes) {
		Some((cut, _)) => format!("{}...", trimmed[..cut].trim_end()),
		None => trimmed.to_string(),
	}
}
