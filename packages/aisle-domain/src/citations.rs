//! Citation handling for generated answers.
//!
//! Documents are presented to the model as `[DOC n]` blocks, 1-indexed in presentation order.
//! Answers are expected to end with a `Citations: [DOC 1], [DOC 2]` trailer, but models are not
//! contractually structured, so parsing is best-effort: trailer tokens come first, then any
//! inline tokens the trailer missed.

use std::fmt::{Display, Formatter};

use regex::Regex;
use serde::{Serialize, Serializer};

const TRAILER_PATTERN: &str = r"(?i)citations?:\s*(.+?)$";
const TOKEN_PATTERN: &str = r"\[DOC\s+(\d+)\]";

/// A reference to the `n`-th presented document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Citation(pub usize);
impl Citation {
	/// The bracketed marker used inside prompts and answers.
	pub fn marker(self) -> String {
		format!("[DOC {}]", self.0)
	}
}
impl Display for Citation {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "DOC {}", self.0)
	}
}
impl Serialize for Citation {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.collect_str(self)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAnswer {
	pub answer: String,
	pub citations: Vec<Citation>,
}

/// Splits a generated answer into its prose and an ordered, duplicate-free citation list.
pub fn parse_answer_with_citations(text: &str) -> ParsedAnswer {
	let mut body = text.trim();
	let mut citations = Vec::new();
	let token_re = Regex::new(TOKEN_PATTERN).ok();

	if let Some(trailer_re) = Regex::new(TRAILER_PATTERN).ok()
		&& let Some(caps) = trailer_re.captures(body)
		&& let (Some(whole), Some(segment)) = (caps.get(0), caps.get(1))
	{
		if let Some(token_re) = token_re.as_ref() {
			push_tokens(token_re, segment.as_str(), &mut citations);
		}

		body = body[..whole.start()].trim();
	}

	if let Some(token_re) = token_re.as_ref() {
		push_tokens(token_re, body, &mut citations);
	}

	ParsedAnswer { answer: body.to_string(), citations }
}

fn push_tokens(token_re: &Regex, text: &str, out: &mut Vec<Citation>) {
	for caps in token_re.captures_iter(text) {
		let Some(index) = caps.get(1).and_then(|m| m.as_str().parse::<usize>().ok()) else {
			continue;
		};
		let citation = Citation(index);

		if !out.contains(&citation) {
			out.push(citation);
		}
	}
}
