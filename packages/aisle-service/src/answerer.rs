use std::fmt::Write as _;

use serde::Serialize;

use aisle_domain::{
	citations::{self, Citation, ParsedAnswer},
	snippet,
};

use crate::{
	AisleService, Error, Result, prompts,
	state::{Document, Stage, Task},
};

pub const NO_MATCHES_ANSWER: &str =
	"I couldn't find any products matching your criteria. Try adjusting your search.";
pub const NO_PRODUCTS_ANSWER: &str = "No products found.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
	pub answer: String,
	pub citations: Vec<Citation>,
}
impl Answer {
	/// Templated answer used when synthesis fails.
	pub fn fallback(documents: &[Document]) -> Self {
		match documents.first() {
			Some(top) => Self {
				answer: format!(
					"Found {} products. Top result: {} at ${:.2}",
					documents.len(),
					top.title,
					top.price
				),
				citations: vec![Citation(1)],
			},
			None => Self { answer: NO_PRODUCTS_ANSWER.to_string(), citations: Vec::new() },
		}
	}

	fn no_matches() -> Self {
		Self { answer: NO_MATCHES_ANSWER.to_string(), citations: Vec::new() }
	}
}

impl AisleService {
	/// Writes a grounded answer over `documents`. With no documents the model is not called.
	pub async fn synthesize(
		&self,
		query: &str,
		task: Task,
		comparison_criteria: &[String],
		documents: &[Document],
	) -> Result<Answer> {
		if documents.is_empty() {
			return Ok(Answer::no_matches());
		}

		let context = format_documents(documents, self.cfg.answer.snippet_chars as usize);
		let messages = prompts::answer_messages(query, task, comparison_criteria, &context);
		let raw = self.providers.completion.complete(&self.cfg.providers.llm, &messages).await?;

		grounded_answer(&raw, documents.len())
	}
}

/// Renders documents as numbered `[DOC n]` blocks, 1-indexed in order.
pub fn format_documents(documents: &[Document], snippet_chars: usize) -> String {
	let mut out = String::new();

	for (idx, doc) in documents.iter().enumerate() {
		if idx > 0 {
			out.push('\n');
		}

		let _ = writeln!(out, "{}", Citation(idx + 1).marker());
		let _ = writeln!(out, "Title: {}", or_na(&doc.title));
		let _ = writeln!(out, "Price: ${:.2}", doc.price);
		let _ = writeln!(out, "Brand: {}", or_na(&doc.brand));
		let _ = writeln!(out, "Material: {}", or_na(&doc.material));
		let _ = writeln!(out, "Category: {}", or_na(&doc.category));
		let _ = writeln!(out, "Content: {}", or_na(&snippet::truncate(&doc.content, snippet_chars)));
		let _ = writeln!(out, "Doc ID: {}", doc.doc_id);
	}

	out
}

/// Parses model output and keeps only citations that point at a presented document.
pub fn grounded_answer(raw: &str, document_count: usize) -> Result<Answer> {
	let ParsedAnswer { answer, mut citations } = citations::parse_answer_with_citations(raw);

	if answer.is_empty() {
		return Err(Error::invalid(Stage::Answerer, "answer text is empty."));
	}

	let before = citations.len();

	citations.retain(|citation| (1..=document_count).contains(&citation.0));

	if citations.len() < before {
		tracing::warn!(
			dropped = before - citations.len(),
			document_count,
			"Dropped citations to documents that were not presented."
		);
	}

	Ok(Answer { answer, citations })
}

fn or_na(value: &str) -> &str {
	if value.trim().is_empty() { "N/A" } else { value }
}
