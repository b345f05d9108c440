use serde_json::{Map, Value};

use aisle_domain::json_object;

use crate::{
	AisleService, Error, Result, prompts,
	state::{Constraints, Plan, Source, Stage, Task},
};

impl AisleService {
	pub async fn plan(&self, query: &str, task: Task, constraints: &Constraints) -> Result<Plan> {
		let messages = prompts::planner_messages(query, task, constraints);
		let raw = self.providers.completion.complete(&self.cfg.providers.llm, &messages).await?;

		parse_plan(&raw)
	}
}

/// Reads a plan from model output.
///
/// Unrecognised sources are dropped and an empty source set becomes the private index, the only
/// backend there is. Missing field lists take the fallback plan's values.
pub fn parse_plan(raw: &str) -> Result<Plan> {
	let map = json_object::first_json_object(raw)
		.ok_or_else(|| Error::invalid(Stage::Planner, "no JSON object in output."))?;
	let fallback = Plan::fallback();
	let mut sources = Vec::new();

	for source in string_list(&map, "sources").unwrap_or_default() {
		match Source::parse(&source) {
			Some(source) if !sources.contains(&source) => sources.push(source),
			Some(_) => {},
			None => tracing::debug!(source = %source, "Ignoring unknown retrieval source."),
		}
	}

	if sources.is_empty() {
		sources = fallback.sources;
	}

	Ok(Plan {
		sources,
		retrieval_fields: string_list(&map, "retrieval_fields")
			.unwrap_or(fallback.retrieval_fields),
		comparison_criteria: string_list(&map, "comparison_criteria")
			.unwrap_or(fallback.comparison_criteria),
		filters: map
			.get("filters")
			.and_then(Value::as_object)
			.map(Constraints::from_object)
			.unwrap_or_default(),
	})
}

fn string_list(map: &Map<String, Value>, key: &str) -> Option<Vec<String>> {
	let items = map.get(key)?.as_array()?;

	Some(
		items
			.iter()
			.filter_map(Value::as_str)
			.map(str::trim)
			.filter(|item| !item.is_empty())
			.map(str::to_string)
			.collect(),
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_full_plan() {
		let plan = parse_plan(
			r#"{"sources": ["private_rag", "private_index"], "retrieval_fields": ["title", "price"],
			"comparison_criteria": ["price"], "filters": {"max_price": "18"}}"#,
		)
		.expect("plan");

		assert_eq!(plan.sources, vec![Source::PrivateIndex]);
		assert_eq!(plan.retrieval_fields, vec!["title", "price"]);
		assert_eq!(plan.comparison_criteria, vec!["price"]);
		assert_eq!(plan.filters.max_price, Some(18.0));
	}

	#[test]
	fn unknown_sources_fall_back_to_private_index() {
		let plan = parse_plan(r#"{"sources": ["web"], "filters": {}}"#).expect("plan");

		assert_eq!(plan.sources, vec![Source::PrivateIndex]);
		assert_eq!(plan.retrieval_fields, Plan::fallback().retrieval_fields);
		assert!(plan.filters.is_empty());
	}

	#[test]
	fn output_without_json_is_rejected() {
		let err = parse_plan("no plan today").expect_err("Expected invalid plan.");

		assert!(matches!(err, Error::InvalidResponse { stage: Stage::Planner, .. }));
	}
}
