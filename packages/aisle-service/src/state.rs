use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use uuid::Uuid;

use aisle_domain::{citations::Citation, filters};
use aisle_storage::catalog::CatalogRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
	#[default]
	ProductSearch,
	Comparison,
	Recommendation,
	AvailabilityCheck,
}
impl Task {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::ProductSearch => "product_search",
			Self::Comparison => "comparison",
			Self::Recommendation => "recommendation",
			Self::AvailabilityCheck => "availability_check",
		}
	}
}

/// User constraints recognised by the router. Absent keys stay `None` and are not serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub product: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub min_price: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max_price: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub material: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub brand: Option<String>,
}
impl Constraints {
	/// Reads the recognised keys from a model-produced object, dropping null, blank and
	/// uninterpretable values.
	pub fn from_object(map: &Map<String, Value>) -> Self {
		let text = |key: &str| {
			map.get(key)
				.and_then(Value::as_str)
				.map(str::trim)
				.filter(|value| !value.is_empty())
				.map(str::to_string)
		};
		let price = |key: &str| map.get(key).and_then(filters::parse_price);

		Self {
			product: text("product"),
			min_price: price("min_price"),
			max_price: price("max_price"),
			material: text("material"),
			brand: text("brand"),
		}
	}

	pub fn is_empty(&self) -> bool {
		*self == Self::default()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
	PrivateIndex,
}
impl Source {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim().to_lowercase().as_str() {
			"private_index" | "private_rag" | "rag" => Some(Self::PrivateIndex),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
	pub sources: Vec<Source>,
	pub retrieval_fields: Vec<String>,
	pub comparison_criteria: Vec<String>,
	pub filters: Constraints,
}
impl Plan {
	/// The plan used when the planning policy is unavailable.
	pub fn fallback() -> Self {
		Self {
			sources: vec![Source::PrivateIndex],
			retrieval_fields: ["title", "brand", "price", "rating"].map(String::from).to_vec(),
			comparison_criteria: ["price", "rating"].map(String::from).to_vec(),
			filters: Constraints::default(),
		}
	}
}

/// A catalog product surfaced by retrieval, with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
	pub doc_id: String,
	pub title: String,
	pub price: f64,
	pub category: String,
	pub brand: String,
	pub material: String,
	pub content: String,
	pub score: f32,
	pub source: Source,
}
impl Document {
	pub fn from_row(row: &CatalogRow, price: f64, score: f32) -> Self {
		Self {
			doc_id: row.product_id.clone(),
			title: row.name.clone(),
			price,
			category: row.category.clone().unwrap_or_default(),
			brand: row.brand.clone().unwrap_or_default(),
			material: row.material.clone().unwrap_or_default(),
			content: row.description.clone().unwrap_or_default(),
			score,
			source: Source::PrivateIndex,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
	Router,
	Planner,
	Retriever,
	Answerer,
}
impl Stage {
	pub const ORDER: [Self; 4] = [Self::Router, Self::Planner, Self::Retriever, Self::Answerer];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Router => "router",
			Self::Planner => "planner",
			Self::Retriever => "retriever",
			Self::Answerer => "answerer",
		}
	}
}
impl Display for Stage {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
	pub node: Stage,
	pub success: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub input: Option<Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub output: Option<Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	#[serde(serialize_with = "crate::time_serde::serialize")]
	pub at: OffsetDateTime,
}

/// What a stage hands back to the orchestrator: its own output, or the stage's fixed fallback
/// together with the reason the real output is missing.
#[derive(Debug)]
pub enum StageOutcome<T> {
	Completed(T),
	Degraded { fallback: T, reason: String },
}
impl<T> StageOutcome<T> {
	pub fn from_result<E>(result: Result<T, E>, fallback: impl FnOnce() -> T) -> Self
	where
		E: Display,
	{
		match result {
			Ok(output) => Self::Completed(output),
			Err(err) => Self::Degraded { fallback: fallback(), reason: err.to_string() },
		}
	}

	pub fn into_parts(self) -> (T, Option<String>) {
		match self {
			Self::Completed(output) => (output, None),
			Self::Degraded { fallback, reason } => (fallback, Some(reason)),
		}
	}
}

/// The record threaded through the pipeline. Stage outputs are `None` until their stage runs.
#[derive(Debug, Clone, Serialize)]
pub struct QueryState {
	pub run_id: Uuid,
	query: String,
	pub task: Option<Task>,
	pub constraints: Option<Constraints>,
	pub safety_flags: Option<Vec<String>>,
	pub plan: Option<Plan>,
	pub retrieved_docs: Option<Vec<Document>>,
	pub answer: Option<String>,
	pub citations: Option<Vec<Citation>>,
	step_log: Vec<LogEntry>,
}
impl QueryState {
	pub fn new(query: impl Into<String>) -> Self {
		Self {
			run_id: Uuid::new_v4(),
			query: query.into(),
			task: None,
			constraints: None,
			safety_flags: None,
			plan: None,
			retrieved_docs: None,
			answer: None,
			citations: None,
			step_log: Vec::new(),
		}
	}

	pub fn query(&self) -> &str {
		&self.query
	}

	pub fn step_log(&self) -> &[LogEntry] {
		&self.step_log
	}

	pub fn documents(&self) -> &[Document] {
		self.retrieved_docs.as_deref().unwrap_or_default()
	}

	pub(crate) fn record_success(&mut self, node: Stage, input: Option<Value>, output: Value) {
		self.step_log.push(LogEntry {
			node,
			success: true,
			input,
			output: Some(output),
			error: None,
			at: OffsetDateTime::now_utc(),
		});
	}

	pub(crate) fn record_failure(&mut self, node: Stage, reason: String) {
		self.step_log.push(LogEntry {
			node,
			success: false,
			input: None,
			output: None,
			error: Some(reason),
			at: OffsetDateTime::now_utc(),
		});
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn constraints_keep_only_present_values() {
		let map = serde_json::json!({
			"product": "longboard",
			"max_price": "$1000",
			"min_price": null,
			"brand": "  ",
			"color": "blue"
		});
		let constraints = Constraints::from_object(map.as_object().expect("object"));

		assert_eq!(constraints.product.as_deref(), Some("longboard"));
		assert_eq!(constraints.max_price, Some(1_000.0));
		assert!(constraints.min_price.is_none());
		assert!(constraints.brand.is_none());
		assert_eq!(
			serde_json::to_value(&constraints).expect("serialize"),
			serde_json::json!({ "product": "longboard", "max_price": 1000.0 })
		);
	}

	#[test]
	fn fallback_plan_matches_fixed_defaults() {
		let plan = Plan::fallback();

		assert_eq!(plan.sources, vec![Source::PrivateIndex]);
		assert_eq!(plan.retrieval_fields, vec!["title", "brand", "price", "rating"]);
		assert_eq!(plan.comparison_criteria, vec!["price", "rating"]);
		assert!(plan.filters.is_empty());
	}

	#[test]
	fn degraded_outcome_carries_fallback_and_reason() {
		let outcome: StageOutcome<Task> =
			StageOutcome::from_result(Err::<Task, _>("timeout"), Task::default);
		let (task, reason) = outcome.into_parts();

		assert_eq!(task, Task::ProductSearch);
		assert_eq!(reason.as_deref(), Some("timeout"));
	}

	#[test]
	fn new_state_has_no_stage_outputs() {
		let state = QueryState::new("puzzles around $18");

		assert_eq!(state.query(), "puzzles around $18");
		assert!(state.task.is_none() && state.plan.is_none() && state.answer.is_none());
		assert!(state.documents().is_empty());
		assert!(state.step_log().is_empty());
	}

	#[test]
	fn log_entries_serialize_compactly() {
		let mut state = QueryState::new("kettle");

		state.record_success(Stage::Router, None, serde_json::json!({ "task": "product_search" }));
		state.record_failure(Stage::Planner, "planner timed out".to_string());

		let json = serde_json::to_value(&state).expect("serialize");
		let log = json["step_log"].as_array().expect("step_log");

		assert_eq!(json["query"], "kettle");
		assert_eq!(log[0]["node"], "router");
		assert!(log[0].get("error").is_none() && log[0].get("input").is_none());
		assert!(log[0]["at"].as_str().is_some_and(|at| at.contains('T')));
		assert_eq!(log[1]["success"], false);
		assert_eq!(log[1]["error"], "planner timed out");
		assert!(log[1].get("output").is_none());
	}
}
