//! Chat messages sent to the completion provider for each model-backed step.

use serde_json::{Value, json};

use crate::state::{Constraints, Task};

pub const ROUTER_SYSTEM: &str = "You classify shopping queries. Respond with one JSON object with keys \
\"task\" (one of product_search, comparison, recommendation, availability_check), \
\"constraints\" (object with optional product, min_price, max_price, material, brand; omit unknown \
values) and \"safety_flags\" (array drawn from adult_content, age_restricted, hazardous_material, \
medical_claim, weapon). Output JSON only.";

pub const PLANNER_SYSTEM: &str = "You plan catalog retrieval for a shopping assistant. Respond with one \
JSON object with keys \"sources\" (array, use \"private_index\"), \"retrieval_fields\" (array of \
product fields to read), \"comparison_criteria\" (array of fields to compare on) and \"filters\" \
(object with optional product, min_price, max_price, material, brand). Output JSON only.";

pub const FILTER_SYSTEM: &str = "You extract product search filters. Respond with one JSON object \
using only these keys when the query states them: category, min_price, max_price, material, brand. \
Prices are plain numbers. Respond with {} when nothing applies.";

pub const ANSWER_SYSTEM: &str = "You are a shopping assistant. Answer using only the documents \
provided. Cite documents inline with their [DOC n] markers and end with a final line of the form \
\"Citations: [DOC 1], [DOC 2]\". If no document fits, say so plainly.";

pub fn router_messages(query: &str) -> Vec<Value> {
	vec![system(ROUTER_SYSTEM), user(format!("Query: {query}"))]
}

pub fn planner_messages(query: &str, task: Task, constraints: &Constraints) -> Vec<Value> {
	let constraints = serde_json::to_string(constraints).unwrap_or_else(|_| "{}".to_string());

	vec![
		system(PLANNER_SYSTEM),
		user(format!("Query: {query}\nTask: {}\nConstraints: {constraints}", task.as_str())),
	]
}

pub fn filter_messages(query: &str) -> Vec<Value> {
	vec![system(FILTER_SYSTEM), user(format!("Query: {query}"))]
}

pub fn answer_messages(
	query: &str,
	task: Task,
	comparison_criteria: &[String],
	documents: &str,
) -> Vec<Value> {
	let criteria =
		if comparison_criteria.is_empty() { "none".to_string() } else { comparison_criteria.join(", ") };

	vec![
		system(ANSWER_SYSTEM),
		user(format!(
			"Query: {query}\nTask: {}\nCompare on: {criteria}\n\nDocuments:\n{documents}",
			task.as_str()
		)),
	]
}

fn system(content: &str) -> Value {
	json!({ "role": "system", "content": content })
}

fn user(content: String) -> Value {
	json!({ "role": "user", "content": content })
}
