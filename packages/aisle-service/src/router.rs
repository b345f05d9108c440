use serde::Serialize;
use serde_json::Value;

use aisle_domain::{json_object, safety};

use crate::{
	AisleService, Error, Result, prompts,
	state::{Constraints, Stage, Task},
};

/// The router's classification of a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Route {
	pub task: Task,
	pub constraints: Constraints,
	pub safety_flags: Vec<String>,
}

impl AisleService {
	pub async fn route(&self, query: &str) -> Result<Route> {
		let messages = prompts::router_messages(query);
		let raw = self.providers.completion.complete(&self.cfg.providers.llm, &messages).await?;

		parse_route(&raw)
	}
}

/// Reads a route from model output. The task must be present and recognised; constraints and
/// safety flags are optional and unrecognised entries are dropped.
pub fn parse_route(raw: &str) -> Result<Route> {
	let map = json_object::first_json_object(raw)
		.ok_or_else(|| Error::invalid(Stage::Router, "no JSON object in output."))?;
	let task = map
		.get("task")
		.ok_or_else(|| Error::invalid(Stage::Router, "task is missing."))
		.and_then(|value| {
			serde_json::from_value::<Task>(value.clone())
				.map_err(|err| Error::invalid(Stage::Router, format!("unknown task: {err}.")))
		})?;
	let constraints =
		map.get("constraints").and_then(Value::as_object).map(Constraints::from_object);
	let safety_flags = map
		.get("safety_flags")
		.and_then(Value::as_array)
		.map(|flags| safety::sanitize_flags(flags.iter().filter_map(Value::as_str)));

	Ok(Route {
		task,
		constraints: constraints.unwrap_or_default(),
		safety_flags: safety_flags.unwrap_or_default(),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_route_wrapped_in_prose() {
		let route = parse_route(
			"Sure! {\"task\": \"recommendation\", \"constraints\": {\"product\": \"longboard\", \
			 \"max_price\": 1000, \"brand\": null}, \"safety_flags\": [\"weapon\", \"nonsense\"]}",
		)
		.expect("route");

		assert_eq!(route.task, Task::Recommendation);
		assert_eq!(route.constraints.product.as_deref(), Some("longboard"));
		assert_eq!(route.constraints.max_price, Some(1_000.0));
		assert!(route.constraints.brand.is_none());
		assert_eq!(route.safety_flags, vec!["weapon"]);
	}

	#[test]
	fn missing_sections_default_to_empty() {
		let route = parse_route("{\"task\": \"comparison\"}").expect("route");

		assert_eq!(route.task, Task::Comparison);
		assert!(route.constraints.is_empty());
		assert!(route.safety_flags.is_empty());
	}

	#[test]
	fn unknown_task_is_rejected() {
		let err = parse_route("{\"task\": \"haggle\"}").expect_err("Expected invalid task.");

		assert!(matches!(err, Error::InvalidResponse { stage: Stage::Router, .. }));
	}

	#[test]
	fn output_without_json_is_rejected() {
		assert!(parse_route("I think they want shoes.").is_err());
	}
}
