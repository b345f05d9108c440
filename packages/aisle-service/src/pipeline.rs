//! Drives a query through router, planner, retriever and answerer.
//!
//! Every stage runs inside a failure boundary: an error becomes the stage's fallback value plus a
//! failed log entry, and the next stage runs regardless. `invoke` therefore always returns a
//! state with four log entries and a non-empty answer.

use serde_json::{Value, json};
use tracing::Instrument;

use aisle_domain::{filters::ProductFilters, snippet};

use crate::{
	AisleService,
	answerer::Answer,
	retrieval::{Retrieval, RetrievalPath},
	router::Route,
	state::{Plan, QueryState, Stage, StageOutcome},
};

const LOGGED_ANSWER_CHARS: usize = 100;
const LOGGED_TOP_RESULTS: usize = 3;

impl AisleService {
	pub async fn invoke(&self, query: &str) -> QueryState {
		let mut state = QueryState::new(query);
		let span = tracing::info_span!("pipeline", run_id = %state.run_id);

		async {
			self.run_router(&mut state).await;
			self.run_planner(&mut state).await;
			self.run_retriever(&mut state).await;
			self.run_answerer(&mut state).await;

			tracing::info!(
				documents = state.documents().len(),
				failed_stages = state.step_log().iter().filter(|entry| !entry.success).count(),
				"Query answered."
			);
		}
		.instrument(span)
		.await;

		state
	}

	async fn run_router(&self, state: &mut QueryState) {
		let input = json!({ "query": state.query() });
		let outcome = StageOutcome::from_result(self.route(state.query()).await, Route::default);
		let (route, failure) = outcome.into_parts();
		let output = json!({
			"task": route.task,
			"constraints": route.constraints,
			"safety_flags": route.safety_flags,
		});

		if !route.safety_flags.is_empty() {
			tracing::info!(flags = ?route.safety_flags, "Query raised safety flags.");
		}

		state.task = Some(route.task);
		state.constraints = Some(route.constraints);
		state.safety_flags = Some(route.safety_flags);

		record(state, Stage::Router, input, output, failure);
	}

	async fn run_planner(&self, state: &mut QueryState) {
		let task = state.task.unwrap_or_default();
		let constraints = state.constraints.clone().unwrap_or_default();
		let input = json!({ "query": state.query(), "task": task, "constraints": &constraints });
		let result = self.plan(state.query(), task, &constraints).await;
		let (plan, failure) = StageOutcome::from_result(result, Plan::fallback).into_parts();
		let output = serde_json::to_value(&plan).unwrap_or(Value::Null);

		state.plan = Some(plan);

		record(state, Stage::Planner, input, output, failure);
	}

	async fn run_retriever(&self, state: &mut QueryState) {
		let filters = state.plan.as_ref().map(|plan| plan.filters.clone()).unwrap_or_default();
		let input = json!({ "query": state.query(), "filters": filters });
		let k = self.cfg.retrieval.top_k as usize;
		let result = self.retrieve(state.query(), k).await;
		let (retrieval, failure) = StageOutcome::from_result(result, empty_retrieval).into_parts();
		let output = json!({
			"num_docs": retrieval.documents.len(),
			"filters": retrieval.filters,
			"path": retrieval.path,
			"candidates": retrieval.candidates,
			"backstop_dropped": retrieval.backstop_dropped,
			"top_results": retrieval
				.documents
				.iter()
				.take(LOGGED_TOP_RESULTS)
				.map(|doc| json!({ "title": doc.title, "price": doc.price }))
				.collect::<Vec<_>>(),
		});

		state.retrieved_docs = Some(retrieval.documents);

		record(state, Stage::Retriever, input, output, failure);
	}

	async fn run_answerer(&self, state: &mut QueryState) {
		let task = state.task.unwrap_or_default();
		let criteria =
			state.plan.as_ref().map(|plan| plan.comparison_criteria.clone()).unwrap_or_default();
		let input = json!({ "query": state.query(), "num_docs": state.documents().len() });
		let result = self.synthesize(state.query(), task, &criteria, state.documents()).await;
		let documents = state.documents();
		let (answer, failure) =
			StageOutcome::from_result(result, || Answer::fallback(documents)).into_parts();
		let output = json!({
			"answer": snippet::truncate(&answer.answer, LOGGED_ANSWER_CHARS),
			"citations": answer.citations,
		});

		state.answer = Some(answer.answer);
		state.citations = Some(answer.citations);

		record(state, Stage::Answerer, input, output, failure);
	}
}

fn empty_retrieval() -> Retrieval {
	Retrieval {
		filters: ProductFilters::default(),
		path: RetrievalPath::Relaxed,
		candidates: 0,
		backstop_dropped: 0,
		documents: Vec::new(),
	}
}

fn record(state: &mut QueryState, stage: Stage, input: Value, output: Value, failure: Option<String>) {
	match failure {
		None => state.record_success(stage, Some(input), output),
		Some(reason) => {
			tracing::warn!(stage = %stage, error = %reason, "Stage failed. Using fallback.");

			state.record_failure(stage, reason);
		},
	}
}
