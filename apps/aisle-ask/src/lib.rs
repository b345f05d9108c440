use std::{
	fmt::Write as _,
	fs,
	path::{Path, PathBuf},
	sync::Arc,
	time::Instant,
};

use clap::Parser;
use color_eyre::eyre;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use aisle_service::{AisleService, QueryState};
use aisle_storage::vector::VectorStore;

pub const DEMO_QUERIES: [&str; 2] = ["recommend longboard under $1000", "puzzles around $18"];

#[derive(Debug, Parser)]
#[command(
	version = aisle_cli::VERSION,
	rename_all = "kebab",
	styles = aisle_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Read additional queries from a file, one per line. Blank lines and `#` comments are skipped.
	#[arg(long = "queries", value_name = "FILE")]
	pub queries_file: Option<PathBuf>,
	/// Print each final state as JSON instead of a report.
	#[arg(long)]
	pub json: bool,
	/// Queries to answer. The demo queries run when none are given.
	#[arg(value_name = "QUERY")]
	pub queries: Vec<String>,
}

#[derive(Debug, Serialize)]
struct AskOutput {
	#[serde(flatten)]
	state: QueryState,
	latency_ms: f64,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = aisle_config::load(&args.config)?;

	init_tracing(&config.service.log_level);

	let queries = collect_queries(&args)?;
	let store = Arc::new(VectorStore::load(&config.catalog)?);

	tracing::info!(queries = queries.len(), products = store.len(), "Answering queries.");

	let service = AisleService::new(config, store);
	let mut outputs = Vec::with_capacity(queries.len());

	for query in &queries {
		let start = Instant::now();
		let state = service.invoke(query).await;
		let latency_ms = start.elapsed().as_secs_f64() * 1_000.0;

		if args.json {
			outputs.push(AskOutput { state, latency_ms });
		} else {
			println!("{}", render_report(&state, latency_ms));
		}
	}

	if args.json {
		let json = serde_json::to_string_pretty(&outputs)?;

		println!("{json}");
	}

	Ok(())
}

fn init_tracing(log_level: &str) {
	let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn collect_queries(args: &Args) -> color_eyre::Result<Vec<String>> {
	let mut queries: Vec<String> = args
		.queries
		.iter()
		.map(|query| query.trim())
		.filter(|query| !query.is_empty())
		.map(str::to_string)
		.collect();

	if let Some(path) = &args.queries_file {
		queries.extend(load_queries(path)?);
	}
	if queries.is_empty() {
		if args.queries_file.is_some() {
			return Err(eyre::eyre!("No queries found in the queries file."));
		}

		queries = DEMO_QUERIES.map(String::from).to_vec();
	}

	Ok(queries)
}

fn load_queries(path: &Path) -> color_eyre::Result<Vec<String>> {
	let raw = fs::read_to_string(path)
		.map_err(|err| eyre::eyre!("Failed to read queries file {}: {err}.", path.display()))?;

	Ok(parse_queries(&raw))
}

fn parse_queries(raw: &str) -> Vec<String> {
	raw.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty() && !line.starts_with('#'))
		.map(str::to_string)
		.collect()
}

fn render_report(state: &QueryState, latency_ms: f64) -> String {
	let mut out = String::new();
	let rule = "=".repeat(72);

	let _ = writeln!(out, "{rule}");
	let _ = writeln!(out, "Query: {}", state.query());
	let _ = writeln!(out, "Run: {}  ({latency_ms:.0} ms)", state.run_id);
	let _ = writeln!(out, "{rule}");

	if let Some(task) = state.task {
		let _ = writeln!(out, "Task: {}", task.as_str());
	}
	if let Some(constraints) = state.constraints.as_ref().filter(|c| !c.is_empty()) {
		let _ = writeln!(out, "Constraints: {}", to_json(constraints));
	}
	if let Some(flags) = state.safety_flags.as_ref().filter(|flags| !flags.is_empty()) {
		let _ = writeln!(out, "Safety flags: {}", flags.join(", "));
	}
	if let Some(plan) = &state.plan {
		let _ = writeln!(out, "Compare on: {}", plan.comparison_criteria.join(", "));
	}

	let _ = writeln!(out, "\nProducts ({}):", state.documents().len());

	for (idx, doc) in state.documents().iter().enumerate() {
		let _ = writeln!(
			out,
			"  [DOC {}] {} | ${:.2} | {} | score {:.3}",
			idx + 1,
			doc.title,
			doc.price,
			doc.doc_id,
			doc.score
		);
	}

	let _ = writeln!(out, "\nAnswer:\n{}", state.answer.as_deref().unwrap_or_default());

	if let Some(citations) = state.citations.as_ref().filter(|citations| !citations.is_empty()) {
		let rendered: Vec<String> = citations.iter().map(ToString::to_string).collect();
		let _ = writeln!(out, "Citations: {}", rendered.join(", "));
	}

	let _ = writeln!(out, "\nExecution log:");

	for entry in state.step_log() {
		match &entry.error {
			None => {
				let _ = writeln!(out, "  {:<10} ok", entry.node.as_str());
			},
			Some(error) => {
				let _ = writeln!(out, "  {:<10} fallback: {error}", entry.node.as_str());
			},
		}
	}

	out
}

fn to_json<T>(value: &T) -> String
where
	T: Serialize,
{
	serde_json::to_string(value).unwrap_or_default()
}
