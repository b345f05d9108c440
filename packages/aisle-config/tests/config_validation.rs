use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::{Table, Value};

use aisle_config::{Config, Error};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_table() -> Table {
	toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.")
}

fn section<'a>(root: &'a mut Table, path: &[&str]) -> &'a mut Table {
	let mut table = root;

	for key in path {
		table = table
			.get_mut(*key)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Template config must include [{key}]."));
	}

	table
}

fn render(table: &Table) -> String {
	toml::to_string(table).expect("Failed to render template config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("aisle_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_table(table: &Table) -> aisle_config::Result<Config> {
	let path = write_temp_config(render(table));
	let result = aisle_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn base_config() -> Config {
	toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse test config.")
}

#[test]
fn sample_config_loads_and_trims_api_base() {
	let cfg = load_table(&sample_table()).expect("Sample config must load.");

	assert_eq!(cfg.providers.embedding.api_base, "https://api.openai.com/v1");
	assert_eq!(cfg.providers.filter_extractor.max_tokens, Some(200));
	assert_eq!(cfg.providers.llm.max_tokens, None);
	assert_eq!(cfg.retrieval.top_k, 5);
}

#[test]
fn retrieval_and_answer_sections_are_optional() {
	let mut table = sample_table();

	table.remove("retrieval");
	table.remove("answer");

	let cfg = load_table(&table).expect("Config without optional sections must load.");

	assert_eq!(cfg.retrieval.top_k, 5);
	assert_eq!(cfg.retrieval.candidate_multiplier, 5);
	assert_eq!(cfg.answer.snippet_chars, 300);
}

#[test]
fn embedding_dimensions_must_match_catalog() {
	let mut table = sample_table();

	section(&mut table, &["providers", "embedding"])
		.insert("dimensions".to_string(), Value::Integer(384));

	let err = load_table(&table).expect_err("Expected dimension mismatch error.");

	assert!(
		err.to_string().contains("providers.embedding.dimensions must match catalog.dimensions."),
		"Unexpected error: {err}"
	);
}

#[test]
fn top_k_must_be_positive() {
	let mut cfg = base_config();

	cfg.retrieval.top_k = 0;

	let err = aisle_config::validate(&cfg).expect_err("Expected top_k validation error.");

	assert!(
		err.to_string().contains("retrieval.top_k must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn candidate_multiplier_must_be_at_least_one() {
	let mut cfg = base_config();

	cfg.retrieval.candidate_multiplier = 0;

	assert!(matches!(aisle_config::validate(&cfg), Err(Error::Validation { .. })));
}

#[test]
fn temperature_must_be_in_range() {
	let mut cfg = base_config();

	cfg.providers.filter_extractor.temperature = 3.5;

	let err = aisle_config::validate(&cfg).expect_err("Expected temperature validation error.");

	assert!(
		err.to_string()
			.contains("providers.filter_extractor.temperature must be in the range 0.0-2.0."),
		"Unexpected error: {err}"
	);
}

#[test]
fn blank_api_key_is_rejected() {
	let mut cfg = base_config();

	cfg.providers.llm.api_key = "   ".to_string();

	let err = aisle_config::validate(&cfg).expect_err("Expected api_key validation error.");

	assert!(
		err.to_string().contains("Provider llm api_key must be non-empty."),
		"Unexpected error: {err}"
	);
}

#[test]
fn env_api_key_is_resolved() {
	let mut cfg = base_config();

	cfg.providers.llm.api_key = "env:AISLE_LLM_KEY".to_string();
	cfg.providers.llm.api_base = "  https://api.groq.com/openai/v1/ ".to_string();

	aisle_config::normalize_with(&mut cfg, |name| {
		(name == "AISLE_LLM_KEY").then(|| "gsk-from-env".to_string())
	})
	.expect("Config with env key must normalize.");

	assert_eq!(cfg.providers.llm.api_key, "gsk-from-env");
	assert_eq!(cfg.providers.llm.api_base, "https://api.groq.com/openai/v1");
	assert!(!cfg.providers.embedding.api_key.starts_with("env:"));
}

#[test]
fn missing_env_api_key_is_reported() {
	let mut table = sample_table();

	section(&mut table, &["providers", "embedding"]).insert(
		"api_key".to_string(),
		Value::String("env:AISLE_TEST_KEY_THAT_IS_NEVER_SET".to_string()),
	);

	let err = load_table(&table).expect_err("Expected missing env error.");

	match err {
		Error::MissingEnv { field, name } => {
			assert_eq!(field, "providers.embedding.api_key");
			assert_eq!(name, "AISLE_TEST_KEY_THAT_IS_NEVER_SET");
		},
		other => panic!("Unexpected error: {other}"),
	}
}

#[test]
fn unreadable_path_is_reported() {
	let path = env::temp_dir().join("aisle_config_test_missing_file.toml");
	let err = aisle_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }));
}
