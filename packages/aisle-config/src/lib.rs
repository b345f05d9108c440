mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Answer, Catalog, Config, EmbeddingProviderConfig, LlmProviderConfig, Providers, Retrieval,
	Service,
};

use std::{env, fs, path::Path};

const ENV_KEY_PREFIX: &str = "env:";

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize_with(&mut cfg, |name| env::var(name).ok())?;

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.catalog.products_path.as_os_str().is_empty() {
		return Err(Error::Validation {
			message: "catalog.products_path must be non-empty.".to_string(),
		});
	}
	if cfg.catalog.embeddings_path.as_os_str().is_empty() {
		return Err(Error::Validation {
			message: "catalog.embeddings_path must be non-empty.".to_string(),
		});
	}
	if cfg.catalog.dimensions == 0 {
		return Err(Error::Validation {
			message: "catalog.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.catalog.dimensions {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match catalog.dimensions.".to_string(),
		});
	}
	if cfg.retrieval.top_k == 0 {
		return Err(Error::Validation {
			message: "retrieval.top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.candidate_multiplier == 0 {
		return Err(Error::Validation {
			message: "retrieval.candidate_multiplier must be at least one.".to_string(),
		});
	}
	if cfg.answer.snippet_chars == 0 {
		return Err(Error::Validation {
			message: "answer.snippet_chars must be greater than zero.".to_string(),
		});
	}

	for (label, llm) in
		[("llm", &cfg.providers.llm), ("filter_extractor", &cfg.providers.filter_extractor)]
	{
		if !llm.temperature.is_finite() || !(0.0..=2.0).contains(&llm.temperature) {
			return Err(Error::Validation {
				message: format!("providers.{label}.temperature must be in the range 0.0-2.0."),
			});
		}
		if llm.max_tokens == Some(0) {
			return Err(Error::Validation {
				message: format!("providers.{label}.max_tokens must be greater than zero."),
			});
		}
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("llm", &cfg.providers.llm.api_key),
		("filter_extractor", &cfg.providers.filter_extractor.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	Ok(())
}

/// Resolves `env:NAME` api keys through `lookup` and trims each `api_base`. `load` passes the
/// process environment.
pub fn normalize_with<F>(cfg: &mut Config, lookup: F) -> Result<()>
where
	F: Fn(&str) -> Option<String>,
{
	let providers = &mut cfg.providers;

	resolve_api_key(&mut providers.embedding.api_key, "providers.embedding.api_key", &lookup)?;
	resolve_api_key(&mut providers.llm.api_key, "providers.llm.api_key", &lookup)?;
	resolve_api_key(
		&mut providers.filter_extractor.api_key,
		"providers.filter_extractor.api_key",
		&lookup,
	)?;

	for api_base in [
		&mut providers.embedding.api_base,
		&mut providers.llm.api_base,
		&mut providers.filter_extractor.api_base,
	] {
		let trimmed = api_base.trim().trim_end_matches('/').to_string();

		*api_base = trimmed;
	}

	Ok(())
}

fn resolve_api_key<F>(key: &mut String, field: &str, lookup: &F) -> Result<()>
where
	F: Fn(&str) -> Option<String>,
{
	let Some(name) = key.trim().strip_prefix(ENV_KEY_PREFIX) else {
		return Ok(());
	};
	let name = name.trim().to_string();
	let value = lookup(&name)
		.ok_or_else(|| Error::MissingEnv { field: field.to_string(), name: name.clone() })?;

	*key = value;

	Ok(())
}
