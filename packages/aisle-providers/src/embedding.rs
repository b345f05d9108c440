use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::{Error, Result};

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
	data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
	#[serde(default)]
	index: Option<usize>,
	embedding: Vec<f32>,
}

/// Embeds `texts` with an OpenAI-compatible `/embeddings` endpoint, one vector per input in
/// input order.
pub async fn embed(
	cfg: &aisle_config::EmbeddingProviderConfig,
	texts: &[String],
) -> Result<Vec<Vec<f32>>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let res = client
		.post(format!("{}{}", cfg.api_base, cfg.path))
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&serde_json::json!({
			"model": cfg.model,
			"input": texts,
			"dimensions": cfg.dimensions,
		}))
		.send()
		.await?;
	let vectors = vectors_in_input_order(crate::json_body(&cfg.provider_id, res).await?)?;

	if vectors.len() != texts.len() {
		return Err(Error::InvalidResponse {
			message: format!(
				"Embedding response has {} vectors for {} inputs.",
				vectors.len(),
				texts.len()
			),
		});
	}
	if let Some(bad) = vectors.iter().find(|vec| vec.len() != cfg.dimensions as usize) {
		return Err(Error::InvalidResponse {
			message: format!(
				"Embedding has {} dimensions, configured {}.",
				bad.len(),
				cfg.dimensions
			),
		});
	}

	tracing::debug!(provider_id = %cfg.provider_id, inputs = texts.len(), "Embeddings received.");

	Ok(vectors)
}

/// Items without an `index` keep their position in `data`.
fn vectors_in_input_order(json: Value) -> Result<Vec<Vec<f32>>> {
	let response: EmbeddingResponse = serde_json::from_value(json).map_err(|err| {
		Error::InvalidResponse { message: format!("Malformed embedding response: {err}.") }
	})?;
	let mut items: Vec<(usize, Vec<f32>)> = response
		.data
		.into_iter()
		.enumerate()
		.map(|(position, item)| (item.index.unwrap_or(position), item.embedding))
		.collect();

	items.sort_by_key(|(index, _)| *index);

	Ok(items.into_iter().map(|(_, embedding)| embedding).collect())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reorders_by_reported_index() {
		let json = serde_json::json!({
			"object": "list",
			"data": [
				{ "index": 1, "embedding": [2.0, 3.0] },
				{ "index": 0, "embedding": [0.5, 1.5] }
			]
		});

		assert_eq!(
			vectors_in_input_order(json).expect("parse failed"),
			vec![vec![0.5, 1.5], vec![2.0, 3.0]]
		);
	}

	#[test]
	fn missing_data_is_invalid() {
		let json = serde_json::json!({ "error": { "message": "quota" } });

		assert!(matches!(vectors_in_input_order(json), Err(Error::InvalidResponse { .. })));
	}

	#[test]
	fn rejects_non_numeric_values() {
		let json = serde_json::json!({ "data": [{ "embedding": [0.1, "x"] }] });

		assert!(vectors_in_input_order(json).is_err());
	}
}
