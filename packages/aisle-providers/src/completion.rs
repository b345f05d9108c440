use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

/// Sends an OpenAI-compatible chat completion request and returns the first choice's text.
pub async fn complete(cfg: &aisle_config::LlmProviderConfig, messages: &[Value]) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = request_body(cfg, messages);
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json = crate::json_body(&cfg.provider_id, res).await?;

	tracing::debug!(provider_id = %cfg.provider_id, model = %cfg.model, "Completion received.");

	parse_completion_text(&json)
}

fn request_body(cfg: &aisle_config::LlmProviderConfig, messages: &[Value]) -> Value {
	let mut body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": messages,
	});

	if let (Some(max_tokens), Some(obj)) = (cfg.max_tokens, body.as_object_mut()) {
		obj.insert("max_tokens".to_string(), Value::from(max_tokens));
	}

	body
}

fn parse_completion_text(json: &Value) -> Result<String> {
	let content = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.ok_or_else(|| Error::InvalidResponse {
			message: "Completion response is missing choices[0].message.content.".to_string(),
		})?;

	Ok(content.trim().to_string())
}

#[cfg(test)]
mod tests {
	use serde_json::Map;

	use super::*;

	fn llm_config(max_tokens: Option<u32>) -> aisle_config::LlmProviderConfig {
		aisle_config::LlmProviderConfig {
			provider_id: "p".to_string(),
			api_base: "http://localhost".to_string(),
			api_key: "key".to_string(),
			path: "/chat/completions".to_string(),
			model: "m".to_string(),
			temperature: 0.2,
			max_tokens,
			timeout_ms: 1_000,
			default_headers: Map::new(),
		}
	}

	#[test]
	fn parses_first_choice_content() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "  {\"max_price\": 15}\n" } },
				{ "message": { "content": "ignored" } }
			]
		});
		let text = parse_completion_text(&json).expect("parse failed");

		assert_eq!(text, "{\"max_price\": 15}");
	}

	#[test]
	fn rejects_response_without_choices() {
		let json = serde_json::json!({ "error": { "message": "rate limited" } });

		assert!(matches!(parse_completion_text(&json), Err(Error::InvalidResponse { .. })));
	}

	#[test]
	fn max_tokens_is_sent_only_when_configured() {
		let messages = vec![serde_json::json!({ "role": "user", "content": "hi" })];
		let with_limit = request_body(&llm_config(Some(200)), &messages);
		let without_limit = request_body(&llm_config(None), &messages);

		assert_eq!(with_limit["max_tokens"], 200);
		assert!(without_limit.get("max_tokens").is_none());
	}
}
