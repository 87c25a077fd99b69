use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

/// Asks the LLM collaborator for one short prose sentence explaining a
/// match. The engine only supplies structured context and consumes the
/// string; callers treat an empty or failed response as "no justification",
/// never as a failed match.
pub async fn justify(
	cfg: &scholar_config::LlmProviderConfig,
	context: &Value,
) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": build_messages(context),
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_chat_content(json)
}

fn build_messages(context: &Value) -> Vec<Value> {
	let system_prompt = "You explain academic matches. Given a JSON context describing a \
requester and a matched candidate, reply with one short factual sentence on why the \
candidate fits the requester's research interests. Reply with the sentence only.";
	let user_prompt = serde_json::to_string(context).unwrap_or_else(|_| "{}".to_string());

	vec![
		serde_json::json!({ "role": "system", "content": system_prompt }),
		serde_json::json!({ "role": "user", "content": user_prompt }),
	]
}

fn parse_chat_content(json: Value) -> Result<String> {
	let content = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.ok_or_else(|| Error::InvalidResponse {
			message: "Justification response is missing message content.".to_string(),
		})?;
	let trimmed = content.trim();

	if trimmed.is_empty() {
		return Err(Error::InvalidResponse {
			message: "Justification response is empty.".to_string(),
		});
	}

	Ok(trimmed.to_string())
}
