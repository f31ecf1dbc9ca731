//! Hosted pub/sub REST calls: channel publish and scoped token issuance.

// std
use std::time::Duration as StdDuration;

// crates.io
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// Token details returned by the provider. Times are Unix milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeToken {
	pub token: String,
	pub issued: i64,
	pub expires: i64,
	pub capability: String,
	#[serde(rename = "clientId", default, skip_serializing_if = "Option::is_none")]
	pub client_id: Option<String>,
}

/// Splits "<key_name>:<key_secret>".
pub fn split_api_key(api_key: &str) -> Result<(&str, &str)> {
	match api_key.split_once(':') {
		Some((name, secret)) if !name.is_empty() && !secret.is_empty() => Ok((name, secret)),
		_ => Err(Error::InvalidConfig {
			message: "realtime.api_key must have the form <key_name>:<key_secret>.".to_string(),
		}),
	}
}

pub fn channel_messages_url(api_base: &str, channel: &str) -> String {
	format!("{api_base}/channels/{}/messages", urlencoding::encode(channel))
}

pub fn request_token_url(api_base: &str, key_name: &str) -> String {
	format!("{api_base}/keys/{}/requestToken", urlencoding::encode(key_name))
}

/// Message body with `data` carried as an encoded JSON string.
pub fn message_body(event: &str, data: &Value) -> Result<Value> {
	Ok(serde_json::json!({
		"name": event,
		"data": serde_json::to_string(data)?,
		"encoding": "json",
	}))
}

pub fn token_request_body(
	key_name: &str,
	capability: &Value,
	client_id: Option<&str>,
	ttl_seconds: u64,
	timestamp_ms: i64,
) -> Result<Value> {
	let mut body = serde_json::json!({
		"keyName": key_name,
		"capability": serde_json::to_string(capability)?,
		"ttl": ttl_seconds.saturating_mul(1_000),
		"timestamp": timestamp_ms,
	});

	if let (Some(client_id), Some(map)) = (client_id, body.as_object_mut()) {
		map.insert("clientId".to_string(), Value::String(client_id.to_string()));
	}

	Ok(body)
}

pub async fn publish(
	cfg: &cp_config::Realtime,
	channel: &str,
	event: &str,
	data: &Value,
) -> Result<()> {
	let (key_name, key_secret) = split_api_key(&cfg.api_key)?;
	let client = Client::builder().timeout(StdDuration::from_millis(cfg.timeout_ms)).build()?;

	client
		.post(channel_messages_url(&cfg.api_base, channel))
		.basic_auth(key_name, Some(key_secret))
		.json(&message_body(event, data)?)
		.send()
		.await?
		.error_for_status()?;

	Ok(())
}

pub async fn request_token(
	cfg: &cp_config::Realtime,
	capability: &Value,
	client_id: Option<&str>,
	timestamp_ms: i64,
) -> Result<RealtimeToken> {
	let (key_name, key_secret) = split_api_key(&cfg.api_key)?;
	let client = Client::builder().timeout(StdDuration::from_millis(cfg.timeout_ms)).build()?;
	let body =
		token_request_body(key_name, capability, client_id, cfg.token_ttl_seconds, timestamp_ms)?;
	let json: Value = client
		.post(request_token_url(&cfg.api_base, key_name))
		.basic_auth(key_name, Some(key_secret))
		.json(&body)
		.send()
		.await?
		.error_for_status()?
		.json()
		.await?;

	parse_token_response(json)
}

fn parse_token_response(json: Value) -> Result<RealtimeToken> {
	if json.get("token").and_then(Value::as_str).is_none_or(str::is_empty) {
		return Err(Error::InvalidResponse {
			message: "Realtime token response is missing token.".to_string(),
		});
	}

	Ok(serde_json::from_value(json)?)
}
