use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::{Caller, ClinicService, Error, Result};

const OWNER_CAPABILITIES: [&str; 3] = ["subscribe", "publish", "presence"];
const DEVICE_CAPABILITIES: [&str; 2] = ["publish", "subscribe"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeTokenResponse {
	pub token: String,
	pub channel: String,
	pub capability: String,
	pub client_id: Option<String>,
	/// Unix milliseconds.
	pub issued: i64,
	/// Unix milliseconds.
	pub expires: i64,
}

impl ClinicService {
	/// Best-effort publish. Failures are logged and never reach the caller.
	pub(crate) async fn notify(&self, channel: &str, event: &str, data: Value) {
		if !self.cfg.realtime.enabled {
			return;
		}

		match self.providers.publisher.publish(&self.cfg.realtime, channel, event, &data).await {
			Ok(()) => tracing::debug!(channel, event, "Published realtime event."),
			Err(err) => tracing::warn!(error = %err, channel, event, "Realtime publish failed."),
		}
	}

	/// Requests a provider token scoped to the caller's own channel.
	pub async fn issue_realtime_token(&self, caller: &Caller) -> Result<RealtimeTokenResponse> {
		if !self.cfg.realtime.enabled {
			return Err(Error::InvalidRequest { message: "Realtime is disabled.".to_string() });
		}

		let now = OffsetDateTime::now_utc();
		let principal = self.resolve_caller(caller, now).await?;
		let channel = principal.channel().ok_or_else(|| Error::Forbidden {
			message: "Caller has no realtime channel.".to_string(),
		})?;
		let operations: &[&str] = match caller {
			Caller::Owner { .. } => &OWNER_CAPABILITIES,
			Caller::Mobile { .. } => &DEVICE_CAPABILITIES,
		};
		let capability = capability_for(&channel, operations);
		let client_id = principal.owner_id().map(ToString::to_string);
		let timestamp_ms =
			i64::try_from(now.unix_timestamp_nanos() / 1_000_000).unwrap_or(i64::MAX);
		let token = self
			.providers
			.token_issuer
			.request_token(&self.cfg.realtime, &capability, client_id.as_deref(), timestamp_ms)
			.await
			.map_err(|err| {
				tracing::error!(error = %err, "Realtime token request failed.");

				Error::from(err)
			})?;

		Ok(RealtimeTokenResponse {
			token: token.token,
			channel,
			capability: token.capability,
			client_id: token.client_id.or(client_id),
			issued: token.issued,
			expires: token.expires,
		})
	}
}

fn capability_for(channel: &str, operations: &[&str]) -> Value {
	let mut map = serde_json::Map::new();

	map.insert(channel.to_string(), serde_json::json!(operations));

	Value::Object(map)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn capability_is_scoped_to_one_channel() {
		let capability = capability_for("user:u1", &OWNER_CAPABILITIES);

		assert_eq!(
			capability,
			serde_json::json!({ "user:u1": ["subscribe", "publish", "presence"] })
		);
	}
}
