use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{ClinicService, Error, Result};
use cp_domain::metering::{self, Tier};
use cp_storage::usage;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageToolUsageResponse {
	pub used: i32,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub limit: Option<i32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub remaining: Option<i32>,
}
impl ImageToolUsageResponse {
	fn new(used: i32, limit: Option<i32>) -> Self {
		Self { used, limit, remaining: metering::remaining(used, limit) }
	}
}

impl ClinicService {
	/// Counts one image tool use for today (UTC). Limited tiers are refused once the allowance
	/// is spent.
	pub async fn record_image_tool_usage(
		&self,
		user_id: &str,
		tier: Tier,
	) -> Result<ImageToolUsageResponse> {
		let now = OffsetDateTime::now_utc();
		let limit = tier.daily_image_tool_limit(self.cfg.metering.basic_daily_image_tool_limit);
		let used = usage::increment_image_tool_usage(&self.db.pool, user_id, now.date(), limit, now)
			.await?;

		match (used, limit) {
			(Some(used), _) => Ok(ImageToolUsageResponse::new(used, limit)),
			(None, Some(limit)) => {
				tracing::info!(?tier, limit, "Image tool usage limit reached.");

				Err(Error::UsageLimitReached { used: limit, limit })
			},
			(None, None) => Err(Error::Storage {
				message: "Unlimited usage increment returned no row.".to_string(),
			}),
		}
	}

	pub async fn image_tool_usage(
		&self,
		user_id: &str,
		tier: Tier,
	) -> Result<ImageToolUsageResponse> {
		let today = OffsetDateTime::now_utc().date();
		let limit = tier.daily_image_tool_limit(self.cfg.metering.basic_daily_image_tool_limit);
		let used = usage::fetch_image_tool_usage(&self.db.pool, user_id, today).await?;

		Ok(ImageToolUsageResponse::new(used, limit))
	}
}
