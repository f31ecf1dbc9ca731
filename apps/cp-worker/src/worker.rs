use std::time::Duration as StdDuration;

use time::OffsetDateTime;
use tokio::time as tokio_time;

use crate::{Error, Result};
use cp_service::{CleanupReport, ClinicService};

pub fn cleanup_interval(lifecycle: &cp_config::Lifecycle) -> Result<StdDuration> {
	if lifecycle.cleanup_interval_seconds == 0 {
		return Err(Error::Validation(
			"lifecycle.cleanup_interval_seconds must be greater than zero.".to_string(),
		));
	}

	Ok(StdDuration::from_secs(lifecycle.cleanup_interval_seconds))
}

pub async fn run_once(service: &ClinicService) -> Result<CleanupReport> {
	Ok(service.run_cleanup(OffsetDateTime::now_utc()).await?)
}

/// Runs a cleanup pass every `interval`. Failed passes are logged and retried on the next tick.
pub async fn run_worker(service: &ClinicService, interval: StdDuration) {
	let mut ticker = tokio_time::interval(interval);

	ticker.set_missed_tick_behavior(tokio_time::MissedTickBehavior::Delay);

	tracing::info!(interval_seconds = interval.as_secs(), "Cleanup worker started.");

	loop {
		ticker.tick().await;

		if let Err(err) = run_once(service).await {
			tracing::error!(error = %err, "Cleanup pass failed.");
		}
	}
}
