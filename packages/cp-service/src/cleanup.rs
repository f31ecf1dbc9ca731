use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{ClinicService, Result};
use cp_storage::cleanup;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
	pub sessions_soft_deleted: u64,
	pub tokens_deleted: u64,
	pub images_deleted: u64,
	pub sessions_purged: u64,
}

impl ClinicService {
	/// One cleanup pass. Each step is a single statement and is not rolled back when a later
	/// step fails.
	pub async fn run_cleanup(&self, now: OffsetDateTime) -> Result<CleanupReport> {
		let lifecycle = &self.cfg.lifecycle;
		let stale_cutoff = now - Duration::hours(lifecycle.empty_session_max_age_hours);
		let purge_cutoff = now - Duration::days(lifecycle.purge_deleted_after_days);
		let report = CleanupReport {
			sessions_soft_deleted: cleanup::soft_delete_stale_empty_sessions(
				&self.db.pool,
				stale_cutoff,
				now,
			)
			.await?,
			tokens_deleted: cleanup::delete_expired_tokens(&self.db.pool, now).await?,
			images_deleted: cleanup::delete_expired_images(&self.db.pool, now).await?,
			sessions_purged: cleanup::purge_deleted_sessions(&self.db.pool, purge_cutoff).await?,
		};

		tracing::info!(
			sessions_soft_deleted = report.sessions_soft_deleted,
			tokens_deleted = report.tokens_deleted,
			images_deleted = report.images_deleted,
			sessions_purged = report.sessions_purged,
			"Cleanup pass finished."
		);

		Ok(report)
	}
}
