use sqlx::PgExecutor;
use time::{Date, OffsetDateTime};

use crate::Result;

/// Counts one image tool use for `user_id` on `day`.
///
/// With a `limit`, the increment only happens while the stored count is below it. Returns the new
/// count, or `None` when the limit was already reached.
pub async fn increment_image_tool_usage<'e, E>(
	executor: E,
	user_id: &str,
	day: Date,
	limit: Option<i32>,
	now: OffsetDateTime,
) -> Result<Option<i32>>
where
	E: PgExecutor<'e>,
{
	let count = sqlx::query_scalar::<_, i32>(
		"\
INSERT INTO image_tool_usage (user_id, usage_day, count, updated_at)
VALUES ($1, $2, 1, $3)
ON CONFLICT (user_id, usage_day) DO UPDATE
SET count = image_tool_usage.count + 1, updated_at = EXCLUDED.updated_at
WHERE $4::integer IS NULL OR image_tool_usage.count < $4::integer
RETURNING count",
	)
	.bind(user_id)
	.bind(day)
	.bind(now)
	.bind(limit)
	.fetch_optional(executor)
	.await?;

	Ok(count)
}

pub async fn fetch_image_tool_usage<'e, E>(executor: E, user_id: &str, day: Date) -> Result<i32>
where
	E: PgExecutor<'e>,
{
	let count = sqlx::query_scalar::<_, i32>(
		"SELECT count FROM image_tool_usage WHERE user_id = $1 AND usage_day = $2",
	)
	.bind(user_id)
	.bind(day)
	.fetch_optional(executor)
	.await?;

	Ok(count.unwrap_or(0))
}
