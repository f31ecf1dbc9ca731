//! Retention statements. Each runs as one SQL statement with no batching.

use sqlx::PgExecutor;
use time::OffsetDateTime;

use crate::Result;

/// Soft-deletes live sessions created before `cutoff` that never gained note content or
/// transcription chunks.
pub async fn soft_delete_stale_empty_sessions<'e, E>(
	executor: E,
	cutoff: OffsetDateTime,
	now: OffsetDateTime,
) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
UPDATE sessions s
SET deleted_at = $2
WHERE s.deleted_at IS NULL
	AND s.created_at < $1
	AND COALESCE(btrim(s.notes), '') = ''
	AND COALESCE(btrim(s.typed_input), '') = ''
	AND COALESCE(btrim(s.consultation_notes), '') = ''
	AND COALESCE(btrim(s.problems_text), '') = ''
	AND COALESCE(btrim(s.objective_text), '') = ''
	AND COALESCE(btrim(s.assessment_text), '') = ''
	AND COALESCE(btrim(s.plan_text), '') = ''
	AND NOT EXISTS (
		SELECT 1
		FROM transcription_chunks c
		WHERE c.session_id = s.session_id
	)",
	)
	.bind(cutoff)
	.bind(now)
	.execute(executor)
	.await?;

	Ok(result.rows_affected())
}

pub async fn delete_expired_tokens<'e, E>(executor: E, now: OffsetDateTime) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query("DELETE FROM mobile_tokens WHERE expires_at <= $1")
		.bind(now)
		.execute(executor)
		.await?;

	Ok(result.rows_affected())
}

pub async fn delete_expired_images<'e, E>(executor: E, now: OffsetDateTime) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query("DELETE FROM image_uploads WHERE expires_at <= $1")
		.bind(now)
		.execute(executor)
		.await?;

	Ok(result.rows_affected())
}

/// Hard-deletes sessions soft-deleted before `cutoff`. Chunks go with them.
pub async fn purge_deleted_sessions<'e, E>(executor: E, cutoff: OffsetDateTime) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	let result =
		sqlx::query("DELETE FROM sessions WHERE deleted_at IS NOT NULL AND deleted_at < $1")
			.bind(cutoff)
			.execute(executor)
			.await?;

	Ok(result.rows_affected())
}
