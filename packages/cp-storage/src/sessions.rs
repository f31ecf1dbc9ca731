use sqlx::PgExecutor;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Result,
	models::{Session, SessionPatch},
};

const SESSION_COLUMNS: &str = "\
session_id,
	user_id,
	patient_name,
	patient_nhi,
	status,
	template_id,
	notes,
	typed_input,
	consultation_notes,
	problems_text,
	objective_text,
	assessment_text,
	plan_text,
	created_at,
	updated_at,
	deleted_at";

pub async fn insert_session<'e, E>(executor: E, session: &Session) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO sessions (
	session_id,
	user_id,
	patient_name,
	patient_nhi,
	status,
	template_id,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
	)
	.bind(session.session_id)
	.bind(session.user_id.as_str())
	.bind(session.patient_name.as_deref())
	.bind(session.patient_nhi.as_deref())
	.bind(session.status.as_str())
	.bind(session.template_id.as_deref())
	.bind(session.created_at)
	.bind(session.updated_at)
	.execute(executor)
	.await?;

	Ok(())
}

/// Returns the session unless it has been soft-deleted.
pub async fn fetch_live_session<'e, E>(executor: E, session_id: Uuid) -> Result<Option<Session>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"SELECT {SESSION_COLUMNS} FROM sessions WHERE session_id = $1 AND deleted_at IS NULL"
	);
	let session =
		sqlx::query_as::<_, Session>(&sql).bind(session_id).fetch_optional(executor).await?;

	Ok(session)
}

pub async fn list_live_sessions<'e, E>(
	executor: E,
	user_id: &str,
	limit: i64,
) -> Result<Vec<Session>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
SELECT {SESSION_COLUMNS}
FROM sessions
WHERE user_id = $1 AND deleted_at IS NULL
ORDER BY updated_at DESC, session_id
LIMIT $2"
	);
	let sessions =
		sqlx::query_as::<_, Session>(&sql).bind(user_id).bind(limit).fetch_all(executor).await?;

	Ok(sessions)
}

/// Applies `patch` to a live session owned by `user_id` and returns the new row.
pub async fn update_session<'e, E>(
	executor: E,
	user_id: &str,
	session_id: Uuid,
	patch: &SessionPatch,
	now: OffsetDateTime,
) -> Result<Option<Session>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
UPDATE sessions
SET
	patient_name = COALESCE($3, patient_name),
	patient_nhi = COALESCE($4, patient_nhi),
	status = COALESCE($5, status),
	template_id = COALESCE($6, template_id),
	notes = COALESCE($7, notes),
	typed_input = COALESCE($8, typed_input),
	consultation_notes = COALESCE($9, consultation_notes),
	problems_text = COALESCE($10, problems_text),
	objective_text = COALESCE($11, objective_text),
	assessment_text = COALESCE($12, assessment_text),
	plan_text = COALESCE($13, plan_text),
	updated_at = $14
WHERE session_id = $1 AND user_id = $2 AND deleted_at IS NULL
RETURNING {SESSION_COLUMNS}"
	);
	let session = sqlx::query_as::<_, Session>(&sql)
		.bind(session_id)
		.bind(user_id)
		.bind(patch.patient_name.as_deref())
		.bind(patch.patient_nhi.as_deref())
		.bind(patch.status.as_deref())
		.bind(patch.template_id.as_deref())
		.bind(patch.notes.as_deref())
		.bind(patch.typed_input.as_deref())
		.bind(patch.consultation_notes.as_deref())
		.bind(patch.problems_text.as_deref())
		.bind(patch.objective_text.as_deref())
		.bind(patch.assessment_text.as_deref())
		.bind(patch.plan_text.as_deref())
		.bind(now)
		.fetch_optional(executor)
		.await?;

	Ok(session)
}

/// Returns `true` when a live session was marked deleted.
pub async fn soft_delete_session<'e, E>(
	executor: E,
	user_id: &str,
	session_id: Uuid,
	now: OffsetDateTime,
) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
UPDATE sessions
SET deleted_at = $3, updated_at = $3
WHERE session_id = $1 AND user_id = $2 AND deleted_at IS NULL",
	)
	.bind(session_id)
	.bind(user_id)
	.bind(now)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn session_exists_for_user<'e, E>(
	executor: E,
	user_id: &str,
	session_id: Uuid,
) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let exists: bool = sqlx::query_scalar(
		"\
SELECT EXISTS (
	SELECT 1
	FROM sessions
	WHERE session_id = $1 AND user_id = $2 AND deleted_at IS NULL
)",
	)
	.bind(session_id)
	.bind(user_id)
	.fetch_one(executor)
	.await?;

	Ok(exists)
}

/// Whether the owner has a soft-deleted session with this id.
pub async fn deleted_session_exists_for_user<'e, E>(
	executor: E,
	user_id: &str,
	session_id: Uuid,
) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let exists: bool = sqlx::query_scalar(
		"\
SELECT EXISTS (
	SELECT 1
	FROM sessions
	WHERE session_id = $1 AND user_id = $2 AND deleted_at IS NOT NULL
)",
	)
	.bind(session_id)
	.bind(user_id)
	.fetch_one(executor)
	.await?;

	Ok(exists)
}

pub async fn touch_session<'e, E>(executor: E, session_id: Uuid, now: OffsetDateTime) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query("UPDATE sessions SET updated_at = GREATEST(updated_at, $2) WHERE session_id = $1")
		.bind(session_id)
		.bind(now)
		.execute(executor)
		.await?;

	Ok(())
}
