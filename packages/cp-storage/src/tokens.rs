use sqlx::PgExecutor;
use time::OffsetDateTime;

use crate::{Result, models::MobileToken};

pub async fn insert_token<'e, E>(executor: E, token: &MobileToken) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO mobile_tokens (
	token,
	user_id,
	session_id,
	is_active,
	expires_at,
	created_at,
	last_used_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7)",
	)
	.bind(token.token.as_str())
	.bind(token.user_id.as_deref())
	.bind(token.session_id)
	.bind(token.is_active)
	.bind(token.expires_at)
	.bind(token.created_at)
	.bind(token.last_used_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn fetch_token<'e, E>(executor: E, token: &str) -> Result<Option<MobileToken>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, MobileToken>(
		"\
SELECT token, user_id, session_id, is_active, expires_at, created_at, last_used_at
FROM mobile_tokens
WHERE token = $1",
	)
	.bind(token)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

/// Deactivates every live token of `user_id`, returning how many were switched off.
pub async fn deactivate_user_tokens<'e, E>(executor: E, user_id: &str) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	let result =
		sqlx::query("UPDATE mobile_tokens SET is_active = false WHERE user_id = $1 AND is_active")
			.bind(user_id)
			.execute(executor)
			.await?;

	Ok(result.rows_affected())
}

/// Returns `false` when the token does not exist or belongs to someone else.
pub async fn deactivate_token<'e, E>(executor: E, token: &str, user_id: &str) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result =
		sqlx::query("UPDATE mobile_tokens SET is_active = false WHERE token = $1 AND user_id = $2")
			.bind(token)
			.bind(user_id)
			.execute(executor)
			.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn mark_token_used<'e, E>(executor: E, token: &str, now: OffsetDateTime) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query("UPDATE mobile_tokens SET last_used_at = $2 WHERE token = $1")
		.bind(token)
		.bind(now)
		.execute(executor)
		.await?;

	Ok(())
}
