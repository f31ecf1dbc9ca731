use sqlx::PgExecutor;
use uuid::Uuid;

use crate::{
	Result,
	models::{NewChunk, TranscriptionChunk},
};

/// Inserts the chunk unless `(session_id, chunk_id)` already exists. Returns the new row id, or
/// `None` on conflict.
pub async fn insert_chunk<'e, E>(executor: E, chunk: &NewChunk<'_>) -> Result<Option<i64>>
where
	E: PgExecutor<'e>,
{
	let id = sqlx::query_scalar::<_, i64>(
		"\
INSERT INTO transcription_chunks (session_id, chunk_id, text, source, device_id, created_at)
VALUES ($1, $2, $3, $4, $5, $6)
ON CONFLICT (session_id, chunk_id) DO NOTHING
RETURNING id",
	)
	.bind(chunk.session_id)
	.bind(chunk.chunk_id)
	.bind(chunk.text)
	.bind(chunk.source)
	.bind(chunk.device_id)
	.bind(chunk.created_at)
	.fetch_optional(executor)
	.await?;

	Ok(id)
}

pub async fn fetch_chunk_id<'e, E>(
	executor: E,
	session_id: Uuid,
	chunk_id: &str,
) -> Result<Option<i64>>
where
	E: PgExecutor<'e>,
{
	let id = sqlx::query_scalar::<_, i64>(
		"SELECT id FROM transcription_chunks WHERE session_id = $1 AND chunk_id = $2",
	)
	.bind(session_id)
	.bind(chunk_id)
	.fetch_optional(executor)
	.await?;

	Ok(id)
}

/// Chunks of a session with `id > after_id`, oldest first.
pub async fn list_chunks_after<'e, E>(
	executor: E,
	session_id: Uuid,
	after_id: i64,
	limit: i64,
) -> Result<Vec<TranscriptionChunk>>
where
	E: PgExecutor<'e>,
{
	let chunks = sqlx::query_as::<_, TranscriptionChunk>(
		"\
SELECT id, session_id, chunk_id, text, source, device_id, created_at
FROM transcription_chunks
WHERE session_id = $1 AND id > $2
ORDER BY id ASC
LIMIT $3",
	)
	.bind(session_id)
	.bind(after_id)
	.bind(limit)
	.fetch_all(executor)
	.await?;

	Ok(chunks)
}
