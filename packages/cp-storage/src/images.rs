use sqlx::PgExecutor;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Result, models::ImageUpload};

const IMAGE_COLUMNS: &str = "\
upload_id, user_id, guest_key, session_id, object_key, content_type, size_bytes, created_at, \
	 confirmed_at, expires_at";

pub async fn insert_image<'e, E>(executor: E, image: &ImageUpload) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO image_uploads (
	upload_id,
	user_id,
	guest_key,
	session_id,
	object_key,
	content_type,
	size_bytes,
	created_at,
	confirmed_at,
	expires_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
	)
	.bind(image.upload_id)
	.bind(image.user_id.as_deref())
	.bind(image.guest_key.as_deref())
	.bind(image.session_id)
	.bind(image.object_key.as_str())
	.bind(image.content_type.as_str())
	.bind(image.size_bytes)
	.bind(image.created_at)
	.bind(image.confirmed_at)
	.bind(image.expires_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn fetch_image<'e, E>(executor: E, upload_id: Uuid) -> Result<Option<ImageUpload>>
where
	E: PgExecutor<'e>,
{
	let sql = format!("SELECT {IMAGE_COLUMNS} FROM image_uploads WHERE upload_id = $1");
	let image =
		sqlx::query_as::<_, ImageUpload>(&sql).bind(upload_id).fetch_optional(executor).await?;

	Ok(image)
}

/// Stamps `confirmed_at` on an unconfirmed upload. Returns `None` when the upload is unknown or
/// was already confirmed, so only one caller ever sees the first confirmation.
pub async fn confirm_image<'e, E>(
	executor: E,
	upload_id: Uuid,
	now: OffsetDateTime,
) -> Result<Option<ImageUpload>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
UPDATE image_uploads
SET confirmed_at = $2
WHERE upload_id = $1 AND confirmed_at IS NULL
RETURNING {IMAGE_COLUMNS}"
	);
	let image = sqlx::query_as::<_, ImageUpload>(&sql)
		.bind(upload_id)
		.bind(now)
		.fetch_optional(executor)
		.await?;

	Ok(image)
}

/// Confirmed, unexpired uploads of `user_id`, newest first.
pub async fn list_user_images<'e, E>(
	executor: E,
	user_id: &str,
	now: OffsetDateTime,
	limit: i64,
) -> Result<Vec<ImageUpload>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
SELECT {IMAGE_COLUMNS}
FROM image_uploads
WHERE user_id = $1 AND confirmed_at IS NOT NULL AND expires_at > $2
ORDER BY created_at DESC, upload_id
LIMIT $3"
	);
	let images = sqlx::query_as::<_, ImageUpload>(&sql)
		.bind(user_id)
		.bind(now)
		.bind(limit)
		.fetch_all(executor)
		.await?;

	Ok(images)
}
