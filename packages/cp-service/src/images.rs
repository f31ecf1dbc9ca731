use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{Caller, ClinicService, Error, Result, access::Principal};
use cp_domain::{channel::events, media};
use cp_providers::object::ObjectPresigner;
use cp_storage::{images, models::ImageUpload, sessions};

const DEFAULT_IMAGE_PAGE: u32 = 50;
const MAX_IMAGE_PAGE: u32 = 200;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresignImageRequest {
	pub content_type: String,
	pub size_bytes: u64,
	#[serde(default, alias = "sessionId")]
	pub session_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresignImageResponse {
	pub upload_id: Uuid,
	pub object_key: String,
	pub upload_url: String,
	pub method: String,
	/// Headers the device must send with the upload.
	pub headers: BTreeMap<String, String>,
	#[serde(with = "crate::time_serde")]
	pub url_expires_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub expires_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmImageResponse {
	pub upload_id: Uuid,
	pub object_key: String,
	pub session_id: Option<Uuid>,
	#[serde(with = "crate::time_serde")]
	pub confirmed_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListImagesRequest {
	pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListImagesResponse {
	pub items: Vec<ImageView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageView {
	pub upload_id: Uuid,
	pub object_key: String,
	pub content_type: String,
	pub size_bytes: i64,
	pub session_id: Option<Uuid>,
	pub download_url: String,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde::option")]
	pub confirmed_at: Option<OffsetDateTime>,
	#[serde(with = "crate::time_serde")]
	pub expires_at: OffsetDateTime,
}

impl ClinicService {
	/// Records an upload slot and returns a presigned `PUT` URL for it.
	///
	/// Mobile tokens bound to a session attach the upload to that session when the request does
	/// not name one.
	pub async fn presign_image_upload(
		&self,
		caller: &Caller,
		req: PresignImageRequest,
	) -> Result<PresignImageResponse> {
		let object_cfg = &self.cfg.storage.object;
		let content_type = req.content_type.trim().to_ascii_lowercase();

		if !object_cfg.allowed_content_types.iter().any(|allowed| allowed == &content_type) {
			return Err(Error::invalid_field(
				"$.content_type",
				format!("content_type {content_type:?} is not accepted."),
			));
		}

		let extension = media::extension_for(&content_type).ok_or_else(|| {
			Error::invalid_field("$.content_type", "content_type has no known file extension.")
		})?;

		if req.size_bytes == 0 || req.size_bytes > object_cfg.max_upload_bytes {
			return Err(Error::invalid_field(
				"$.size_bytes",
				format!("size_bytes must be in the range 1-{}.", object_cfg.max_upload_bytes),
			));
		}

		let now = OffsetDateTime::now_utc();
		let principal = self.resolve_caller(caller, now).await?;
		let session_id = match req.session_id.or_else(|| principal.bound_session()) {
			Some(session_id) => {
				Some(self.authorize_session(&principal, session_id).await?.session_id)
			},
			None => None,
		};
		let guest_key = principal.guest_key();
		let owner = principal.object_owner(guest_key.as_deref()).ok_or_else(|| {
			Error::Forbidden { message: "Caller cannot own uploads.".to_string() }
		})?;
		let upload_id = Uuid::new_v4();
		let object_key = media::object_key(owner, now.date(), upload_id, extension);
		let row = ImageUpload {
			upload_id,
			user_id: principal.owner_id().map(ToString::to_string),
			guest_key: guest_key.clone(),
			session_id,
			object_key,
			content_type,
			size_bytes: i64::try_from(req.size_bytes).unwrap_or(i64::MAX),
			created_at: now,
			confirmed_at: None,
			expires_at: now + Duration::days(object_cfg.retention_days),
		};
		let signed = ObjectPresigner::new(object_cfg).presign_put(
			&row.object_key,
			&row.content_type,
			now,
			object_cfg.presign_ttl_seconds,
		)?;

		images::insert_image(&self.db.pool, &row).await?;

		tracing::info!(%upload_id, session_id = ?row.session_id, "Issued image upload URL.");

		Ok(PresignImageResponse {
			upload_id,
			object_key: row.object_key,
			upload_url: signed.url,
			method: signed.method.as_str().to_string(),
			headers: signed.headers.into_iter().collect(),
			url_expires_at: signed.expires_at,
			expires_at: row.expires_at,
		})
	}

	/// Marks an upload complete. Repeated confirmations return the first confirmation time and
	/// do not publish again.
	pub async fn confirm_image_upload(
		&self,
		caller: &Caller,
		upload_id: Uuid,
	) -> Result<ConfirmImageResponse> {
		let now = OffsetDateTime::now_utc();
		let principal = self.resolve_caller(caller, now).await?;
		let existing = images::fetch_image(&self.db.pool, upload_id)
			.await?
			.filter(|image| owns_upload(&principal, image))
			.ok_or_else(|| Error::not_found("Upload not found."))?;

		if existing.expires_at <= now {
			return Err(Error::Conflict { message: "Upload has expired.".to_string() });
		}

		let mut tx = self.db.pool.begin().await?;
		let (confirmed, first_confirmation) =
			match images::confirm_image(&mut *tx, upload_id, now).await? {
				Some(row) => (row, true),
				None => {
					let row = images::fetch_image(&mut *tx, upload_id)
						.await?
						.ok_or_else(|| Error::not_found("Upload not found."))?;

					(row, false)
				},
			};

		if first_confirmation && let Some(session_id) = confirmed.session_id {
			sessions::touch_session(&mut *tx, session_id, now).await?;
		}

		tx.commit().await?;

		let confirmed_at = confirmed.confirmed_at.unwrap_or(now);

		if first_confirmation && let Some(channel) = principal.channel() {
			self.notify(
				&channel,
				events::IMAGE_UPLOADED,
				serde_json::json!({
					"upload_id": confirmed.upload_id,
					"object_key": confirmed.object_key,
					"session_id": confirmed.session_id,
				}),
			)
			.await;
		}

		Ok(ConfirmImageResponse {
			upload_id: confirmed.upload_id,
			object_key: confirmed.object_key,
			session_id: confirmed.session_id,
			confirmed_at,
		})
	}

	/// Confirmed, unexpired uploads of the owner with short-lived download URLs.
	pub async fn list_images(
		&self,
		user_id: &str,
		req: ListImagesRequest,
	) -> Result<ListImagesResponse> {
		let now = OffsetDateTime::now_utc();
		let limit = crate::clamp_limit(req.limit, DEFAULT_IMAGE_PAGE, MAX_IMAGE_PAGE);
		let rows = images::list_user_images(&self.db.pool, user_id, now, limit).await?;
		let presigner = ObjectPresigner::new(&self.cfg.storage.object);
		let ttl = self.cfg.storage.object.presign_ttl_seconds;
		let mut items = Vec::with_capacity(rows.len());

		for row in rows {
			let signed = presigner.presign_get(&row.object_key, now, ttl)?;

			items.push(ImageView {
				upload_id: row.upload_id,
				object_key: row.object_key,
				content_type: row.content_type,
				size_bytes: row.size_bytes,
				session_id: row.session_id,
				download_url: signed.url,
				created_at: row.created_at,
				confirmed_at: row.confirmed_at,
				expires_at: row.expires_at,
			});
		}

		Ok(ListImagesResponse { items })
	}
}

fn owns_upload(principal: &Principal, image: &ImageUpload) -> bool {
	match (principal.owner_id(), principal.guest_key()) {
		(Some(user_id), _) => image.user_id.as_deref() == Some(user_id),
		(None, Some(key)) => image.guest_key.as_deref() == Some(key.as_str()),
		(None, None) => false,
	}
}
