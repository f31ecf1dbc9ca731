use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Caller, ClinicService, Error, Result};
use cp_domain::{
	channel::{self, events},
	sync::{self, ChunkInput, ChunkSource},
};
use cp_storage::{
	chunks,
	models::{NewChunk, TranscriptionChunk},
	sessions,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitChunkRequest {
	#[serde(alias = "sessionId")]
	pub session_id: Uuid,
	#[serde(alias = "chunkId")]
	pub chunk_id: String,
	pub text: String,
	/// Defaults to `mobile` for token callers and `desktop` for owners.
	pub source: Option<String>,
	#[serde(default, alias = "deviceId")]
	pub device_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitChunkResponse {
	pub id: i64,
	pub chunk_id: String,
	/// `true` when the chunk had already been stored and the existing id is returned.
	pub duplicate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListChunksRequest {
	#[serde(alias = "sessionId")]
	pub session_id: Uuid,
	#[serde(default, alias = "afterId")]
	pub after_id: Option<i64>,
	#[serde(default)]
	pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListChunksResponse {
	pub items: Vec<ChunkView>,
	/// Cursor for the next poll: the last returned id, or the request cursor when nothing is new.
	pub next_after_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkView {
	pub id: i64,
	pub chunk_id: String,
	pub text: String,
	pub source: String,
	pub device_id: Option<String>,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
}
impl From<TranscriptionChunk> for ChunkView {
	fn from(row: TranscriptionChunk) -> Self {
		Self {
			id: row.id,
			chunk_id: row.chunk_id,
			text: row.text,
			source: row.source,
			device_id: row.device_id,
			created_at: row.created_at,
		}
	}
}

impl ClinicService {
	/// Stores one transcription chunk. Resubmitting the same `(session_id, chunk_id)` returns the
	/// stored id with `duplicate: true` and leaves the row untouched.
	pub async fn submit_chunk(
		&self,
		caller: &Caller,
		req: SubmitChunkRequest,
	) -> Result<SubmitChunkResponse> {
		let now = OffsetDateTime::now_utc();
		let chunk_id = req.chunk_id.trim();
		let device_id = req.device_id.as_deref().map(str::trim).filter(|id| !id.is_empty());

		sync::check_chunk(
			&ChunkInput { chunk_id, text: &req.text, device_id },
			self.cfg.sync.max_chunk_chars,
		)
		.map_err(|rejection| Error::invalid_field(rejection.field(), rejection.message()))?;

		let source = resolve_source(req.source.as_deref(), caller)?;
		let principal = self.resolve_caller(caller, now).await?;
		let session = self.authorize_session(&principal, req.session_id).await?;
		let new_chunk = NewChunk {
			session_id: session.session_id,
			chunk_id,
			text: &req.text,
			source: source.as_str(),
			device_id,
			created_at: now,
		};
		let mut tx = self.db.pool.begin().await?;
		let inserted = chunks::insert_chunk(&mut *tx, &new_chunk).await?;
		let response = match inserted {
			Some(id) => {
				sessions::touch_session(&mut *tx, session.session_id, now).await?;

				SubmitChunkResponse { id, chunk_id: chunk_id.to_string(), duplicate: false }
			},
			None => {
				let id = chunks::fetch_chunk_id(&mut *tx, session.session_id, chunk_id)
					.await?
					.ok_or_else(|| Error::Storage {
						message: "Chunk conflict reported but no row was found.".to_string(),
					})?;

				SubmitChunkResponse { id, chunk_id: chunk_id.to_string(), duplicate: true }
			},
		};

		tx.commit().await?;

		if response.duplicate {
			tracing::debug!(session_id = %session.session_id, chunk_id, "Duplicate chunk ignored.");
		} else {
			self.notify(
				&channel::user_channel(&session.user_id),
				events::TRANSCRIPTION_CHUNK,
				serde_json::json!({
					"session_id": session.session_id,
					"id": response.id,
					"chunk_id": response.chunk_id,
					"source": source.as_str(),
				}),
			)
			.await;
		}

		Ok(response)
	}

	/// Chunks of a session with ids greater than `after_id`, ascending.
	pub async fn list_chunks(
		&self,
		caller: &Caller,
		req: ListChunksRequest,
	) -> Result<ListChunksResponse> {
		let after_id = req.after_id.unwrap_or(0);

		if after_id < 0 {
			return Err(Error::invalid_field("$.after_id", "after_id must not be negative."));
		}

		let principal = self.resolve_caller(caller, OffsetDateTime::now_utc()).await?;
		let session = self.authorize_session(&principal, req.session_id).await?;
		let limit = sync::page_limit(req.limit, self.cfg.sync.page_limit);
		let rows =
			chunks::list_chunks_after(&self.db.pool, session.session_id, after_id, i64::from(limit))
				.await?;
		let next_after_id = rows.last().map(|row| row.id).unwrap_or(after_id);

		Ok(ListChunksResponse {
			items: rows.into_iter().map(ChunkView::from).collect(),
			next_after_id,
		})
	}
}

fn resolve_source(raw: Option<&str>, caller: &Caller) -> Result<ChunkSource> {
	match raw.map(str::trim).filter(|value| !value.is_empty()) {
		Some(value) => ChunkSource::parse(&value.to_ascii_lowercase())
			.ok_or_else(|| Error::invalid_field("$.source", "source must be mobile or desktop.")),
		None => Ok(match caller {
			Caller::Owner { .. } => ChunkSource::Desktop,
			Caller::Mobile { .. } => ChunkSource::Mobile,
		}),
	}
}
