//! Incremental transcription polling with an id cursor.

// std
use std::{future::Future, time::Duration};

// crates.io
use reqwest::Method;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiClient, Result};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteChunk {
	pub id: i64,
	pub chunk_id: String,
	pub text: String,
	pub source: String,
	pub device_id: Option<String>,
	pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkPage {
	pub items: Vec<RemoteChunk>,
	pub next_after_id: i64,
}

pub struct ChunkPoller {
	client: ApiClient,
	session_id: Uuid,
	after_id: i64,
	interval: Duration,
}
impl ChunkPoller {
	pub fn new(client: ApiClient, session_id: Uuid) -> Self {
		Self { client, session_id, after_id: 0, interval: DEFAULT_POLL_INTERVAL }
	}

	/// Resumes from a cursor persisted by an earlier run.
	pub fn with_cursor(mut self, after_id: i64) -> Self {
		self.after_id = after_id.max(0);

		self
	}

	pub fn with_interval(mut self, interval: Duration) -> Self {
		self.interval = interval;

		self
	}

	pub fn cursor(&self) -> i64 {
		self.after_id
	}

	/// Fetches chunks newer than the cursor and advances it.
	pub async fn poll_once(&mut self) -> Result<Vec<RemoteChunk>> {
		let query = [
			("session_id", self.session_id.to_string()),
			("after_id", self.after_id.to_string()),
		];
		let page: ChunkPage = self
			.client
			.fetch_with_retry(Method::GET, "/v1/transcriptions", &query)
			.await?
			.json()
			.await?;

		Ok(self.accept(page))
	}

	/// Polls every interval until `shutdown` resolves. Poll errors are logged and retried on the
	/// next tick.
	pub async fn run_until<S, F>(&mut self, shutdown: S, mut on_chunks: F)
	where
		S: Future<Output = ()>,
		F: FnMut(Vec<RemoteChunk>),
	{
		let mut ticker = tokio::time::interval(self.interval);

		tokio::pin!(shutdown);

		loop {
			tokio::select! {
				_ = &mut shutdown => return,
				_ = ticker.tick() => match self.poll_once().await {
					Ok(chunks) if chunks.is_empty() => {},
					Ok(chunks) => on_chunks(chunks),
					Err(err) => tracing::warn!(
						error = %err,
						session_id = %self.session_id,
						"Chunk poll failed."
					),
				},
			}
		}
	}

	/// Drops rows at or below the cursor and moves the cursor forward, never backward.
	pub(crate) fn accept(&mut self, page: ChunkPage) -> Vec<RemoteChunk> {
		let cursor = self.after_id;
		let fresh: Vec<RemoteChunk> =
			page.items.into_iter().filter(|chunk| chunk.id > cursor).collect();
		let newest = fresh.iter().map(|chunk| chunk.id).max().unwrap_or(cursor);

		self.after_id = cursor.max(newest).max(page.next_after_id);

		fresh
	}
}
