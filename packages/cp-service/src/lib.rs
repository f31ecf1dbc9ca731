pub mod access;
pub mod cleanup;
pub mod images;
pub mod realtime;
pub mod sessions;
pub mod time_serde;
pub mod tokens;
pub mod transcriptions;
pub mod usage;

mod error;

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;

pub use access::Caller;
pub use cleanup::CleanupReport;
pub use error::{Error, Result};
pub use images::{
	ConfirmImageResponse, ImageView, ListImagesRequest, ListImagesResponse, PresignImageRequest,
	PresignImageResponse,
};
pub use realtime::RealtimeTokenResponse;
pub use sessions::{
	CreateSessionRequest, DeleteSessionResponse, ListSessionsRequest, ListSessionsResponse,
	SessionView, UpdateSessionRequest,
};
pub use tokens::{
	DeactivateTokenResponse, IssueTokenRequest, IssueTokenResponse, ValidateTokenRequest,
	ValidateTokenResponse,
};
pub use transcriptions::{
	ChunkView, ListChunksRequest, ListChunksResponse, SubmitChunkRequest, SubmitChunkResponse,
};
pub use usage::ImageToolUsageResponse;

use cp_config::{Config, Realtime};
use cp_providers::realtime::RealtimeToken;
use cp_storage::db::Db;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait RealtimePublisher
where
	Self: Send + Sync,
{
	fn publish<'a>(
		&'a self,
		cfg: &'a Realtime,
		channel: &'a str,
		event: &'a str,
		data: &'a Value,
	) -> BoxFuture<'a, cp_providers::Result<()>>;
}

pub trait RealtimeTokenIssuer
where
	Self: Send + Sync,
{
	fn request_token<'a>(
		&'a self,
		cfg: &'a Realtime,
		capability: &'a Value,
		client_id: Option<&'a str>,
		timestamp_ms: i64,
	) -> BoxFuture<'a, cp_providers::Result<RealtimeToken>>;
}

#[derive(Clone)]
pub struct Providers {
	pub publisher: Arc<dyn RealtimePublisher>,
	pub token_issuer: Arc<dyn RealtimeTokenIssuer>,
}
impl Providers {
	pub fn new(
		publisher: Arc<dyn RealtimePublisher>,
		token_issuer: Arc<dyn RealtimeTokenIssuer>,
	) -> Self {
		Self { publisher, token_issuer }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { publisher: provider.clone(), token_issuer: provider }
	}
}

pub struct ClinicService {
	pub cfg: Config,
	pub db: Db,
	pub providers: Providers,
}
impl ClinicService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self { cfg, db, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, db: Db, providers: Providers) -> Self {
		Self { cfg, db, providers }
	}
}

struct DefaultProviders;

impl RealtimePublisher for DefaultProviders {
	fn publish<'a>(
		&'a self,
		cfg: &'a Realtime,
		channel: &'a str,
		event: &'a str,
		data: &'a Value,
	) -> BoxFuture<'a, cp_providers::Result<()>> {
		Box::pin(cp_providers::realtime::publish(cfg, channel, event, data))
	}
}

impl RealtimeTokenIssuer for DefaultProviders {
	fn request_token<'a>(
		&'a self,
		cfg: &'a Realtime,
		capability: &'a Value,
		client_id: Option<&'a str>,
		timestamp_ms: i64,
	) -> BoxFuture<'a, cp_providers::Result<RealtimeToken>> {
		Box::pin(cp_providers::realtime::request_token(cfg, capability, client_id, timestamp_ms))
	}
}

/// Trims and drops empty optional text.
pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
	value.map(|raw| raw.trim().to_string()).filter(|raw| !raw.is_empty())
}

/// Clamps a requested page size to `1..=max`, defaulting to `default`.
pub(crate) fn clamp_limit(requested: Option<u32>, default: u32, max: u32) -> i64 {
	i64::from(requested.unwrap_or(default).clamp(1, max.max(1)))
}
