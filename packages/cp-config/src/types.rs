use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub realtime: Realtime,
	pub mobile: Mobile,
	pub sync: Sync,
	pub lifecycle: Lifecycle,
	pub metering: Metering,
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub admin_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub object: ObjectStorage,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

/// S3-compatible bucket that receives clinical images through presigned URLs.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectStorage {
	/// Base endpoint, e.g. "https://s3.ap-southeast-2.amazonaws.com".
	pub endpoint: String,
	pub region: String,
	pub bucket: String,
	pub access_key_id: String,
	pub secret_access_key: String,
	/// `false` switches to virtual-hosted URLs (`<bucket>.<endpoint host>`).
	#[serde(default = "default_path_style")]
	pub path_style: bool,
	#[serde(default = "default_presign_ttl_seconds")]
	pub presign_ttl_seconds: u64,
	pub max_upload_bytes: u64,
	pub retention_days: i64,
	#[serde(default = "default_allowed_content_types")]
	pub allowed_content_types: Vec<String>,
}

/// Hosted pub/sub. `api_key` has the form "<key_name>:<key_secret>".
#[derive(Debug, Clone, Deserialize)]
pub struct Realtime {
	pub enabled: bool,
	pub api_base: String,
	pub api_key: String,
	#[serde(default = "default_realtime_token_ttl_seconds")]
	pub token_ttl_seconds: u64,
	pub timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Mobile {
	#[serde(default = "default_token_ttl_hours")]
	pub token_ttl_hours: i64,
}

#[derive(Debug, Deserialize)]
pub struct Sync {
	pub page_limit: u32,
	pub max_chunk_chars: u32,
}

#[derive(Debug, Deserialize)]
pub struct Lifecycle {
	pub empty_session_max_age_hours: i64,
	pub purge_deleted_after_days: i64,
	pub cleanup_interval_seconds: u64,
}

#[derive(Debug, Deserialize)]
pub struct Metering {
	pub basic_daily_image_tool_limit: i32,
}

#[derive(Debug, Deserialize)]
pub struct Security {
	pub bind_localhost_only: bool,
	/// Shared bearer the auth proxy presents on every public request.
	pub api_auth_token: Option<String>,
	/// Secret accepted by the cleanup endpoint as a bearer or `?secret=` query value.
	pub cron_secret: Option<String>,
}

fn default_path_style() -> bool {
	true
}

fn default_presign_ttl_seconds() -> u64 {
	900
}

fn default_allowed_content_types() -> Vec<String> {
	["image/jpeg", "image/png", "image/webp", "image/heic"]
		.into_iter()
		.map(ToString::to_string)
		.collect()
}

fn default_realtime_token_ttl_seconds() -> u64 {
	3_600
}

fn default_token_ttl_hours() -> i64 {
	24
}
