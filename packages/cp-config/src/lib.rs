mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, Lifecycle, Metering, Mobile, ObjectStorage, Postgres, Realtime, Security, Service,
	Storage, Sync,
};

use std::{fs, path::Path};

/// Longest lifetime a SigV4 presigned URL may carry.
pub const MAX_PRESIGN_TTL_SECONDS: u64 = 604_800;
/// Longest realtime token the hosted provider will issue.
pub const MAX_REALTIME_TOKEN_TTL_SECONDS: u64 = 86_400;
pub const MAX_TOKEN_TTL_HOURS: i64 = 8_760;
pub const MAX_EMPTY_SESSION_AGE_HOURS: i64 = 8_760;
pub const MAX_RETENTION_DAYS: i64 = 3_650;
pub const MAX_CLEANUP_INTERVAL_SECONDS: u64 = 604_800;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	for (label, value) in [
		("service.http_bind", &cfg.service.http_bind),
		("service.admin_bind", &cfg.service.admin_bind),
		("storage.postgres.dsn", &cfg.storage.postgres.dsn),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	validate_object_storage(&cfg.storage.object)?;
	validate_realtime(&cfg.realtime)?;

	check_range("mobile.token_ttl_hours", cfg.mobile.token_ttl_hours, MAX_TOKEN_TTL_HOURS)?;

	if cfg.sync.page_limit == 0 {
		return Err(Error::Validation {
			message: "sync.page_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.sync.max_chunk_chars == 0 {
		return Err(Error::Validation {
			message: "sync.max_chunk_chars must be greater than zero.".to_string(),
		});
	}

	check_range(
		"lifecycle.empty_session_max_age_hours",
		cfg.lifecycle.empty_session_max_age_hours,
		MAX_EMPTY_SESSION_AGE_HOURS,
	)?;
	check_range(
		"lifecycle.purge_deleted_after_days",
		cfg.lifecycle.purge_deleted_after_days,
		MAX_RETENTION_DAYS,
	)?;

	if cfg.lifecycle.cleanup_interval_seconds == 0
		|| cfg.lifecycle.cleanup_interval_seconds > MAX_CLEANUP_INTERVAL_SECONDS
	{
		return Err(Error::Validation {
			message: format!(
				"lifecycle.cleanup_interval_seconds must be in the range 1-{MAX_CLEANUP_INTERVAL_SECONDS}."
			),
		});
	}
	if cfg.metering.basic_daily_image_tool_limit <= 0 {
		return Err(Error::Validation {
			message: "metering.basic_daily_image_tool_limit must be greater than zero."
				.to_string(),
		});
	}

	Ok(())
}

fn validate_object_storage(object: &ObjectStorage) -> Result<()> {
	for (label, value) in [
		("storage.object.endpoint", &object.endpoint),
		("storage.object.region", &object.region),
		("storage.object.bucket", &object.bucket),
		("storage.object.access_key_id", &object.access_key_id),
		("storage.object.secret_access_key", &object.secret_access_key),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if !object.endpoint.starts_with("http://") && !object.endpoint.starts_with("https://") {
		return Err(Error::Validation {
			message: "storage.object.endpoint must start with http:// or https://.".to_string(),
		});
	}
	if object.presign_ttl_seconds == 0 || object.presign_ttl_seconds > MAX_PRESIGN_TTL_SECONDS {
		return Err(Error::Validation {
			message: format!(
				"storage.object.presign_ttl_seconds must be in the range 1-{MAX_PRESIGN_TTL_SECONDS}."
			),
		});
	}
	if object.max_upload_bytes == 0 {
		return Err(Error::Validation {
			message: "storage.object.max_upload_bytes must be greater than zero.".to_string(),
		});
	}

	check_range("storage.object.retention_days", object.retention_days, MAX_RETENTION_DAYS)?;

	if object.allowed_content_types.is_empty() {
		return Err(Error::Validation {
			message: "storage.object.allowed_content_types must be non-empty.".to_string(),
		});
	}

	for content_type in &object.allowed_content_types {
		if !content_type.starts_with("image/") {
			return Err(Error::Validation {
				message: format!(
					"storage.object.allowed_content_types entry {content_type:?} must be an image type."
				),
			});
		}
	}

	Ok(())
}

fn validate_realtime(realtime: &Realtime) -> Result<()> {
	if !realtime.enabled {
		return Ok(());
	}
	if realtime.api_base.trim().is_empty() {
		return Err(Error::Validation {
			message: "realtime.api_base must be non-empty when realtime is enabled.".to_string(),
		});
	}

	let valid_key = realtime
		.api_key
		.split_once(':')
		.map(|(name, secret)| !name.trim().is_empty() && !secret.trim().is_empty())
		.unwrap_or(false);

	if !valid_key {
		return Err(Error::Validation {
			message: "realtime.api_key must have the form <key_name>:<key_secret>.".to_string(),
		});
	}
	if !(1..=MAX_REALTIME_TOKEN_TTL_SECONDS).contains(&realtime.token_ttl_seconds) {
		return Err(Error::Validation {
			message: format!(
				"realtime.token_ttl_seconds must be in the range 1-{MAX_REALTIME_TOKEN_TTL_SECONDS}."
			),
		});
	}
	if realtime.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "realtime.timeout_ms must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

/// Day and hour counts feed `time::Duration` arithmetic, which panics on overflow.
fn check_range(label: &str, value: i64, max: i64) -> Result<()> {
	if (1..=max).contains(&value) {
		Ok(())
	} else {
		Err(Error::Validation { message: format!("{label} must be in the range 1-{max}.") })
	}
}

fn normalize(cfg: &mut Config) {
	if cfg.security.api_auth_token.as_deref().map(|token| token.trim().is_empty()).unwrap_or(false)
	{
		cfg.security.api_auth_token = None;
	}
	if cfg.security.cron_secret.as_deref().map(|secret| secret.trim().is_empty()).unwrap_or(false)
	{
		cfg.security.cron_secret = None;
	}

	cfg.realtime.api_base = cfg.realtime.api_base.trim_end_matches('/').to_string();
	cfg.storage.object.endpoint = cfg.storage.object.endpoint.trim_end_matches('/').to_string();
}
