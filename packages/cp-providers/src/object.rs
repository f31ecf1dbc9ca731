//! AWS Signature V4 query-string presigning for S3-compatible buckets.
//!
//! Payloads are never hashed (`UNSIGNED-PAYLOAD`), so the device uploads directly and the service
//! never touches image bytes.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};

use crate::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";
const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";
const AMZ_DATE_FORMAT: &[BorrowedFormatItem<'static>] =
	format_description!("[year][month][day]T[hour][minute][second]Z");
const DATE_STAMP_FORMAT: &[BorrowedFormatItem<'static>] =
	format_description!("[year][month][day]");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresignMethod {
	Get,
	Put,
}
impl PresignMethod {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Put => "PUT",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedRequest {
	pub method: PresignMethod,
	pub url: String,
	/// Headers the caller must send verbatim because they are part of the signature.
	pub headers: Vec<(String, String)>,
	pub expires_at: OffsetDateTime,
}

pub struct ObjectPresigner<'a> {
	cfg: &'a cp_config::ObjectStorage,
}
impl<'a> ObjectPresigner<'a> {
	pub fn new(cfg: &'a cp_config::ObjectStorage) -> Self {
		Self { cfg }
	}

	pub fn presign_put(
		&self,
		key: &str,
		content_type: &str,
		now: OffsetDateTime,
		ttl_seconds: u64,
	) -> Result<PresignedRequest> {
		self.presign(PresignMethod::Put, key, Some(content_type), now, ttl_seconds)
	}

	pub fn presign_get(
		&self,
		key: &str,
		now: OffsetDateTime,
		ttl_seconds: u64,
	) -> Result<PresignedRequest> {
		self.presign(PresignMethod::Get, key, None, now, ttl_seconds)
	}

	fn presign(
		&self,
		method: PresignMethod,
		key: &str,
		content_type: Option<&str>,
		now: OffsetDateTime,
		ttl_seconds: u64,
	) -> Result<PresignedRequest> {
		let (scheme, endpoint_host) = split_endpoint(&self.cfg.endpoint)?;
		let (host, canonical_uri) = if self.cfg.path_style {
			(endpoint_host.to_string(), format!("/{}/{}", self.cfg.bucket, encode_key(key)))
		} else {
			(format!("{}.{endpoint_host}", self.cfg.bucket), format!("/{}", encode_key(key)))
		};
		let now = now.replace_nanosecond(0).unwrap_or(now);
		let amz_date = now.format(AMZ_DATE_FORMAT)?;
		let date_stamp = now.format(DATE_STAMP_FORMAT)?;
		let scope = format!("{date_stamp}/{}/{SERVICE}/aws4_request", self.cfg.region);
		let mut headers = Vec::new();

		if let Some(content_type) = content_type {
			headers.push(("content-type".to_string(), content_type.to_string()));
		}

		headers.push(("host".to_string(), host.clone()));

		let signed_headers =
			headers.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>().join(";");
		let canonical_headers: String =
			headers.iter().map(|(name, value)| format!("{name}:{}\n", value.trim())).collect();
		let credential = format!("{}/{scope}", self.cfg.access_key_id);
		let mut query = [
			("X-Amz-Algorithm", ALGORITHM.to_string()),
			("X-Amz-Credential", credential),
			("X-Amz-Date", amz_date.clone()),
			("X-Amz-Expires", ttl_seconds.to_string()),
			("X-Amz-SignedHeaders", signed_headers.clone()),
		]
		.into_iter()
		.map(|(name, value)| {
			format!("{}={}", urlencoding::encode(name), urlencoding::encode(&value))
		})
		.collect::<Vec<_>>();

		query.sort();

		let canonical_query = query.join("&");
		let canonical_request = format!(
			"{}\n{canonical_uri}\n{canonical_query}\n{canonical_headers}\n{signed_headers}\n{UNSIGNED_PAYLOAD}",
			method.as_str()
		);
		let string_to_sign = format!(
			"{ALGORITHM}\n{amz_date}\n{scope}\n{}",
			hex::encode(Sha256::digest(canonical_request.as_bytes()))
		);
		let signing_key = signing_key(
			&self.cfg.secret_access_key,
			&date_stamp,
			&self.cfg.region,
		)?;
		let signature = hex::encode(hmac(&signing_key, string_to_sign.as_bytes())?);
		let url = format!(
			"{scheme}://{host}{canonical_uri}?{canonical_query}&X-Amz-Signature={signature}"
		);
		let headers = headers.into_iter().filter(|(name, _)| name != "host").collect();
		let expires_at =
			now + time::Duration::seconds(i64::try_from(ttl_seconds).unwrap_or(i64::MAX));

		Ok(PresignedRequest { method, url, headers, expires_at })
	}
}

fn split_endpoint(endpoint: &str) -> Result<(&str, &str)> {
	let (scheme, rest) = endpoint.split_once("://").ok_or_else(|| Error::InvalidConfig {
		message: "storage.object.endpoint must include a scheme.".to_string(),
	})?;
	let host = rest.split('/').next().unwrap_or_default();

	if host.is_empty() {
		return Err(Error::InvalidConfig {
			message: "storage.object.endpoint must include a host.".to_string(),
		});
	}

	Ok((scheme, host))
}

/// URI-encodes each path segment, keeping the separators.
fn encode_key(key: &str) -> String {
	key.split('/')
		.map(|segment| urlencoding::encode(segment).into_owned())
		.collect::<Vec<_>>()
		.join("/")
}

fn signing_key(secret: &str, date_stamp: &str, region: &str) -> Result<Vec<u8>> {
	let date_key = hmac(format!("AWS4{secret}").as_bytes(), date_stamp.as_bytes())?;
	let region_key = hmac(&date_key, region.as_bytes())?;
	let service_key = hmac(&region_key, SERVICE.as_bytes())?;

	hmac(&service_key, b"aws4_request")
}

fn hmac(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
	let mut mac = HmacSha256::new_from_slice(key).map_err(|_| Error::InvalidConfig {
		message: "Object storage signing key is invalid.".to_string(),
	})?;

	mac.update(data);

	Ok(mac.finalize().into_bytes().to_vec())
}
