//! Caller identity carried in request headers.
//!
//! Practitioners arrive through the auth proxy, which forwards the verified user id and tier.
//! Phones present a mobile token instead.

use axum::http::{HeaderMap, header::AUTHORIZATION};

use cp_config::Security;
use cp_domain::metering::Tier;
use cp_service::Caller;

pub const USER_ID_HEADER: &str = "x-clinicpro-user-id";
pub const TIER_HEADER: &str = "x-clinicpro-tier";
pub const MOBILE_TOKEN_HEADER: &str = "x-clinicpro-mobile-token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
	/// Proxy bearer missing or wrong.
	BadProxyToken,
	MissingIdentity,
	UnknownTier(String),
}

/// Owner id forwarded by the proxy, if any.
///
/// When `security.api_auth_token` is set the id is only trusted alongside the matching bearer.
pub fn owner_id(headers: &HeaderMap, security: &Security) -> Result<Option<String>, AuthError> {
	let Some(user_id) = read_header(headers, USER_ID_HEADER) else {
		return Ok(None);
	};

	if let Some(expected) = security.api_auth_token.as_deref()
		&& !read_bearer_token(headers).is_some_and(|token| constant_time_eq(token, expected))
	{
		return Err(AuthError::BadProxyToken);
	}

	Ok(Some(user_id.to_string()))
}

pub fn require_owner(headers: &HeaderMap, security: &Security) -> Result<String, AuthError> {
	owner_id(headers, security)?.ok_or(AuthError::MissingIdentity)
}

/// Owner when the proxy vouches for one, otherwise the mobile token.
pub fn caller(headers: &HeaderMap, security: &Security) -> Result<Caller, AuthError> {
	if let Some(user_id) = owner_id(headers, security)? {
		return Ok(Caller::Owner { user_id });
	}

	read_header(headers, MOBILE_TOKEN_HEADER)
		.map(|token| Caller::Mobile { token: token.to_string() })
		.ok_or(AuthError::MissingIdentity)
}

/// Subscription tier. A missing header means Basic.
pub fn tier(headers: &HeaderMap) -> Result<Tier, AuthError> {
	match read_header(headers, TIER_HEADER) {
		None => Ok(Tier::Basic),
		Some(raw) => Tier::parse(raw).ok_or_else(|| AuthError::UnknownTier(raw.to_string())),
	}
}

/// Cron callers send the secret as a bearer or as `?secret=`. Either matching is enough.
pub fn is_cron_authorized(
	headers: &HeaderMap,
	query_secret: Option<&str>,
	security: &Security,
) -> bool {
	let Some(expected) = security.cron_secret.as_deref() else {
		return false;
	};

	let bearer_ok =
		read_bearer_token(headers).is_some_and(|presented| constant_time_eq(presented, expected));
	let query_ok = query_secret
		.map(str::trim)
		.filter(|value| !value.is_empty())
		.is_some_and(|presented| constant_time_eq(presented, expected));

	bearer_ok || query_ok
}

fn read_header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
	let value = headers.get(name)?.to_str().ok()?.trim();

	if value.is_empty() { None } else { Some(value) }
}

fn read_bearer_token(headers: &HeaderMap) -> Option<&str> {
	let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
	let token = value.strip_prefix("Bearer ")?.trim();

	if token.is_empty() { None } else { Some(token) }
}

fn constant_time_eq(left: &str, right: &str) -> bool {
	let (left, right) = (left.as_bytes(), right.as_bytes());

	if left.len() != right.len() {
		return false;
	}

	left.iter().zip(right).fold(0_u8, |acc, (a, b)| acc | (a ^ b)) == 0
}
