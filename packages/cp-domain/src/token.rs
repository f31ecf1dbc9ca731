//! Mobile pairing tokens.
//!
//! A token is 32 bytes from the operating system RNG encoded as unpadded URL-safe base64, so it
//! is always [`TOKEN_LEN`] characters and can travel in a header, a query string, or a QR code
//! without escaping.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{RngCore, rngs::OsRng};

pub const TOKEN_BYTES: usize = 32;
pub const TOKEN_LEN: usize = 43;

const GUEST_KEY_LEN: usize = 16;

pub fn generate_token() -> String {
	let mut bytes = [0_u8; TOKEN_BYTES];

	OsRng.fill_bytes(&mut bytes);

	URL_SAFE_NO_PAD.encode(bytes)
}

/// Cheap shape check run before any database lookup.
pub fn is_well_formed(token: &str) -> bool {
	token.len() == TOKEN_LEN
		&& token.bytes().all(|byte| byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_')
}

/// Stable, non-reversible name for a guest token, used for channel names and object prefixes.
pub fn guest_key(token: &str) -> String {
	let hash = blake3::hash(token.as_bytes());
	let mut hex = hash.to_hex().to_string();

	hex.truncate(GUEST_KEY_LEN);

	hex
}
