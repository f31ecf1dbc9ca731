//! Realtime channel naming. Owners and guests never share a namespace.

pub fn user_channel(owner_id: &str) -> String {
	format!("user:{owner_id}")
}

pub fn guest_channel(guest_key: &str) -> String {
	format!("guest:{guest_key}")
}

pub mod events {
	pub const TRANSCRIPTION_CHUNK: &str = "transcription.chunk";
	pub const SESSION_UPDATED: &str = "session.updated";
	pub const IMAGE_UPLOADED: &str = "image.uploaded";
}
