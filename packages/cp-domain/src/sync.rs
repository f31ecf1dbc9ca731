use serde::{Deserialize, Serialize};

pub const MAX_CHUNK_ID_CHARS: usize = 128;
pub const MAX_DEVICE_ID_CHARS: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkSource {
	Mobile,
	Desktop,
}
impl ChunkSource {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Mobile => "mobile",
			Self::Desktop => "desktop",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"mobile" => Some(Self::Mobile),
			"desktop" => Some(Self::Desktop),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkRejection {
	EmptyChunkId,
	ChunkIdTooLong,
	EmptyText,
	TextTooLong,
	DeviceIdTooLong,
}
impl ChunkRejection {
	/// JSON path of the offending request field.
	pub fn field(self) -> &'static str {
		match self {
			Self::EmptyChunkId | Self::ChunkIdTooLong => "$.chunk_id",
			Self::EmptyText | Self::TextTooLong => "$.text",
			Self::DeviceIdTooLong => "$.device_id",
		}
	}

	pub fn message(self) -> &'static str {
		match self {
			Self::EmptyChunkId => "chunk_id must be non-empty.",
			Self::ChunkIdTooLong => "chunk_id is too long.",
			Self::EmptyText => "text must be non-empty.",
			Self::TextTooLong => "text is too long.",
			Self::DeviceIdTooLong => "device_id is too long.",
		}
	}
}

pub struct ChunkInput<'a> {
	pub chunk_id: &'a str,
	pub text: &'a str,
	pub device_id: Option<&'a str>,
}

pub fn check_chunk(chunk: &ChunkInput<'_>, max_text_chars: u32) -> Result<(), ChunkRejection> {
	if chunk.chunk_id.trim().is_empty() {
		return Err(ChunkRejection::EmptyChunkId);
	}
	if chunk.chunk_id.chars().count() > MAX_CHUNK_ID_CHARS {
		return Err(ChunkRejection::ChunkIdTooLong);
	}
	if chunk.text.trim().is_empty() {
		return Err(ChunkRejection::EmptyText);
	}
	if chunk.text.chars().count() > max_text_chars as usize {
		return Err(ChunkRejection::TextTooLong);
	}
	if chunk.device_id.map(|id| id.chars().count() > MAX_DEVICE_ID_CHARS).unwrap_or(false) {
		return Err(ChunkRejection::DeviceIdTooLong);
	}

	Ok(())
}

/// Clamps a requested page size into `1..=max`, falling back to `max`.
pub fn page_limit(requested: Option<u32>, max: u32) -> u32 {
	requested.unwrap_or(max).clamp(1, max.max(1))
}
