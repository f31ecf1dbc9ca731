use time::{Date, format_description::BorrowedFormatItem, macros::format_description};
use uuid::Uuid;

const OBJECT_PREFIX: &str = "clinical-images";
const DAY_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Who an uploaded object belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectOwner<'a> {
	User(&'a str),
	Guest(&'a str),
}

pub fn extension_for(content_type: &str) -> Option<&'static str> {
	match content_type {
		"image/jpeg" => Some("jpg"),
		"image/png" => Some("png"),
		"image/webp" => Some("webp"),
		"image/heic" => Some("heic"),
		"image/heif" => Some("heif"),
		"image/gif" => Some("gif"),
		_ => None,
	}
}

/// Builds `clinical-images/<owner>/<yyyy-mm-dd>/<upload_id>.<ext>`.
///
/// Owner ids come from the auth provider and are sanitized so a hostile id cannot escape its
/// prefix.
pub fn object_key(owner: ObjectOwner<'_>, day: Date, upload_id: Uuid, extension: &str) -> String {
	let owner_segment = match owner {
		ObjectOwner::User(id) => sanitize_segment(id),
		ObjectOwner::Guest(key) => format!("guest/{}", sanitize_segment(key)),
	};
	let day = day.format(DAY_FORMAT).unwrap_or_else(|_| "unknown-day".to_string());

	format!("{OBJECT_PREFIX}/{owner_segment}/{day}/{upload_id}.{extension}")
}

fn sanitize_segment(raw: &str) -> String {
	let cleaned: String = raw
		.chars()
		.map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
		.collect();

	if cleaned.is_empty() { "_".to_string() } else { cleaned }
}
