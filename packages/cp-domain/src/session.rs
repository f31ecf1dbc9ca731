use serde::{Deserialize, Serialize};

pub const MAX_PATIENT_NAME_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
	Active,
	Completed,
	Archived,
}
impl SessionStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Active => "active",
			Self::Completed => "completed",
			Self::Archived => "archived",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"active" => Some(Self::Active),
			"completed" => Some(Self::Completed),
			"archived" => Some(Self::Archived),
			_ => None,
		}
	}
}

/// New Zealand National Health Index number: three letters then four digits (legacy format) or
/// three letters, two digits, two letters (2025 format). Letters I and O are never issued.
pub fn is_valid_nhi(raw: &str) -> bool {
	let bytes = raw.as_bytes();

	if bytes.len() != 7 {
		return false;
	}

	let letter = |byte: u8| byte.is_ascii_uppercase() && byte != b'I' && byte != b'O';

	if !bytes[..3].iter().all(|byte| letter(*byte)) {
		return false;
	}

	let legacy = bytes[3..].iter().all(u8::is_ascii_digit);
	let current = bytes[3..5].iter().all(u8::is_ascii_digit)
		&& bytes[5..].iter().all(|byte| letter(*byte));

	legacy || current
}
