use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
	Basic,
	Standard,
	Premium,
}
impl Tier {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"basic" => Some(Self::Basic),
			"standard" => Some(Self::Standard),
			"premium" => Some(Self::Premium),
			_ => None,
		}
	}

	/// Daily image tool allowance, `None` when unlimited.
	pub fn daily_image_tool_limit(self, basic_limit: i32) -> Option<i32> {
		match self {
			Self::Basic => Some(basic_limit),
			Self::Standard | Self::Premium => None,
		}
	}
}

pub fn remaining(used: i32, limit: Option<i32>) -> Option<i32> {
	limit.map(|limit| (limit - used).max(0))
}
