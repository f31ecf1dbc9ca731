use crate::{Error, Result};

pub fn render_schema() -> Result<String> {
	expand_includes(include_str!("../../../sql/init.sql"))
}

fn expand_includes(sql: &str) -> Result<String> {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			let body = match path.trim() {
				"tables/001_sessions.sql" => include_str!("../../../sql/tables/001_sessions.sql"),
				"tables/002_mobile_tokens.sql" =>
					include_str!("../../../sql/tables/002_mobile_tokens.sql"),
				"tables/003_transcription_chunks.sql" =>
					include_str!("../../../sql/tables/003_transcription_chunks.sql"),
				"tables/004_image_uploads.sql" =>
					include_str!("../../../sql/tables/004_image_uploads.sql"),
				"tables/005_image_tool_usage.sql" =>
					include_str!("../../../sql/tables/005_image_tool_usage.sql"),
				other => return Err(Error::UnknownInclude(other.to_string())),
			};

			out.push_str(body);
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	Ok(out)
}
