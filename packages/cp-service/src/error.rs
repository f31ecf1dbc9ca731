pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Invalid field {field}: {message}")]
	InvalidField { field: String, message: String },
	#[error("Unauthorized: {message}")]
	Unauthorized { message: String },
	#[error("Forbidden: {message}")]
	Forbidden { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("Daily usage limit of {limit} reached.")]
	UsageLimitReached { used: i32, limit: i32 },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl Error {
	pub(crate) fn not_found(message: &str) -> Self {
		Self::NotFound { message: message.to_string() }
	}

	pub(crate) fn unauthorized(message: &str) -> Self {
		Self::Unauthorized { message: message.to_string() }
	}

	pub(crate) fn invalid_field(field: &str, message: impl Into<String>) -> Self {
		Self::InvalidField { field: field.to_string(), message: message.into() }
	}
}

impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<cp_storage::Error> for Error {
	fn from(err: cp_storage::Error) -> Self {
		match err {
			cp_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			cp_storage::Error::UnknownInclude(message) => Self::Storage { message },
		}
	}
}

impl From<cp_providers::Error> for Error {
	fn from(err: cp_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
