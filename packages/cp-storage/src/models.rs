use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
	pub session_id: Uuid,
	pub user_id: String,
	pub patient_name: Option<String>,
	pub patient_nhi: Option<String>,
	pub status: String,
	pub template_id: Option<String>,
	pub notes: Option<String>,
	pub typed_input: Option<String>,
	pub consultation_notes: Option<String>,
	pub problems_text: Option<String>,
	pub objective_text: Option<String>,
	pub assessment_text: Option<String>,
	pub plan_text: Option<String>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub deleted_at: Option<OffsetDateTime>,
}

/// Fields a session update may set. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
	pub patient_name: Option<String>,
	pub patient_nhi: Option<String>,
	pub status: Option<String>,
	pub template_id: Option<String>,
	pub notes: Option<String>,
	pub typed_input: Option<String>,
	pub consultation_notes: Option<String>,
	pub problems_text: Option<String>,
	pub objective_text: Option<String>,
	pub assessment_text: Option<String>,
	pub plan_text: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MobileToken {
	pub token: String,
	pub user_id: Option<String>,
	pub session_id: Option<Uuid>,
	pub is_active: bool,
	pub expires_at: OffsetDateTime,
	pub created_at: OffsetDateTime,
	pub last_used_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TranscriptionChunk {
	pub id: i64,
	pub session_id: Uuid,
	pub chunk_id: String,
	pub text: String,
	pub source: String,
	pub device_id: Option<String>,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewChunk<'a> {
	pub session_id: Uuid,
	pub chunk_id: &'a str,
	pub text: &'a str,
	pub source: &'a str,
	pub device_id: Option<&'a str>,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ImageUpload {
	pub upload_id: Uuid,
	pub user_id: Option<String>,
	pub guest_key: Option<String>,
	pub session_id: Option<Uuid>,
	pub object_key: String,
	pub content_type: String,
	pub size_bytes: i64,
	pub created_at: OffsetDateTime,
	pub confirmed_at: Option<OffsetDateTime>,
	pub expires_at: OffsetDateTime,
}
