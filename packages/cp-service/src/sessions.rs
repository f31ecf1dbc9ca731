use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{ClinicService, Error, Result};
use cp_domain::{
	channel::events,
	session::{self, SessionStatus},
};
use cp_storage::{
	models::{Session, SessionPatch},
	sessions,
};

const DEFAULT_SESSION_PAGE: u32 = 50;
const MAX_SESSION_PAGE: u32 = 200;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSessionRequest {
	pub patient_name: Option<String>,
	pub patient_nhi: Option<String>,
	pub template_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListSessionsRequest {
	pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSessionsResponse {
	pub items: Vec<SessionView>,
}

/// Any subset of patient fields, note fields and status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSessionRequest {
	pub patient_name: Option<String>,
	pub patient_nhi: Option<String>,
	pub status: Option<SessionStatus>,
	pub template_id: Option<String>,
	pub notes: Option<String>,
	pub typed_input: Option<String>,
	pub consultation_notes: Option<String>,
	pub problems_text: Option<String>,
	pub objective_text: Option<String>,
	pub assessment_text: Option<String>,
	pub plan_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteSessionResponse {
	pub session_id: Uuid,
	pub deleted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
	pub session_id: Uuid,
	pub status: String,
	pub patient_name: Option<String>,
	pub patient_nhi: Option<String>,
	pub template_id: Option<String>,
	pub notes: Option<String>,
	pub typed_input: Option<String>,
	pub consultation_notes: Option<String>,
	pub problems_text: Option<String>,
	pub objective_text: Option<String>,
	pub assessment_text: Option<String>,
	pub plan_text: Option<String>,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}
impl From<Session> for SessionView {
	fn from(row: Session) -> Self {
		Self {
			session_id: row.session_id,
			status: row.status,
			patient_name: row.patient_name,
			patient_nhi: row.patient_nhi,
			template_id: row.template_id,
			notes: row.notes,
			typed_input: row.typed_input,
			consultation_notes: row.consultation_notes,
			problems_text: row.problems_text,
			objective_text: row.objective_text,
			assessment_text: row.assessment_text,
			plan_text: row.plan_text,
			created_at: row.created_at,
			updated_at: row.updated_at,
		}
	}
}

impl ClinicService {
	pub async fn create_session(
		&self,
		user_id: &str,
		req: CreateSessionRequest,
	) -> Result<SessionView> {
		let now = OffsetDateTime::now_utc();
		let row = Session {
			session_id: Uuid::new_v4(),
			user_id: user_id.to_string(),
			patient_name: check_patient_name(req.patient_name)?,
			patient_nhi: check_nhi(req.patient_nhi)?,
			status: SessionStatus::Active.as_str().to_string(),
			template_id: crate::normalize_optional(req.template_id),
			notes: None,
			typed_input: None,
			consultation_notes: None,
			problems_text: None,
			objective_text: None,
			assessment_text: None,
			plan_text: None,
			created_at: now,
			updated_at: now,
			deleted_at: None,
		};

		sessions::insert_session(&self.db.pool, &row).await?;

		tracing::info!(session_id = %row.session_id, "Created session.");

		Ok(row.into())
	}

	pub async fn get_session(&self, user_id: &str, session_id: Uuid) -> Result<SessionView> {
		let row = sessions::fetch_live_session(&self.db.pool, session_id)
			.await?
			.filter(|row| row.user_id == user_id)
			.ok_or_else(|| Error::not_found("Session not found."))?;

		Ok(row.into())
	}

	/// Live sessions of the owner, most recently updated first.
	pub async fn list_sessions(
		&self,
		user_id: &str,
		req: ListSessionsRequest,
	) -> Result<ListSessionsResponse> {
		let limit = crate::clamp_limit(req.limit, DEFAULT_SESSION_PAGE, MAX_SESSION_PAGE);
		let rows = sessions::list_live_sessions(&self.db.pool, user_id, limit).await?;

		Ok(ListSessionsResponse { items: rows.into_iter().map(SessionView::from).collect() })
	}

	pub async fn update_session(
		&self,
		user_id: &str,
		session_id: Uuid,
		req: UpdateSessionRequest,
	) -> Result<SessionView> {
		let patch = SessionPatch {
			patient_name: check_patient_name(req.patient_name)?,
			patient_nhi: check_nhi(req.patient_nhi)?,
			status: req.status.map(|status| status.as_str().to_string()),
			template_id: req.template_id,
			notes: req.notes,
			typed_input: req.typed_input,
			consultation_notes: req.consultation_notes,
			problems_text: req.problems_text,
			objective_text: req.objective_text,
			assessment_text: req.assessment_text,
			plan_text: req.plan_text,
		};

		if is_empty_patch(&patch) {
			return Err(Error::InvalidRequest {
				message: "At least one session field is required.".to_string(),
			});
		}

		let now = OffsetDateTime::now_utc();
		let row = sessions::update_session(&self.db.pool, user_id, session_id, &patch, now)
			.await?
			.ok_or_else(|| Error::not_found("Session not found."))?;

		self.notify(
			&cp_domain::channel::user_channel(user_id),
			events::SESSION_UPDATED,
			serde_json::json!({ "session_id": row.session_id, "status": row.status }),
		)
		.await;

		Ok(row.into())
	}

	/// Soft-deletes a session. Deleting an already deleted session reports `deleted: false`;
	/// unknown or foreign sessions are NotFound.
	pub async fn delete_session(
		&self,
		user_id: &str,
		session_id: Uuid,
	) -> Result<DeleteSessionResponse> {
		let now = OffsetDateTime::now_utc();
		let deleted = sessions::soft_delete_session(&self.db.pool, user_id, session_id, now).await?;

		if deleted {
			tracing::info!(%session_id, "Soft-deleted session.");
		} else if !sessions::deleted_session_exists_for_user(&self.db.pool, user_id, session_id)
			.await?
		{
			return Err(Error::not_found("Session not found."));
		}

		Ok(DeleteSessionResponse { session_id, deleted })
	}
}

fn check_patient_name(raw: Option<String>) -> Result<Option<String>> {
	let Some(name) = crate::normalize_optional(raw) else {
		return Ok(None);
	};

	if name.chars().count() > session::MAX_PATIENT_NAME_CHARS {
		return Err(Error::invalid_field(
			"$.patient_name",
			format!("patient_name must be at most {} characters.", session::MAX_PATIENT_NAME_CHARS),
		));
	}

	Ok(Some(name))
}

fn check_nhi(raw: Option<String>) -> Result<Option<String>> {
	let Some(nhi) = crate::normalize_optional(raw).map(|value| value.to_ascii_uppercase()) else {
		return Ok(None);
	};

	if !session::is_valid_nhi(&nhi) {
		return Err(Error::invalid_field("$.patient_nhi", "patient_nhi is not a valid NHI number."));
	}

	Ok(Some(nhi))
}

fn is_empty_patch(patch: &SessionPatch) -> bool {
	[
		&patch.patient_name,
		&patch.patient_nhi,
		&patch.status,
		&patch.template_id,
		&patch.notes,
		&patch.typed_input,
		&patch.consultation_notes,
		&patch.problems_text,
		&patch.objective_text,
		&patch.assessment_text,
		&patch.plan_text,
	]
	.iter()
	.all(|field| field.is_none())
}
