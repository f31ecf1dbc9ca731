use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{ClinicService, Error, Result};
use cp_domain::token;
use cp_storage::{models::MobileToken, sessions, tokens};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueTokenRequest {
	#[serde(default, alias = "sessionId")]
	pub session_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueTokenResponse {
	pub token: String,
	#[serde(with = "crate::time_serde")]
	pub expires_at: OffsetDateTime,
	pub session_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateTokenRequest {
	pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateTokenResponse {
	pub user_id: Option<String>,
	pub session_id: Option<Uuid>,
	pub guest: bool,
	#[serde(with = "crate::time_serde")]
	pub expires_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeactivateTokenResponse {
	pub deactivated: bool,
}

impl ClinicService {
	/// Issues a mobile token for `user_id`, or a guest token when no owner is known.
	///
	/// An owner keeps a single live pairing: earlier active tokens are switched off in the same
	/// transaction.
	pub async fn issue_mobile_token(
		&self,
		user_id: Option<&str>,
		req: IssueTokenRequest,
	) -> Result<IssueTokenResponse> {
		let now = OffsetDateTime::now_utc();
		let user_id = user_id.map(str::trim).filter(|value| !value.is_empty());
		let expires_at = now + Duration::hours(self.cfg.mobile.token_ttl_hours);
		let row = MobileToken {
			token: token::generate_token(),
			user_id: user_id.map(ToString::to_string),
			session_id: req.session_id,
			is_active: true,
			expires_at,
			created_at: now,
			last_used_at: None,
		};

		if user_id.is_none() && req.session_id.is_some() {
			return Err(Error::InvalidRequest {
				message: "session_id requires an authenticated owner.".to_string(),
			});
		}

		let mut tx = self.db.pool.begin().await?;

		if let (Some(owner), Some(session_id)) = (user_id, req.session_id)
			&& !sessions::session_exists_for_user(&mut *tx, owner, session_id).await?
		{
			return Err(Error::not_found("Session not found."));
		}
		if let Some(owner) = user_id {
			let revoked = tokens::deactivate_user_tokens(&mut *tx, owner).await?;

			if revoked > 0 {
				tracing::info!(revoked, "Deactivated previous mobile tokens.");
			}
		}

		tokens::insert_token(&mut *tx, &row).await?;
		tx.commit().await?;

		tracing::info!(
			guest = user_id.is_none(),
			session_id = ?row.session_id,
			"Issued mobile token."
		);

		Ok(IssueTokenResponse { token: row.token, expires_at, session_id: row.session_id })
	}

	pub async fn validate_mobile_token(
		&self,
		req: ValidateTokenRequest,
	) -> Result<ValidateTokenResponse> {
		let row = self.check_token(&req.token, OffsetDateTime::now_utc()).await?;

		Ok(ValidateTokenResponse {
			guest: row.user_id.is_none(),
			user_id: row.user_id,
			session_id: row.session_id,
			expires_at: row.expires_at,
		})
	}

	/// Switches off one of the owner's tokens. Unknown or foreign tokens read as missing.
	pub async fn deactivate_mobile_token(
		&self,
		user_id: &str,
		raw_token: &str,
	) -> Result<DeactivateTokenResponse> {
		let deactivated = tokens::deactivate_token(&self.db.pool, raw_token.trim(), user_id).await?;

		if !deactivated {
			return Err(Error::not_found("Mobile token not found."));
		}

		Ok(DeactivateTokenResponse { deactivated })
	}
}
