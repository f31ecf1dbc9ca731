//! Caller resolution and session authorization.

use time::OffsetDateTime;
use uuid::Uuid;

use crate::{ClinicService, Error, Result};
use cp_domain::{channel, media::ObjectOwner, token};
use cp_storage::{
	models::{MobileToken, Session},
	sessions, tokens,
};

/// Credentials presented with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
	/// A practitioner authenticated by the upstream auth proxy.
	Owner { user_id: String },
	/// A phone presenting a mobile token.
	Mobile { token: String },
}

/// A caller whose credentials have been checked.
#[derive(Debug, Clone)]
pub(crate) enum Principal {
	Owner(String),
	Token(MobileToken),
}
impl Principal {
	/// Owner id the principal acts for. Guest tokens have none.
	pub(crate) fn owner_id(&self) -> Option<&str> {
		match self {
			Self::Owner(user_id) => Some(user_id),
			Self::Token(token) => token.user_id.as_deref(),
		}
	}

	pub(crate) fn guest_key(&self) -> Option<String> {
		match self {
			Self::Token(row) if row.user_id.is_none() => Some(token::guest_key(&row.token)),
			_ => None,
		}
	}

	pub(crate) fn object_owner<'a>(
		&'a self,
		guest_key: Option<&'a str>,
	) -> Option<ObjectOwner<'a>> {
		match (self.owner_id(), guest_key) {
			(Some(user_id), _) => Some(ObjectOwner::User(user_id)),
			(None, Some(key)) => Some(ObjectOwner::Guest(key)),
			(None, None) => None,
		}
	}

	/// Channel that receives events for resources this principal creates.
	pub(crate) fn channel(&self) -> Option<String> {
		match self.owner_id() {
			Some(user_id) => Some(channel::user_channel(user_id)),
			None => self.guest_key().map(|key| channel::guest_channel(&key)),
		}
	}

	pub(crate) fn bound_session(&self) -> Option<Uuid> {
		match self {
			Self::Owner(_) => None,
			Self::Token(token) => token.session_id,
		}
	}
}

impl ClinicService {
	/// Loads a token and checks it is active and unexpired, stamping `last_used_at`.
	///
	/// Unknown tokens are `NotFound`; inactive or expired ones are `Unauthorized`.
	pub(crate) async fn check_token(&self, raw: &str, now: OffsetDateTime) -> Result<MobileToken> {
		let raw = raw.trim();

		if !token::is_well_formed(raw) {
			return Err(Error::not_found("Mobile token not found."));
		}

		let row = tokens::fetch_token(&self.db.pool, raw)
			.await?
			.ok_or_else(|| Error::not_found("Mobile token not found."))?;

		if !row.is_active {
			return Err(Error::unauthorized("Mobile token is no longer active."));
		}
		if row.expires_at <= now {
			return Err(Error::unauthorized("Mobile token has expired."));
		}

		tokens::mark_token_used(&self.db.pool, &row.token, now).await?;

		Ok(row)
	}

	pub(crate) async fn resolve_caller(
		&self,
		caller: &Caller,
		now: OffsetDateTime,
	) -> Result<Principal> {
		match caller {
			Caller::Owner { user_id } => {
				let user_id = user_id.trim();

				if user_id.is_empty() {
					return Err(Error::unauthorized("User id is required."));
				}

				Ok(Principal::Owner(user_id.to_string()))
			},
			Caller::Mobile { token } => match self.check_token(token, now).await {
				Ok(row) => Ok(Principal::Token(row)),
				Err(Error::NotFound { .. }) => Err(Error::unauthorized("Mobile token is invalid.")),
				Err(err) => Err(err),
			},
		}
	}

	/// Returns the live session when the principal may access it.
	///
	/// Sessions owned by someone else read as missing. A token bound to a session only reaches
	/// that session.
	pub(crate) async fn authorize_session(
		&self,
		principal: &Principal,
		session_id: Uuid,
	) -> Result<Session> {
		let Some(owner_id) = principal.owner_id() else {
			return Err(Error::Forbidden {
				message: "Guest tokens cannot access sessions.".to_string(),
			});
		};

		if principal.bound_session().is_some_and(|bound| bound != session_id) {
			return Err(Error::not_found("Session not found."));
		}

		let session = sessions::fetch_live_session(&self.db.pool, session_id)
			.await?
			.filter(|session| session.user_id == owner_id)
			.ok_or_else(|| Error::not_found("Session not found."))?;

		Ok(session)
	}
}
