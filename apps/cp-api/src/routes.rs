use axum::{
	Json, Router,
	extract::{
		Path, Query, State,
		rejection::{JsonRejection, PathRejection, QueryRejection},
	},
	http::{HeaderMap, StatusCode},
	response::{IntoResponse, Response},
	routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	auth::{self, AuthError},
	state::AppState,
};
use cp_service::{
	CleanupReport, ConfirmImageResponse, CreateSessionRequest, DeactivateTokenResponse,
	DeleteSessionResponse, Error as ServiceError, ImageToolUsageResponse, IssueTokenRequest,
	IssueTokenResponse, ListChunksRequest, ListChunksResponse, ListImagesRequest,
	ListImagesResponse, ListSessionsRequest, ListSessionsResponse, PresignImageRequest,
	PresignImageResponse, RealtimeTokenResponse, SessionView, SubmitChunkRequest,
	SubmitChunkResponse, UpdateSessionRequest, ValidateTokenRequest, ValidateTokenResponse,
};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/mobile/tokens", post(issue_mobile_token))
		.route("/v1/mobile/tokens/validate", post(validate_mobile_token))
		.route("/v1/mobile/tokens/{token}", delete(deactivate_mobile_token))
		.route("/v1/sessions", post(create_session).get(list_sessions))
		.route(
			"/v1/sessions/{session_id}",
			get(get_session).patch(update_session).delete(delete_session),
		)
		.route("/v1/transcriptions", post(submit_chunk).get(list_chunks))
		.route("/v1/images", get(list_images))
		.route("/v1/images/presign", post(presign_image_upload))
		.route("/v1/images/{upload_id}/confirm", post(confirm_image_upload))
		.route("/v1/realtime/token", post(issue_realtime_token))
		.route("/v1/usage/image-tool", post(record_image_tool_usage).get(image_tool_usage))
		.with_state(state)
}

pub fn admin_router(state: AppState) -> Router {
	Router::new().route("/v1/admin/cleanup", post(run_cleanup)).with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn issue_mobile_token(
	State(state): State<AppState>,
	headers: HeaderMap,
	payload: Result<Json<IssueTokenRequest>, JsonRejection>,
) -> Result<Json<IssueTokenResponse>, ApiError> {
	let user_id = auth::owner_id(&headers, &state.service.cfg.security)?;
	let payload = match payload {
		Ok(Json(payload)) => payload,
		// Guests may post without a body.
		Err(JsonRejection::MissingJsonContentType(_)) => IssueTokenRequest::default(),
		Err(err) => return Err(err.into()),
	};
	let response = state.service.issue_mobile_token(user_id.as_deref(), payload).await?;

	Ok(Json(response))
}

async fn validate_mobile_token(
	State(state): State<AppState>,
	payload: Result<Json<ValidateTokenRequest>, JsonRejection>,
) -> Result<Json<ValidateTokenResponse>, ApiError> {
	let Json(payload) = payload?;
	let response = state.service.validate_mobile_token(payload).await?;

	Ok(Json(response))
}

async fn deactivate_mobile_token(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(token): Path<String>,
) -> Result<Json<DeactivateTokenResponse>, ApiError> {
	let user_id = auth::require_owner(&headers, &state.service.cfg.security)?;
	let response = state.service.deactivate_mobile_token(&user_id, &token).await?;

	Ok(Json(response))
}

async fn create_session(
	State(state): State<AppState>,
	headers: HeaderMap,
	payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
	let user_id = auth::require_owner(&headers, &state.service.cfg.security)?;
	let Json(payload) = payload?;
	let response = state.service.create_session(&user_id, payload).await?;

	Ok((StatusCode::CREATED, Json(response)))
}

async fn list_sessions(
	State(state): State<AppState>,
	headers: HeaderMap,
	query: Result<Query<ListSessionsRequest>, QueryRejection>,
) -> Result<Json<ListSessionsResponse>, ApiError> {
	let user_id = auth::require_owner(&headers, &state.service.cfg.security)?;
	let Query(query) = query?;
	let response = state.service.list_sessions(&user_id, query).await?;

	Ok(Json(response))
}

async fn get_session(
	State(state): State<AppState>,
	headers: HeaderMap,
	session_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<SessionView>, ApiError> {
	let user_id = auth::require_owner(&headers, &state.service.cfg.security)?;
	let Path(session_id) = session_id?;
	let response = state.service.get_session(&user_id, session_id).await?;

	Ok(Json(response))
}

async fn update_session(
	State(state): State<AppState>,
	headers: HeaderMap,
	session_id: Result<Path<Uuid>, PathRejection>,
	payload: Result<Json<UpdateSessionRequest>, JsonRejection>,
) -> Result<Json<SessionView>, ApiError> {
	let user_id = auth::require_owner(&headers, &state.service.cfg.security)?;
	let Path(session_id) = session_id?;
	let Json(payload) = payload?;
	let response = state.service.update_session(&user_id, session_id, payload).await?;

	Ok(Json(response))
}

async fn delete_session(
	State(state): State<AppState>,
	headers: HeaderMap,
	session_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<DeleteSessionResponse>, ApiError> {
	let user_id = auth::require_owner(&headers, &state.service.cfg.security)?;
	let Path(session_id) = session_id?;
	let response = state.service.delete_session(&user_id, session_id).await?;

	Ok(Json(response))
}

async fn submit_chunk(
	State(state): State<AppState>,
	headers: HeaderMap,
	payload: Result<Json<SubmitChunkRequest>, JsonRejection>,
) -> Result<Json<SubmitChunkResponse>, ApiError> {
	let caller = auth::caller(&headers, &state.service.cfg.security)?;
	let Json(payload) = payload?;
	let response = state.service.submit_chunk(&caller, payload).await?;

	Ok(Json(response))
}

async fn list_chunks(
	State(state): State<AppState>,
	headers: HeaderMap,
	query: Result<Query<ListChunksRequest>, QueryRejection>,
) -> Result<Json<ListChunksResponse>, ApiError> {
	let caller = auth::caller(&headers, &state.service.cfg.security)?;
	let Query(query) = query?;
	let response = state.service.list_chunks(&caller, query).await?;

	Ok(Json(response))
}

async fn presign_image_upload(
	State(state): State<AppState>,
	headers: HeaderMap,
	payload: Result<Json<PresignImageRequest>, JsonRejection>,
) -> Result<Json<PresignImageResponse>, ApiError> {
	let caller = auth::caller(&headers, &state.service.cfg.security)?;
	let Json(payload) = payload?;
	let response = state.service.presign_image_upload(&caller, payload).await?;

	Ok(Json(response))
}

async fn confirm_image_upload(
	State(state): State<AppState>,
	headers: HeaderMap,
	upload_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ConfirmImageResponse>, ApiError> {
	let caller = auth::caller(&headers, &state.service.cfg.security)?;
	let Path(upload_id) = upload_id?;
	let response = state.service.confirm_image_upload(&caller, upload_id).await?;

	Ok(Json(response))
}

async fn list_images(
	State(state): State<AppState>,
	headers: HeaderMap,
	query: Result<Query<ListImagesRequest>, QueryRejection>,
) -> Result<Json<ListImagesResponse>, ApiError> {
	let user_id = auth::require_owner(&headers, &state.service.cfg.security)?;
	let Query(query) = query?;
	let response = state.service.list_images(&user_id, query).await?;

	Ok(Json(response))
}

async fn issue_realtime_token(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> Result<Json<RealtimeTokenResponse>, ApiError> {
	let caller = auth::caller(&headers, &state.service.cfg.security)?;
	let response = state.service.issue_realtime_token(&caller).await?;

	Ok(Json(response))
}

async fn record_image_tool_usage(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> Result<Json<ImageToolUsageResponse>, ApiError> {
	let user_id = auth::require_owner(&headers, &state.service.cfg.security)?;
	let tier = auth::tier(&headers)?;
	let response = state.service.record_image_tool_usage(&user_id, tier).await?;

	Ok(Json(response))
}

async fn image_tool_usage(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> Result<Json<ImageToolUsageResponse>, ApiError> {
	let user_id = auth::require_owner(&headers, &state.service.cfg.security)?;
	let tier = auth::tier(&headers)?;
	let response = state.service.image_tool_usage(&user_id, tier).await?;

	Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct CleanupQuery {
	secret: Option<String>,
}

async fn run_cleanup(
	State(state): State<AppState>,
	headers: HeaderMap,
	query: Result<Query<CleanupQuery>, QueryRejection>,
) -> Result<Json<CleanupReport>, ApiError> {
	let Query(query) = query?;

	if !auth::is_cron_authorized(&headers, query.secret.as_deref(), &state.service.cfg.security) {
		return Err(json_error(
			StatusCode::UNAUTHORIZED,
			"UNAUTHORIZED",
			"Cron secret is missing or invalid.",
			None,
		));
	}

	let response = state.service.run_cleanup(OffsetDateTime::now_utc()).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message, None),
			ServiceError::InvalidField { field, message } =>
				json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message, Some(vec![field])),
			ServiceError::Unauthorized { message } =>
				json_error(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message, None),
			ServiceError::Forbidden { message } =>
				json_error(StatusCode::FORBIDDEN, "FORBIDDEN", message, None),
			ServiceError::NotFound { message } =>
				json_error(StatusCode::NOT_FOUND, "NOT_FOUND", message, None),
			ServiceError::Conflict { message } =>
				json_error(StatusCode::CONFLICT, "CONFLICT", message, None),
			ServiceError::UsageLimitReached { used, limit } => json_error(
				StatusCode::TOO_MANY_REQUESTS,
				"USAGE_LIMIT_REACHED",
				format!("Daily image tool limit reached ({used}/{limit})."),
				None,
			),
			ServiceError::Provider { message } => {
				tracing::error!(error = %message, "Provider request failed.");

				json_error(
					StatusCode::BAD_GATEWAY,
					"PROVIDER_ERROR",
					"Upstream provider request failed.",
					None,
				)
			},
			ServiceError::Storage { message } => {
				tracing::error!(error = %message, "Storage request failed.");

				json_error(
					StatusCode::INTERNAL_SERVER_ERROR,
					"INTERNAL_ERROR",
					"Internal server error.",
					None,
				)
			},
		}
	}
}

impl From<AuthError> for ApiError {
	fn from(err: AuthError) -> Self {
		match err {
			AuthError::BadProxyToken => json_error(
				StatusCode::UNAUTHORIZED,
				"UNAUTHORIZED",
				"Proxy authorization is missing or invalid.",
				None,
			),
			AuthError::MissingIdentity => json_error(
				StatusCode::UNAUTHORIZED,
				"UNAUTHORIZED",
				"Caller identity is required.",
				None,
			),
			AuthError::UnknownTier(raw) => json_error(
				StatusCode::BAD_REQUEST,
				"INVALID_REQUEST",
				format!("Unknown subscription tier {raw:?}."),
				Some(vec![auth::TIER_HEADER.to_string()]),
			),
		}
	}
}

impl From<JsonRejection> for ApiError {
	fn from(err: JsonRejection) -> Self {
		json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", err.body_text(), None)
	}
}

impl From<QueryRejection> for ApiError {
	fn from(err: QueryRejection) -> Self {
		json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", err.body_text(), None)
	}
}

impl From<PathRejection> for ApiError {
	fn from(err: PathRejection) -> Self {
		json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", err.body_text(), None)
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody {
			error_code: self.error_code,
			message: self.message,
			fields: self.fields,
		};

		(self.status, Json(body)).into_response()
	}
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}
