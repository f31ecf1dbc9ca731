use std::sync::Arc;

use cp_service::{
	Caller, CreateSessionRequest, Error, IssueTokenRequest, ListChunksRequest, SubmitChunkRequest,
};

use super::SpyPublisher;

fn list(session_id: uuid::Uuid) -> ListChunksRequest {
	ListChunksRequest { session_id, after_id: None, limit: None }
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set CLINICPRO_PG_DSN to run."]
async fn other_owners_cannot_read_session_chunks() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping other_owners_cannot_read_session_chunks; set CLINICPRO_PG_DSN to run this test."
		);

		return;
	};
	let service = super::build_service(
		super::test_config(test_db.dsn().to_string()),
		Arc::new(SpyPublisher::default()),
	)
	.await
	.expect("Failed to build service.");
	let session = service
		.create_session("user_a", CreateSessionRequest::default())
		.await
		.expect("Failed to create session.");
	let intruder = Caller::Owner { user_id: "user_b".to_string() };
	let err = service
		.list_chunks(&intruder, list(session.session_id))
		.await
		.expect_err("Foreign owner must not read chunks.");

	assert!(matches!(err, Error::NotFound { .. }));

	let other_token = service
		.issue_mobile_token(Some("user_b"), IssueTokenRequest::default())
		.await
		.expect("Failed to issue token.");
	let err = service
		.list_chunks(&Caller::Mobile { token: other_token.token }, list(session.session_id))
		.await
		.expect_err("Foreign token must not read chunks.");

	assert!(matches!(err, Error::NotFound { .. }));
	assert!(service.get_session("user_b", session.session_id).await.is_err());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set CLINICPRO_PG_DSN to run."]
async fn session_bound_token_only_reaches_its_session() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping session_bound_token_only_reaches_its_session; set CLINICPRO_PG_DSN to run this test."
		);

		return;
	};
	let service = super::build_service(
		super::test_config(test_db.dsn().to_string()),
		Arc::new(SpyPublisher::default()),
	)
	.await
	.expect("Failed to build service.");
	let bound = service
		.create_session("user_a", CreateSessionRequest::default())
		.await
		.expect("Failed to create session.");
	let other = service
		.create_session("user_a", CreateSessionRequest::default())
		.await
		.expect("Failed to create session.");
	let issued = service
		.issue_mobile_token(
			Some("user_a"),
			IssueTokenRequest { session_id: Some(bound.session_id) },
		)
		.await
		.expect("Failed to issue token.");
	let phone = Caller::Mobile { token: issued.token };

	assert!(service.list_chunks(&phone, list(bound.session_id)).await.is_ok());
	assert!(matches!(
		service.list_chunks(&phone, list(other.session_id)).await,
		Err(Error::NotFound { .. })
	));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set CLINICPRO_PG_DSN to run."]
async fn guest_tokens_cannot_write_chunks() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping guest_tokens_cannot_write_chunks; set CLINICPRO_PG_DSN to run this test."
		);

		return;
	};
	let service = super::build_service(
		super::test_config(test_db.dsn().to_string()),
		Arc::new(SpyPublisher::default()),
	)
	.await
	.expect("Failed to build service.");
	let session = service
		.create_session("user_a", CreateSessionRequest::default())
		.await
		.expect("Failed to create session.");
	let guest = service
		.issue_mobile_token(None, IssueTokenRequest::default())
		.await
		.expect("Failed to issue guest token.");
	let err = service
		.submit_chunk(
			&Caller::Mobile { token: guest.token },
			SubmitChunkRequest {
				session_id: session.session_id,
				chunk_id: "c1".to_string(),
				text: "hello".to_string(),
				source: None,
				device_id: None,
			},
		)
		.await
		.expect_err("Guest token must not write chunks.");

	assert!(matches!(err, Error::Forbidden { .. }));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set CLINICPRO_PG_DSN to run."]
async fn deleting_foreign_or_unknown_sessions_is_not_found() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping deleting_foreign_or_unknown_sessions_is_not_found; set CLINICPRO_PG_DSN to run this test."
		);

		return;
	};
	let service = super::build_service(
		super::test_config(test_db.dsn().to_string()),
		Arc::new(SpyPublisher::default()),
	)
	.await
	.expect("Failed to build service.");
	let session = service
		.create_session("user_a", CreateSessionRequest::default())
		.await
		.expect("Failed to create session.");

	assert!(matches!(
		service.delete_session("user_b", session.session_id).await,
		Err(Error::NotFound { .. })
	));
	assert!(matches!(
		service.delete_session("user_a", uuid::Uuid::new_v4()).await,
		Err(Error::NotFound { .. })
	));
	assert!(service.get_session("user_a", session.session_id).await.is_ok());

	service.delete_session("user_a", session.session_id).await.expect("Owner delete failed.");

	assert!(matches!(
		service.delete_session("user_b", session.session_id).await,
		Err(Error::NotFound { .. })
	));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
