use std::sync::Arc;

use time::{Duration, OffsetDateTime};

use cp_domain::token;
use cp_service::{Caller, Error, IssueTokenRequest, ValidateTokenRequest};
use cp_storage::{models::MobileToken, tokens};

use super::SpyPublisher;

#[tokio::test]
#[ignore = "Requires external Postgres. Set CLINICPRO_PG_DSN to run."]
async fn expired_token_is_rejected_even_when_well_formed() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping expired_token_is_rejected_even_when_well_formed; set CLINICPRO_PG_DSN to run this test."
		);

		return;
	};
	let service = super::build_service(
		super::test_config(test_db.dsn().to_string()),
		Arc::new(SpyPublisher::default()),
	)
	.await
	.expect("Failed to build service.");
	let now = OffsetDateTime::now_utc();
	let raw = token::generate_token();

	tokens::insert_token(
		&service.db.pool,
		&MobileToken {
			token: raw.clone(),
			user_id: Some("user_a".to_string()),
			session_id: None,
			is_active: true,
			expires_at: now - Duration::seconds(1),
			created_at: now - Duration::hours(25),
			last_used_at: None,
		},
	)
	.await
	.expect("Failed to insert token.");

	assert!(token::is_well_formed(&raw));

	let err = service
		.validate_mobile_token(ValidateTokenRequest { token: raw.clone() })
		.await
		.expect_err("Expired token must be rejected.");

	assert!(matches!(err, Error::Unauthorized { .. }));

	let err = service
		.issue_realtime_token(&Caller::Mobile { token: raw })
		.await
		.expect_err("Expired token must not authenticate.");

	assert!(matches!(err, Error::Unauthorized { .. }));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set CLINICPRO_PG_DSN to run."]
async fn new_token_deactivates_the_previous_pairing() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping new_token_deactivates_the_previous_pairing; set CLINICPRO_PG_DSN to run this test."
		);

		return;
	};
	let service = super::build_service(
		super::test_config(test_db.dsn().to_string()),
		Arc::new(SpyPublisher::default()),
	)
	.await
	.expect("Failed to build service.");
	let first = service
		.issue_mobile_token(Some("user_a"), IssueTokenRequest::default())
		.await
		.expect("Failed to issue token.");
	let second = service
		.issue_mobile_token(Some("user_a"), IssueTokenRequest::default())
		.await
		.expect("Failed to issue token.");

	assert_ne!(first.token, second.token);
	assert_eq!(second.token.len(), token::TOKEN_LEN);

	let stale = service.validate_mobile_token(ValidateTokenRequest { token: first.token }).await;

	assert!(matches!(stale, Err(Error::Unauthorized { .. })));

	let live = service
		.validate_mobile_token(ValidateTokenRequest { token: second.token.clone() })
		.await
		.expect("Latest token must validate.");

	assert_eq!(live.user_id.as_deref(), Some("user_a"));
	assert!(!live.guest);

	let stored = tokens::fetch_token(&service.db.pool, &second.token)
		.await
		.expect("Fetch failed.")
		.expect("Token must exist.");

	assert!(stored.last_used_at.is_some());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set CLINICPRO_PG_DSN to run."]
async fn unknown_and_deactivated_tokens() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping unknown_and_deactivated_tokens; set CLINICPRO_PG_DSN to run this test."
		);

		return;
	};
	let service = super::build_service(
		super::test_config(test_db.dsn().to_string()),
		Arc::new(SpyPublisher::default()),
	)
	.await
	.expect("Failed to build service.");
	let unknown = service
		.validate_mobile_token(ValidateTokenRequest { token: token::generate_token() })
		.await;

	assert!(matches!(unknown, Err(Error::NotFound { .. })));

	let issued = service
		.issue_mobile_token(Some("user_a"), IssueTokenRequest::default())
		.await
		.expect("Failed to issue token.");

	assert!(matches!(
		service.deactivate_mobile_token("user_b", &issued.token).await,
		Err(Error::NotFound { .. })
	));
	assert!(
		service
			.deactivate_mobile_token("user_a", &issued.token)
			.await
			.expect("Owner must deactivate.")
			.deactivated
	);
	assert!(matches!(
		service.validate_mobile_token(ValidateTokenRequest { token: issued.token }).await,
		Err(Error::Unauthorized { .. })
	));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
