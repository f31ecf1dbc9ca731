use std::sync::Arc;

use serde_json::Value;

use cp_domain::token;
use cp_service::{Caller, Error, IssueTokenRequest, RealtimeTokenResponse};

use super::SpyPublisher;

fn capability(response: &RealtimeTokenResponse) -> Value {
	serde_json::from_str(&response.capability).expect("Capability must be JSON.")
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set CLINICPRO_PG_DSN to run."]
async fn realtime_tokens_are_scoped_to_the_callers_channel() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping realtime_tokens_are_scoped_to_the_callers_channel; set CLINICPRO_PG_DSN to run this test."
		);

		return;
	};
	let service = super::build_service(
		super::test_config(test_db.dsn().to_string()),
		Arc::new(SpyPublisher::default()),
	)
	.await
	.expect("Failed to build service.");
	let owner = service
		.issue_realtime_token(&Caller::Owner { user_id: "user_a".to_string() })
		.await
		.expect("Owner token failed.");

	assert_eq!(owner.token, "stub-token");
	assert_eq!(owner.channel, "user:user_a");
	assert_eq!(owner.client_id.as_deref(), Some("user_a"));
	assert_eq!(
		capability(&owner),
		serde_json::json!({ "user:user_a": ["subscribe", "publish", "presence"] })
	);
	assert!(owner.expires > owner.issued);

	let paired = service
		.issue_mobile_token(Some("user_a"), IssueTokenRequest::default())
		.await
		.expect("Failed to issue token.");
	let phone = service
		.issue_realtime_token(&Caller::Mobile { token: paired.token })
		.await
		.expect("Mobile token failed.");

	assert_eq!(phone.channel, "user:user_a");
	assert_eq!(phone.client_id.as_deref(), Some("user_a"));
	assert_eq!(
		capability(&phone),
		serde_json::json!({ "user:user_a": ["publish", "subscribe"] })
	);

	let guest = service
		.issue_mobile_token(None, IssueTokenRequest::default())
		.await
		.expect("Failed to issue guest token.");
	let guest_channel = format!("guest:{}", token::guest_key(&guest.token));
	let visitor = service
		.issue_realtime_token(&Caller::Mobile { token: guest.token })
		.await
		.expect("Guest token failed.");

	assert_eq!(visitor.channel, guest_channel);
	assert_eq!(visitor.client_id, None);
	assert_eq!(
		capability(&visitor),
		serde_json::json!({ (guest_channel.as_str()): ["publish", "subscribe"] })
	);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set CLINICPRO_PG_DSN to run."]
async fn realtime_tokens_are_refused_when_realtime_is_disabled() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping realtime_tokens_are_refused_when_realtime_is_disabled; set CLINICPRO_PG_DSN to run this test."
		);

		return;
	};
	let mut cfg = super::test_config(test_db.dsn().to_string());

	cfg.realtime.enabled = false;

	let service = super::build_service(cfg, Arc::new(SpyPublisher::default()))
		.await
		.expect("Failed to build service.");
	let err = service
		.issue_realtime_token(&Caller::Owner { user_id: "user_a".to_string() })
		.await
		.expect_err("Disabled realtime must refuse tokens.");

	assert!(matches!(err, Error::InvalidRequest { .. }));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
