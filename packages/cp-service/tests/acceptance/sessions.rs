use std::sync::Arc;

use cp_domain::session::SessionStatus;
use cp_service::{CreateSessionRequest, Error, UpdateSessionRequest};

use super::SpyPublisher;

#[tokio::test]
#[ignore = "Requires external Postgres. Set CLINICPRO_PG_DSN to run."]
async fn update_publishes_session_updated_to_the_owner() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping update_publishes_session_updated_to_the_owner; set CLINICPRO_PG_DSN to run this test."
		);

		return;
	};
	let publisher = Arc::new(SpyPublisher::default());
	let service = super::build_service(
		super::test_config(test_db.dsn().to_string()),
		publisher.clone(),
	)
	.await
	.expect("Failed to build service.");
	let session = service
		.create_session("user_a", CreateSessionRequest::default())
		.await
		.expect("Failed to create session.");
	let updated = service
		.update_session(
			"user_a",
			session.session_id,
			UpdateSessionRequest {
				patient_nhi: Some("abc1234".to_string()),
				status: Some(SessionStatus::Completed),
				notes: Some("Follow up in two weeks.".to_string()),
				..UpdateSessionRequest::default()
			},
		)
		.await
		.expect("Failed to update session.");

	assert_eq!(updated.status, "completed");
	assert_eq!(updated.patient_nhi.as_deref(), Some("ABC1234"));

	let events = publisher.events();

	assert_eq!(events.len(), 1);
	assert_eq!(events[0].channel, "user:user_a");
	assert_eq!(events[0].event, "session.updated");
	assert_eq!(events[0].data["session_id"], session.session_id.to_string());
	assert_eq!(events[0].data["status"], "completed");

	let err = service
		.update_session("user_a", session.session_id, UpdateSessionRequest::default())
		.await
		.expect_err("Empty patch must be rejected.");

	assert!(matches!(err, Error::InvalidRequest { .. }));
	assert_eq!(publisher.events().len(), 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set CLINICPRO_PG_DSN to run."]
async fn second_delete_reports_nothing_deleted() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping second_delete_reports_nothing_deleted; set CLINICPRO_PG_DSN to run this test."
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
	let first =
		service.delete_session("user_a", session.session_id).await.expect("First delete failed.");
	let second =
		service.delete_session("user_a", session.session_id).await.expect("Second delete failed.");

	assert!(first.deleted);
	assert!(!second.deleted);
	assert_eq!(second.session_id, session.session_id);
	assert!(matches!(
		service.get_session("user_a", session.session_id).await,
		Err(Error::NotFound { .. })
	));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
