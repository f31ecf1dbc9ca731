use std::sync::Arc;

use time::{Duration, OffsetDateTime};

use cp_service::{
	Caller, CleanupReport, CreateSessionRequest, SubmitChunkRequest, UpdateSessionRequest,
};

use super::SpyPublisher;

#[tokio::test]
#[ignore = "Requires external Postgres. Set CLINICPRO_PG_DSN to run."]
async fn cleanup_soft_deletes_then_purges_empty_sessions() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping cleanup_soft_deletes_then_purges_empty_sessions; set CLINICPRO_PG_DSN to run this test."
		);

		return;
	};
	let service = super::build_service(
		super::test_config(test_db.dsn().to_string()),
		Arc::new(SpyPublisher::default()),
	)
	.await
	.expect("Failed to build service.");
	let owner = Caller::Owner { user_id: "user_a".to_string() };
	let empty = service
		.create_session("user_a", CreateSessionRequest::default())
		.await
		.expect("Failed to create session.");
	let with_notes = service
		.create_session("user_a", CreateSessionRequest::default())
		.await
		.expect("Failed to create session.");
	let with_chunks = service
		.create_session("user_a", CreateSessionRequest::default())
		.await
		.expect("Failed to create session.");

	service
		.update_session(
			"user_a",
			with_notes.session_id,
			UpdateSessionRequest {
				plan_text: Some("Review in two weeks.".to_string()),
				..Default::default()
			},
		)
		.await
		.expect("Failed to update session.");
	service
		.submit_chunk(
			&owner,
			SubmitChunkRequest {
				session_id: with_chunks.session_id,
				chunk_id: "c1".to_string(),
				text: "Chest clear.".to_string(),
				source: None,
				device_id: None,
			},
		)
		.await
		.expect("Failed to submit chunk.");

	let later = OffsetDateTime::now_utc() + Duration::hours(25);
	let report = service.run_cleanup(later).await.expect("Cleanup failed.");

	assert_eq!(
		report,
		CleanupReport {
			sessions_soft_deleted: 1,
			tokens_deleted: 0,
			images_deleted: 0,
			sessions_purged: 0,
		}
	);
	assert!(service.get_session("user_a", empty.session_id).await.is_err());
	assert!(service.get_session("user_a", with_notes.session_id).await.is_ok());
	assert!(service.get_session("user_a", with_chunks.session_id).await.is_ok());

	let much_later = later + Duration::days(31);
	let report = service.run_cleanup(much_later).await.expect("Cleanup failed.");

	assert_eq!(report.sessions_purged, 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
