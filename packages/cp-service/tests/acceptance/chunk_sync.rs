use std::sync::Arc;

use cp_service::{
	Caller, CreateSessionRequest, IssueTokenRequest, ListChunksRequest, SubmitChunkRequest,
};

use super::{FailingPublisher, SpyPublisher};

fn chunk(session_id: uuid::Uuid, chunk_id: &str, text: &str) -> SubmitChunkRequest {
	SubmitChunkRequest {
		session_id,
		chunk_id: chunk_id.to_string(),
		text: text.to_string(),
		source: Some("mobile".to_string()),
		device_id: Some("iphone-15".to_string()),
	}
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set CLINICPRO_PG_DSN to run."]
async fn resubmitted_chunk_returns_the_first_row_id() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping resubmitted_chunk_returns_the_first_row_id; set CLINICPRO_PG_DSN to run this test."
		);

		return;
	};
	let publisher = Arc::new(SpyPublisher::default());
	let service =
		super::build_service(super::test_config(test_db.dsn().to_string()), publisher.clone())
			.await
			.expect("Failed to build service.");
	let session = service
		.create_session("user_a", CreateSessionRequest::default())
		.await
		.expect("Failed to create session.");
	let issued = service
		.issue_mobile_token(
			Some("user_a"),
			IssueTokenRequest { session_id: Some(session.session_id) },
		)
		.await
		.expect("Failed to issue token.");
	let phone = Caller::Mobile { token: issued.token };
	let first = service
		.submit_chunk(&phone, chunk(session.session_id, "c1", "BP 120/80"))
		.await
		.expect("First submit failed.");
	let second = service
		.submit_chunk(&phone, chunk(session.session_id, "c1", "BP 120/80"))
		.await
		.expect("Second submit failed.");

	assert!(!first.duplicate);
	assert!(second.duplicate);
	assert_eq!(first.id, second.id);

	let desktop = Caller::Owner { user_id: "user_a".to_string() };
	let listed = service
		.list_chunks(
			&desktop,
			ListChunksRequest { session_id: session.session_id, after_id: None, limit: None },
		)
		.await
		.expect("List failed.");

	assert_eq!(listed.items.len(), 1);
	assert_eq!(listed.items[0].text, "BP 120/80");
	assert_eq!(listed.next_after_id, first.id);

	let events = publisher.events();

	assert_eq!(events.len(), 1);
	assert_eq!(events[0].channel, "user:user_a");
	assert_eq!(events[0].event, "transcription.chunk");
	assert_eq!(events[0].data["id"], first.id);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set CLINICPRO_PG_DSN to run."]
async fn chunks_are_strictly_increasing_after_the_cursor() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping chunks_are_strictly_increasing_after_the_cursor; set CLINICPRO_PG_DSN to run this test."
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
	let session = service
		.create_session("user_a", CreateSessionRequest::default())
		.await
		.expect("Failed to create session.");
	let mut ids = Vec::new();

	for (chunk_id, text) in
		[("c1", "History: cough"), ("c2", "Exam: clear"), ("c3", "Plan: rest")]
	{
		let submitted = service
			.submit_chunk(&owner, chunk(session.session_id, chunk_id, text))
			.await
			.expect("Submit failed.");

		ids.push(submitted.id);
	}

	let after_first = service
		.list_chunks(
			&owner,
			ListChunksRequest {
				session_id: session.session_id,
				after_id: Some(ids[0]),
				limit: None,
			},
		)
		.await
		.expect("List failed.");
	let listed: Vec<i64> = after_first.items.iter().map(|item| item.id).collect();

	assert_eq!(listed, vec![ids[1], ids[2]]);
	assert!(listed.windows(2).all(|pair| pair[0] < pair[1]));
	assert_eq!(after_first.next_after_id, ids[2]);

	let drained = service
		.list_chunks(
			&owner,
			ListChunksRequest {
				session_id: session.session_id,
				after_id: Some(ids[2]),
				limit: None,
			},
		)
		.await
		.expect("List failed.");

	assert!(drained.items.is_empty());
	assert_eq!(drained.next_after_id, ids[2]);

	let first_page = service
		.list_chunks(
			&owner,
			ListChunksRequest { session_id: session.session_id, after_id: None, limit: Some(2) },
		)
		.await
		.expect("List failed.");

	assert_eq!(first_page.items.len(), 2);
	assert_eq!(first_page.next_after_id, ids[1]);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set CLINICPRO_PG_DSN to run."]
async fn publish_failure_does_not_fail_the_write() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping publish_failure_does_not_fail_the_write; set CLINICPRO_PG_DSN to run this test."
		);

		return;
	};
	let service = super::build_service(
		super::test_config(test_db.dsn().to_string()),
		Arc::new(FailingPublisher),
	)
	.await
	.expect("Failed to build service.");
	let owner = Caller::Owner { user_id: "user_a".to_string() };
	let session = service
		.create_session("user_a", CreateSessionRequest::default())
		.await
		.expect("Failed to create session.");
	let submitted = service
		.submit_chunk(&owner, chunk(session.session_id, "c1", "Afebrile."))
		.await
		.expect("Submit must succeed when publishing fails.");

	assert!(!submitted.duplicate);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
