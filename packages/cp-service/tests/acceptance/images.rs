use std::sync::Arc;

use cp_service::{Caller, Error, IssueTokenRequest, ListImagesRequest, PresignImageRequest};

use super::SpyPublisher;

#[tokio::test]
#[ignore = "Requires external Postgres. Set CLINICPRO_PG_DSN to run."]
async fn confirmed_upload_is_listed_and_published_once() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping confirmed_upload_is_listed_and_published_once; set CLINICPRO_PG_DSN to run this test."
		);

		return;
	};
	let publisher = Arc::new(SpyPublisher::default());
	let service =
		super::build_service(super::test_config(test_db.dsn().to_string()), publisher.clone())
			.await
			.expect("Failed to build service.");
	let issued = service
		.issue_mobile_token(Some("user_a"), IssueTokenRequest::default())
		.await
		.expect("Failed to issue token.");
	let phone = Caller::Mobile { token: issued.token };
	let presigned = service
		.presign_image_upload(
			&phone,
			PresignImageRequest {
				content_type: "image/jpeg".to_string(),
				size_bytes: 2_048,
				session_id: None,
			},
		)
		.await
		.expect("Presign failed.");

	assert!(presigned.object_key.starts_with("clinical-images/user_a/"));
	assert!(presigned.upload_url.contains("X-Amz-Signature="));
	assert_eq!(presigned.method, "PUT");
	assert_eq!(presigned.headers.get("content-type").map(String::as_str), Some("image/jpeg"));

	let first = service
		.confirm_image_upload(&phone, presigned.upload_id)
		.await
		.expect("Confirm failed.");
	let second = service
		.confirm_image_upload(&phone, presigned.upload_id)
		.await
		.expect("Second confirm failed.");

	assert_eq!(first.confirmed_at, second.confirmed_at);

	let events = publisher.events();

	assert_eq!(events.len(), 1);
	assert_eq!(events[0].event, "image.uploaded");

	let listed = service
		.list_images("user_a", ListImagesRequest::default())
		.await
		.expect("List failed.");

	assert_eq!(listed.items.len(), 1);
	assert_eq!(listed.items[0].upload_id, presigned.upload_id);

	let foreign = service
		.confirm_image_upload(&Caller::Owner { user_id: "user_b".to_string() }, presigned.upload_id)
		.await;

	assert!(matches!(foreign, Err(Error::NotFound { .. })));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set CLINICPRO_PG_DSN to run."]
async fn concurrent_confirms_publish_once() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping concurrent_confirms_publish_once; set CLINICPRO_PG_DSN to run this test."
		);

		return;
	};
	let publisher = Arc::new(SpyPublisher::default());
	let service =
		super::build_service(super::test_config(test_db.dsn().to_string()), publisher.clone())
			.await
			.expect("Failed to build service.");
	let owner = Caller::Owner { user_id: "user_a".to_string() };
	let presigned = service
		.presign_image_upload(
			&owner,
			PresignImageRequest {
				content_type: "image/png".to_string(),
				size_bytes: 512,
				session_id: None,
			},
		)
		.await
		.expect("Presign failed.");
	let (left, right) = tokio::join!(
		service.confirm_image_upload(&owner, presigned.upload_id),
		service.confirm_image_upload(&owner, presigned.upload_id),
	);
	let left = left.expect("Confirm failed.");
	let right = right.expect("Confirm failed.");

	assert_eq!(left.confirmed_at, right.confirmed_at);
	assert_eq!(publisher.events().len(), 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set CLINICPRO_PG_DSN to run."]
async fn guest_uploads_use_the_guest_prefix_and_reject_bad_input() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping guest_uploads_use_the_guest_prefix_and_reject_bad_input; set CLINICPRO_PG_DSN to run this test."
		);

		return;
	};
	let service = super::build_service(
		super::test_config(test_db.dsn().to_string()),
		Arc::new(SpyPublisher::default()),
	)
	.await
	.expect("Failed to build service.");
	let guest = service
		.issue_mobile_token(None, IssueTokenRequest::default())
		.await
		.expect("Failed to issue guest token.");
	let caller = Caller::Mobile { token: guest.token.clone() };
	let presigned = service
		.presign_image_upload(
			&caller,
			PresignImageRequest {
				content_type: "image/png".to_string(),
				size_bytes: 10,
				session_id: None,
			},
		)
		.await
		.expect("Guest presign failed.");
	let expected_prefix =
		format!("clinical-images/guest/{}/", cp_domain::token::guest_key(&guest.token));

	assert!(presigned.object_key.starts_with(&expected_prefix));

	let too_large = service
		.presign_image_upload(
			&caller,
			PresignImageRequest {
				content_type: "image/png".to_string(),
				size_bytes: 1_048_577,
				session_id: None,
			},
		)
		.await;

	assert!(matches!(too_large, Err(Error::InvalidField { field, .. }) if field == "$.size_bytes"));

	let wrong_type = service
		.presign_image_upload(
			&caller,
			PresignImageRequest {
				content_type: "application/pdf".to_string(),
				size_bytes: 10,
				session_id: None,
			},
		)
		.await;

	assert!(
		matches!(wrong_type, Err(Error::InvalidField { field, .. }) if field == "$.content_type")
	);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
