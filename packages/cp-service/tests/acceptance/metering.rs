use std::sync::Arc;

use cp_domain::metering::Tier;
use cp_service::Error;

use super::SpyPublisher;

#[tokio::test]
#[ignore = "Requires external Postgres. Set CLINICPRO_PG_DSN to run."]
async fn basic_tier_stops_at_the_daily_limit() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping basic_tier_stops_at_the_daily_limit; set CLINICPRO_PG_DSN to run this test."
		);

		return;
	};
	let service = super::build_service(
		super::test_config(test_db.dsn().to_string()),
		Arc::new(SpyPublisher::default()),
	)
	.await
	.expect("Failed to build service.");

	for used in 1..=2 {
		let usage = service
			.record_image_tool_usage("user_basic", Tier::Basic)
			.await
			.expect("Usage within the limit must succeed.");

		assert_eq!(usage.used, used);
		assert_eq!(usage.limit, Some(2));
		assert_eq!(usage.remaining, Some(2 - used));
	}

	let err = service
		.record_image_tool_usage("user_basic", Tier::Basic)
		.await
		.expect_err("Third use must be refused.");

	assert!(matches!(err, Error::UsageLimitReached { used: 2, limit: 2 }));

	let view = service.image_tool_usage("user_basic", Tier::Basic).await.expect("View failed.");

	assert_eq!(view.used, 2);
	assert_eq!(view.remaining, Some(0));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set CLINICPRO_PG_DSN to run."]
async fn premium_tier_is_counted_but_unlimited() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping premium_tier_is_counted_but_unlimited; set CLINICPRO_PG_DSN to run this test."
		);

		return;
	};
	let service = super::build_service(
		super::test_config(test_db.dsn().to_string()),
		Arc::new(SpyPublisher::default()),
	)
	.await
	.expect("Failed to build service.");

	for _ in 0..5 {
		service
			.record_image_tool_usage("user_premium", Tier::Premium)
			.await
			.expect("Premium usage must not be limited.");
	}

	let view = service.image_tool_usage("user_premium", Tier::Premium).await.expect("View failed.");

	assert_eq!(view.used, 5);
	assert_eq!(view.limit, None);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
