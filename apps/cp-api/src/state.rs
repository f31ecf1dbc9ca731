use std::sync::Arc;

use cp_service::ClinicService;
use cp_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<ClinicService>,
}
impl AppState {
	pub async fn new(config: cp_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		Ok(Self::from_service(ClinicService::new(config, db)))
	}

	pub fn from_service(service: ClinicService) -> Self {
		Self { service: Arc::new(service) }
	}
}
