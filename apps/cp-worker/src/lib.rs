pub mod worker;

mod error;

pub use error::{Error, Result};

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cp_service::ClinicService;
use cp_storage::db::Db;

#[derive(Debug, Parser)]
#[command(
	version = cp_cli::VERSION,
	rename_all = "kebab",
	styles = cp_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Run a single cleanup pass and exit.
	#[arg(long)]
	pub once: bool,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = cp_config::load(&args.config)?;
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();

	let db = Db::connect(&config.storage.postgres).await?;

	db.ensure_schema().await?;

	let interval = worker::cleanup_interval(&config.lifecycle)?;
	let service = ClinicService::new(config, db);

	if args.once {
		worker::run_once(&service).await?;

		return Ok(());
	}

	worker::run_worker(&service, interval).await;

	Ok(())
}
