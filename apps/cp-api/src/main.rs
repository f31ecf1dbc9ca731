use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = cp_api::Args::parse();

	cp_api::run(args).await
}
