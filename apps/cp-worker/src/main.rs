use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = cp_worker::Args::parse();

	cp_worker::run(args).await
}
