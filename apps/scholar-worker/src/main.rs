use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = scholar_worker::Args::parse();

	scholar_worker::run(args).await
}
