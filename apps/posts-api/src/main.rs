use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = posts_api::Args::parse();

	posts_api::run(args).await
}
