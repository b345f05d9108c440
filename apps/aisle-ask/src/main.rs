use clap::Parser;

use aisle_ask::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	aisle_ask::run(args).await
}
