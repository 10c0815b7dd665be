use anyhow::Result;
use clap::Parser;
use ledgerd::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    ledgerd::telemetry::init(cli.verbose);
    cli.run().await
}
