//! lereco binary entry point

use clap::Parser;
use lereco::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    Cli::parse().run().await
}
