mod auth;
mod azure;
mod cli;
mod config;
mod error;
mod git;
mod notes;
mod output;
mod stages;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose() { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    output::print_banner();

    info!("Starting azrelease - Azure DevOps release automation");
    cli.execute().await?;

    Ok(())
}
