use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use chain_stats_bot::{config, init_tracing};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = cli::Cli::parse();

    init_tracing(args.json_logs);

    // Dispatch to appropriate command handler
    match args.get_command() {
        cli::Commands::Start => {
            let cfg = config::load_config(&args.config)?;
            commands::start::execute(cfg).await?;
        }
        cli::Commands::Once => {
            let cfg = config::load_config(&args.config)?;
            commands::once::execute(cfg).await?;
        }
        cli::Commands::Test => {
            commands::test::execute(&args.config)?;
        }
        cli::Commands::Version => {
            println!("Chain Stats Bot v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
