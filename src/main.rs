use anyhow::Context;
use clap::Parser;
use stock_sentinel::cli::{print_config, Cli, Commands};
use stock_sentinel::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Configuration problems are fatal
    let config = Config::load(&cli.config)
        .with_context(|| format!("could not load config from {}", cli.config))?;

    stock_sentinel::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting price monitor");
            args.execute(&config).await?;
        }
        Commands::Replay(args) => {
            tracing::info!("Starting replay");
            args.execute(&config).await?;
        }
        Commands::Config => print_config(&config),
    }

    Ok(())
}
