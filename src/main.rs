use clap::Parser;
use matchday_radar::cli::{render_config, Cli, Commands};
use matchday_radar::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Configuration problems abort before any request is made
    let config = Config::load(&cli.config)?;

    // Initialize telemetry
    matchday_radar::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!(config = %cli.config, "Starting run");
            args.execute(&config).await?;
        }
        Commands::Leagues(args) => {
            args.execute(&config).await?;
        }
        Commands::Config => {
            print!("{}", render_config(&config)?);
        }
    }

    Ok(())
}
