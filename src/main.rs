use clap::Parser;
use signal_dash::cli::{Cli, Commands};
use signal_dash::config::Config;
use signal_dash::fetch::HttpFetcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        Config::default()
    });

    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
    }

    // Initialize telemetry
    signal_dash::telemetry::init_telemetry(&config.telemetry)?;

    for warning in config.warnings() {
        tracing::warn!("{}", warning);
    }

    match cli.command {
        Commands::Watch(args) => {
            tracing::info!(base_url = %config.api.base_url, "Starting dashboard");
            args.execute(&config).await?;
        }
        Commands::Fetch(args) => {
            args.execute(&config).await?;
        }
        Commands::Symbols => {
            let fetcher = HttpFetcher::with_config(config.api.fetcher_config())?;
            for instrument in fetcher.list_instruments().await? {
                println!("{}", instrument);
            }
        }
        Commands::Health => {
            let fetcher = HttpFetcher::with_config(config.api.fetcher_config())?;
            let health = fetcher.health().await?;
            println!(
                "{}: {}",
                health.service.as_deref().unwrap_or("signal service"),
                health.status
            );
        }
        Commands::Config => {
            println!("Current configuration:");
            println!(
                "  API: {} (timeout {}ms)",
                config.api.base_url, config.api.timeout_ms
            );
            println!(
                "  Poller: {} every {}ms, pulse {}ms",
                config.poller.instrument, config.poller.interval_ms, config.poller.pulse_ms
            );
            let instruments: Vec<String> = config
                .poller
                .instruments
                .iter()
                .map(ToString::to_string)
                .collect();
            println!("  Instruments: {}", instruments.join(", "));
            println!(
                "  Telemetry: level={}, format={:?}, metrics_port={:?}",
                config.telemetry.log_level, config.telemetry.log_format, config.telemetry.metrics_port
            );
        }
    }

    Ok(())
}
