//! CLI interface for signal-dash
//!
//! Provides subcommands for:
//! - `watch`: Poll one instrument and render its signal live
//! - `fetch`: One-shot fetch for one or more instruments
//! - `symbols`: List instruments the service supports
//! - `health`: Check the signal service
//! - `config`: Show the effective configuration

mod fetch;
mod render;
mod watch;

pub use fetch::FetchArgs;
pub use render::TerminalRenderer;
pub use watch::WatchArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "signal-dash")]
#[command(about = "Live dashboard for options trading signals")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// Signal service base URL (overrides api.base_url)
    #[arg(long, global = true, env = "SIGNAL_DASH_BASE_URL")]
    pub base_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll an instrument and render its signal live
    Watch(WatchArgs),
    /// Fetch the current signal once
    Fetch(FetchArgs),
    /// List instruments the service supports
    Symbols,
    /// Check the signal service health
    Health,
    /// Show the effective configuration
    Config,
}
