//! Watch command implementation

use super::TerminalRenderer;
use crate::config::Config;
use crate::fetch::HttpFetcher;
use crate::poller::Poller;
use crate::signal::InstrumentKey;
use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Instrument to watch (defaults to poller.instrument)
    #[arg(short, long)]
    pub instrument: Option<InstrumentKey>,

    /// Poll interval in milliseconds (overrides poller.interval_ms)
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Emit view models as JSON lines
    #[arg(long)]
    pub json: bool,
}

impl WatchArgs {
    /// Poll until Ctrl-C or `quit` on stdin
    ///
    /// Any other line typed on stdin is taken as an instrument to switch to.
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let fetcher = Arc::new(HttpFetcher::with_config(config.api.fetcher_config())?);
        let poller = Poller::new(fetcher, config.poller_settings());

        let instrument = self
            .instrument
            .clone()
            .unwrap_or_else(|| config.poller.instrument.clone());
        let interval = Duration::from_millis(self.interval_ms.unwrap_or(config.poller.interval_ms));

        let mut revisions = poller.subscribe();
        poller.start(instrument, interval).await?;

        let mut renderer = TerminalRenderer::new(self.json);
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdin_open = true;

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                changed = revisions.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    if let Some(view) = poller.view().await {
                        renderer.render(&view)?;
                    }
                }

                line = lines.next_line(), if stdin_open => {
                    match line? {
                        Some(line) => {
                            let command = line.trim();
                            if command.is_empty() {
                                continue;
                            }
                            if command.eq_ignore_ascii_case("q") || command.eq_ignore_ascii_case("quit") {
                                break;
                            }
                            match InstrumentKey::new(command) {
                                Ok(key) => {
                                    if !config.poller.instruments.contains(&key) {
                                        tracing::warn!(instrument = %key, "Instrument not in configured list");
                                    }
                                    poller.switch_instrument(key).await?;
                                }
                                Err(e) => tracing::warn!(error = %e, "Ignoring selector input"),
                            }
                        }
                        None => stdin_open = false,
                    }
                }

                _ = &mut ctrl_c => {
                    tracing::info!("Interrupted");
                    break;
                }
            }
        }

        poller.stop().await;
        Ok(())
    }
}
