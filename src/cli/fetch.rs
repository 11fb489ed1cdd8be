//! Fetch command implementation

use super::render::format_signal;
use crate::config::Config;
use crate::fetch::{HttpFetcher, SignalFetcher};
use crate::signal::{InstrumentKey, Signal};
use clap::Args;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Instruments to fetch (defaults to poller.instrument)
    pub instruments: Vec<InstrumentKey>,

    /// Print signals as JSON
    #[arg(long)]
    pub json: bool,
}

/// Answer for one requested instrument
#[derive(Debug, Serialize, PartialEq)]
struct Fetched {
    instrument: InstrumentKey,
    signal: Option<Signal>,
}

impl FetchArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let fetcher = HttpFetcher::with_config(config.api.fetcher_config())?;

        let requested = match self.instruments.as_slice() {
            [] => vec![config.poller.instrument.clone()],
            keys => keys.to_vec(),
        };

        let results = match requested.as_slice() {
            [single] => vec![Fetched {
                instrument: single.clone(),
                signal: fetcher.fetch(single).await?,
            }],
            many => pair_with_requests(many, fetcher.fetch_batch(many).await?),
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&results)?);
            return Ok(());
        }

        for fetched in &results {
            match fetched.signal {
                Some(ref signal) => println!("{}", format_signal(signal)),
                None => println!("{}: no signal, criteria not met", fetched.instrument),
            }
        }

        Ok(())
    }
}

/// Line up batch signals with the instruments asked for, in request order
fn pair_with_requests(requested: &[InstrumentKey], signals: Vec<Signal>) -> Vec<Fetched> {
    let mut results: Vec<Fetched> = requested
        .iter()
        .map(|instrument| Fetched {
            instrument: instrument.clone(),
            signal: None,
        })
        .collect();

    for signal in signals {
        match results.iter_mut().find(|r| r.instrument == signal.instrument) {
            Some(slot) if slot.signal.is_none() => slot.signal = Some(signal),
            Some(_) => {
                tracing::debug!(instrument = %signal.instrument, "Ignoring extra batch signal")
            }
            None => {
                tracing::warn!(instrument = %signal.instrument, "Ignoring unrequested batch signal")
            }
        }
    }

    results
}
