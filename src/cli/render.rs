//! Plain-text renderer for the terminal

use crate::signal::Signal;
use crate::view::ViewModel;
use std::io::Write;

/// Prints a line per visible change of the view model
pub struct TerminalRenderer {
    json: bool,
    last_line: Option<String>,
}

impl TerminalRenderer {
    pub fn new(json: bool) -> Self {
        Self {
            json,
            last_line: None,
        }
    }

    /// Render the view, skipping output identical to the previous line
    pub fn render(&mut self, view: &ViewModel) -> anyhow::Result<()> {
        let line = if self.json {
            serde_json::to_string(view)?
        } else {
            format_view(view)
        };

        if self.last_line.as_deref() == Some(line.as_str()) {
            return Ok(());
        }

        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", line)?;
        stdout.flush()?;
        self.last_line = Some(line);

        Ok(())
    }
}

/// One-line summary of a signal
pub fn format_signal(signal: &Signal) -> String {
    let mut line = format!(
        "{} {} {:.0}% @ {} | δ {:.3} γ {:.3} θ {:.3} ν {:.3}",
        signal.instrument,
        signal.side,
        signal.confidence * 100.0,
        signal.timestamp,
        signal.greeks.delta,
        signal.greeks.gamma,
        signal.greeks.theta,
        signal.greeks.vega,
    );

    let detail = &signal.detail;
    if let Some(strike) = signal.strike() {
        match detail.option_type {
            Some(option_type) => line.push_str(&format!(" | {} {}", strike, option_type)),
            None => line.push_str(&format!(" | strike {}", strike)),
        }
    }
    if let Some(ltp_option) = detail.ltp_option {
        line.push_str(&format!(" | premium {:.2}", ltp_option));
    }
    if let Some(ltp) = detail.ltp {
        line.push_str(&format!(" | spot {:.2}", ltp));
    }
    if let Some(iv) = detail.iv {
        line.push_str(&format!(" | IV {:.1}%", iv * 100.0));
    }
    if let Some(oi) = detail.oi {
        line.push_str(&format!(" | OI {}K", oi / 1000));
    }
    if let Some(levels) = signal.levels {
        line.push_str(&format!(
            " | strikes {}/{} | OI call {}K put {}K",
            levels.primary_strike,
            levels.secondary_strike,
            levels.call_oi / 1000,
            levels.put_oi / 1000,
        ));
    }
    if let Some(ref source) = detail.data_source {
        line.push_str(&format!(" | {}", source));
    }

    line
}

fn format_view(view: &ViewModel) -> String {
    let mut line = format!("[{}] {}", view.instrument, view.connected_label);

    if view.is_loading_first_time {
        line.push_str(" | scanning for signals...");
        return line;
    }

    match view.display_signal {
        Some(ref signal) => {
            line.push_str(" | ");
            line.push_str(&format_signal(signal));
        }
        None => line.push_str(" | no signal"),
    }

    if let Some(delta) = view.strike_delta {
        line.push_str(&format!(" | strike moved {:+}", delta));
    }
    if view.pulse_active {
        line.push_str(" *");
    }
    if let Some(updated) = view.last_update {
        line.push_str(&format!(" | updated {}", updated.format("%H:%M:%S")));
    }

    line
}
