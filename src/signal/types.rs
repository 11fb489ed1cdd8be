//! Signal types

use super::InstrumentKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trading side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum Side {
    Buy,
    Sell,
}

impl FromStr for Side {
    type Err = String;

    /// Accepts the decorated labels the service emits, e.g. "STRONG BUY PE"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        if upper.contains("SELL") {
            Ok(Side::Sell)
        } else if upper.contains("BUY") {
            Ok(Side::Buy)
        } else {
            Err(format!("unrecognized side: {}", s))
        }
    }
}

impl TryFrom<String> for Side {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Option type of the recommended contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionType {
    /// Call
    #[serde(rename = "CE")]
    Call,
    /// Put
    #[serde(rename = "PE")]
    Put,
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "CE"),
            OptionType::Put => write!(f, "PE"),
        }
    }
}

/// Option sensitivities
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
}

/// Reference price levels and per-leg open interest of the multi-instrument card
///
/// The single-instrument endpoint does not send these; a signal carries them
/// only when all four are present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketLevels {
    /// Primary reference strike
    #[serde(rename = "strike1")]
    pub primary_strike: f64,
    /// Secondary reference strike
    #[serde(rename = "strike2")]
    pub secondary_strike: f64,
    /// Open interest on the call leg
    #[serde(rename = "iv_call_oi")]
    pub call_oi: u64,
    /// Open interest on the put leg
    #[serde(rename = "iv_put_oi")]
    pub put_oi: u64,
}

/// Extended fields only present for the single-instrument detail view
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_type: Option<OptionType>,
    /// Strike of the recommended contract
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strike: Option<f64>,
    /// Last traded price of the option
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ltp_option: Option<f64>,
    /// Last traded price of the index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ltp: Option<f64>,
    /// Implied volatility
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iv: Option<f64>,
    /// Open interest of the recommended contract
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oi: Option<u64>,
    /// Where the server took its market data from, e.g. "ZERODHA_LIVE"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<String>,
}

/// A point-in-time trading recommendation computed by the signal service
///
/// Never mutated after construction; every poll produces a fresh value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    #[serde(rename = "symbol")]
    pub instrument: InstrumentKey,
    pub side: Side,
    /// Confidence score in [0, 1]
    pub confidence: f64,
    /// Server-formatted timestamp, displayed as sent
    pub timestamp: String,
    #[serde(flatten)]
    pub greeks: Greeks,
    #[serde(flatten)]
    pub levels: Option<MarketLevels>,
    #[serde(flatten)]
    pub detail: SignalDetail,
}

impl Signal {
    /// Check value ranges serde cannot express
    pub fn validate(&self) -> Result<(), String> {
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!("confidence out of range: {}", self.confidence));
        }
        Ok(())
    }

    /// Strike of the recommended contract, if the detail view fields are present
    pub fn strike(&self) -> Option<f64> {
        self.detail.strike
    }
}
