//! Signal model
//!
//! Value types for the signals served by the remote service

mod instrument;
mod types;

pub use instrument::{InstrumentKey, InstrumentKeyError};
pub use types::{Greeks, MarketLevels, OptionType, Side, Signal, SignalDetail};
