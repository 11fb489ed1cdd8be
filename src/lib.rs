//! signal-dash: live dashboard client for options trading signals
//!
//! This library provides the core components for:
//! - Fetching the latest signal per instrument from the signal service
//! - Polling on a fixed interval with stale-result protection
//! - Reconciling fetch results into dashboard state
//! - Projecting that state into a read-only view model for renderers
//! - Configuration, logging and metrics

pub mod cli;
pub mod config;
pub mod fetch;
pub mod poller;
pub mod signal;
pub mod telemetry;
pub mod view;
