//! # vigil-cli
//!
//! The vigil daemon: loads a TOML config of monitored domains, runs the
//! check loop on a fixed interval, and wires the DoH reader, TLS prober,
//! state store and Telegram notifier into the change detector.

pub mod cli;
pub mod config;
pub mod monitor;

pub use cli::run;
