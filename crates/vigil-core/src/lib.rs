//! Core types and change-detection engine for the vigil DNS/TLS monitor.
//!
//! This crate is the I/O-free heart of vigil:
//!
//! - **Types**: the persisted [`DomainState`], the observed [`DnsSnapshot`]
//!   and [`CertificateInfo`], per-domain [`DomainConfig`], and the closed
//!   [`ChangeEvent`] enum.
//! - **Detector**: [`detect`] compares a previous state against a fresh
//!   observation and decides what changed, how to classify it, and what the
//!   next persisted state must become.
//! - **Formatting**: [`format::render_event`] maps each event to its alert
//!   message, keeping detection decoupled from delivery.
//!
//! Everything here is a pure function of its inputs and fully testable
//! without network or storage.

mod detector;
mod error;
pub mod format;
pub mod types;

pub use detector::{detect, Detection};
pub use error::{Result, VigilError};
pub use types::*;
