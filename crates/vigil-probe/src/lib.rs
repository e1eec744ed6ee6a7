//! External collaborators for the vigil monitor.
//!
//! Thin, narrowly-contracted wrappers around the outside world:
//!
//! - [`DohClient`]: DNS-over-HTTPS lookups normalized into a
//!   [`vigil_core::DnsSnapshot`]
//! - [`CertProber`]: raw TLS handshake returning the peer leaf certificate
//! - [`TelegramNotifier`]: alert delivery over the Telegram bot API
//! - [`StateStore`]: durable get/put of one [`vigil_core::DomainState`] per
//!   domain

mod doh;
mod store;
mod telegram;
mod tls;

pub use doh::{DohClient, DohClientBuilder};
pub use store::{state_key, FileStore, MemoryStore, StateStore};
pub use telegram::{TelegramNotifier, TelegramNotifierBuilder};
pub use tls::CertProber;
