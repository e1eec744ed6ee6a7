mod cert;
mod config;
mod dns;
mod event;
mod state;

pub use cert::*;
pub use config::*;
pub use dns::*;
pub use event::*;
pub use state::*;
