//! vigil - DNS/TLS posture monitor
//!
//! Watches configured domains for DNS hijacking, unexpected IP changes,
//! certificate substitution and zone updates.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    vigil_cli::run().await
}
