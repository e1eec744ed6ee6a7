//! DNS-over-HTTPS snapshot reader.

use reqwest::header::ACCEPT;
use reqwest::Client as HttpClient;
use std::time::Duration;
use tracing::debug;
use vigil_core::{DnsSnapshot, DohResponse, Result, VigilError};

/// Default DoH endpoint (Cloudflare public resolver)
const DEFAULT_BASE_URL: &str = "https://1.1.1.1";

/// Default DNS query timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// DNS-over-HTTPS client returning normalized snapshots
#[derive(Clone)]
pub struct DohClient {
    http: HttpClient,
    base_url: String,
}

impl DohClient {
    /// Create a client against the default public resolver
    #[must_use]
    pub fn new() -> Self {
        DohClientBuilder::new().build()
    }

    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder() -> DohClientBuilder {
        DohClientBuilder::new()
    }

    /// Observe a domain's current A and SOA posture.
    ///
    /// The SOA query is skipped when the A query already reports no
    /// reachable authority; there is no zone metadata worth asking for.
    pub async fn snapshot(&self, domain: &str) -> Result<DnsSnapshot> {
        let a = self.query(domain, "A").await?;
        if a.status == vigil_core::STATUS_NO_AUTHORITY {
            return Ok(DnsSnapshot::from_responses(&a, None));
        }
        let soa = self.query(domain, "SOA").await?;
        Ok(DnsSnapshot::from_responses(&a, Some(&soa)))
    }

    /// Perform one dns-json query
    async fn query(&self, domain: &str, record_type: &str) -> Result<DohResponse> {
        let url = format!("{}/dns-query", self.base_url);
        debug!(domain, record_type, url = %url, "DoH query");

        let response = self
            .http
            .get(&url)
            .query(&[("name", domain), ("type", record_type)])
            .header(ACCEPT, "application/dns-json")
            .send()
            .await
            .map_err(|e| VigilError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VigilError::Transport(format!(
                "DoH endpoint returned HTTP {status} for {domain}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| VigilError::Transport(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| VigilError::MalformedUpstream(e.to_string()))
    }
}

impl Default for DohClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for configuring a [`DohClient`]
pub struct DohClientBuilder {
    base_url: String,
    timeout: Duration,
}

impl DohClientBuilder {
    /// Create a builder with the default resolver and timeout
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the base URL (useful for testing)
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the per-query timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the client
    #[must_use]
    pub fn build(self) -> DohClient {
        let http = HttpClient::builder()
            .timeout(self.timeout)
            .user_agent(concat!("vigil/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("reqwest client with static settings");

        DohClient {
            http,
            base_url: self.base_url,
        }
    }
}

impl Default for DohClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
