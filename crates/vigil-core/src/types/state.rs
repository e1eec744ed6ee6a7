use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

use super::{normalize_ips, CertificateInfo};

/// Lifecycle status of a monitored domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainStatus {
    /// State record exists but no real observation has been compared yet
    Uninitialized,

    /// No authoritative nameserver was reachable on the last observation
    #[serde(rename = "No Reachable Authority")]
    NoAuthority,

    /// Domain resolved; IPs and serial are trustworthy baselines
    Resolved,
}

/// Persisted per-domain state, keyed by domain name in the store
///
/// Mutated in place by the change detector whenever a change is detected;
/// never deleted by this subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainState {
    /// Lifecycle status
    pub status: DomainStatus,

    /// Baseline A-record addresses; always sorted and deduplicated
    pub ips: Vec<Ipv4Addr>,

    /// Last-seen SOA serial
    pub serial: Option<String>,

    /// When the IP set last changed; only set on a detected change
    pub last_ip_change: Option<DateTime<Utc>>,

    /// When the certificate last changed; only set on a detected change
    pub last_cert_change: Option<DateTime<Utc>>,

    /// Baseline certificate; `None` means no certificate has been observed
    /// yet, not a divergence
    pub baseline_cert: Option<CertificateInfo>,
}

impl DomainState {
    /// Fresh state seeded on the first ever observation of a domain
    #[must_use]
    pub const fn uninitialized() -> Self {
        Self {
            status: DomainStatus::Uninitialized,
            ips: Vec::new(),
            serial: None,
            last_ip_change: None,
            last_cert_change: None,
            baseline_cert: None,
        }
    }

    /// Replace the baseline IP set, enforcing the sorted/deduplicated
    /// invariant
    pub fn set_ips(&mut self, ips: Vec<Ipv4Addr>) {
        self.ips = normalize_ips(ips);
    }

    /// Transition into [`DomainStatus::NoAuthority`]: while authority is
    /// unreachable there is nothing reliable to compare against, so IPs and
    /// serial are cleared
    pub fn clear_authority(&mut self) {
        self.status = DomainStatus::NoAuthority;
        self.ips.clear();
        self.serial = None;
    }
}
