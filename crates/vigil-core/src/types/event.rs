use chrono::{DateTime, Utc};
use std::net::Ipv4Addr;

use super::{CertificateInfo, SoaRecord};

/// Outcome of the TLS certificate probe, fed into the change detector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertObservation {
    /// No probe was performed (no current addresses, or authority lost)
    NotProbed,

    /// Probe transport failed or the peer presented no usable certificate;
    /// treated as critical for the tick
    Failed(String),

    /// Leaf certificate retrieved from the first current address
    Observed(CertificateInfo),
}

/// A detected deviation between a domain's baseline and its observed posture
///
/// Closed tagged-variant type so detection stays decoupled from message
/// formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// No authoritative nameserver reachable; fired once per outage on the
    /// transition into the unreachable state
    AuthorityLost,

    /// The A-record set changed (set inequality, including to/from empty)
    IpChanged {
        /// Baseline addresses before this tick
        previous: Vec<Ipv4Addr>,
        /// Observed addresses, sorted and deduplicated
        current: Vec<Ipv4Addr>,
        /// Zone serial observed alongside the change
        serial: Option<String>,
        /// Raw DoH status code, for the technical-details block
        dns_status: u16,
    },

    /// The served certificate's fingerprint diverged from the baseline
    CertificateChanged {
        /// Baseline certificate being replaced
        previous: Option<CertificateInfo>,
        /// Newly observed certificate, now the baseline
        current: CertificateInfo,
    },

    /// Zone serial changed without any IP change
    SoaUpdated {
        /// Serial stored before this tick
        previous_serial: Option<String>,
        /// Observed SOA record
        soa: SoaRecord,
        /// Raw DoH status code
        dns_status: u16,
    },

    /// IP change and certificate change landed within the configured
    /// correlation window; additive to the individual events
    CriticalConcurrentChange {
        /// Baseline addresses before the IP change
        previous_ips: Vec<Ipv4Addr>,
        /// Addresses after the IP change
        current_ips: Vec<Ipv4Addr>,
        /// Certificate replaced by the correlated change, when it happened
        /// this tick
        previous_cert: Option<CertificateInfo>,
        /// Certificate considered current after the tick
        current_cert: Option<CertificateInfo>,
        /// Configured window in minutes
        window_minutes: u32,
        /// Stored timestamp of the correlated IP change
        last_ip_change: DateTime<Utc>,
        /// Stored timestamp of the correlated certificate change
        last_cert_change: DateTime<Utc>,
    },

    /// The TLS probe itself failed; the tick aborts and state is left
    /// untouched so the comparison retries against the same baseline
    CertificateValidationError {
        /// Probe failure reason
        reason: String,
    },
}

impl ChangeEvent {
    /// Short stable name for logging
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::AuthorityLost => "authority_lost",
            Self::IpChanged { .. } => "ip_changed",
            Self::CertificateChanged { .. } => "certificate_changed",
            Self::SoaUpdated { .. } => "soa_updated",
            Self::CriticalConcurrentChange { .. } => "critical_concurrent_change",
            Self::CertificateValidationError { .. } => "certificate_validation_error",
        }
    }

    /// True for the compound and probe-failure events that warrant paging
    #[must_use]
    pub const fn is_critical(&self) -> bool {
        matches!(
            self,
            Self::CriticalConcurrentChange { .. } | Self::CertificateValidationError { .. }
        )
    }
}
