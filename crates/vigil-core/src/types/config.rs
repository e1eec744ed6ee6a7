use serde::{Deserialize, Serialize};

/// Per-domain monitoring configuration; immutable for the process lifetime
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Domain name to monitor
    pub name: String,

    /// Suppress alerts for SOA-only zone updates. Unset means suppressed:
    /// silent serial bumps are the default, alerting must be opted into.
    #[serde(default)]
    pub suppress_non_ip_soa_alerts: Option<bool>,

    /// Suppress certificate-change alerts (baseline still updates)
    #[serde(default)]
    pub suppress_cert_alerts: bool,

    /// Suppress IP-change alerts (state still updates)
    #[serde(default)]
    pub suppress_ip_change_alerts: bool,

    /// Window in minutes within which an IP change and a certificate change
    /// are escalated to one compound critical event; unset disables the
    /// correlation
    #[serde(default)]
    pub critical_change_window_minutes: Option<u32>,
}

impl DomainConfig {
    /// Config for a domain with all alerts enabled and no critical window
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            suppress_non_ip_soa_alerts: None,
            suppress_cert_alerts: false,
            suppress_ip_change_alerts: false,
            critical_change_window_minutes: None,
        }
    }

    /// SOA-only alerts are suppressed unless explicitly set to `false`
    #[must_use]
    pub fn soa_alerts_suppressed(&self) -> bool {
        self.suppress_non_ip_soa_alerts.unwrap_or(true)
    }
}
