use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Observed TLS leaf certificate for a domain
///
/// Two certificates are considered "the same certificate" iff their
/// fingerprints are equal; the other fields are carried for alert rendering
/// only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateInfo {
    /// Issuer common name (falls back to organization, then the full DN)
    pub issuer: String,

    /// Subject common name (same fallback as issuer)
    pub subject: String,

    /// Start of validity window
    pub valid_from: DateTime<Utc>,

    /// End of validity window
    pub valid_to: DateTime<Utc>,

    /// SHA-256 over the DER encoding, colon-separated uppercase hex; the
    /// certificate's stable identity
    pub fingerprint: String,
}

impl CertificateInfo {
    /// Fingerprint equality; the only notion of certificate identity vigil
    /// uses
    #[must_use]
    pub fn same_certificate(&self, other: &Self) -> bool {
        self.fingerprint == other.fingerprint
    }
}
