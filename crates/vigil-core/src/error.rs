use thiserror::Error;

/// Result type alias for vigil operations
pub type Result<T> = std::result::Result<T, VigilError>;

/// Errors that can occur while monitoring a domain
#[derive(Error, Debug)]
pub enum VigilError {
    /// DNS query or alert POST failed in transit; retried naturally on the
    /// next scheduled tick, no state is mutated
    #[error("transport error: {0}")]
    Transport(String),

    /// TLS probe failed (timeout, connect error, or no usable peer
    /// certificate); the domain's tick is aborted without persisting
    #[error("certificate probe failed: {0}")]
    CertProbe(String),

    /// Alert channel returned a non-2xx response
    #[error("alert delivery failed ({status}): {body}")]
    Alert {
        /// HTTP status code from the messaging API
        status: u16,
        /// Response body, if any
        body: String,
    },

    /// Missing credentials or domain list; fatal for the whole run
    #[error("configuration error: {0}")]
    Config(String),

    /// Upstream DNS JSON had an unexpected shape
    #[error("malformed upstream data: {0}")]
    MalformedUpstream(String),

    /// State store read/write failed
    #[error("state store error: {0}")]
    Store(String),

    /// JSON parsing/serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl VigilError {
    /// Returns true if the next scheduled tick is expected to recover
    /// without intervention
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Alert { .. } | Self::Store(_) | Self::CertProbe(_)
        )
    }

    /// Returns true if the error should abort the whole run rather than a
    /// single domain's tick
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
