//! TLS certificate prober.
//!
//! Performs a raw TLS handshake against a candidate address with SNI set to
//! the monitored domain and extracts the peer's leaf certificate. The
//! handshake deliberately skips chain verification: the point is to observe
//! what certificate is being served, including a hostile one a verifying
//! client would reject.

use chrono::{DateTime, TimeZone, Utc};
use rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tracing::debug;
use vigil_core::{CertObservation, CertificateInfo, Result, VigilError};
use x509_parser::prelude::{FromDer, X509Certificate};

/// TLS port probed for the served certificate
const TLS_PORT: u16 = 443;

/// Deadline covering TCP connect plus TLS handshake
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Certificate verifier that accepts any chain.
///
/// Verification is intentionally skipped so a substituted certificate is
/// observed rather than rejected at the transport layer.
#[derive(Debug)]
struct AcceptAnyCert(Arc<rustls::crypto::CryptoProvider>);

impl AcceptAnyCert {
    fn new() -> Arc<Self> {
        Arc::new(Self(Arc::new(rustls::crypto::ring::default_provider())))
    }
}

impl ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

/// Probes a single address for the TLS certificate served under a domain's
/// SNI
#[derive(Clone)]
pub struct CertProber {
    connector: TlsConnector,
    timeout: Duration,
}

impl CertProber {
    /// Create a prober with the default 5-second deadline
    #[must_use]
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a prober with a custom deadline
    #[must_use]
    pub fn with_timeout(deadline: Duration) -> Self {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .expect("ring provider supports the default protocol versions")
            .dangerous()
            .with_custom_certificate_verifier(AcceptAnyCert::new())
            .with_no_client_auth();

        Self {
            connector: TlsConnector::from(Arc::new(config)),
            timeout: deadline,
        }
    }

    /// Probe `ip:443` with SNI `domain`.
    ///
    /// Timeouts, connection errors, handshake failures and a missing or
    /// unparsable peer certificate all collapse into
    /// [`CertObservation::Failed`]; they are not distinguished further.
    pub async fn probe(&self, domain: &str, ip: Ipv4Addr) -> CertObservation {
        match self.handshake(domain, ip).await {
            Ok(info) => {
                debug!(domain, %ip, fingerprint = %info.fingerprint, "certificate observed");
                CertObservation::Observed(info)
            }
            Err(e) => CertObservation::Failed(e.to_string()),
        }
    }

    async fn handshake(&self, domain: &str, ip: Ipv4Addr) -> Result<CertificateInfo> {
        let addr = SocketAddr::new(IpAddr::V4(ip), TLS_PORT);
        let server_name = ServerName::try_from(domain.to_string())
            .map_err(|e| VigilError::CertProbe(format!("invalid SNI name {domain}: {e}")))?;

        let stream = timeout(self.timeout, async {
            let tcp = TcpStream::connect(addr)
                .await
                .map_err(|e| VigilError::CertProbe(format!("connect {addr}: {e}")))?;
            self.connector
                .connect(server_name, tcp)
                .await
                .map_err(|e| VigilError::CertProbe(format!("handshake with {addr}: {e}")))
        })
        .await
        .map_err(|_| VigilError::CertProbe("TLS connection timed out".into()))??;

        let (_, conn) = stream.get_ref();
        let der = conn
            .peer_certificates()
            .and_then(|certs| certs.first())
            .ok_or_else(|| VigilError::CertProbe("no peer certificate presented".into()))?;

        parse_leaf(der.as_ref())
    }
}

impl Default for CertProber {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the fields vigil cares about from a DER-encoded leaf certificate
fn parse_leaf(der: &[u8]) -> Result<CertificateInfo> {
    let (_, x509) = X509Certificate::from_der(der)
        .map_err(|e| VigilError::CertProbe(format!("certificate parse: {e}")))?;

    Ok(CertificateInfo {
        issuer: name_of(x509.issuer()),
        subject: name_of(x509.subject()),
        valid_from: asn1_to_utc(x509.validity().not_before),
        valid_to: asn1_to_utc(x509.validity().not_after),
        fingerprint: fingerprint_sha256(der),
    })
}

/// Common name, falling back to organization, falling back to the full DN
fn name_of(name: &x509_parser::x509::X509Name<'_>) -> String {
    name.iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .or_else(|| {
            name.iter_organization()
                .next()
                .and_then(|o| o.as_str().ok())
        })
        .map_or_else(|| name.to_string(), String::from)
}

/// SHA-256 over the DER encoding, rendered as colon-separated uppercase hex
fn fingerprint_sha256(der: &[u8]) -> String {
    let digest = ring::digest::digest(&ring::digest::SHA256, der);
    let mut out = String::with_capacity(digest.as_ref().len() * 3);
    for byte in digest.as_ref() {
        if !out.is_empty() {
            out.push(':');
        }
        out.push_str(&hex::encode_upper([*byte]));
    }
    out
}

/// Convert an ASN.1 `GeneralizedTime` / `UTCTime` to `DateTime<Utc>`
fn asn1_to_utc(t: x509_parser::time::ASN1Time) -> DateTime<Utc> {
    Utc.timestamp_opt(t.timestamp(), 0)
        .single()
        .unwrap_or_else(Utc::now)
}
