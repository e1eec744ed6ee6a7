use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Record type code for A records in dns-json answers
pub const RECORD_TYPE_A: u16 = 1;

/// Record type code for SOA records in dns-json answers
pub const RECORD_TYPE_SOA: u16 = 6;

/// DoH status code for the SERVFAIL / no-reachable-authority family
pub const STATUS_NO_AUTHORITY: u16 = 3;

/// Raw response body of a DNS-over-HTTPS `application/dns-json` query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DohResponse {
    /// DNS response code (3 = SERVFAIL / no reachable authority)
    #[serde(rename = "Status")]
    pub status: u16,

    /// Answer records, absent when the query resolved to nothing
    #[serde(rename = "Answer", default)]
    pub answer: Vec<DohAnswer>,

    /// Provider commentary; shape varies between providers so it is kept
    /// opaque (may carry authority-unreachable hints)
    #[serde(rename = "Comment", default)]
    pub comment: Option<serde_json::Value>,
}

/// Individual answer record in a dns-json response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DohAnswer {
    /// Owner name
    #[serde(default)]
    pub name: String,

    /// Numeric record type (1 = A, 6 = SOA)
    #[serde(rename = "type", default)]
    pub record_type: u16,

    /// Time to live in seconds
    #[serde(rename = "TTL", default)]
    pub ttl: u32,

    /// Record data in presentation format
    #[serde(default)]
    pub data: String,
}

/// SOA record fields, parsed from the space-separated rdata string
///
/// Fields missing from a short or malformed record degrade to `"unknown"`
/// instead of failing the tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoaRecord {
    /// Primary nameserver (MNAME)
    pub primary_ns: String,
    /// Zone admin mailbox (RNAME)
    pub admin_email: String,
    /// Zone serial, increments on zone changes
    pub serial: String,
    /// Refresh interval
    pub refresh: String,
    /// Retry interval
    pub retry: String,
    /// Expire limit
    pub expire: String,
    /// Minimum / negative-caching TTL
    pub minimum_ttl: String,
}

impl SoaRecord {
    /// Parse SOA rdata of the form
    /// `"ns1.example.com. admin.example.com. 2024010101 7200 3600 1209600 300"`.
    #[must_use]
    pub fn parse(data: &str) -> Self {
        let mut fields = data.split_whitespace();
        let mut next = || {
            fields
                .next()
                .map_or_else(|| String::from("unknown"), String::from)
        };
        Self {
            primary_ns: next(),
            admin_email: next(),
            serial: next(),
            refresh: next(),
            retry: next(),
            expire: next(),
            minimum_ttl: next(),
        }
    }

    /// An all-unknown record, used when a serial changed but no SOA answer
    /// was returned to describe it.
    #[must_use]
    pub fn unknown() -> Self {
        Self::parse("")
    }
}

/// Normalized view of one domain's DNS posture at a single observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsSnapshot {
    /// Raw DoH status code of the A query
    pub status: u16,
    /// Current A-record addresses, sorted and deduplicated
    pub ips: Vec<Ipv4Addr>,
    /// SOA record, if the zone returned one
    pub soa: Option<SoaRecord>,
}

impl DnsSnapshot {
    /// Build a snapshot from the raw A response plus an optional separate
    /// SOA response.
    ///
    /// A answers that fail to parse as IPv4 addresses are skipped; the SOA
    /// record is taken from the dedicated SOA response first, falling back
    /// to an SOA answer piggybacked on the A response.
    #[must_use]
    pub fn from_responses(a: &DohResponse, soa: Option<&DohResponse>) -> Self {
        let ips = normalize_ips(
            a.answer
                .iter()
                .filter(|r| r.record_type == RECORD_TYPE_A)
                .filter_map(|r| r.data.parse().ok())
                .collect(),
        );

        let soa_answer = soa
            .map(|r| r.answer.as_slice())
            .unwrap_or_default()
            .iter()
            .chain(&a.answer)
            .find(|r| r.record_type == RECORD_TYPE_SOA)
            .map(|r| SoaRecord::parse(&r.data));

        Self {
            status: a.status,
            ips,
            soa: soa_answer,
        }
    }

    /// True when no authoritative nameserver could be reached; distinct from
    /// resolving with zero records
    #[must_use]
    pub const fn no_authority(&self) -> bool {
        self.status == STATUS_NO_AUTHORITY
    }

    /// The observed zone serial, if an SOA record was present
    #[must_use]
    pub fn serial(&self) -> Option<&str> {
        self.soa.as_ref().map(|s| s.serial.as_str())
    }
}

/// Sort and deduplicate an address list so comparisons are set equality
#[must_use]
pub fn normalize_ips(mut ips: Vec<Ipv4Addr>) -> Vec<Ipv4Addr> {
    ips.sort_unstable();
    ips.dedup();
    ips
}
