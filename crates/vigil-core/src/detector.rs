//! The change-detection engine.
//!
//! [`detect`] is a pure function of `(previous state, domain config, DNS
//! snapshot, certificate observation, now)`. It performs no I/O, which keeps
//! every ordering rule and edge case testable in isolation; the orchestrator
//! is responsible for gathering the inputs and acting on the outputs.

use chrono::{DateTime, Duration, Utc};

use crate::types::{
    normalize_ips, CertObservation, ChangeEvent, DnsSnapshot, DomainConfig, DomainState,
    DomainStatus, SoaRecord,
};

/// Result of one detection pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    /// Typed change events, in emission order
    pub events: Vec<ChangeEvent>,

    /// The state the store must hold after this tick
    pub state: DomainState,

    /// Whether `state` differs from the previous state and must be written.
    /// False means the tick was a no-op (or aborted on a probe failure) and
    /// nothing may be persisted.
    pub persist: bool,
}

/// Compare a domain's previous persisted state against a fresh observation.
///
/// Decision sequence (order matters; later checks read values captured
/// before earlier mutations):
///
/// 1. authority check, 2. IP set comparison, 3. certificate policy,
/// 4. IP change event, 5. SOA-only serial bump, 6. critical correlation,
/// 7. persistence flag.
///
/// Re-running on identical input produces no events and `persist == false`.
#[must_use]
pub fn detect(
    previous: &DomainState,
    config: &DomainConfig,
    snapshot: &DnsSnapshot,
    cert: &CertObservation,
    now: DateTime<Utc>,
) -> Detection {
    let mut state = previous.clone();
    let mut events = Vec::new();

    // 1. Authority check. While no authority is reachable there is nothing
    // to compare; the transition fires exactly once per outage.
    if snapshot.no_authority() {
        if state.status == DomainStatus::NoAuthority {
            return Detection {
                events,
                state,
                persist: false,
            };
        }
        events.push(ChangeEvent::AuthorityLost);
        state.clear_authority();
        return Detection {
            events,
            state,
            persist: true,
        };
    }

    // 2. IP comparison, captured before any mutation so later steps can
    // still render the prior set.
    let current_ips = normalize_ips(snapshot.ips.clone());
    let previous_ips = state.ips.clone();
    let ip_changed = current_ips != previous_ips;

    // A probe failure aborts the tick before anything else: state must stay
    // byte-identical so the next tick compares against the same baseline.
    if !current_ips.is_empty() {
        if let CertObservation::Failed(reason) = cert {
            events.push(ChangeEvent::CertificateValidationError {
                reason: reason.clone(),
            });
            return Detection {
                events,
                state: previous.clone(),
                persist: false,
            };
        }
    }

    // First real observation after seeding: adopt everything silently.
    if state.status == DomainStatus::Uninitialized {
        return bootstrap(state, snapshot, cert, current_ips);
    }

    let mut persist = false;

    // Recovery from an outage is a status mutation even when the restored
    // records happen to match the cleared baseline.
    if state.status != DomainStatus::Resolved {
        state.status = DomainStatus::Resolved;
        persist = true;
    }

    // 3. Certificate policy, sampled from the first current address only.
    let mut cert_changed = false;
    let mut replaced_baseline = None;
    if !current_ips.is_empty() {
        if let CertObservation::Observed(info) = cert {
            match state.baseline_cert.take() {
                // Missing baseline after initialization: adopt without
                // alerting, this is bootstrap, not divergence.
                None => {
                    state.baseline_cert = Some(info.clone());
                    persist = true;
                }
                Some(baseline) if !baseline.same_certificate(info) => {
                    replaced_baseline = Some(baseline);
                    if !config.suppress_cert_alerts {
                        events.push(ChangeEvent::CertificateChanged {
                            previous: replaced_baseline.clone(),
                            current: info.clone(),
                        });
                    }
                    state.baseline_cert = Some(info.clone());
                    state.last_cert_change = Some(now);
                    cert_changed = true;
                    persist = true;
                }
                unchanged => state.baseline_cert = unchanged,
            }
        }
    }

    // 4. IP change. An empty set with authority reachable is a legal value
    // and transitioning to it is reportable like any other change.
    if ip_changed {
        state.ips = current_ips.clone();
        state.last_ip_change = Some(now);
        persist = true;

        if !config.suppress_ip_change_alerts {
            events.push(ChangeEvent::IpChanged {
                previous: previous_ips.clone(),
                current: current_ips.clone(),
                serial: snapshot.serial().map(String::from),
                dns_status: snapshot.status,
            });
        }
    }

    // 5. SOA-only change; the serial updates even when the alert is
    // suppressed.
    if !ip_changed {
        let observed_serial = snapshot.serial().map(String::from);
        if observed_serial != state.serial {
            if !config.soa_alerts_suppressed() {
                events.push(ChangeEvent::SoaUpdated {
                    previous_serial: state.serial.clone(),
                    soa: snapshot.soa.clone().unwrap_or_else(SoaRecord::unknown),
                    dns_status: snapshot.status,
                });
            }
            state.serial = observed_serial;
            persist = true;
        }
    }

    // 6. Critical correlation. Judged on the stored timestamps, not
    // tick-local booleans: a certificate change now correlates with an IP
    // change from a few minutes ago and vice versa.
    if ip_changed || cert_changed {
        if let Some(window_minutes) = config.critical_change_window_minutes {
            let window = Duration::minutes(i64::from(window_minutes));
            if let (Some(ip_at), Some(cert_at)) = (state.last_ip_change, state.last_cert_change) {
                if now - ip_at <= window && now - cert_at <= window {
                    events.push(ChangeEvent::CriticalConcurrentChange {
                        previous_ips,
                        current_ips,
                        previous_cert: replaced_baseline,
                        current_cert: state.baseline_cert.clone(),
                        window_minutes,
                        last_ip_change: ip_at,
                        last_cert_change: cert_at,
                    });
                }
            }
        }
    }

    // 7. Persist iff something actually mutated.
    Detection {
        events,
        state,
        persist,
    }
}

/// Adopt the first real observation as the baseline without emitting events.
fn bootstrap(
    mut state: DomainState,
    snapshot: &DnsSnapshot,
    cert: &CertObservation,
    current_ips: Vec<std::net::Ipv4Addr>,
) -> Detection {
    state.status = DomainStatus::Resolved;
    state.ips = current_ips;
    state.serial = snapshot.serial().map(String::from);
    if let CertObservation::Observed(info) = cert {
        state.baseline_cert = Some(info.clone());
    }
    Detection {
        events: Vec::new(),
        state,
        persist: true,
    }
}
