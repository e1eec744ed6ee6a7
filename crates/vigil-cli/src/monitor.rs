//! Per-tick orchestration.
//!
//! For each configured domain: load persisted state, observe DNS and the
//! served certificate, run the change detector, dispatch alerts, persist.
//! Domains are independent; one domain's failure never aborts the others.

use chrono::Utc;
use futures_util::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tracing::{error, info, warn};

use vigil_core::format::render_event;
use vigil_core::{detect, CertObservation, DomainConfig, DomainState, Result};
use vigil_probe::{state_key, CertProber, DohClient, StateStore, TelegramNotifier};

use crate::config::MonitorConfig;

/// Outcome counters for one check cycle
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    /// Domains whose check ran to a result
    pub checked: usize,
    /// Domains with at least one event or state mutation
    pub changed: usize,
    /// Domains whose check failed
    pub failed: usize,
    /// Domains skipped because their previous check was still in flight
    pub skipped: usize,
}

/// The monitor: owns the collaborators and fans domain checks out per tick
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    domains: Vec<DomainConfig>,
    doh: DohClient,
    prober: CertProber,
    notifier: TelegramNotifier,
    store: Arc<dyn StateStore>,
    limiter: Semaphore,
    in_flight: Mutex<HashSet<String>>,
}

impl Monitor {
    /// Wire a monitor from validated configuration and a state store
    pub fn new(config: &MonitorConfig, store: Arc<dyn StateStore>) -> Result<Self> {
        let credentials = config.credentials()?;
        let doh = DohClient::builder().base_url(&config.doh_url).build();
        let notifier = TelegramNotifier::builder(credentials.bot_token, credentials.chat_id)
            .base_url(&config.telegram.api_url)
            .topic_id(config.telegram.topic_id)
            .build();

        Ok(Self {
            inner: Arc::new(MonitorInner {
                domains: config.domains.clone(),
                doh,
                prober: CertProber::new(),
                notifier,
                store,
                limiter: Semaphore::new(config.concurrency),
                in_flight: Mutex::new(HashSet::new()),
            }),
        })
    }

    /// Run one check cycle over all configured domains.
    ///
    /// Checks run concurrently up to the configured limit, with at most one
    /// in-flight check per domain: a domain whose previous check is still
    /// running is skipped this tick rather than raced on read-modify-write.
    pub async fn tick(&self) -> TickSummary {
        let mut summary = TickSummary::default();
        let mut handles = Vec::with_capacity(self.inner.domains.len());

        for domain in &self.inner.domains {
            if !self
                .inner
                .in_flight
                .lock()
                .await
                .insert(domain.name.clone())
            {
                warn!(domain = %domain.name, "previous check still in flight, skipping");
                summary.skipped += 1;
                continue;
            }

            let inner = Arc::clone(&self.inner);
            let domain = domain.clone();
            let name = domain.name.clone();
            let handle = tokio::spawn(async move {
                let _permit = inner
                    .limiter
                    .acquire()
                    .await
                    .expect("semaphore is never closed");
                let result = check_domain(&inner, &domain).await;
                inner.in_flight.lock().await.remove(&domain.name);
                result
            });
            handles.push((name, handle));
        }

        let joined = join_all(
            handles
                .into_iter()
                .map(|(name, handle)| async move { (name, handle.await) }),
        )
        .await;

        for (name, outcome) in joined {
            match outcome {
                Ok(Ok(changed)) => {
                    summary.checked += 1;
                    if changed {
                        summary.changed += 1;
                    }
                }
                Ok(Err(e)) => {
                    summary.checked += 1;
                    summary.failed += 1;
                    error!(domain = %name, error = %e, "domain check failed");
                }
                Err(e) => {
                    // The task never reached its own cleanup; release the
                    // in-flight slot here or the domain is never re-checked.
                    self.inner.in_flight.lock().await.remove(&name);
                    summary.failed += 1;
                    error!(domain = %name, error = %e, "domain check task aborted");
                }
            }
        }

        info!(
            checked = summary.checked,
            changed = summary.changed,
            failed = summary.failed,
            skipped = summary.skipped,
            "check cycle complete"
        );
        summary
    }
}

/// Check one domain; returns whether anything was detected or mutated.
async fn check_domain(inner: &MonitorInner, config: &DomainConfig) -> Result<bool> {
    let key = state_key(&config.name);

    let Some(previous) = inner.store.get(&key).await? else {
        // First ever observation: seed the record and return without
        // detecting; the next tick establishes the real baseline.
        inner
            .store
            .put(&key, &DomainState::uninitialized())
            .await?;
        info!(domain = %config.name, "initialized state");
        return Ok(false);
    };

    let snapshot = inner.doh.snapshot(&config.name).await?;

    // Single-IP sampling: only the first current address is probed.
    let cert = match snapshot.ips.first() {
        Some(&ip) if !snapshot.no_authority() => inner.prober.probe(&config.name, ip).await,
        _ => CertObservation::NotProbed,
    };

    let now = Utc::now();
    let detection = detect(&previous, config, &snapshot, &cert, now);

    // Dispatch before persisting: a failed alert leaves the state untouched
    // so the same change is re-detected and re-announced next tick.
    for event in &detection.events {
        let message = render_event(&config.name, event, now);
        inner.notifier.send(&message).await?;
        info!(domain = %config.name, kind = event.kind(), "alert dispatched");
    }

    if detection.persist {
        inner.store.put(&key, &detection.state).await?;
    }

    Ok(!detection.events.is_empty() || detection.persist)
}
