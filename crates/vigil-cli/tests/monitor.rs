//! End-to-end orchestration tests against mocked DoH and Telegram endpoints.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use vigil_cli::config::{MonitorConfig, TelegramConfig};
use vigil_cli::monitor::Monitor;
use vigil_core::{DomainConfig, DomainState, DomainStatus};
use vigil_probe::{state_key, MemoryStore, StateStore};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(doh: &MockServer, telegram: &MockServer, domains: Vec<DomainConfig>) -> MonitorConfig {
    MonitorConfig {
        interval_secs: 300,
        doh_url: doh.uri(),
        state_dir: PathBuf::from("unused-in-tests"),
        concurrency: 4,
        telegram: TelegramConfig {
            bot_token: Some("TEST:TOKEN".into()),
            chat_id: Some("-100123".into()),
            topic_id: None,
            api_url: telegram.uri(),
        },
        domains,
    }
}

fn resolved_state(ips: &[&str], serial: Option<&str>) -> DomainState {
    let mut state = DomainState::uninitialized();
    state.status = DomainStatus::Resolved;
    state.set_ips(ips.iter().map(|s| s.parse().unwrap()).collect());
    state.serial = serial.map(String::from);
    state
}

async fn mock_dns(server: &MockServer, record_type: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/dns-query"))
        .and(query_param("type", record_type))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Store whose first `get` panics mid-check, then behaves normally
struct PanicOnceStore {
    inner: MemoryStore,
    armed: AtomicBool,
}

impl PanicOnceStore {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            armed: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl StateStore for PanicOnceStore {
    async fn get(&self, key: &str) -> vigil_core::Result<Option<DomainState>> {
        if self.armed.swap(false, Ordering::SeqCst) {
            panic!("injected storage fault");
        }
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, state: &DomainState) -> vigil_core::Result<()> {
        self.inner.put(key, state).await
    }
}

async fn mock_telegram_ok(server: &MockServer, expected_sends: u64) {
    Mock::given(method("POST"))
        .and(path("/botTEST:TOKEN/sendMessage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .expect(expected_sends)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_first_observation_seeds_state_without_alerting() {
    let doh = MockServer::start().await;
    let telegram = MockServer::start().await;
    mock_telegram_ok(&telegram, 0).await;

    let store = Arc::new(MemoryStore::new());
    let monitor = Monitor::new(
        &config(&doh, &telegram, vec![DomainConfig::new("example.com")]),
        store.clone(),
    )
    .unwrap();

    let summary = monitor.tick().await;
    assert_eq!(summary.checked, 1);
    assert_eq!(summary.failed, 0);

    let seeded = store.get(&state_key("example.com")).await.unwrap().unwrap();
    assert_eq!(seeded, DomainState::uninitialized());
}

#[tokio::test]
async fn test_authority_lost_alerts_exactly_once() {
    let doh = MockServer::start().await;
    let telegram = MockServer::start().await;
    mock_dns(&doh, "A", serde_json::json!({"Status": 3})).await;
    mock_telegram_ok(&telegram, 1).await;

    let store = Arc::new(MemoryStore::new());
    let key = state_key("example.com");
    store
        .put(&key, &resolved_state(&["9.9.9.9"], Some("100")))
        .await
        .unwrap();

    let monitor = Monitor::new(
        &config(&doh, &telegram, vec![DomainConfig::new("example.com")]),
        store.clone(),
    )
    .unwrap();

    let first = monitor.tick().await;
    assert_eq!(first.changed, 1);
    let state = store.get(&key).await.unwrap().unwrap();
    assert_eq!(state.status, DomainStatus::NoAuthority);
    assert!(state.ips.is_empty());

    // still unreachable: no second alert (telegram mock expects exactly 1)
    let second = monitor.tick().await;
    assert_eq!(second.changed, 0);
    assert_eq!(second.failed, 0);
}

#[tokio::test]
async fn test_soa_only_bump_is_silent_but_persisted() {
    let doh = MockServer::start().await;
    let telegram = MockServer::start().await;
    mock_dns(&doh, "A", serde_json::json!({"Status": 0})).await;
    mock_dns(
        &doh,
        "SOA",
        serde_json::json!({
            "Status": 0,
            "Answer": [{"name": "example.com", "type": 6, "TTL": 3600,
                        "data": "ns1. admin. 101 7200 3600 1209600 300"}]
        }),
    )
    .await;
    mock_telegram_ok(&telegram, 0).await;

    let store = Arc::new(MemoryStore::new());
    let key = state_key("example.com");
    store
        .put(&key, &resolved_state(&[], Some("100")))
        .await
        .unwrap();

    let monitor = Monitor::new(
        &config(&doh, &telegram, vec![DomainConfig::new("example.com")]),
        store.clone(),
    )
    .unwrap();

    let summary = monitor.tick().await;
    assert_eq!(summary.changed, 1);
    assert_eq!(summary.failed, 0);

    let state = store.get(&key).await.unwrap().unwrap();
    assert_eq!(state.serial.as_deref(), Some("101"));
}

#[tokio::test]
async fn test_probe_failure_leaves_state_untouched() {
    let doh = MockServer::start().await;
    let telegram = MockServer::start().await;
    // resolves to loopback where no TLS listener answers, so the probe fails
    mock_dns(
        &doh,
        "A",
        serde_json::json!({
            "Status": 0,
            "Answer": [{"name": "example.com", "type": 1, "TTL": 300, "data": "127.0.0.1"}]
        }),
    )
    .await;
    mock_dns(&doh, "SOA", serde_json::json!({"Status": 0})).await;
    // the probe failure itself is alertable
    mock_telegram_ok(&telegram, 1).await;

    let store = Arc::new(MemoryStore::new());
    let key = state_key("example.com");
    let before = resolved_state(&["9.9.9.9"], Some("100"));
    store.put(&key, &before).await.unwrap();

    let monitor = Monitor::new(
        &config(&doh, &telegram, vec![DomainConfig::new("example.com")]),
        store.clone(),
    )
    .unwrap();

    monitor.tick().await;
    // the would-be IP change must not have been persisted
    assert_eq!(store.get(&key).await.unwrap().unwrap(), before);
}

#[tokio::test]
async fn test_failed_alert_dispatch_blocks_persistence() {
    let doh = MockServer::start().await;
    let telegram = MockServer::start().await;
    mock_dns(&doh, "A", serde_json::json!({"Status": 3})).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&telegram)
        .await;

    let store = Arc::new(MemoryStore::new());
    let key = state_key("example.com");
    let before = resolved_state(&["9.9.9.9"], Some("100"));
    store.put(&key, &before).await.unwrap();

    let monitor = Monitor::new(
        &config(&doh, &telegram, vec![DomainConfig::new("example.com")]),
        store.clone(),
    )
    .unwrap();

    let summary = monitor.tick().await;
    assert_eq!(summary.failed, 1);
    // alert failed, so the transition is re-detected (and re-announced) next tick
    assert_eq!(store.get(&key).await.unwrap().unwrap(), before);
}

#[tokio::test]
async fn test_panicked_check_does_not_wedge_the_domain() {
    let doh = MockServer::start().await;
    let telegram = MockServer::start().await;
    mock_telegram_ok(&telegram, 0).await;

    let store = Arc::new(PanicOnceStore::new());
    let monitor = Monitor::new(
        &config(&doh, &telegram, vec![DomainConfig::new("example.com")]),
        store.clone(),
    )
    .unwrap();

    // first tick: the check task panics inside the store
    let first = monitor.tick().await;
    assert_eq!(first.failed, 1);
    assert_eq!(first.checked, 0);
    assert_eq!(first.skipped, 0);

    // store healthy again: the domain must be re-checked, not skipped as
    // still in flight
    let second = monitor.tick().await;
    assert_eq!(second.skipped, 0);
    assert_eq!(second.checked, 1);
    assert_eq!(second.failed, 0);

    let seeded = store.get(&state_key("example.com")).await.unwrap().unwrap();
    assert_eq!(seeded, DomainState::uninitialized());
}

#[tokio::test]
async fn test_one_domain_failure_does_not_abort_others() {
    let doh = MockServer::start().await;
    let telegram = MockServer::start().await;
    // only good.example resolves; bad.example gets a DoH transport failure
    Mock::given(method("GET"))
        .and(path("/dns-query"))
        .and(query_param("name", "bad.example"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&doh)
        .await;
    Mock::given(method("GET"))
        .and(path("/dns-query"))
        .and(query_param("name", "good.example"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"Status": 3})))
        .mount(&doh)
        .await;
    mock_telegram_ok(&telegram, 1).await;

    let store = Arc::new(MemoryStore::new());
    store
        .put(&state_key("good.example"), &resolved_state(&["9.9.9.9"], None))
        .await
        .unwrap();
    store
        .put(&state_key("bad.example"), &resolved_state(&["8.8.8.8"], None))
        .await
        .unwrap();

    let monitor = Monitor::new(
        &config(
            &doh,
            &telegram,
            vec![
                DomainConfig::new("bad.example"),
                DomainConfig::new("good.example"),
            ],
        ),
        store.clone(),
    )
    .unwrap();

    let summary = monitor.tick().await;
    assert_eq!(summary.checked, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.changed, 1);

    // the failing domain's state is untouched, the good one transitioned
    let good = store.get(&state_key("good.example")).await.unwrap().unwrap();
    assert_eq!(good.status, DomainStatus::NoAuthority);
    let bad = store.get(&state_key("bad.example")).await.unwrap().unwrap();
    assert_eq!(bad.status, DomainStatus::Resolved);
}
