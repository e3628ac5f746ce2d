//! Integration tests for the monitor
//!
//! These tests use wiremock to stand in for the listing endpoint (and the
//! chat API) and run complete monitoring passes against real state files.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use ur_watch::config::{parse_config, Config};
use ur_watch::extract::ListingExtractor;
use ur_watch::fetcher::PageFetcher;
use ur_watch::monitor::{NotificationStatus, RunOutcome};
use ur_watch::notify::{build_notifier, Notifier, NotifyError};
use ur_watch::reconcile::MessageOptions;
use ur_watch::storage::open_store;
use ur_watch::{Monitor, PersistedState, WatchError};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING_PATH: &str = "/chintai/api/bukken/detail/detail_bukken_room/";

const PAGE_0: &str = r#"[
    {"id":"000010101","name":"1号棟101号室","type":"2LDK","floorspace":"55&#13217;","floor":"1階","rent":"85,000円","commonfee":"3,100円"},
    {"id":"000010202","name":"1号棟202号室","type":"1DK","floorspace":"40&#13217;","floor":"2階","rent":"66,000円","commonfee":"2,800円"}
]"#;

const PAGE_1: &str = r#"{"result":[
    {"id":"000020303","name":"2号棟303号室","type":"3LDK","floorspace":"70&#13217;","floor":"3階","rent":"98,000円"}
]}"#;

#[derive(Clone, Default)]
struct RecordingNotifier {
    messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

/// Creates a test configuration pointing at the mock server
fn create_test_config(server: &MockServer, dir: &TempDir, backend: &str, pages: &[u32]) -> Config {
    let state_file = match backend {
        "sqlite" => "state.db",
        _ => "state.json",
    };
    parse_config(&format!(
        r#"
[target]
endpoint = "{}{}"
property-id = "7080"
shisya = "20"
page-indexes = {:?}

[fetcher]
timeout-secs = 5
retry-backoff-ms = 10

[state]
backend = "{}"
path = "{}"
"#,
        server.uri(),
        LISTING_PATH,
        pages,
        backend,
        dir.path().join(state_file).display()
    ))
    .expect("test config should parse")
}

/// Builds a monitor the way the binary does, but with an explicit notifier
fn create_monitor(config: &Config, notifier: Box<dyn Notifier>) -> Monitor {
    let fetcher = PageFetcher::new(&config.target, &config.fetcher).unwrap();
    let store = open_store(config).unwrap();
    Monitor::new(
        Box::new(fetcher),
        Box::new(ListingExtractor),
        store,
        notifier,
        config.target.page_indexes.clone(),
        MessageOptions::from_config(&config.notify, config.target.property_link()),
    )
}

fn listing_page(index: u32, body: &'static str) -> Mock {
    Mock::given(method("POST"))
        .and(path(LISTING_PATH))
        .and(body_string_contains(format!("pageIndex={}", index)))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
}

fn saved_ids(config: &Config) -> Vec<String> {
    match open_store(config).unwrap().load().unwrap() {
        PersistedState::Initialized(snapshot) => snapshot.iter().map(|r| r.id.clone()).collect(),
        PersistedState::Uninitialized => Vec::new(),
    }
}

#[tokio::test]
async fn test_first_run_initializes_then_stays_quiet() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    listing_page(0, PAGE_0).mount(&server).await;
    listing_page(1, PAGE_1).mount(&server).await;

    let config = create_test_config(&server, &dir, "json", &[0, 1]);
    let notifier = RecordingNotifier::default();

    let report = create_monitor(&config, Box::new(notifier.clone()))
        .run()
        .await
        .unwrap();
    assert_eq!(report.outcome, RunOutcome::Initialized { rooms: 3 });
    assert!(report.persisted);

    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("initialized"));
    assert!(messages[0].contains("3"));
    assert!(messages[0].contains("https://www.ur-net.go.jp/chintai/kanto/tokyo/20_7080.html"));

    assert_eq!(
        saved_ids(&config),
        vec!["000010101", "000010202", "000020303"]
    );

    // A second invocation with identical data sends nothing
    let report = create_monitor(&config, Box::new(notifier.clone()))
        .run()
        .await
        .unwrap();
    assert_eq!(report.outcome, RunOutcome::Unchanged);
    assert_eq!(report.notification, NotificationStatus::NotNeeded);
    assert_eq!(notifier.messages().len(), 1);
}

#[tokio::test]
async fn test_request_carries_property_form_fields() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    Mock::given(method("POST"))
        .and(path(LISTING_PATH))
        .and(body_string_contains("shisya=20"))
        .and(body_string_contains("danchi=708"))
        .and(body_string_contains("pageIndex=0"))
        .and(header("origin", "https://www.ur-net.go.jp"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server, &dir, "json", &[0]);
    let report = create_monitor(&config, Box::new(RecordingNotifier::default()))
        .run()
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Initialized { rooms: 0 });
}

#[tokio::test]
async fn test_transient_failure_is_retried_once() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    // The first request for page 0 fails, the retry succeeds
    Mock::given(method("POST"))
        .and(path(LISTING_PATH))
        .and(body_string_contains("pageIndex=0"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    listing_page(0, PAGE_0).expect(1).mount(&server).await;

    let config = create_test_config(&server, &dir, "json", &[0]);
    let report = create_monitor(&config, Box::new(RecordingNotifier::default()))
        .run()
        .await
        .unwrap();

    assert!(report.failed_pages.is_empty());
    assert_eq!(report.rooms_observed, 2);
}

#[tokio::test]
async fn test_retry_is_bounded_and_429_is_transient() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    // Page 0 keeps failing: exactly one retry, then the page is given up
    Mock::given(method("POST"))
        .and(path(LISTING_PATH))
        .and(body_string_contains("pageIndex=0"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    // Page 1 is rate limited once, then served
    Mock::given(method("POST"))
        .and(path(LISTING_PATH))
        .and(body_string_contains("pageIndex=1"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    listing_page(1, PAGE_1).expect(1).mount(&server).await;

    let mut config = create_test_config(&server, &dir, "json", &[0, 1]);
    config.fetcher.concurrent = true;

    let report = create_monitor(&config, Box::new(RecordingNotifier::default()))
        .run()
        .await
        .unwrap();

    assert_eq!(report.failed_pages, vec![0]);
    assert_eq!(report.rooms_observed, 1);
    assert_eq!(saved_ids(&config), vec!["000020303"]);
}

#[tokio::test]
async fn test_client_error_is_not_retried_and_partial_run_persists() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    listing_page(0, PAGE_0).mount(&server).await;
    Mock::given(method("POST"))
        .and(path(LISTING_PATH))
        .and(body_string_contains("pageIndex=1"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server, &dir, "json", &[0, 1]);
    let report = create_monitor(&config, Box::new(RecordingNotifier::default()))
        .run()
        .await
        .unwrap();

    assert_eq!(report.failed_pages, vec![1]);
    assert!(report.persisted);
    assert_eq!(saved_ids(&config), vec!["000010101", "000010202"]);
}

#[tokio::test]
async fn test_all_pages_failing_leaves_state_untouched() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    // Two successful responses for the first run, then the endpoint is down
    Mock::given(method("POST"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE_0))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = create_test_config(&server, &dir, "json", &[0, 1]);
    let state_path = dir.path().join("state.json");

    create_monitor(&config, Box::new(RecordingNotifier::default()))
        .run()
        .await
        .unwrap();
    let before = std::fs::read(&state_path).unwrap();

    let notifier = RecordingNotifier::default();
    let result = create_monitor(&config, Box::new(notifier.clone()))
        .run()
        .await;

    match result {
        Err(WatchError::AllPagesFailed { pages }) => assert_eq!(pages, vec![0, 1]),
        other => panic!("expected AllPagesFailed, got {:?}", other.map(|r| r.outcome)),
    }
    assert!(notifier.messages().is_empty());
    assert_eq!(std::fs::read(&state_path).unwrap(), before);
}

#[tokio::test]
async fn test_all_pages_failing_on_first_run_creates_no_state() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = create_test_config(&server, &dir, "json", &[0]);
    let result = create_monitor(&config, Box::new(RecordingNotifier::default()))
        .run()
        .await;

    assert!(matches!(result, Err(WatchError::AllPagesFailed { .. })));
    assert!(!dir.path().join("state.json").exists());
}

#[tokio::test]
async fn test_changes_are_notified() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    listing_page(0, PAGE_0).up_to_n_times(1).mount(&server).await;
    listing_page(
        0,
        r#"[
            {"id":"000010101","name":"1号棟101号室","type":"2LDK","floorspace":"55&#13217;","floor":"1階","rent":"83,000円","commonfee":"3,100円"},
            {"id":"000030404","name":"3号棟404号室","type":"1LDK","floorspace":"45&#13217;","floor":"4階","rent":"72,000円"}
        ]"#,
    )
    .mount(&server)
    .await;

    let config = create_test_config(&server, &dir, "json", &[0]);
    let notifier = RecordingNotifier::default();

    create_monitor(&config, Box::new(notifier.clone()))
        .run()
        .await
        .unwrap();
    let report = create_monitor(&config, Box::new(notifier.clone()))
        .run()
        .await
        .unwrap();

    assert_eq!(
        report.outcome,
        RunOutcome::Changed {
            appeared: 1,
            changed: 1,
            disappeared: 1
        }
    );

    let messages = notifier.messages();
    assert_eq!(messages.len(), 2);
    let message = &messages[1];
    assert!(message.contains("1 appeared, 1 changed, 1 disappeared"));
    assert!(message.contains("+ 3号棟404号室"));
    assert!(message.contains("~ 1号棟101号室: rent 85000円 → 83000円"));
    assert!(message.contains("- 1号棟202号室"));

    assert_eq!(saved_ids(&config), vec!["000010101", "000030404"]);
}

#[tokio::test]
async fn test_html_fragment_listing_with_sqlite_state() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    listing_page(
        0,
        r#"<table>
             <tr><td>101号室</td><td>2LDK</td><td>55.2&#13217;</td><td>1階</td><td>賃料: 85,000円</td></tr>
             <tr><td>302号室</td><td>1DK</td><td>3階</td><td>62,300円</td></tr>
           </table>"#,
    )
    .mount(&server)
    .await;

    let config = create_test_config(&server, &dir, "sqlite", &[0]);
    let report = create_monitor(&config, Box::new(RecordingNotifier::default()))
        .run()
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Initialized { rooms: 2 });
    assert_eq!(saved_ids(&config), vec!["101号室", "302号室"]);
}

#[tokio::test]
async fn test_chatwork_delivery_end_to_end() {
    let listing = MockServer::start().await;
    let chat = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    listing_page(0, PAGE_0).mount(&listing).await;
    Mock::given(method("POST"))
        .and(path("/v2/rooms/99/messages"))
        .and(header("X-ChatWorkToken", "token"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"message_id":"1"}"#))
        .expect(1)
        .mount(&chat)
        .await;

    let mut config = create_test_config(&listing, &dir, "json", &[0]);
    config.notify.api_base = chat.uri();
    let notifier = build_notifier(
        &config.notify,
        Some("token".to_string()),
        Some("99".to_string()),
    )
    .unwrap();

    let report = create_monitor(&config, notifier).run().await.unwrap();

    assert_eq!(
        report.notification,
        NotificationStatus::Sent {
            transport: "chatwork"
        }
    );
}
