use std::{sync::Arc, time::Duration};

use gerrit_check::{
    GerritApi, PollingConfig, Tracker, TrackerEvent, UpdateReport,
    client::ClientConfig,
    domain::QueryKind,
    id::ChangeId,
    result::TrackerError,
};
use tokio::{sync::broadcast, time::timeout};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

const PENDING_QUERY: &str = "status:open project:core reviewer:jdoe";
const SUBMITTABLE_QUERY: &str = "status:open project:core owner:jdoe";

fn tracker() -> Tracker {
    let api = GerritApi::new(ClientConfig::default()).expect("valid client config");
    Tracker::spawn(
        Arc::new(api),
        PollingConfig { interval: Duration::from_secs(300) },
    )
}

async fn mount(server: &MockServer, query: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/changes/"))
        .and(query_param("q", query))
        .respond_with(response)
        .mount(server)
        .await;
}

fn gerrit_body(json: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(format!(")]}}'\n{json}"))
}

async fn next_update(
    events: &mut broadcast::Receiver<TrackerEvent>,
    failures: &mut Vec<(QueryKind, TrackerError)>,
) -> UpdateReport {
    timeout(Duration::from_secs(10), async {
        loop {
            match events.recv().await.expect("tracker is running") {
                TrackerEvent::Updated(report) => return report,
                TrackerEvent::QueryFailed(kind, e) => failures.push((kind, e)),
                TrackerEvent::AppError(e) => panic!("unexpected error: {e}"),
            }
        }
    })
    .await
    .expect("poll completed in time")
}

#[tokio::test]
async fn unchanged_server_reports_nothing_new_on_second_poll() {
    let server = MockServer::start().await;
    mount(
        &server,
        PENDING_QUERY,
        gerrit_body(
            r#"[
                {"_number": 42, "submittable": false, "revisions": {"a": {}, "b": {}}},
                {"_number": 43, "submittable": false, "revisions": {"c": {}}}
            ]"#,
        ),
    )
    .await;
    mount(
        &server,
        SUBMITTABLE_QUERY,
        gerrit_body(r#"[{"_number": 50, "submittable": true}, {"_number": 51, "submittable": false}]"#),
    )
    .await;

    let tracker = tracker();
    let mut events = tracker.subscribe();
    let mut failures = Vec::new();

    tracker
        .configure(server.uri(), "core", "jdoe")
        .await
        .unwrap();
    let first = next_update(&mut events, &mut failures).await;

    assert!(first.status.has_new_pending);
    assert!(first.status.has_new_submittable);
    assert_eq!(first.pending_count, 2);
    assert_eq!(first.submittable_count, 1);
    assert_eq!(
        tracker.snapshot().pending_revisions.get(&ChangeId::new("42")),
        Some(&2)
    );

    tracker.refresh().unwrap();
    let second = next_update(&mut events, &mut failures).await;

    assert!(!second.status.has_new_pending);
    assert!(!second.status.has_new_submittable);
    assert!(failures.is_empty());
    assert_eq!(server.received_requests().await.unwrap().len(), 4);
}

#[tokio::test]
async fn failed_pending_half_keeps_cycle_alive() {
    let server = MockServer::start().await;
    mount(&server, PENDING_QUERY, ResponseTemplate::new(500)).await;
    mount(
        &server,
        SUBMITTABLE_QUERY,
        gerrit_body(r#"[{"_number": 7, "submittable": true}]"#),
    )
    .await;

    let tracker = tracker();
    let mut events = tracker.subscribe();
    let mut failures = Vec::new();

    tracker
        .configure(server.uri(), "core", "jdoe")
        .await
        .unwrap();
    let report = next_update(&mut events, &mut failures).await;

    assert!(!report.status.has_new_pending);
    assert!(report.status.has_new_submittable);
    assert!(report.status.update_complete());
    assert_eq!(report.pending_count, 0);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, QueryKind::Pending);
    assert!(matches!(failures[0].1, TrackerError::TransportError(_)));
    assert!(!tracker.is_polling());
}

#[tokio::test]
async fn malformed_body_is_reported_as_decode_error() {
    let server = MockServer::start().await;
    mount(&server, PENDING_QUERY, gerrit_body("[]")).await;
    mount(
        &server,
        SUBMITTABLE_QUERY,
        ResponseTemplate::new(200).set_body_string("<html>Sign in</html>"),
    )
    .await;

    let tracker = tracker();
    let mut events = tracker.subscribe();
    let mut failures = Vec::new();

    tracker
        .configure(server.uri(), "core", "jdoe")
        .await
        .unwrap();
    let report = next_update(&mut events, &mut failures).await;

    assert!(!report.status.has_news());
    assert_eq!(failures.len(), 1);
    assert!(matches!(
        failures[0],
        (QueryKind::Submittable, TrackerError::DecodeError { .. })
    ));
}

#[tokio::test]
async fn plus_in_username_reaches_server_unchanged() {
    let server = MockServer::start().await;
    mount(
        &server,
        "status:open project:tools/repo reviewer:jane+ci@example.org",
        gerrit_body(r#"[{"_number": 3, "revisions": {"a": {}}}]"#),
    )
    .await;
    mount(
        &server,
        "status:open project:tools/repo owner:jane+ci@example.org",
        gerrit_body("[]"),
    )
    .await;

    let tracker = tracker();
    let mut events = tracker.subscribe();
    let mut failures = Vec::new();

    tracker
        .configure(server.uri(), "tools/repo", "jane+ci@example.org")
        .await
        .unwrap();
    let report = next_update(&mut events, &mut failures).await;

    assert!(failures.is_empty(), "unexpected failures: {failures:?}");
    assert!(report.status.has_new_pending);
    assert_eq!(report.pending_count, 1);
}
