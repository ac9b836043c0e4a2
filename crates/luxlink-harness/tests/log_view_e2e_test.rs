//! End-to-end log view tests: fetch through the real client and task layer,
//! apply to the state machine, lay out the table.

#![allow(clippy::unwrap_used, clippy::panic)]

use luxlink_app::{LogLevel, LogViewState, table::layout_log_table};
use luxlink_client::BridgeClient;
use luxlink_harness::MockBridge;
use luxlink_tui::tasks::{self, ControllerEvent};
use serde_json::json;
use tokio::sync::mpsc;

async fn run_fetch(client: &BridgeClient, view: &mut LogViewState) -> bool {
    let (events_tx, mut events_rx) = mpsc::channel(8);
    let (generation, query) = view.begin_fetch();
    tasks::spawn_view_fetch(client.clone(), generation, query, events_tx);

    let event = tokio::time::timeout(std::time::Duration::from_secs(5), events_rx.recv())
        .await
        .unwrap()
        .unwrap();
    match event {
        ControllerEvent::ViewFetched { generation, outcome } => view.apply_fetch(generation, outcome),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn filtered_single_entry_renders_one_row_one_page() {
    let bridge = MockBridge::start().await.unwrap();
    bridge.set_logs(vec![json!({
        "timestamp": "2025-12-30T10:00:03Z",
        "level": "ERROR",
        "logger": "sender",
        "message": "Failed to send command: timeout",
    })]);
    let client = BridgeClient::new(&bridge.url(), None).unwrap();

    let mut view =
        LogViewState::new(Some(LogLevel::Error), Some("sender".to_string()), None);
    view.logs_per_page = 50;

    let refetch = run_fetch(&client, &mut view).await;
    assert!(!refetch, "single page needs no re-target");
    assert_eq!(view.total_pages, 1);
    assert_eq!(view.current_page, 0);
    assert_eq!(view.rows.len(), 1);
    assert!(view.error.is_none());

    let requests = bridge.request_lines();
    assert_eq!(requests, vec!["GET /logs?level=ERROR&logger=sender&limit=50&offset=0"]);

    // One row, no pagination beyond 1/1, nothing truncated.
    let layout = layout_log_table(&view.rows, 120, 40);
    assert_eq!(layout.rows.len(), 1);
    assert!(!layout.truncated);
    assert_eq!(layout.rows[0].level, "ERROR");
}

#[tokio::test]
async fn initial_fetch_lands_on_last_page() {
    let bridge = MockBridge::start().await.unwrap();
    let many: Vec<serde_json::Value> = (0..25)
        .map(|i| {
            json!({
                "timestamp": "2025-12-30T10:00:00Z",
                "level": "INFO",
                "logger": "artnet",
                "message": format!("packet {i}"),
            })
        })
        .collect();
    bridge.set_logs(many);
    let client = BridgeClient::new(&bridge.url(), None).unwrap();

    let mut view = LogViewState::new(Some(LogLevel::Info), None, None);
    view.logs_per_page = 10;

    let refetch = run_fetch(&client, &mut view).await;
    assert!(refetch, "25 entries at 10/page: the view must jump to page 3");
    assert_eq!(view.current_page, 2);

    let refetch = run_fetch(&client, &mut view).await;
    assert!(!refetch);
    assert_eq!(view.rows.len(), 5, "last page holds the remainder");
}

#[tokio::test]
async fn search_mode_fetches_one_page() {
    let bridge = MockBridge::start().await.unwrap();
    let client = BridgeClient::new(&bridge.url(), None).unwrap();

    let mut view = LogViewState::new(None, None, Some(("timeout".to_string(), false)));
    view.logs_per_page = 50;

    run_fetch(&client, &mut view).await;
    assert_eq!(view.total_pages, 1);
    assert_eq!(view.rows.len(), 1);
    assert!(view.rows[0].message.contains("timeout"));

    let requests = bridge.request_lines();
    assert_eq!(requests, vec!["GET /logs/search?pattern=timeout&regex=false&limit=50"]);
}

#[tokio::test]
async fn fetch_failure_sets_error_and_recovers() {
    let bridge = MockBridge::start().await.unwrap();
    let url = bridge.url();
    let client = BridgeClient::new(&url, None).unwrap();

    let mut view = LogViewState::new(None, None, None);
    view.logs_per_page = 10;
    run_fetch(&client, &mut view).await;
    assert!(view.error.is_none());

    // Point a client at a dead port: the fetch fails, the view keeps going.
    drop(bridge);
    let dead_client = BridgeClient::new(&url, None).unwrap();
    run_fetch(&dead_client, &mut view).await;
    assert!(view.error.is_some());
    assert!(view.rows.is_empty());

    let revived = MockBridge::start().await.unwrap();
    let client = BridgeClient::new(&revived.url(), None).unwrap();
    run_fetch(&client, &mut view).await;
    assert!(view.error.is_none());
}
