//! End-to-end watch task tests.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::time::Duration;

use luxlink_app::WatchTarget;
use luxlink_client::BridgeClient;
use luxlink_harness::MockBridge;
use luxlink_tui::tasks::{self, ControllerEvent};
use tokio::sync::mpsc;

async fn next_render(rx: &mut mpsc::Receiver<ControllerEvent>) -> String {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for watch render")
            .expect("event channel closed");
        if let ControllerEvent::WatchRendered { text } = event {
            return text;
        }
    }
}

#[tokio::test]
async fn watch_renders_header_and_target_output() {
    let bridge = MockBridge::start().await.unwrap();
    let client = BridgeClient::new(&bridge.url(), None).unwrap();

    let (events_tx, mut events_rx) = mpsc::channel(16);
    let handle = tasks::spawn_watch(
        client,
        WatchTarget::Devices,
        Duration::from_millis(600),
        120,
        events_tx,
    );

    let first = next_render(&mut events_rx).await;
    assert!(first.contains("Watch Mode - DEVICES"));
    assert!(first.contains("Refreshed at"));
    assert!(first.contains("Total: 3 devices"));

    // A second refresh arrives on its own after the interval.
    let second = next_render(&mut events_rx).await;
    assert!(second.contains("Total: 3 devices"));

    handle.set_interval(Duration::from_millis(500)).await;
    handle.stop().await;

    let quiet = tokio::time::timeout(Duration::from_millis(900), events_rx.recv()).await;
    assert!(quiet.is_err(), "no renders after stop() returns");
}

#[tokio::test]
async fn watch_reports_fetch_errors_inline() {
    let bridge = MockBridge::start().await.unwrap();
    let url = bridge.url();
    drop(bridge);

    let client = BridgeClient::new(&url, None).unwrap();
    let (events_tx, mut events_rx) = mpsc::channel(16);
    let handle = tasks::spawn_watch(
        client,
        WatchTarget::Dashboard,
        Duration::from_secs(5),
        120,
        events_tx,
    );

    let rendered = next_render(&mut events_rx).await;
    assert!(rendered.contains("Error executing watch command:"));

    handle.stop().await;
}
