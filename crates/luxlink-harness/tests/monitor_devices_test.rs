//! End-to-end tests for the one-shot monitoring commands against the mock
//! bridge: real client, real HTTP, scripted fixtures.

#![allow(clippy::unwrap_used, clippy::panic)]

use luxlink_client::{BridgeClient, ClientError};
use luxlink_harness::MockBridge;
use luxlink_tui::handlers;

#[tokio::test]
async fn monitor_devices_reports_totals() {
    let bridge = MockBridge::start().await.unwrap();
    let client = BridgeClient::new(&bridge.url(), None).unwrap();

    let output = handlers::monitoring::render_devices(&client, 120).await.unwrap();

    assert!(output.contains("Total: 3 devices"), "output:\n{output}");
    assert!(output.contains("2 online"));
    assert!(output.contains("1 offline"));
    // The offline+stale device reports as offline, not stale.
    assert!(output.contains("● Offline"));
}

#[tokio::test]
async fn dashboard_renders_health_and_protocols() {
    let bridge = MockBridge::start().await.unwrap();
    let client = BridgeClient::new(&bridge.url(), None).unwrap();

    let output = handlers::monitoring::render_dashboard(&client, 120).await.unwrap();

    assert!(output.contains("Health: ok"));
    assert!(output.contains("sender"));
    assert!(output.contains("govee: 2 total (2 enabled, 0 offline)"));
    assert!(output.contains("Devices: 3"));
}

#[tokio::test]
async fn channels_list_joins_mappings_and_devices() {
    let bridge = MockBridge::start().await.unwrap();
    let client = BridgeClient::new(&bridge.url(), None).unwrap();

    let output = handlers::monitoring::render_channels(&client, &[1], 140).await.unwrap();

    // Universe 1 holds mappings 1 (rgb @ 1) and 2 (rgbw @ 10).
    assert!(output.contains("Red"));
    assert!(output.contains("White"));
    assert!(output.contains("Total: 7 populated channel(s)"));
    assert!(output.contains("Channel range: 1 - 13"));

    let none = handlers::monitoring::render_channels(&client, &[9], 140).await.unwrap();
    assert!(none.contains("No mappings found for universe(s) 9"));
}

#[tokio::test]
async fn api_key_is_sent_on_requests() {
    let bridge = MockBridge::start().await.unwrap();
    let client = BridgeClient::new(&bridge.url(), Some("secret".to_string())).unwrap();

    client.health().await.unwrap();

    let requests = bridge.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].api_key.as_deref(), Some("secret"));
}

#[tokio::test]
async fn upstream_errors_surface_status_and_body() {
    let bridge = MockBridge::start().await.unwrap();
    let client = BridgeClient::new(&bridge.url(), None).unwrap();

    let error = client.device("no:such:device").await.unwrap_err();
    match error {
        ClientError::Api { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("Device not found"));
        },
        other => panic!("expected Api error, got {other:?}"),
    }
}
