//! Endpoint coverage for the bridge client against the mock bridge.

#![allow(clippy::unwrap_used, clippy::panic)]

use luxlink_client::BridgeClient;
use luxlink_harness::MockBridge;
use luxlink_tui::handlers;
use serde_json::json;

#[tokio::test]
async fn device_crud_round_trip() {
    let bridge = MockBridge::start().await.unwrap();
    let client = BridgeClient::new(&bridge.url(), None).unwrap();

    let created = client
        .create_device(&json!({"id": "NEW:01", "ip": "192.168.1.200"}))
        .await
        .unwrap();
    assert_eq!(created.id, "NEW:01");
    assert!(created.manual);

    let updated = client
        .update_device("AA:BB:CC:DD:EE:FF:11:22", &json!({"enabled": false}))
        .await
        .unwrap();
    assert!(!updated.enabled);

    let response = client
        .test_device("AA:BB:CC:DD:EE:FF:11:22", &json!({"color": {"r": 255, "g": 0, "b": 0}}))
        .await
        .unwrap();
    assert_eq!(response["status"], "sent");

    let response = client
        .command_device("AA:BB:CC:DD:EE:FF:11:22", &json!({"power": true}))
        .await
        .unwrap();
    assert_eq!(response["status"], "ok");
}

#[tokio::test]
async fn mapping_crud_and_channel_map() {
    let bridge = MockBridge::start().await.unwrap();
    let client = BridgeClient::new(&bridge.url(), None).unwrap();

    let created = client
        .create_mapping(&json!({"device_id": "AA:BB:CC:DD:EE:FF:11:22", "universe": 3,
                                "channel": 20, "length": 3, "fields": ["r", "g", "b"]}))
        .await
        .unwrap();
    assert_eq!(created.id, 99);
    assert_eq!(created.universe, 3);

    let updated = client.update_mapping(1, &json!({"channel": 5})).await.unwrap();
    assert_eq!(updated.channel, 5);

    client.delete_mapping(1).await.unwrap();
    assert!(client.delete_mapping(42).await.is_err());

    let channel_map = client.channel_map().await.unwrap();
    let universe_one = channel_map.get("1").and_then(|v| v.as_array()).unwrap();
    assert_eq!(universe_one.len(), 2);

    let status = client.status().await.unwrap();
    assert_eq!(status["uptime_seconds"], 3600);

    client.reload().await.unwrap();
    assert!(bridge.request_lines().contains(&"POST /reload".to_string()));
}

#[tokio::test]
async fn device_and_mapping_handlers_render() {
    let bridge = MockBridge::start().await.unwrap();
    let client = BridgeClient::new(&bridge.url(), None).unwrap();

    let listing = handlers::devices::render_list(&client, 140).await.unwrap();
    assert!(listing.contains("Living Room Strip"));
    assert!(listing.contains("Offline"));

    let toggled =
        handlers::devices::set_enabled(&client, "AA:BB:CC:DD:EE:FF:11:22", false).await.unwrap();
    assert!(toggled.contains("disabled"));

    let mappings = handlers::mappings::render_list(&client, 120).await.unwrap();
    assert!(mappings.contains("Total: 3 mapping(s)"));
    assert!(mappings.contains("r,g,b"));

    let deleted = handlers::mappings::delete(&client, 2).await.unwrap();
    assert!(deleted.contains("Mapping 2 deleted"));

    let detail = handlers::devices::render_show(&client, "11:22:33:44:55:66:77:88").await.unwrap();
    assert!(detail.contains("Bedroom Light Bar"));
}
