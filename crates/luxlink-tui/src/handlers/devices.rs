//! Device command handlers.

use chrono::Utc;
use luxlink_app::{format::relative_age, table::TextTable};
use luxlink_client::{BridgeClient, ClientError};

/// `devices list`: table of all known devices.
pub async fn render_list(client: &BridgeClient, width: usize) -> Result<String, ClientError> {
    let mut devices = client.devices().await?;
    devices.sort_by(|a, b| (a.offline, a.id.clone()).cmp(&(b.offline, b.id.clone())));

    if devices.is_empty() {
        return Ok("No devices known to the bridge\n".to_string());
    }

    let now = Utc::now();
    let mut table =
        TextTable::new(&["ID", "Status", "IP", "Protocol", "Model", "Name", "Last Seen"]);
    for device in &devices {
        let status = if device.offline {
            "Offline"
        } else if device.stale {
            "Stale"
        } else {
            "Online"
        };
        table.push_row(vec![
            device.id.clone(),
            status.to_string(),
            device.ip.clone().unwrap_or_else(|| "-".to_string()),
            device.protocol.clone().unwrap_or_else(|| "-".to_string()),
            device.model_number.clone().unwrap_or_else(|| "-".to_string()),
            device.description.clone().unwrap_or_else(|| "-".to_string()),
            relative_age(device.last_seen.as_deref(), now),
        ]);
    }
    Ok(table.render(width))
}

/// `devices show ID`: full detail block for one device.
pub async fn render_show(client: &BridgeClient, id: &str) -> Result<String, ClientError> {
    let device = client.device(id).await?;
    let value = serde_json::to_value(&device).unwrap_or_default();
    Ok(format!("Device {id}\n{}", super::render_value(&value, 1)))
}

/// `devices enable|disable ID`.
pub async fn set_enabled(
    client: &BridgeClient,
    id: &str,
    enabled: bool,
) -> Result<String, ClientError> {
    let updates = serde_json::json!({ "enabled": enabled });
    let device = client.update_device(id, &updates).await?;
    let verb = if device.enabled { "enabled" } else { "disabled" };
    Ok(format!("Device {id} {verb}\n"))
}

/// `devices test ID [JSON]`: send a test payload (defaults to a white flash).
pub async fn send_test(
    client: &BridgeClient,
    id: &str,
    payload: Option<&str>,
) -> Result<String, ClientError> {
    let payload = match payload {
        Some(raw) => match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(error) => return Ok(format!("Invalid JSON payload: {error}\n")),
        },
        None => serde_json::json!({ "color": { "r": 255, "g": 255, "b": 255 } }),
    };
    let response = client.test_device(id, &payload).await?;
    Ok(format!("Test sent to {id}\n{}", super::render_value(&response, 1)))
}

/// `devices command ID JSON`.
pub async fn send_command(
    client: &BridgeClient,
    id: &str,
    body: &str,
) -> Result<String, ClientError> {
    let command: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(error) => return Ok(format!("Invalid JSON command: {error}\n")),
    };
    let response = client.command_device(id, &command).await?;
    Ok(format!("Command sent to {id}\n{}", super::render_value(&response, 1)))
}
