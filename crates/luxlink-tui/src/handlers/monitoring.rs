//! Monitoring renderers: dashboard, device overview, stats, channels, and
//! the recent-log snapshot used by watch mode.

use std::collections::BTreeMap;

use chrono::Utc;
use luxlink_app::{
    format::{relative_age, table_timestamp},
    table::TextTable,
};
use luxlink_client::{BridgeClient, ClientError, Device, LogQuery, Mapping};

/// Channel functions for well-known field layouts.
fn template_functions(fields: &[String]) -> Vec<String> {
    let key: String = fields.join("").to_ascii_lowercase();
    let known: &[&str] = match key.as_str() {
        "rgb" => &["Red", "Green", "Blue"],
        "rgbw" => &["Red", "Green", "Blue", "White"],
        "rgbww" => &["Red", "Green", "Blue", "Warm White", "Cool White"],
        "brightness" | "dimmer" => &["Dimmer"],
        "cct" => &["Color Temp", "Dimmer"],
        "rgbcct" => &["Red", "Green", "Blue", "Color Temp", "Dimmer"],
        _ => &[],
    };
    if !known.is_empty() {
        return known.iter().map(ToString::to_string).collect();
    }
    fields
        .iter()
        .map(|f| match f.as_str() {
            "r" => "Red".to_string(),
            "g" => "Green".to_string(),
            "b" => "Blue".to_string(),
            "w" => "White".to_string(),
            "brightness" => "Dimmer".to_string(),
            "temperature" | "ct" => "Color Temp".to_string(),
            other => {
                let mut chars = other.chars();
                chars.next().map_or_else(String::new, |c| {
                    c.to_uppercase().collect::<String>() + chars.as_str()
                })
            },
        })
        .collect()
}

fn device_status(device: &Device) -> &'static str {
    if device.offline {
        "● Offline"
    } else if device.stale {
        "● Stale"
    } else {
        "● Online"
    }
}

fn device_table(devices: &[Device], limit: Option<usize>, width: usize) -> String {
    let mut sorted: Vec<&Device> = devices.iter().collect();
    sorted.sort_by(|a, b| (a.offline, &a.id).cmp(&(b.offline, &b.id)));

    let now = Utc::now();
    let mut table =
        TextTable::new(&["ID", "Status", "IP", "Model", "Name", "Last Seen", "Maps"]);
    let shown = limit.unwrap_or(sorted.len());
    for device in sorted.iter().take(shown) {
        table.push_row(vec![
            device.id.clone(),
            device_status(device).to_string(),
            device.ip.clone().unwrap_or_else(|| "-".to_string()),
            device.model_number.clone().unwrap_or_else(|| "-".to_string()),
            device.description.clone().unwrap_or_else(|| "-".to_string()),
            relative_age(device.last_seen.as_deref(), now),
            device.mapping_count.to_string(),
        ]);
    }

    let mut out = table.render(width);
    if sorted.len() > shown {
        out.push_str(&format!("... and {} more\n", sorted.len() - shown));
    }
    out
}

/// `monitor devices`: full device table plus the totals line.
pub async fn render_devices(client: &BridgeClient, width: usize) -> Result<String, ClientError> {
    let devices = client.devices().await?;

    let mut out = device_table(&devices, None, width);
    let total = devices.len();
    let online = devices.iter().filter(|d| !d.offline).count();
    let offline = devices.iter().filter(|d| d.offline).count();
    out.push_str(&format!("Total: {total} devices | {online} online | {offline} offline\n"));
    Ok(out)
}

/// `monitor dashboard`: health, stat summary, and a trimmed device table.
pub async fn render_dashboard(client: &BridgeClient, width: usize) -> Result<String, ClientError> {
    let health = client.health().await?;
    let status = client.status().await.unwrap_or_default();
    let devices = client.devices().await?;
    let mappings = client.mappings().await.unwrap_or_default();

    let total = devices.len();
    let online = devices.iter().filter(|d| !d.offline).count();
    let offline = devices.iter().filter(|d| d.offline).count();
    let mapped = devices.iter().filter(|d| d.mapping_count > 0).count();

    let mut out = String::new();
    out.push_str("═══ Bridge Dashboard ═══\n\n");
    out.push_str(&format!(
        "Devices: {total}   Online: {online}   Offline: {offline}   Mapped: {mapped}   Mappings: {}\n\n",
        mappings.len()
    ));

    out.push_str(&format!("Health: {}\n", health.status));
    for (name, subsystem) in &health.subsystems {
        out.push_str(&format!("  {name:<14} {}\n", subsystem.status.to_ascii_uppercase()));
    }
    out.push('\n');

    if let Some(protocols) = status.get("protocols").and_then(|p| p.as_object()) {
        out.push_str("Protocols:\n");
        for (name, stats) in protocols {
            let total = stats.get("total").and_then(serde_json::Value::as_u64).unwrap_or(0);
            let enabled = stats.get("enabled").and_then(serde_json::Value::as_u64).unwrap_or(0);
            let offline = stats.get("offline").and_then(serde_json::Value::as_u64).unwrap_or(0);
            out.push_str(&format!(
                "  {name}: {total} total ({enabled} enabled, {offline} offline)\n"
            ));
        }
        out.push('\n');
    }

    if !devices.is_empty() {
        out.push_str(&device_table(&devices, Some(10), width));
    }
    Ok(out)
}

/// `monitor stats`: the `/status` payload, honoring the configured output
/// format (`json` dumps pretty JSON, anything else renders key/value text).
pub async fn render_stats(client: &BridgeClient, format: &str) -> Result<String, ClientError> {
    let status = client.status().await?;
    if format.eq_ignore_ascii_case("json") {
        let mut out = serde_json::to_string_pretty(&status).unwrap_or_default();
        out.push('\n');
        return Ok(out);
    }
    Ok(super::render_value(&status, 0))
}

/// Watch-mode log snapshot: the newest entries from `/logs`.
pub async fn render_recent_logs(client: &BridgeClient, width: usize) -> Result<String, ClientError> {
    const SNAPSHOT_LINES: usize = 20;

    // Probe the total first so the snapshot shows the tail, not the head.
    let probe = client.logs(&LogQuery { limit: 1, ..LogQuery::default() }).await?;
    let offset = probe.total.saturating_sub(SNAPSHOT_LINES);
    let page = client
        .logs(&LogQuery { limit: SNAPSHOT_LINES, offset, ..LogQuery::default() })
        .await?;

    let mut out = String::new();
    for entry in &page.logs {
        let line = format!(
            "{} {:<8} {}: {}",
            table_timestamp(&entry.timestamp),
            entry.level,
            entry.logger,
            entry.message
        );
        out.push_str(&luxlink_app::format::fit_with_ellipsis(&line, width.max(20)));
        out.push('\n');
    }
    if page.logs.is_empty() {
        out.push_str("No logs available\n");
    }
    Ok(out)
}

/// `channels list`: per-channel assignments for the requested universes.
pub async fn render_channels(
    client: &BridgeClient,
    universes: &[u32],
    width: usize,
) -> Result<String, ClientError> {
    let mappings = client.mappings().await?;
    let devices = client.devices().await?;
    let device_lookup: BTreeMap<&str, &Device> =
        devices.iter().map(|d| (d.id.as_str(), d)).collect();

    let relevant: Vec<&Mapping> =
        mappings.iter().filter(|m| universes.contains(&m.universe)).collect();
    let universes_label =
        universes.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
    if relevant.is_empty() {
        return Ok(format!("No mappings found for universe(s) {universes_label}\n"));
    }

    // (universe, channel) -> (device, function, mapping id)
    let mut channel_map: BTreeMap<(u32, u32), (&str, String, u64)> = BTreeMap::new();
    for mapping in &relevant {
        let functions = if mapping.fields.is_empty() {
            mapping.field.as_ref().map_or_else(Vec::new, |f| template_functions(&[f.clone()]))
        } else {
            template_functions(&mapping.fields)
        };
        for i in 0..mapping.length {
            let channel = mapping.channel + i;
            if !(1..=512).contains(&channel) {
                continue;
            }
            let function = functions
                .get(i as usize)
                .cloned()
                .unwrap_or_else(|| format!("Ch{}", i + 1));
            channel_map
                .insert((mapping.universe, channel), (mapping.device_id.as_str(), function, mapping.id));
        }
    }

    let mut table = TextTable::new(&[
        "Universe", "Channel", "Device ID", "Protocol", "IP", "Name", "Function", "Mapping",
    ])
    .with_title(format!("Channels - Universe {universes_label}"));

    for ((universe, channel), (device_id, function, mapping_id)) in &channel_map {
        let device = device_lookup.get(device_id);
        table.push_row(vec![
            universe.to_string(),
            channel.to_string(),
            (*device_id).to_string(),
            device
                .and_then(|d| d.protocol.clone())
                .unwrap_or_else(|| "-".to_string()),
            device.and_then(|d| d.ip.clone()).unwrap_or_else(|| "-".to_string()),
            device
                .and_then(|d| d.description.clone())
                .unwrap_or_else(|| "-".to_string()),
            function.clone(),
            mapping_id.to_string(),
        ]);
    }

    let mut out = table.render(width);
    let channels: Vec<u32> = channel_map.keys().map(|(_, c)| *c).collect();
    let lowest = channels.iter().min().map_or(0, |c| *c);
    let highest = channels.iter().max().map_or(0, |c| *c);
    out.push_str(&format!("\nTotal: {} populated channel(s)\n", channel_map.len()));
    out.push_str(&format!("Channel range: {lowest} - {highest}\n"));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_functions_expand_known_layouts() {
        let rgb: Vec<String> =
            ["r", "g", "b"].iter().map(ToString::to_string).collect();
        assert_eq!(template_functions(&rgb), vec!["Red", "Green", "Blue"]);

        let custom: Vec<String> = ["power"].iter().map(ToString::to_string).collect();
        assert_eq!(template_functions(&custom), vec!["Power"]);
    }

    #[test]
    fn device_status_precedence() {
        let mut device = Device { id: "x".to_string(), ..Device::default() };
        assert_eq!(device_status(&device), "● Online");
        device.stale = true;
        assert_eq!(device_status(&device), "● Stale");
        device.offline = true;
        assert_eq!(device_status(&device), "● Offline");
    }

    #[test]
    fn device_table_sorts_offline_last_and_caps_rows() {
        let devices = vec![
            Device { id: "b".to_string(), offline: true, ..Device::default() },
            Device { id: "a".to_string(), ..Device::default() },
            Device { id: "c".to_string(), ..Device::default() },
        ];
        let out = device_table(&devices, Some(2), 100);
        assert!(out.contains("and 1 more"));
        let a_at = out.find("│ a").map_or(usize::MAX, |i| i);
        let c_at = out.find("│ c").map_or(0, |i| i);
        assert!(a_at < c_at, "online devices sort before offline, by id");
        assert!(!out.contains("│ b"), "offline device falls past the cap");
    }
}
