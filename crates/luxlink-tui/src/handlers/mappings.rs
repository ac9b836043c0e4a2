//! Mapping command handlers.

use luxlink_app::table::TextTable;
use luxlink_client::{BridgeClient, ClientError};

/// `mappings list`: table of all channel mappings.
pub async fn render_list(client: &BridgeClient, width: usize) -> Result<String, ClientError> {
    let mut mappings = client.mappings().await?;
    mappings.sort_by_key(|m| (m.universe, m.channel, m.id));

    if mappings.is_empty() {
        return Ok("No mappings configured\n".to_string());
    }

    let mut table =
        TextTable::new(&["ID", "Device", "Universe", "Channel", "Length", "Type", "Fields"]);
    for mapping in &mappings {
        let fields = if mapping.fields.is_empty() {
            mapping.field.clone().unwrap_or_else(|| "-".to_string())
        } else {
            mapping.fields.join(",")
        };
        table.push_row(vec![
            mapping.id.to_string(),
            mapping.device_id.clone(),
            mapping.universe.to_string(),
            mapping.channel.to_string(),
            mapping.length.to_string(),
            mapping.mapping_type.clone().unwrap_or_else(|| "range".to_string()),
            fields,
        ]);
    }
    let mut out = table.render(width);
    out.push_str(&format!("Total: {} mapping(s)\n", mappings.len()));
    Ok(out)
}

/// `mappings show ID`.
pub async fn render_show(client: &BridgeClient, id: u64) -> Result<String, ClientError> {
    let mapping = client.mapping(id).await?;
    let value = serde_json::to_value(&mapping).unwrap_or_default();
    Ok(format!("Mapping {id}\n{}", super::render_value(&value, 1)))
}

/// `mappings delete ID`.
pub async fn delete(client: &BridgeClient, id: u64) -> Result<String, ClientError> {
    client.delete_mapping(id).await?;
    Ok(format!("Mapping {id} deleted\n"))
}
