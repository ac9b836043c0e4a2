//! One-shot command handlers.
//!
//! Each handler performs its REST calls and returns the rendered output as a
//! `String`. The caller decides where the text lands: the main output buffer
//! in normal mode, or the watch overlay when the watch task drives the same
//! renderer. Nothing here writes to shared state.

pub mod devices;
pub mod mappings;
pub mod monitoring;
pub mod system;

use serde_json::Value;

/// Render a JSON value as indented `key: value` lines with sorted keys.
/// Used for `/status`, device detail, and similar free-form payloads.
pub(crate) fn render_value(value: &Value, indent: usize) -> String {
    let pad = "  ".repeat(indent);
    match value {
        Value::Object(map) => {
            let mut out = String::new();
            for (key, nested) in map {
                match nested {
                    Value::Object(_) | Value::Array(_) => {
                        out.push_str(&format!("{pad}{key}:\n"));
                        out.push_str(&render_value(nested, indent + 1));
                    },
                    scalar => out.push_str(&format!("{pad}{key}: {}\n", scalar_text(scalar))),
                }
            }
            out
        },
        Value::Array(items) => {
            let mut out = String::new();
            for item in items {
                match item {
                    Value::Object(_) | Value::Array(_) => {
                        out.push_str(&format!("{pad}-\n"));
                        out.push_str(&render_value(item, indent + 1));
                    },
                    scalar => out.push_str(&format!("{pad}- {}\n", scalar_text(scalar))),
                }
            }
            out
        },
        scalar => format!("{pad}{}\n", scalar_text(scalar)),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_nested_objects_with_indentation() {
        let value = serde_json::json!({
            "uptime": 120,
            "queues": {"artnet": 3},
            "protocols": ["govee", "lifx"],
        });
        let rendered = render_value(&value, 0);
        assert!(rendered.contains("uptime: 120\n"));
        assert!(rendered.contains("queues:\n  artnet: 3\n"));
        assert!(rendered.contains("protocols:\n  - govee\n  - lifx\n"));
    }
}
