//! Mock REST bridge.

use std::{
    io,
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use serde_json::{Value, json};
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
};

/// One recorded HTTP request.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: String,
    /// Path without the query string.
    pub path: String,
    /// Raw query string (possibly empty).
    pub query: String,
    /// `X-API-Key` header value, when sent.
    pub api_key: Option<String>,
}

/// Scriptable response fixtures.
#[derive(Debug, Clone)]
pub struct Fixtures {
    /// `/health` body.
    pub health: Value,
    /// `/status` body.
    pub status: Value,
    /// `/devices` array.
    pub devices: Value,
    /// `/mappings` array.
    pub mappings: Value,
    /// Log entries served by `/logs` and `/logs/search`.
    pub logs: Vec<Value>,
}

impl Default for Fixtures {
    /// Three devices (two online, one offline and stale), three mappings,
    /// four log lines.
    fn default() -> Self {
        Self {
            health: json!({
                "status": "ok",
                "subsystems": {
                    "artnet": {"status": "ok"},
                    "discovery": {"status": "ok"},
                    "sender": {"status": "degraded"},
                },
            }),
            status: json!({
                "uptime_seconds": 3600,
                "protocols": {
                    "govee": {"total": 2, "enabled": 2, "offline": 0},
                    "lifx": {"total": 1, "enabled": 0, "offline": 1},
                },
            }),
            devices: json!([
                {
                    "id": "AA:BB:CC:DD:EE:FF:11:22",
                    "ip": "192.168.1.100",
                    "model_number": "H6160",
                    "device_type": "led_strip",
                    "description": "Living Room Strip",
                    "protocol": "govee",
                    "enabled": true,
                    "configured": true,
                    "offline": false,
                    "stale": false,
                    "last_seen": "2025-12-30T10:00:00Z",
                    "mapping_count": 2,
                },
                {
                    "id": "11:22:33:44:55:66:77:88",
                    "ip": "192.168.1.101",
                    "model_number": "H6199",
                    "device_type": "light_bar",
                    "description": "Bedroom Light Bar",
                    "protocol": "govee",
                    "enabled": true,
                    "configured": false,
                    "offline": false,
                    "stale": false,
                    "last_seen": "2025-12-30T10:00:00Z",
                    "mapping_count": 1,
                },
                {
                    "id": "99:88:77:66:55:44:33:22",
                    "ip": "192.168.1.102",
                    "model_number": "H6182",
                    "device_type": "led_strip",
                    "description": "Office Strip",
                    "protocol": "lifx",
                    "enabled": false,
                    "configured": true,
                    "offline": true,
                    "stale": true,
                    "last_seen": "2025-12-29T15:00:00Z",
                    "mapping_count": 0,
                },
            ]),
            mappings: json!([
                {"id": 1, "device_id": "AA:BB:CC:DD:EE:FF:11:22", "universe": 1,
                 "channel": 1, "length": 3, "mapping_type": "range", "fields": ["r", "g", "b"]},
                {"id": 2, "device_id": "11:22:33:44:55:66:77:88", "universe": 1,
                 "channel": 10, "length": 4, "mapping_type": "range", "fields": ["r", "g", "b", "w"]},
                {"id": 3, "device_id": "AA:BB:CC:DD:EE:FF:11:22", "universe": 2,
                 "channel": 1, "length": 1, "mapping_type": "discrete", "field": "brightness"},
            ]),
            logs: vec![
                json!({"timestamp": "2025-12-30T10:00:00Z", "level": "INFO",
                       "logger": "artnet", "message": "ArtNet packet received on universe 1"}),
                json!({"timestamp": "2025-12-30T10:00:01Z", "level": "DEBUG",
                       "logger": "devices", "message": "Device state updated"}),
                json!({"timestamp": "2025-12-30T10:00:02Z", "level": "WARNING",
                       "logger": "queue", "message": "Queue depth exceeding threshold: 150"}),
                json!({"timestamp": "2025-12-30T10:00:03Z", "level": "ERROR",
                       "logger": "sender", "message": "Failed to send command: timeout"}),
            ],
        }
    }
}

/// Running mock bridge.
pub struct MockBridge {
    addr: SocketAddr,
    fixtures: Arc<Mutex<Fixtures>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    task: tokio::task::JoinHandle<()>,
}

impl MockBridge {
    /// Bind on an ephemeral loopback port with default fixtures.
    pub async fn start() -> io::Result<Self> {
        Self::start_with(Fixtures::default()).await
    }

    /// Bind with explicit fixtures.
    pub async fn start_with(fixtures: Fixtures) -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let fixtures = Arc::new(Mutex::new(fixtures));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let serve_fixtures = Arc::clone(&fixtures);
        let serve_requests = Arc::clone(&requests);
        let task = tokio::spawn(async move {
            loop {
                let Ok((stream, _peer)) = listener.accept().await else {
                    return;
                };
                let fixtures = Arc::clone(&serve_fixtures);
                let requests = Arc::clone(&serve_requests);
                tokio::spawn(async move {
                    if let Err(error) = serve_connection(stream, &fixtures, &requests).await {
                        tracing::debug!(%error, "mock bridge connection error");
                    }
                });
            }
        });

        Ok(Self { addr, fixtures, requests, task })
    }

    /// Base HTTP URL.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Replace the log fixture.
    pub fn set_logs(&self, logs: Vec<Value>) {
        if let Ok(mut fixtures) = self.fixtures.lock() {
            fixtures.logs = logs;
        }
    }

    /// All requests seen so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Requests matching a path, rendered as `METHOD path?query`.
    pub fn request_lines(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| {
                if r.query.is_empty() {
                    format!("{} {}", r.method, r.path)
                } else {
                    format!("{} {}?{}", r.method, r.path, r.query)
                }
            })
            .collect()
    }
}

impl Drop for MockBridge {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve_connection(
    stream: TcpStream,
    fixtures: &Mutex<Fixtures>,
    requests: &Mutex<Vec<RecordedRequest>>,
) -> io::Result<()> {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("").to_string();
    let target = parts.next().unwrap_or("/").to_string();

    let mut content_length = 0usize;
    let mut api_key = None;
    loop {
        let mut header = String::new();
        reader.read_line(&mut header).await?;
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.parse().unwrap_or(0);
            } else if name.eq_ignore_ascii_case("x-api-key") {
                api_key = Some(value.to_string());
            }
        }
    }

    let mut body = vec![0u8; content_length];
    if content_length > 0 {
        reader.read_exact(&mut body).await?;
    }

    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path.to_string(), query.to_string()),
        None => (target.clone(), String::new()),
    };
    if let Ok(mut log) = requests.lock() {
        log.push(RecordedRequest {
            method: method.clone(),
            path: path.clone(),
            query: query.clone(),
            api_key,
        });
    }

    let request_body: Option<Value> = serde_json::from_slice(&body).ok();
    let (status, body) = route(&method, &path, &query, request_body.as_ref(), fixtures);
    let payload = body.to_string();
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
        payload.len()
    );
    let mut stream = reader.into_inner();
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

fn route(
    method: &str,
    path: &str,
    query: &str,
    body: Option<&Value>,
    fixtures: &Mutex<Fixtures>,
) -> (&'static str, Value) {
    let Ok(fixtures) = fixtures.lock() else {
        return ("500 Internal Server Error", json!({"detail": "lock poisoned"}));
    };
    let params = parse_query(query);
    let get = |key: &str| params.iter().find(|(k, _)| k.as_str() == key).map(|(_, v)| v.clone());

    match (method, path) {
        ("GET", "/health") => ("200 OK", fixtures.health.clone()),
        ("GET", "/status") => ("200 OK", fixtures.status.clone()),
        ("GET", "/devices") => ("200 OK", fixtures.devices.clone()),
        ("GET", "/mappings") => ("200 OK", fixtures.mappings.clone()),
        ("POST", "/reload") => ("200 OK", json!({"status": "reloaded"})),
        ("GET", "/logs") => {
            let level = get("level");
            let logger = get("logger");
            let limit = get("limit").and_then(|v| v.parse::<usize>().ok()).unwrap_or(50);
            let offset = get("offset").and_then(|v| v.parse::<usize>().ok()).unwrap_or(0);

            let matching: Vec<Value> = fixtures
                .logs
                .iter()
                .filter(|log| {
                    level.as_deref().is_none_or(|l| log.get("level").and_then(Value::as_str) == Some(l))
                        && logger.as_deref().is_none_or(|l| {
                            log.get("logger")
                                .and_then(Value::as_str)
                                .is_some_and(|name| name.starts_with(l))
                        })
                })
                .cloned()
                .collect();
            let total = matching.len();
            let page: Vec<Value> = matching.into_iter().skip(offset).take(limit).collect();
            ("200 OK", json!({"logs": page, "total": total, "limit": limit, "offset": offset}))
        },
        ("GET", "/logs/search") => {
            let pattern = get("pattern").unwrap_or_default().to_ascii_lowercase();
            let limit = get("limit").and_then(|v| v.parse::<usize>().ok()).unwrap_or(100);
            let matches: Vec<Value> = fixtures
                .logs
                .iter()
                .filter(|log| {
                    log.get("message")
                        .and_then(Value::as_str)
                        .is_some_and(|m| m.to_ascii_lowercase().contains(&pattern))
                })
                .take(limit)
                .cloned()
                .collect();
            let count = matches.len();
            ("200 OK", json!({"logs": matches, "count": count}))
        },
        ("GET", "/channel-map") => {
            let mut by_universe: serde_json::Map<String, Value> = serde_json::Map::new();
            if let Some(mappings) = fixtures.mappings.as_array() {
                for mapping in mappings {
                    let universe =
                        mapping.get("universe").and_then(Value::as_u64).unwrap_or(0).to_string();
                    let entry = json!({
                        "device_id": mapping.get("device_id").cloned().unwrap_or(Value::Null),
                        "channel": mapping.get("channel").cloned().unwrap_or(Value::Null),
                        "length": mapping.get("length").cloned().unwrap_or(Value::Null),
                        "mapping_id": mapping.get("id").cloned().unwrap_or(Value::Null),
                    });
                    match by_universe.get_mut(&universe) {
                        Some(Value::Array(list)) => list.push(entry),
                        _ => {
                            by_universe.insert(universe, json!([entry]));
                        },
                    }
                }
            }
            ("200 OK", Value::Object(by_universe))
        },
        ("POST", "/devices") => {
            let mut device = json!({
                "enabled": true, "configured": false, "offline": false,
                "stale": false, "manual": true, "discovered": false,
            });
            merge(&mut device, body);
            ("200 OK", device)
        },
        ("POST", "/mappings") => {
            let mut mapping = json!({"id": 99, "channel": 1, "length": 1});
            merge(&mut mapping, body);
            ("200 OK", mapping)
        },
        ("GET", path) if path.starts_with("/devices/") => {
            let id = path.trim_start_matches("/devices/");
            match find_device(&fixtures, id) {
                Some(device) => ("200 OK", device),
                None => ("404 Not Found", json!({"detail": "Device not found"})),
            }
        },
        ("PATCH", path) if path.starts_with("/devices/") => {
            let id = path.trim_start_matches("/devices/");
            match find_device(&fixtures, id) {
                Some(mut device) => {
                    merge(&mut device, body);
                    ("200 OK", device)
                },
                None => ("404 Not Found", json!({"detail": "Device not found"})),
            }
        },
        ("POST", path) if path.starts_with("/devices/") && path.ends_with("/test") => {
            ("200 OK", json!({"status": "sent", "payload": body.cloned().unwrap_or(Value::Null)}))
        },
        ("POST", path) if path.starts_with("/devices/") && path.ends_with("/command") => {
            ("200 OK", json!({"status": "ok", "command": body.cloned().unwrap_or(Value::Null)}))
        },
        ("GET", path) if path.starts_with("/mappings/") => {
            match find_mapping(&fixtures, path) {
                Some(mapping) => ("200 OK", mapping),
                None => ("404 Not Found", json!({"detail": "Mapping not found"})),
            }
        },
        ("PUT", path) if path.starts_with("/mappings/") => {
            match find_mapping(&fixtures, path) {
                Some(mut mapping) => {
                    merge(&mut mapping, body);
                    ("200 OK", mapping)
                },
                None => ("404 Not Found", json!({"detail": "Mapping not found"})),
            }
        },
        ("DELETE", path) if path.starts_with("/mappings/") => {
            match find_mapping(&fixtures, path) {
                Some(_) => ("200 OK", json!({"status": "deleted"})),
                None => ("404 Not Found", json!({"detail": "Mapping not found"})),
            }
        },
        _ => ("404 Not Found", json!({"detail": "Not found"})),
    }
}

fn find_device(fixtures: &Fixtures, id: &str) -> Option<Value> {
    fixtures
        .devices
        .as_array()?
        .iter()
        .find(|d| d.get("id").and_then(Value::as_str) == Some(id))
        .cloned()
}

fn find_mapping(fixtures: &Fixtures, path: &str) -> Option<Value> {
    let id = path.trim_start_matches("/mappings/").trim_end_matches('/').parse::<u64>().ok()?;
    fixtures
        .mappings
        .as_array()?
        .iter()
        .find(|m| m.get("id").and_then(Value::as_u64) == Some(id))
        .cloned()
}

/// Shallow-merge a request body's object keys into `target`.
fn merge(target: &mut Value, body: Option<&Value>) {
    let (Value::Object(target), Some(Value::Object(updates))) = (target, body) else {
        return;
    };
    for (key, value) in updates {
        target.insert(key.clone(), value.clone());
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (percent_decode(key), percent_decode(value)),
            None => (percent_decode(pair), String::new()),
        })
        .collect()
}

fn percent_decode(raw: &str) -> String {
    fn hex(byte: u8) -> Option<u8> {
        match byte {
            b'0'..=b'9' => Some(byte - b'0'),
            b'a'..=b'f' => Some(byte - b'a' + 10),
            b'A'..=b'F' => Some(byte - b'A' + 10),
            _ => None,
        }
    }

    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => match (hex(bytes[i + 1]), hex(bytes[i + 2])) {
                (Some(high), Some(low)) => {
                    out.push(high * 16 + low);
                    i += 3;
                },
                _ => {
                    out.push(b'%');
                    i += 1;
                },
            },
            b'+' => {
                out.push(b' ');
                i += 1;
            },
            byte => {
                out.push(byte);
                i += 1;
            },
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}
