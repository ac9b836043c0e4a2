//! WebSocket connection helpers.
//!
//! Thin wrappers over tokio-tungstenite that attach the bridge auth headers
//! during the handshake. Reconnect policy lives with the stream owners, not
//! here.

use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{client::IntoClientRequest, http::HeaderValue},
};

use crate::ClientError;

/// A connected bridge WebSocket stream.
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Open a WebSocket to `url`, attaching auth headers when a key is set.
pub async fn connect(url: &str, api_key: Option<&str>) -> Result<WsStream, ClientError> {
    let mut request = url.into_client_request()?;
    if let Some(key) = api_key {
        let key_value = HeaderValue::from_str(key).map_err(|_| ClientError::InvalidApiKey)?;
        let bearer = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|_| ClientError::InvalidApiKey)?;
        let headers = request.headers_mut();
        headers.insert("X-API-Key", key_value);
        headers.insert("Authorization", bearer);
    }

    let (stream, _response) = connect_async(request).await?;
    Ok(stream)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokio_tungstenite::tungstenite::client::IntoClientRequest;

    #[test]
    fn auth_headers_are_attached_to_request() {
        let mut request = "ws://bridge:8000/logs/stream".into_client_request().unwrap();
        let headers = request.headers_mut();
        headers.insert("X-API-Key", "secret".parse().unwrap());
        headers.insert("Authorization", "Bearer secret".parse().unwrap());

        assert_eq!(request.headers().get("X-API-Key").unwrap(), "secret");
        assert_eq!(request.headers().get("Authorization").unwrap(), "Bearer secret");
    }
}
