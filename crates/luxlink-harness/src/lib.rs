//! In-process mock bridge for integration tests.
//!
//! Two pieces, mirroring the bridge's two surfaces:
//! - [`MockBridge`]: a loopback HTTP/1.1 responder serving the REST
//!   endpoints from scriptable JSON fixtures, recording every request.
//! - [`MockStream`]: a WebSocket listener that plays a scripted message
//!   sequence per connection, then optionally closes — enough to drive the
//!   reconnect state machine through its whole lifecycle.
//!
//! Tests explicitly start these servers and drive the real client against
//! them; no network mocking layers involved.

#![forbid(unsafe_code)]

mod bridge;
mod stream;

pub use bridge::{Fixtures, MockBridge, RecordedRequest};
pub use stream::MockStream;
