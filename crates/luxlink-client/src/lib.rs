//! Bridge API client.
//!
//! Typed access to the lighting bridge's REST and WebSocket surface. The
//! bridge performs device discovery and protocol translation; this crate only
//! consumes its API: health/status probes, device and mapping CRUD, paginated
//! log queries, and the two push streams (`/logs/stream`, `/events/stream`).
//!
//! An optional API key is attached to every HTTP request and WebSocket
//! handshake as both an `X-API-Key` header and a `Bearer` authorization.

#![forbid(unsafe_code)]

mod error;
mod rest;
mod types;
pub mod ws;

pub use error::ClientError;
pub use rest::{BridgeClient, LogQuery};
pub use types::{
    BridgeEvent, Device, Health, LogEntry, LogsPage, Mapping, SearchResults, SubsystemHealth,
};
