//! Terminal console for the luxlink lighting bridge.
//!
//! The binary wires a [`runtime::Runtime`] over the pure state machines in
//! `luxlink-app`: the runtime owns the terminal and the event loop, spawns
//! controller tasks for streams/watch/fetches, and routes keys by the active
//! mode. This crate holds everything terminal- and network-shaped; behavior
//! lives in `luxlink-app` where it is unit tested.

#![forbid(unsafe_code)]

pub mod handlers;
pub mod input;
pub mod keys;
pub mod runtime;
pub mod tasks;
pub mod ui;

pub use runtime::{Runtime, RuntimeError};
