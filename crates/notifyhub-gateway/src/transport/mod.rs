//! Transport layer (WebSocket).
//!
//! Exposes the WS upgrade handler that turns an HTTP request into a
//! registered hub connection.

pub mod ws;
