//! notifyhub gateway library entry.
//!
//! This crate wires the transport, realtime hub, HTTP API, and ops endpoints
//! into the notification service. It is consumed by the binary (`main.rs`)
//! and by integration tests.

pub mod api;
pub mod app_state;
pub mod config;
pub mod obs;
pub mod ops;
pub mod realtime;
pub mod router;
pub mod transport;
