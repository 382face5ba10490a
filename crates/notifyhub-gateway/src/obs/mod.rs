//! Lightweight in-process metrics.
//!
//! Metrics are stored as atomics keyed by label sets and rendered in the
//! Prometheus text format by the `/metrics` handler.

pub mod metrics;
