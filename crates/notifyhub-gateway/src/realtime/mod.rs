//! Realtime runtime (egress engine) for the notification gateway.
//!
//! Hub control loop + per-connection pumps + serialize-once messages.

pub mod connection;
pub mod hub;
pub mod types;

pub use connection::{Backlog, ConnMeta, Connection, ANONYMOUS_CLIENT};
pub use hub::Hub;
pub use types::{ConnId, ConnectionCounts, PreparedMsg};
