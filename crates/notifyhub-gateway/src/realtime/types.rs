use std::fmt;
use std::sync::Arc;

use axum::extract::ws::Message;

use notifyhub_core::error::Result;
use notifyhub_core::protocol::Notification;

/// Identifier assigned to each connection by the hub handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnId(pub u64);

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Prepared message cached for broadcasting (serialize once, send N times).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedMsg(Arc<str>);

impl PreparedMsg {
    pub fn prepare(n: &Notification) -> Result<Self> {
        Ok(Self(n.to_json()?.into()))
    }

    /// Wrap already-serialized text.
    pub fn text(s: impl Into<Arc<str>>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to axum::ws::Message for transport.
    /// NOTE: axum::Message::Text owns a String, so each recipient gets a copy.
    pub fn to_ws_message(&self) -> Message {
        Message::Text(self.0.to_string())
    }
}

/// Point-in-time view of hub membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionCounts {
    pub total: usize,
    /// Present only when a user was asked for.
    pub user: Option<usize>,
}
