//! WebSocket session handshake.
//!
//! Responsibilities:
//! - Upgrade HTTP -> WS (failures are logged only; no connection is created)
//! - Extract optional `userId` / `clientId` from the query string
//! - Register the connection with the hub, then run its pumps until either
//!   side ends (write pump on its own task, read pump on the upgrade task)

use std::sync::Arc;

use axum::{
    extract::{ws::WebSocket, ws::WebSocketUpgrade, Query, State},
    response::Response,
};
use futures_util::StreamExt;
use serde::Deserialize;
use tracing::Instrument;

use crate::app_state::AppState;
use crate::realtime::connection::run_pumps;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsQuery {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
}

impl WsQuery {
    /// `(client_id, user_id)`; empty strings count as absent.
    pub fn into_identity(self) -> (Option<Arc<str>>, Option<Arc<str>>) {
        let non_empty = |s: Option<String>| s.filter(|v| !v.is_empty()).map(Arc::<str>::from);
        (non_empty(self.client_id), non_empty(self.user_id))
    }
}

pub async fn ws_upgrade(
    State(app): State<AppState>,
    Query(q): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let (client_id, user_id) = q.into_identity();
    let metrics = app.metrics();

    ws.max_message_size(app.cfg().hub.max_message_bytes)
        .on_failed_upgrade(move |e| {
            metrics.ws_upgrade_failures.inc(&[]);
            tracing::error!(error = %e, "failed to upgrade connection");
        })
        .on_upgrade(move |socket| run_session(app, client_id, user_id, socket))
}

async fn run_session(
    app: AppState,
    client_id: Option<Arc<str>>,
    user_id: Option<Arc<str>>,
    socket: WebSocket,
) {
    let hub = app.hub().clone();
    let (conn, rx) = hub.connection(client_id, user_id);
    let meta = conn.meta().clone();

    let span = tracing::info_span!(
        "session",
        conn_id = %meta.id,
        client_id = %meta.client_id,
        user_id = meta.user_id.as_deref().unwrap_or(""),
    );

    if let Err(e) = hub.register(conn) {
        // socket is dropped here, which closes the transport
        span.in_scope(|| tracing::warn!(error = %e, "hub rejected connection"));
        return;
    }
    app.metrics().ws_upgrades.inc(&[]);

    let (sink, stream) = socket.split();
    run_pumps(sink, stream, rx, hub, meta).instrument(span).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_values_are_absent() {
        let q = WsQuery { user_id: Some(String::new()), client_id: Some(String::new()) };
        let (client, user) = q.into_identity();
        assert!(client.is_none());
        assert!(user.is_none());

        let q = WsQuery { user_id: Some("u1".into()), client_id: Some("tab-2".into()) };
        let (client, user) = q.into_identity();
        assert_eq!(client.as_deref(), Some("tab-2"));
        assert_eq!(user.as_deref(), Some("u1"));
    }
}
