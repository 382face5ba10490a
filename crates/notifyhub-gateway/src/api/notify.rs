//! Send-notification and connection-count endpoints.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use notifyhub_core::error::NotifyError;
use notifyhub_core::protocol::{Notification, NotifyRequest};

use super::{success, ApiError};
use crate::app_state::AppState;

/// POST /api/v1/notify
///
/// Succeeds once the notification is handed to the hub, whether or not any
/// connection receives it.
pub async fn send_notification(
    State(app): State<AppState>,
    payload: Result<Json<NotifyRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    if app.is_draining() {
        return Err(NotifyError::HubClosed.into());
    }

    let Json(req) = payload.map_err(|e| {
        tracing::warn!(error = %e.body_text(), "invalid notification request");
        NotifyError::BadRequest("Invalid request payload".into())
    })?;

    let n = Notification::from_request(req)?;
    app.hub().dispatch(&n)?;

    let target = if n.target_user().is_some() { "user" } else { "all" };
    app.metrics().notifications.inc(&[("target", target)]);
    tracing::info!(id = %n.id, kind = %n.kind, user_id = %n.user_id, "notification sent");

    Ok(success(json!({
        "id": n.id,
        "timestamp": n.timestamp,
        "status": "sent",
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionsQuery {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// GET /api/v1/connections
pub async fn active_connections(
    State(app): State<AppState>,
    Query(q): Query<ConnectionsQuery>,
) -> Result<Json<Value>, ApiError> {
    let user = q.user_id.filter(|u| !u.is_empty());
    let counts = app.hub().counts(user.as_deref()).await?;

    let mut stats = json!({ "totalConnections": counts.total });
    if let (Some(user), Some(n)) = (user, counts.user) {
        stats["userConnections"] = json!(n);
        stats["userId"] = json!(user);
    }
    Ok(success(stats))
}
