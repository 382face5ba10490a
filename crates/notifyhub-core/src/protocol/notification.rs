//! Notification envelope (JSON).
//!
//! A `Notification` is immutable once built: the gateway serializes it once
//! and fans the same text out to every matching connection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{NotifyError, Result};

/// Body of a send-notification request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyRequest {
    /// Target user. Absent or empty means broadcast to everyone.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Category tag (field name is `type` in JSON).
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    /// Arbitrary key-value payload.
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
}

impl NotifyRequest {
    /// Required fields must be present and non-empty.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("type", &self.kind),
            ("title", &self.title),
            ("message", &self.message),
        ] {
            if value.is_empty() {
                return Err(NotifyError::BadRequest(format!("{field} is required")));
            }
        }
        Ok(())
    }

    /// Target user id, with empty strings treated as "no target".
    pub fn target_user(&self) -> Option<&str> {
        self.user_id.as_deref().filter(|u| !u.is_empty())
    }
}

/// Notification pushed to subscribers.
///
/// Wire shape:
/// `{"id","userId"?,"type","title","message","data"?,"timestamp"}` where
/// `userId` and `data` are omitted when empty and `timestamp` is RFC3339.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    /// Build a notification with a fresh id and the current time.
    pub fn new(
        user_id: Option<&str>,
        kind: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
        data: Map<String, Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.unwrap_or_default().to_string(),
            kind: kind.into(),
            title: title.into(),
            message: message.into(),
            data,
            timestamp: Utc::now(),
        }
    }

    /// Validate a request and turn it into a notification.
    pub fn from_request(req: NotifyRequest) -> Result<Self> {
        req.validate()?;
        let user = req.target_user().map(str::to_owned);
        Ok(Self::new(
            user.as_deref(),
            req.kind,
            req.title,
            req.message,
            req.data.unwrap_or_default(),
        ))
    }

    /// Target user, if this is not a broadcast.
    pub fn target_user(&self) -> Option<&str> {
        Some(self.user_id.as_str()).filter(|u| !u.is_empty())
    }

    /// Serialize to the wire text.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| NotifyError::Internal(format!("notification encode failed: {e}")))
    }
}
