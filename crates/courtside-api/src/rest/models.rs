// REST request/response bodies for the notification store and the
// preference document.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A persisted notification as returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /notifications`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationCreate {
    pub user_id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Query parameters for `GET /notifications`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListQuery {
    pub limit: u32,
    pub offset: u32,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
}

impl ListQuery {
    pub const MAX_LIMIT: u32 = 100;

    /// The server rejects limits outside `1..=100`.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.limit = self.limit.clamp(1, Self::MAX_LIMIT);
        self
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            limit: 10,
            offset: 0,
            kind: None,
            read: None,
        }
    }
}

/// One page of notifications.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NotificationListResponse {
    pub data: Vec<NotificationRecord>,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct UnreadCountResponse {
    pub count: u64,
}

/// Per-type toggles inside the preference document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationTypeToggles {
    #[serde(default = "enabled")]
    pub system: bool,
    #[serde(default = "enabled")]
    pub alert: bool,
    #[serde(default = "enabled")]
    pub info: bool,
    #[serde(default = "enabled")]
    pub update: bool,
}

/// `GET /users/{id}/preferences`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesRecord {
    #[serde(default = "enabled")]
    pub notifications_enabled: bool,
    #[serde(default = "enabled")]
    pub enable_notification_sound: bool,
    #[serde(default)]
    pub enable_desktop_notifications: bool,
    #[serde(default)]
    pub notification_types: Option<NotificationTypeToggles>,
}

fn enabled() -> bool {
    true
}

/// Accept RFC 3339 timestamps and the naive `YYYY-MM-DDTHH:MM:SS[.f]` form
/// some backends emit, which is read as UTC.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_accepts_naive_timestamps() {
        let record: NotificationRecord = serde_json::from_value(json!({
            "id": "n1",
            "user_id": "u1",
            "title": "t",
            "message": "m",
            "type": "alert",
            "read": false,
            "created_at": "2026-02-10T12:00:00.123456"
        }))
        .unwrap();
        assert_eq!(record.created_at.to_rfc3339(), "2026-02-10T12:00:00.123456+00:00");
    }

    #[test]
    fn preferences_default_missing_fields() {
        let prefs: PreferencesRecord = serde_json::from_value(json!({})).unwrap();
        assert!(prefs.notifications_enabled);
        assert!(prefs.enable_notification_sound);
        assert!(!prefs.enable_desktop_notifications);
        assert!(prefs.notification_types.is_none());
    }

    #[test]
    fn list_query_clamps_limit() {
        let q = ListQuery {
            limit: 500,
            ..ListQuery::default()
        }
        .clamped();
        assert_eq!(q.limit, 100);

        let q = ListQuery {
            limit: 0,
            ..ListQuery::default()
        }
        .clamped();
        assert_eq!(q.limit, 1);
    }
}
