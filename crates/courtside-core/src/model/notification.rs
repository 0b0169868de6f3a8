// ── Notifications and preferences ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Category used for preference filtering and display.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum NotificationType {
    System,
    Alert,
    Info,
    Update,
}

/// One entry in the user's inbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A notification before the store has assigned it an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationDraft {
    pub user_id: String,
    pub title: String,
    pub message: String,
    pub kind: NotificationType,
    pub url: Option<String>,
    pub data: Option<Value>,
}

impl NotificationDraft {
    /// Materialise locally with a fresh v4 id, for when the store is
    /// unavailable or disabled.
    pub fn into_local(self) -> Notification {
        Notification {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: self.user_id,
            title: self.title,
            message: self.message,
            kind: self.kind,
            read: false,
            created_at: Utc::now(),
            url: self.url,
            data: self.data,
        }
    }
}

/// Paging and filter parameters for loading older notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationQuery {
    pub limit: u32,
    pub offset: u32,
    pub kind: Option<NotificationType>,
    pub read: Option<bool>,
}

impl Default for NotificationQuery {
    fn default() -> Self {
        Self {
            limit: 10,
            offset: 0,
            kind: None,
            read: None,
        }
    }
}

impl NotificationQuery {
    pub fn page(limit: u32, offset: u32) -> Self {
        Self {
            limit,
            offset,
            ..Self::default()
        }
    }

    pub fn matches(&self, n: &Notification) -> bool {
        self.kind.is_none_or(|k| n.kind == k) && self.read.is_none_or(|r| n.read == r)
    }
}

/// One page returned by the store.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NotificationPage {
    pub items: Vec<Notification>,
    pub total: Option<u64>,
    pub has_more: bool,
}

// ── Preferences ──────────────────────────────────────────────────────

/// Per-type enable switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeToggles {
    pub system: bool,
    pub alert: bool,
    pub info: bool,
    pub update: bool,
}

impl Default for TypeToggles {
    fn default() -> Self {
        Self {
            system: true,
            alert: true,
            info: true,
            update: true,
        }
    }
}

impl TypeToggles {
    pub fn is_enabled(&self, kind: NotificationType) -> bool {
        match kind {
            NotificationType::System => self.system,
            NotificationType::Alert => self.alert,
            NotificationType::Info => self.info,
            NotificationType::Update => self.update,
        }
    }

    pub fn set(&mut self, kind: NotificationType, enabled: bool) {
        match kind {
            NotificationType::System => self.system = enabled,
            NotificationType::Alert => self.alert = enabled,
            NotificationType::Info => self.info = enabled,
            NotificationType::Update => self.update = enabled,
        }
    }
}

/// User notification preferences.
///
/// The default is the permissive fallback used whenever preferences cannot
/// be loaded: everything enabled, sound and desktop off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationPreferences {
    pub master_enabled: bool,
    pub sound: bool,
    pub desktop: bool,
    pub types: TypeToggles,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            master_enabled: true,
            sound: false,
            desktop: false,
            types: TypeToggles::default(),
        }
    }
}

impl NotificationPreferences {
    /// Whether a notification of this type should be produced at all.
    pub fn allows(&self, kind: NotificationType) -> bool {
        self.master_enabled && self.types.is_enabled(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_preferences_are_permissive_but_quiet() {
        let prefs = NotificationPreferences::default();
        assert!(prefs.master_enabled);
        assert!(!prefs.sound);
        assert!(!prefs.desktop);
        assert!(prefs.allows(NotificationType::Alert));
    }

    #[test]
    fn master_switch_overrides_type_toggles() {
        let prefs = NotificationPreferences {
            master_enabled: false,
            ..NotificationPreferences::default()
        };
        assert!(!prefs.allows(NotificationType::System));
    }

    #[test]
    fn type_parsing_is_case_insensitive() {
        assert_eq!("ALERT".parse::<NotificationType>().ok(), Some(NotificationType::Alert));
        assert!("digest".parse::<NotificationType>().is_err());
    }

    #[test]
    fn query_filters_by_type_and_read_state() {
        let n = NotificationDraft {
            user_id: "u1".into(),
            title: "t".into(),
            message: "m".into(),
            kind: NotificationType::Info,
            url: None,
            data: None,
        }
        .into_local();

        let q = NotificationQuery {
            kind: Some(NotificationType::Info),
            read: Some(false),
            ..NotificationQuery::default()
        };
        assert!(q.matches(&n));
        assert!(!NotificationQuery {
            kind: Some(NotificationType::Alert),
            ..NotificationQuery::default()
        }
        .matches(&n));
    }
}
