// Store records ↔ domain notifications.

use courtside_api::rest::{
    ListQuery, NotificationCreate, NotificationRecord, NotificationTypeToggles, PreferencesRecord,
};

use crate::model::{
    Notification, NotificationDraft, NotificationPreferences, NotificationQuery, NotificationType,
    TypeToggles,
};

impl From<NotificationRecord> for Notification {
    fn from(record: NotificationRecord) -> Self {
        let kind = record.kind.parse().unwrap_or_else(|_| {
            tracing::debug!(kind = %record.kind, "unknown notification type, treating as info");
            NotificationType::Info
        });
        Self {
            id: record.id,
            user_id: record.user_id,
            title: record.title,
            message: record.message,
            kind,
            read: record.read,
            created_at: record.created_at,
            url: record.url,
            data: record.data,
        }
    }
}

impl From<NotificationDraft> for NotificationCreate {
    fn from(draft: NotificationDraft) -> Self {
        Self {
            user_id: draft.user_id,
            title: draft.title,
            message: draft.message,
            kind: draft.kind.to_string(),
            data: draft.data,
            url: draft.url,
        }
    }
}

impl From<&NotificationQuery> for ListQuery {
    fn from(query: &NotificationQuery) -> Self {
        Self {
            limit: query.limit,
            offset: query.offset,
            kind: query.kind.map(|k| k.to_string()),
            read: query.read,
        }
        .clamped()
    }
}

impl From<NotificationTypeToggles> for TypeToggles {
    fn from(t: NotificationTypeToggles) -> Self {
        Self {
            system: t.system,
            alert: t.alert,
            info: t.info,
            update: t.update,
        }
    }
}

impl From<PreferencesRecord> for NotificationPreferences {
    fn from(record: PreferencesRecord) -> Self {
        Self {
            master_enabled: record.notifications_enabled,
            sound: record.enable_notification_sound,
            desktop: record.enable_desktop_notifications,
            types: record.notification_types.map(Into::into).unwrap_or_default(),
        }
    }
}
