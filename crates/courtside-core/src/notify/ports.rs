// ── Capability ports ──
//
// The notification center depends on these traits, never on a concrete
// backend. `MemoryRepository` and the HTTP adapters implement them.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::model::{Notification, NotificationDraft, NotificationPage, NotificationPreferences, NotificationQuery};

/// Durable store for notifications.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Persist a draft and return it with its assigned id and timestamp.
    async fn create(&self, draft: NotificationDraft) -> Result<Notification, CoreError>;

    /// Page through stored notifications, newest first.
    async fn list(&self, user_id: &str, query: &NotificationQuery) -> Result<NotificationPage, CoreError>;

    async fn mark_read(&self, id: &str) -> Result<(), CoreError>;

    async fn mark_all_read(&self, user_id: &str) -> Result<(), CoreError>;

    async fn delete(&self, id: &str) -> Result<(), CoreError>;

    async fn delete_all(&self, user_id: &str) -> Result<(), CoreError>;

    async fn unread_count(&self, user_id: &str) -> Result<u64, CoreError>;
}

/// Where a user's notification preferences come from.
#[async_trait]
pub trait PreferenceSource: Send + Sync {
    async fn preferences(&self, user_id: &str) -> Result<NotificationPreferences, CoreError>;
}

/// Fixed preferences, for tests and for deployments without a
/// preference store.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticPreferences(pub NotificationPreferences);

#[async_trait]
impl PreferenceSource for StaticPreferences {
    async fn preferences(&self, _user_id: &str) -> Result<NotificationPreferences, CoreError> {
        Ok(self.0)
    }
}
