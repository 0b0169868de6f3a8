// ── Backend-backed capabilities ──

use async_trait::async_trait;
use courtside_api::RestClient;
use courtside_api::rest::NotificationCreate;

use super::ports::{NotificationRepository, PreferenceSource};
use crate::config::EngineConfig;
use crate::error::CoreError;
use crate::model::{Notification, NotificationDraft, NotificationPage, NotificationPreferences, NotificationQuery};

/// Notification store on the backend's REST API.
///
/// The backend scopes every call to the token's user, so the `user_id`
/// arguments are only used when creating.
#[derive(Clone)]
pub struct HttpNotificationRepository {
    client: RestClient,
}

impl HttpNotificationRepository {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    /// Build a standalone store client for `config`'s backend.
    pub fn from_config(config: &EngineConfig) -> Result<Self, CoreError> {
        let client = RestClient::new(
            config.server_url.clone(),
            &config.http_config(),
            config.token.clone(),
        )?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl NotificationRepository for HttpNotificationRepository {
    async fn create(&self, draft: NotificationDraft) -> Result<Notification, CoreError> {
        let body = NotificationCreate::from(draft);
        let record = self.client.create_notification(&body).await?;
        Ok(record.into())
    }

    async fn list(
        &self,
        _user_id: &str,
        query: &NotificationQuery,
    ) -> Result<NotificationPage, CoreError> {
        let response = self.client.list_notifications(&query.into()).await?;
        Ok(NotificationPage {
            items: response.data.into_iter().map(Into::into).collect(),
            total: Some(response.total),
            has_more: response.has_more,
        })
    }

    async fn mark_read(&self, id: &str) -> Result<(), CoreError> {
        self.client.mark_read(id).await?;
        Ok(())
    }

    async fn mark_all_read(&self, _user_id: &str) -> Result<(), CoreError> {
        Ok(self.client.mark_all_read().await?)
    }

    async fn delete(&self, id: &str) -> Result<(), CoreError> {
        Ok(self.client.delete_notification(id).await?)
    }

    async fn delete_all(&self, _user_id: &str) -> Result<(), CoreError> {
        Ok(self.client.delete_all_notifications().await?)
    }

    async fn unread_count(&self, _user_id: &str) -> Result<u64, CoreError> {
        Ok(self.client.unread_count().await?)
    }
}

/// Preferences from the backend's per-user document.
#[derive(Clone)]
pub struct HttpPreferenceSource {
    client: RestClient,
}

impl HttpPreferenceSource {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PreferenceSource for HttpPreferenceSource {
    async fn preferences(&self, user_id: &str) -> Result<NotificationPreferences, CoreError> {
        self.client
            .get_preferences(user_id)
            .await
            .map(Into::into)
            .map_err(|e| CoreError::Preference {
                message: e.to_string(),
            })
    }
}
