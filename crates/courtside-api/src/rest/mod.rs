// REST client for the notification store and preference endpoints.
//
// All paths live under `{base}/api/v1/`; ids are single path segments. A bearer token, when configured,
// is attached to every request. Non-success statuses are mapped onto
// `Error::Authentication` (401/403) or `Error::Api`.

pub mod models;

use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::http::HttpConfig;

pub use models::{
    ListQuery, NotificationCreate, NotificationListResponse, NotificationRecord,
    NotificationTypeToggles, PreferencesRecord, UnreadCountResponse,
};

/// HTTP client for the backend's `/api/v1` surface.
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl RestClient {
    /// Build a client with its own `reqwest::Client`.
    pub fn new(base_url: Url, config: &HttpConfig, token: Option<SecretString>) -> Result<Self, Error> {
        let http = config.build_client()?;
        Ok(Self::with_client(http, base_url, token))
    }

    /// Reuse an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, token: Option<SecretString>) -> Self {
        Self {
            http,
            base_url,
            token,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Notifications ────────────────────────────────────────────────

    pub async fn create_notification(
        &self,
        body: &NotificationCreate,
    ) -> Result<NotificationRecord, Error> {
        let url = self.api_url(&["notifications"])?;
        debug!("POST {url}");
        Self::send_json(self.request(Method::POST, url).json(body)).await
    }

    /// Fetch one page. The limit is clamped to what the server accepts.
    pub async fn list_notifications(
        &self,
        query: &ListQuery,
    ) -> Result<NotificationListResponse, Error> {
        let url = self.api_url(&["notifications"])?;
        let query = query.clone().clamped();
        debug!(limit = query.limit, offset = query.offset, "GET {url}");
        Self::send_json(self.request(Method::GET, url).query(&query))
            .await
    }

    pub async fn unread_count(&self) -> Result<u64, Error> {
        let url = self.api_url(&["notifications", "unread-count"])?;
        debug!("GET {url}");
        let resp: UnreadCountResponse = Self::send_json(self.request(Method::GET, url)).await?;
        Ok(resp.count)
    }

    pub async fn mark_read(&self, id: &str) -> Result<NotificationRecord, Error> {
        let url = self.api_url(&["notifications", id, "read"])?;
        debug!("PATCH {url}");
        Self::send_json(self.request(Method::PATCH, url)).await
    }

    pub async fn mark_all_read(&self) -> Result<(), Error> {
        let url = self.api_url(&["notifications", "mark-all-read"])?;
        debug!("PATCH {url}");
        Self::send_empty(self.request(Method::PATCH, url)).await
    }

    pub async fn delete_notification(&self, id: &str) -> Result<(), Error> {
        let url = self.api_url(&["notifications", id])?;
        debug!("DELETE {url}");
        Self::send_empty(self.request(Method::DELETE, url)).await
    }

    pub async fn delete_all_notifications(&self) -> Result<(), Error> {
        let url = self.api_url(&["notifications"])?;
        debug!("DELETE {url}");
        Self::send_empty(self.request(Method::DELETE, url)).await
    }

    // ── Preferences ──────────────────────────────────────────────────

    pub async fn get_preferences(&self, user_id: &str) -> Result<PreferencesRecord, Error> {
        let url = self.api_url(&["users", user_id, "preferences"])?;
        debug!("GET {url}");
        Self::send_json(self.request(Method::GET, url)).await
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// `{base}/api/v1/` followed by `segments`, each percent-encoded so
    /// an id can never address a different endpoint.
    fn api_url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut target = self.base_url.clone();
        target
            .path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(["api", "v1"])
            .extend(segments);
        Ok(target)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, Error> {
        let body = Self::execute(builder).await?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    async fn send_empty(builder: RequestBuilder) -> Result<(), Error> {
        Self::execute(builder).await.map(|_| ())
    }

    async fn execute(builder: RequestBuilder) -> Result<String, Error> {
        let resp = builder.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Authentication {
                message: error_detail(&body).unwrap_or_else(|| "invalid or expired token".into()),
            });
        }
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: error_detail(&body).unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_owned()
                }),
            });
        }
        Ok(body)
    }
}

/// Pull a human-readable message out of an error body (`{"detail": ...}`).
fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail").or_else(|| value.get("message"))? {
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
