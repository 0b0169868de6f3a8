// ── Runtime engine configuration ──
//
// Describes how to reach the backend and how the pipeline behaves. Carries
// credentials and tuning but never touches disk: the config crate or the
// embedding application builds an `EngineConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use courtside_api::{HttpConfig, ReconnectConfig, TlsMode};
use secrecy::SecretString;
use url::Url;

use crate::error::CoreError;
use crate::model::NotificationPreferences;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (local development backends).
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => Self::System,
            TlsVerification::CustomCa(path) => Self::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => Self::DangerAcceptInvalid,
        }
    }
}

/// Everything the engine needs for one signed-in session.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// REST base URL (e.g. `http://localhost:8000`).
    pub server_url: Url,
    /// Push feed endpoint (e.g. `ws://localhost:8000/ws`).
    pub ws_url: Url,
    /// Signed-in user; notifications are created for and scoped to it.
    pub user_id: String,
    /// Bearer token for REST calls and the push feed handshake.
    pub token: Option<SecretString>,
    pub tls: TlsVerification,
    /// REST request timeout.
    pub timeout: Duration,
    pub reconnect: ReconnectConfig,
    /// Upper bound on any single store call made while dispatching.
    pub store_timeout: Duration,
    /// Mirror notifications into the backend store. When off, records
    /// are kept in process memory only.
    pub persistence: bool,
    /// Read preferences from the backend instead of `preferences`.
    pub remote_preferences: bool,
    /// Local preferences, used when `remote_preferences` is off.
    pub preferences: NotificationPreferences,
}

impl EngineConfig {
    /// Defaults for a backend at `server_url`, with the push feed at
    /// `/ws` on the same host.
    pub fn new(server_url: Url, user_id: impl Into<String>) -> Result<Self, CoreError> {
        let ws_url = derive_ws_url(&server_url, "/ws")?;
        Ok(Self {
            server_url,
            ws_url,
            user_id: user_id.into(),
            token: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            reconnect: ReconnectConfig::default(),
            store_timeout: Duration::from_secs(5),
            persistence: true,
            remote_preferences: true,
            preferences: NotificationPreferences::default(),
        })
    }

    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            tls: TlsMode::from(&self.tls),
            timeout: self.timeout,
        }
    }
}

/// Map an `http(s)` base URL onto its `ws(s)` endpoint at `path`.
pub fn derive_ws_url(server_url: &Url, path: &str) -> Result<Url, CoreError> {
    let scheme = match server_url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(CoreError::Config {
                message: format!("unsupported URL scheme '{other}' in {server_url}"),
            });
        }
    };

    let mut ws = server_url.clone();
    ws.set_scheme(scheme).map_err(|()| CoreError::Config {
        message: format!("cannot derive push feed URL from {server_url}"),
    })?;
    let base = ws.path().trim_end_matches('/').to_owned();
    ws.set_path(&format!("{base}/{}", path.trim_start_matches('/')));
    ws.set_query(None);
    Ok(ws)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ws_url_follows_server_scheme() {
        let plain = derive_ws_url(&Url::parse("http://localhost:8000").unwrap(), "/ws").unwrap();
        assert_eq!(plain.as_str(), "ws://localhost:8000/ws");

        let secure =
            derive_ws_url(&Url::parse("https://stats.example.com/app/").unwrap(), "ws").unwrap();
        assert_eq!(secure.as_str(), "wss://stats.example.com/app/ws");
    }

    #[test]
    fn unsupported_scheme_is_a_config_error() {
        let err = derive_ws_url(&Url::parse("ftp://host").unwrap(), "/ws").unwrap_err();
        assert!(matches!(err, CoreError::Config { .. }));
    }

    #[test]
    fn new_fills_defaults() {
        let config = EngineConfig::new(Url::parse("http://localhost:8000").unwrap(), "u1").unwrap();
        assert_eq!(config.ws_url.as_str(), "ws://localhost:8000/ws");
        assert!(config.persistence);
        assert_eq!(config.store_timeout, Duration::from_secs(5));
        assert_eq!(config.reconnect.max_retries, Some(10));
    }
}
