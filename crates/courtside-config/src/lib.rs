//! Shared configuration for courtside consumers.
//!
//! TOML profiles, token resolution (env + keyring + plaintext), and
//! translation to `courtside_core::EngineConfig`. The CLI layers its
//! `GlobalOpts` overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use courtside_core::{EngineConfig, NotificationPreferences, ReconnectConfig, TlsVerification};
use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const KEYRING_SERVICE: &str = "courtside";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("no user configured for profile '{profile}'")]
    NoUser { profile: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use: the override, else `default_profile`,
    /// else `"default"`.
    pub fn active_profile_name(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// Push feed reconnection tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReconnectSettings {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Consecutive failures before going offline. 0 retries forever.
    pub max_attempts: u32,
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1_000,
            max_delay_ms: 30_000,
            max_attempts: 10,
        }
    }
}

impl From<ReconnectSettings> for ReconnectConfig {
    fn from(s: ReconnectSettings) -> Self {
        Self {
            initial_delay: Duration::from_millis(s.initial_delay_ms),
            max_delay: Duration::from_millis(s.max_delay_ms),
            max_retries: (s.max_attempts > 0).then_some(s.max_attempts),
        }
    }
}

/// A named backend profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// REST base URL (e.g., "http://localhost:8000").
    pub server: String,

    /// Push feed path on the same host.
    #[serde(default = "default_ws_path")]
    pub ws_path: String,

    /// Signed-in user id. Falls back to `COURTSIDE_USER_ID`.
    pub user_id: Option<String>,

    /// API token (plaintext; prefer keyring or env var).
    pub token: Option<String>,

    /// Environment variable name containing the API token.
    pub token_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override request timeout (seconds).
    pub timeout: Option<u64>,

    /// Store call timeout while dispatching (seconds).
    #[serde(default = "default_store_timeout")]
    pub store_timeout: u64,

    /// Mirror notifications into the backend store.
    #[serde(default = "enabled")]
    pub persistence: bool,

    /// Read preferences from the backend rather than `notifications`.
    #[serde(default = "enabled")]
    pub remote_preferences: bool,

    #[serde(default)]
    pub reconnect: ReconnectSettings,

    /// Local notification preferences.
    #[serde(default)]
    pub notifications: NotificationPreferences,
}

impl Profile {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            ws_path: default_ws_path(),
            user_id: None,
            token: None,
            token_env: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
            store_timeout: default_store_timeout(),
            persistence: true,
            remote_preferences: true,
            reconnect: ReconnectSettings::default(),
            notifications: NotificationPreferences::default(),
        }
    }
}

fn default_ws_path() -> String {
    "/ws".into()
}
fn default_store_timeout() -> u64 {
    5
}
fn enabled() -> bool {
    true
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
///
/// `COURTSIDE_CONFIG` overrides the location.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os("COURTSIDE_CONFIG") {
        return PathBuf::from(path);
    }
    ProjectDirs::from("dev", "courtside", "courtside").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("courtside");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Defaults, then the TOML file at `path`, then `COURTSIDE_*` env vars
/// (nested keys separated by `__`, e.g. `COURTSIDE_DEFAULTS__TIMEOUT`).
pub fn figment_for(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("COURTSIDE_").split("__").ignore(&["config", "user_id"]))
}

/// Load the full Config from file + environment.
///
/// A missing file yields the defaults; a file that exists but does not
/// parse is an error.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = figment_for(path).extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(&path, cfg)?;
    Ok(path)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Resolve the API token from the credential chain (no CLI flag step).
///
/// A backend may run without authentication, so a missing token is not
/// an error.
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    // 1. Profile's token_env → env var lookup
    if let Some(ref env_name) = profile.token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name)) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    profile.token.clone().map(SecretString::from)
}

/// Save a token in the system keyring for `profile_name`.
pub fn store_token(profile_name: &str, token: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))?;
    entry.set_password(token)?;
    Ok(())
}

fn keyring_user(profile_name: &str) -> String {
    format!("{profile_name}/token")
}

/// Resolve the user id: profile, then `COURTSIDE_USER_ID`.
pub fn resolve_user_id(profile: &Profile, profile_name: &str) -> Result<String, ConfigError> {
    profile
        .user_id
        .clone()
        .or_else(|| std::env::var("COURTSIDE_USER_ID").ok())
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ConfigError::NoUser {
            profile: profile_name.into(),
        })
}

// ── Translation ─────────────────────────────────────────────────────

/// Build an `EngineConfig` from a profile, with no CLI flag overrides.
pub fn profile_to_engine_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<EngineConfig, ConfigError> {
    let server_url: url::Url = profile.server.parse().map_err(|_| ConfigError::Validation {
        field: "server".into(),
        reason: format!("invalid URL: {}", profile.server),
    })?;

    let user_id = resolve_user_id(profile, profile_name)?;

    let mut config = EngineConfig::new(server_url, user_id).map_err(|e| ConfigError::Validation {
        field: "server".into(),
        reason: e.to_string(),
    })?;
    config.ws_url =
        courtside_core::config::derive_ws_url(&config.server_url, &profile.ws_path).map_err(
            |e| ConfigError::Validation {
                field: "ws_path".into(),
                reason: e.to_string(),
            },
        )?;

    config.token = resolve_token(profile, profile_name);
    config.tls = if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or_else(default_timeout));
    config.store_timeout = Duration::from_secs(profile.store_timeout);
    config.reconnect = profile.reconnect.into();
    config.persistence = profile.persistence;
    config.remote_preferences = profile.remote_preferences;
    config.preferences = profile.notifications;

    Ok(config)
}
