//! CLI configuration: thin wrapper around `courtside_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--server, --user, --token, ...).

use secrecy::SecretString;

use courtside_core::EngineConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use courtside_config::{
    Config, Profile, config_path, load_config, profile_to_engine_config, save_config,
};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.active_profile_name(global.profile.as_deref())
}

/// Build an `EngineConfig` from the config file, profile, and CLI overrides.
pub fn build_engine_config(global: &GlobalOpts) -> Result<EngineConfig, CliError> {
    let cfg = load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        // No profile -- fall back to flags / env vars alone
        None => {
            let server = global.server.clone().ok_or_else(|| CliError::NoConfig {
                path: config_path().display().to_string(),
            })?;
            Profile::new(server)
        }
    };

    apply_overrides(&mut profile, global);
    let mut engine_config = profile_to_engine_config(&profile, &profile_name)?;

    if let Some(ref token) = global.token {
        engine_config.token = Some(SecretString::from(token.clone()));
    }
    Ok(engine_config)
}

/// Flag values take priority over profile values.
fn apply_overrides(profile: &mut Profile, global: &GlobalOpts) {
    if let Some(ref server) = global.server {
        profile.server.clone_from(server);
    }
    if let Some(ref user) = global.user {
        profile.user_id = Some(user.clone());
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    profile.timeout = Some(global.timeout);
}

pub fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}
