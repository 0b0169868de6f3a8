//! Config subcommand handlers.

use serde::Serialize;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output::{self, Printable};

const DEFAULT_SERVER: &str = "http://localhost:8000";

/// Copy of `cfg` with plaintext tokens masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.token.is_some() {
            profile.token = Some("****".into());
        }
    }
    cfg
}

fn render_toml(cfg: &Config) -> String {
    toml::to_string_pretty(cfg).unwrap_or_else(|e| format!("# failed to render config: {e}"))
}

/// The effective configuration as `config show` prints it.
#[derive(Serialize)]
#[serde(transparent)]
struct Shown(Config);

impl Printable for Shown {
    fn human(&self) -> String {
        render_toml(&self.0)
    }

    fn plain(&self) -> String {
        render_toml(&self.0)
    }
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let shown = Shown(redacted(&config::load_config()?));
            output::print_output(&output::render(&global.output, &shown), global.quiet);
            Ok(())
        }

        ConfigCommand::Init {
            store_token,
            default,
            force,
        } => {
            let mut cfg = courtside_config::load_config()?;
            let name = global.profile.clone().unwrap_or_else(|| "default".into());

            if cfg.profiles.contains_key(&name) && !force {
                return Err(CliError::ProfileExists { name });
            }

            let user = global
                .user
                .clone()
                .ok_or_else(|| CliError::NoUser { profile: name.clone() })?;
            let server = global.server.as_deref().unwrap_or(DEFAULT_SERVER);
            url::Url::parse(server).map_err(|e| CliError::Validation {
                field: "server".into(),
                reason: format!("invalid URL '{server}': {e}"),
            })?;

            let mut profile = Profile::new(server);
            profile.user_id = Some(user);
            if global.insecure {
                profile.insecure = Some(true);
            }

            if let Some(ref token) = store_token {
                courtside_config::store_token(&name, token)?;
                eprintln!("   ✓ token stored in system keyring");
            }

            cfg.profiles.insert(name.clone(), profile);
            if default || cfg.profiles.len() == 1 {
                cfg.default_profile = Some(name.clone());
            }

            let path = config::save_config(&cfg)?;
            output::print_output(
                &format!("Saved profile '{name}' to {}", path.display()),
                global.quiet,
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_masks_plaintext_tokens() {
        let mut cfg = Config::default();
        let mut profile = Profile::new(DEFAULT_SERVER);
        profile.token = Some("s3cret".into());
        cfg.profiles.insert("default".into(), profile);

        let rendered = render_toml(&redacted(&cfg));
        assert!(rendered.contains("****"));
        assert!(!rendered.contains("s3cret"));
    }
}
