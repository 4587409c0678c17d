//! CLI-side configuration: profile resolution against `GlobalOpts` and
//! translation to `staffdesk_core::ConsoleConfig`.
//!
//! File layout and env layering live in `staffdesk-config`.

use std::time::Duration;

use staffdesk_core::ConsoleConfig;

pub use staffdesk_config::{
    Config, Profile, config_path, load_config, load_config_or_default, profile_to_console_config,
    save_config,
};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `ConsoleConfig` from the config file, profile, and CLI overrides.
///
/// `--base-url` wins over the profile URL; without any profile it is the
/// only way to reach an API.
pub fn build_console_config(global: &GlobalOpts) -> Result<ConsoleConfig, CliError> {
    let cfg = load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => {
            let mut profile = profile.clone();
            if let Some(ref url) = global.base_url {
                profile.base_url.clone_from(url);
            }
            profile
        }
        None => {
            // An explicitly requested profile must exist.
            if global.profile.is_some() {
                return Err(CliError::ProfileNotFound {
                    name: profile_name,
                    available: available_profiles(&cfg),
                });
            }
            let url = global.base_url.as_deref().ok_or_else(|| CliError::NoConfig {
                path: config_path().display().to_string(),
            })?;
            Profile::new(url)
        }
    };

    let mut console = profile_to_console_config(&profile, &cfg.defaults)?;
    if let Some(secs) = global.timeout {
        console.timeout = Duration::from_secs(secs);
    }
    tracing::debug!(
        profile = %profile_name,
        base_url = %console.base_url,
        page_size = console.default_page_size,
        "resolved console config"
    );
    Ok(console)
}

pub fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort_unstable();
    names.join(", ")
}
