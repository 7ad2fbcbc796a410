//! CLI-side configuration glue: applies `GlobalOpts` overrides on top of
//! `airdeploy_config` and builds the core handles commands need.
//!
//! Core never sees these types -- it receives a pre-built `ControllerConfig`,
//! an `AssignmentStore`, and `DeployOptions`.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use airdeploy_config::{Config, parse_controller_url, resolve_api_key, store_dir};
use airdeploy_core::{AssignmentStore, ControllerConfig, FileBackend, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Profile resolution ───────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `ControllerConfig` from the config file, profile, and CLI overrides.
///
/// Flags win over the profile; with no matching profile the controller URL
/// and API key must both come from flags or the environment.
pub fn controller_config(global: &GlobalOpts, cfg: &Config) -> Result<ControllerConfig, CliError> {
    let profile_name = active_profile_name(global, cfg);
    let profile = cfg.profiles.get(&profile_name);

    // Naming a profile explicitly that doesn't exist is a mistake, not a fallback.
    if profile.is_none() && global.profile.is_some() && global.controller.is_none() {
        return Err(CliError::ProfileNotFound {
            available: available_profiles(cfg),
            name: profile_name,
        });
    }

    // 1. Controller URL (flag > env > profile)
    let url_str = match (global.controller.as_deref(), profile) {
        (Some(url), _) => url,
        (None, Some(p)) => p.controller.as_str(),
        (None, None) => {
            return Err(CliError::NoConfig {
                path: airdeploy_config::config_path().display().to_string(),
            });
        }
    };
    let url = parse_controller_url(url_str)?;

    // 2. API key (flag > profile credential chain)
    let api_key = match (&global.api_key, profile) {
        (Some(key), _) => SecretString::from(key.clone()),
        (None, Some(p)) => resolve_api_key(p, &profile_name)?,
        (None, None) => {
            return Err(CliError::NoCredentials {
                profile: profile_name,
            });
        }
    };

    // 3. TLS verification
    let insecure = global.insecure
        || profile
            .and_then(|p| p.insecure)
            .unwrap_or(cfg.defaults.insecure);
    let tls = if insecure {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ca_path) = profile.and_then(|p| p.ca_cert.clone()) {
        TlsVerification::CustomCa(ca_path)
    } else {
        TlsVerification::SystemDefaults
    };

    let mut config = ControllerConfig::new(url, api_key);
    config.tls = tls;
    config.timeout = Duration::from_secs(global.timeout);
    Ok(config)
}

/// Connect to the controller selected by flags and profile.
pub fn connect(global: &GlobalOpts, cfg: &Config) -> Result<Arc<airdeploy_api::Client>, CliError> {
    let controller = controller_config(global, cfg)?;
    tracing::debug!(url = %controller.url, "connecting to controller");
    Ok(Arc::new(controller.connect()?))
}

/// Open the file-backed assignment store (flag > env > config).
pub fn open_store(global: &GlobalOpts, cfg: &Config) -> Result<Arc<AssignmentStore>, CliError> {
    let dir = global.store_dir.clone().unwrap_or_else(|| store_dir(cfg));
    tracing::debug!(dir = %dir.display(), "opening assignment store");
    let backend = FileBackend::new(dir).with_quota(cfg.store.quota_bytes);
    Ok(Arc::new(AssignmentStore::open(Box::new(backend))?))
}

pub fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}
