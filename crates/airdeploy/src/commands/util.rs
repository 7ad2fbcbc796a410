//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;

use serde::de::DeserializeOwned;

use airdeploy_core::{AssignmentStore, EntityId};

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool, action: &str) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Read a JSON or YAML document for `--from-file` flags.
///
/// `.yaml` / `.yml` files are parsed as YAML, everything else as JSON.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let contents = std::fs::read_to_string(path)?;
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
    if is_yaml {
        Ok(serde_yaml::from_str(&contents)?)
    } else {
        Ok(serde_json::from_str(&contents)?)
    }
}

/// Split `SITE:PROFILE[,PROFILE...]` into a site id and its profile ids.
pub fn parse_site_profiles(flag: &str, raw: &str) -> Result<(EntityId, Vec<EntityId>), CliError> {
    let invalid = |reason: &str| CliError::Validation {
        field: flag.into(),
        reason: format!("{reason} in '{raw}' (expected SITE:PROFILE[,PROFILE...])"),
    };
    let (site, profiles) = raw.split_once(':').ok_or_else(|| invalid("missing ':'"))?;
    let site = site.trim();
    if site.is_empty() {
        return Err(invalid("empty site"));
    }
    let profiles: Vec<EntityId> = profiles
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(EntityId::from)
        .collect();
    if profiles.is_empty() {
        return Err(invalid("no profiles"));
    }
    Ok((EntityId::from(site), profiles))
}

/// Fail with a not-found error unless the store has records for `wlan_id`.
pub fn require_tracked(store: &AssignmentStore, wlan_id: &EntityId) -> Result<(), CliError> {
    if store.tracked_wlan_ids().contains(wlan_id) {
        return Ok(());
    }
    Err(CliError::NotFound {
        resource_type: "WLAN".into(),
        identifier: wlan_id.to_string(),
        list_command: "status".into(),
    })
}
