//! `assignments`: recorded site policies and profile assignments for a WLAN.

use tabled::Tabled;

use airdeploy_config::Config;
use airdeploy_core::{EntityId, ProfileAssignment, SiteAssignment};

use crate::cli::{AssignmentsArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct SiteRow {
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Included")]
    included: String,
    #[tabled(rename = "Excluded")]
    excluded: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

fn join_ids(ids: &[EntityId]) -> String {
    if ids.is_empty() {
        return "-".into();
    }
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

impl From<&SiteAssignment> for SiteRow {
    fn from(s: &SiteAssignment) -> Self {
        Self {
            site: s.site_id().to_string(),
            mode: s.policy.deployment_mode.to_string(),
            included: join_ids(&s.policy.included_profiles),
            excluded: join_ids(&s.policy.excluded_profiles),
            updated: s.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "Profile")]
    profile: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "Expected")]
    expected: String,
    #[tabled(rename = "Actual")]
    actual: String,
    #[tabled(rename = "Sync")]
    sync: String,
    #[tabled(rename = "Mismatch")]
    mismatch: String,
}

impl From<&ProfileAssignment> for ProfileRow {
    fn from(p: &ProfileAssignment) -> Self {
        Self {
            profile: p.profile_id.to_string(),
            name: p.profile_name.clone(),
            site: output::or_dash(p.site_id.as_ref()),
            expected: p.expected_state.to_string(),
            actual: p.actual_state().to_string(),
            sync: p.sync_status().to_string(),
            mismatch: output::or_dash(p.effective_mismatch()),
        }
    }
}

pub fn handle(args: AssignmentsArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let wlan_id = EntityId::from(args.wlan);
    let store = config::open_store(global, cfg)?;
    util::require_tracked(&store, &wlan_id)?;

    let out = if args.sites {
        let sites = store.site_assignments_for_wlan(&wlan_id);
        output::render_list(&global.output, &sites, |s| SiteRow::from(s), |s| {
            s.site_id().to_string()
        })?
    } else {
        let profiles: Vec<ProfileAssignment> = store
            .profile_assignments_for_wlan(&wlan_id)
            .into_iter()
            .filter(|p| !args.unhealthy || !p.is_healthy())
            .collect();
        output::render_list(&global.output, &profiles, |p| ProfileRow::from(p), |p| {
            p.profile_id.to_string()
        })?
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
