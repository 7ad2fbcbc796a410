//! `status`: deployment status from the local assignment store.

use tabled::Tabled;

use airdeploy_config::Config;
use airdeploy_core::status::{all_statuses, wlan_status};
use airdeploy_core::{DeploymentStatus, EntityId, WlanStatus};

use crate::cli::{GlobalOpts, StatusArgs};
use crate::config;
use crate::error::CliError;
use crate::output::{self, Tone};

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "WLAN")]
    wlan: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Sites")]
    sites: usize,
    #[tabled(rename = "Profiles")]
    profiles: usize,
    #[tabled(rename = "Healthy")]
    healthy: usize,
    #[tabled(rename = "Unhealthy")]
    unhealthy: usize,
    #[tabled(rename = "Last Reconciled")]
    last_reconciled: String,
}

impl StatusRow {
    fn new(s: &WlanStatus, color: bool) -> Self {
        Self {
            wlan: s.wlan_id.to_string(),
            status: status_cell(s.status, color),
            sites: s.sites,
            profiles: s.profiles,
            healthy: s.healthy,
            unhealthy: s.unhealthy,
            last_reconciled: output::or_dash(
                s.last_reconciled.map(|t| t.format("%Y-%m-%d %H:%M")),
            ),
        }
    }
}

fn status_cell(status: DeploymentStatus, color: bool) -> String {
    let tone = match status {
        DeploymentStatus::Deployed => Tone::Good,
        DeploymentStatus::PartiallyDeployed => Tone::Warn,
        DeploymentStatus::Unknown => Tone::Bad,
        DeploymentStatus::NotDeployed => Tone::Muted,
    };
    output::paint(&status.to_string(), tone, color)
}

fn detail(s: &WlanStatus, color: bool) -> String {
    [
        format!("WLAN:            {}", s.wlan_id),
        format!("Status:          {}", status_cell(s.status, color)),
        format!("Sites:           {}", s.sites),
        format!("Profiles:        {} ({} healthy, {} unhealthy)", s.profiles, s.healthy, s.unhealthy),
        format!(
            "Last reconciled: {}",
            output::or_dash(s.last_reconciled.map(|t| t.to_rfc3339()))
        ),
    ]
    .join("\n")
}

pub fn handle(args: StatusArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let store = config::open_store(global, cfg)?;
    let color = output::should_color(&global.color);

    if let Some(wlan) = args.wlan {
        let status = wlan_status(&store, &EntityId::from(wlan));
        let out = output::render_single(
            &global.output,
            &status,
            |s| detail(s, color),
            |s| s.status.to_string(),
        )?;
        output::print_output(&out, global.quiet);
        return Ok(());
    }

    let statuses = all_statuses(&store);
    if statuses.is_empty() && !global.quiet {
        eprintln!("No WLANs tracked yet. Deploy one with: airdeploy deploy");
    }
    let out = output::render_list(
        &global.output,
        &statuses,
        |s| StatusRow::new(s, color),
        |s| s.wlan_id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
