//! `inventory`: intended vs observed WLANs at one site.

use tabled::Tabled;

use airdeploy_config::Config;
use airdeploy_core::discovery::profiles_at_site;
use airdeploy_core::status::{intended_wlans_at_site, observed_wlans_at_site};
use airdeploy_core::{EntityId, InventoryEntry, SiteWlanInventory, WlanApi, create_site_inventory};

use crate::cli::{GlobalOpts, InventoryArgs};
use crate::config;
use crate::error::CliError;
use crate::output::{self, Tone};

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "WLAN")]
    wlan: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Intended")]
    intended: String,
    #[tabled(rename = "Observed")]
    observed: String,
    #[tabled(rename = "Expected")]
    expected: usize,
    #[tabled(rename = "Actual")]
    actual: usize,
    #[tabled(rename = "Mismatch")]
    mismatch: String,
    #[tabled(rename = "Severity")]
    severity: String,
}

fn yes_no(flag: bool) -> String {
    if flag { "yes" } else { "no" }.into()
}

impl EntryRow {
    fn new(e: &InventoryEntry, color: bool) -> Self {
        Self {
            wlan: e.wlan_id.to_string(),
            name: e.display_name.clone(),
            intended: yes_no(e.intended),
            observed: yes_no(e.observed),
            expected: e.expected_profiles,
            actual: e.actual_profiles,
            mismatch: output::or_dash(e.mismatch),
            severity: e
                .severity
                .map_or_else(|| "-".into(), |s| super::severity_cell(s, color)),
        }
    }
}

fn detail(inv: &SiteWlanInventory, color: bool) -> String {
    let rows: Vec<EntryRow> = inv.entries.iter().map(|e| EntryRow::new(e, color)).collect();
    let mismatches = inv.mismatch_count();
    let summary = if mismatches == 0 {
        output::paint("no drift", Tone::Good, color)
    } else {
        output::paint(&format!("{mismatches} mismatch(es)"), Tone::Warn, color)
    };
    format!(
        "Site: {} ({})  {summary}\n{}",
        inv.site_name,
        inv.site_id,
        output::render_table(&rows)
    )
}

pub async fn handle(args: InventoryArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let site_id = EntityId::from(args.site);
    let store = config::open_store(global, cfg)?;
    let api = config::connect(global, cfg)?;

    let site = WlanApi::list_sites(api.as_ref())
        .await?
        .into_iter()
        .find(|s| s.id == site_id)
        .ok_or_else(|| CliError::NotFound {
            resource_type: "site".into(),
            identifier: site_id.to_string(),
            list_command: "status".into(),
        })?;

    let profiles = profiles_at_site(api.as_ref(), &site.id).await?;
    let known = WlanApi::list_services(api.as_ref()).await?;
    let intended = intended_wlans_at_site(&store, &site.id, &known);
    let observed = observed_wlans_at_site(&profiles, &known);

    let inventory = create_site_inventory(&store, &site, &intended, &profiles, &observed);

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &inventory,
        |i| detail(i, color),
        |i| {
            i.entries
                .iter()
                .filter(|e| e.mismatch.is_some())
                .map(|e| e.wlan_id.to_string())
                .collect::<Vec<_>>()
                .join("\n")
        },
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
