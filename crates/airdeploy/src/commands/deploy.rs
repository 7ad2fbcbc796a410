//! `deploy`: create a WLAN and assign it to every selected profile.

use secrecy::SecretString;
use serde::Deserialize;
use tabled::Tabled;

use airdeploy_config::Config;
use airdeploy_core::{
    DeployOptions, DeploymentPolicy, DeploymentResult, Orchestrator, ProfileOutcome, WlanBand,
    WlanConfig, WlanSecurity,
};

use crate::cli::{DeployArgs, GlobalOpts, WlanBandArg, WlanSecurityArg};
use crate::config;
use crate::error::CliError;
use crate::output::{self, Tone};

use super::util;

/// A deployment read from `--from-file`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployPlan {
    pub wlan: WlanConfig,
    pub policies: Vec<DeploymentPolicy>,
}

impl From<WlanSecurityArg> for WlanSecurity {
    fn from(arg: WlanSecurityArg) -> Self {
        match arg {
            WlanSecurityArg::Open => Self::Open,
            WlanSecurityArg::Wpa2Personal => Self::Wpa2Personal,
            WlanSecurityArg::Wpa3Personal => Self::Wpa3Personal,
            WlanSecurityArg::Wpa2Wpa3Personal => Self::Wpa2Wpa3Personal,
            WlanSecurityArg::Wpa2Enterprise => Self::Wpa2Enterprise,
            WlanSecurityArg::Wpa3Enterprise => Self::Wpa3Enterprise,
        }
    }
}

impl From<WlanBandArg> for WlanBand {
    fn from(arg: WlanBandArg) -> Self {
        match arg {
            WlanBandArg::Band2_4 => Self::Band2_4Ghz,
            WlanBandArg::Band5 => Self::Band5Ghz,
            WlanBandArg::Band6 => Self::Band6Ghz,
            WlanBandArg::All => Self::All,
        }
    }
}

// ── Request building ────────────────────────────────────────────────

/// Turn flags (or a plan file) into the WLAN config and site policies.
///
/// Only syntax is checked here; policy rules are enforced by the orchestrator.
pub fn build_plan(args: &DeployArgs) -> Result<DeployPlan, CliError> {
    if let Some(ref path) = args.from_file {
        let mut plan: DeployPlan = util::read_document(path)?;
        if plan.wlan.passphrase.is_none() {
            plan.wlan.passphrase = args.passphrase.clone().map(SecretString::from);
        }
        return Ok(plan);
    }

    let ssid = args.ssid.clone().ok_or_else(|| CliError::Validation {
        field: "ssid".into(),
        reason: "required unless --from-file is given".into(),
    })?;

    let mut policies: Vec<DeploymentPolicy> = args
        .sites
        .iter()
        .map(|site| DeploymentPolicy::all_profiles(site.as_str()))
        .collect();
    for raw in &args.include {
        let (site, profiles) = util::parse_site_profiles("include", raw)?;
        policies.push(DeploymentPolicy::include_only(site, profiles));
    }
    for raw in &args.exclude {
        let (site, profiles) = util::parse_site_profiles("exclude", raw)?;
        policies.push(DeploymentPolicy::exclude_some(site, profiles));
    }
    if policies.is_empty() {
        return Err(CliError::Validation {
            field: "site".into(),
            reason: "at least one --site, --include or --exclude is required".into(),
        });
    }

    Ok(DeployPlan {
        wlan: WlanConfig {
            ssid,
            name: args.name.clone(),
            security: args.security.into(),
            passphrase: args.passphrase.clone().map(SecretString::from),
            vlan_id: args.vlan,
            band: args.band.into(),
            enabled: !args.disabled,
        },
        policies,
    })
}

/// `[deploy]` settings overridden by flags.
pub fn options(args: &DeployArgs, cfg: &Config) -> DeployOptions {
    let mut opts = airdeploy_config::deploy_options(cfg);
    opts.dry_run = args.dry_run;
    if args.no_sync {
        opts.sync = false;
    }
    if let Some(size) = args.batch_size {
        opts.batch_size = usize::from(size);
    }
    opts
}

// ── Rendering ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct SiteRow {
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "Profiles")]
    total: usize,
    #[tabled(rename = "Selected")]
    assigned: usize,
    #[tabled(rename = "Excluded")]
    excluded: usize,
    #[tabled(rename = "Coverage")]
    percent: String,
}

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Profile")]
    profile: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Assigned")]
    assigned: String,
    #[tabled(rename = "Sync")]
    sync: String,
    #[tabled(rename = "Error")]
    error: String,
}

impl OutcomeRow {
    fn new(o: &ProfileOutcome, color: bool) -> Self {
        Self {
            profile: o.profile_id.to_string(),
            name: o.profile_name.clone(),
            assigned: if o.assigned {
                output::paint("yes", Tone::Good, color)
            } else {
                output::paint("no", Tone::Bad, color)
            },
            sync: output::or_dash(o.sync_status),
            error: o
                .assignment_error
                .clone()
                .or_else(|| o.sync_error.clone())
                .unwrap_or_default(),
        }
    }
}

fn detail(result: &DeploymentResult, color: bool) -> String {
    let mut lines = Vec::new();
    match result.wlan {
        Some(ref wlan) => lines.push(format!("WLAN:        {} ({})", wlan.display_name, wlan.id)),
        None => lines.push(output::paint("Dry run: nothing was changed", Tone::Muted, color)),
    }
    lines.push(format!("Targets:     {} profiles", result.target_profiles.len()));

    let sites: Vec<SiteRow> = result
        .sites
        .iter()
        .map(|s| SiteRow {
            site: s.site_id.to_string(),
            total: s.summary.total,
            assigned: s.summary.assigned,
            excluded: s.summary.excluded,
            percent: format!("{}%", s.summary.assigned_percent),
        })
        .collect();
    lines.push(output::render_table(&sites));

    if result.dry_run {
        let targets: Vec<String> = result
            .target_profiles
            .iter()
            .map(|p| format!("  {}  {}", p.id, p.display_name))
            .collect();
        lines.extend(targets);
        return lines.join("\n");
    }

    let status = if result.success {
        output::paint("success", Tone::Good, color)
    } else {
        output::paint("incomplete", Tone::Bad, color)
    };
    lines.push(format!("Result:      {status}"));
    lines.push(format!(
        "Assigned:    {} ({} failed, {} batches)",
        result.profiles_assigned, result.assignment_failures, result.batches
    ));
    lines.push(format!("Sync errors: {}", result.sync_failures));

    let problems: Vec<OutcomeRow> = result
        .outcomes
        .iter()
        .filter(|o| !o.assigned || o.sync_error.is_some())
        .map(|o| OutcomeRow::new(o, color))
        .collect();
    if !problems.is_empty() {
        lines.push(output::render_table(&problems));
    }
    lines.join("\n")
}

fn plain(result: &DeploymentResult) -> String {
    match result.wlan {
        Some(ref wlan) => wlan.id.to_string(),
        None => result
            .target_profiles
            .iter()
            .map(|p| p.id.to_string())
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: DeployArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let plan = build_plan(&args)?;
    let opts = options(&args, cfg);

    let api = config::connect(global, cfg)?;
    let store = config::open_store(global, cfg)?;
    let orchestrator = Orchestrator::new(api, store);

    let result = orchestrator.deploy(&plan.wlan, &plan.policies, opts).await?;

    let color = output::should_color(&global.color);
    let out = output::render_single(&global.output, &result, |r| detail(r, color), plain)?;
    output::print_output(&out, global.quiet);

    if !result.success {
        return Err(CliError::PartialFailure {
            operation: "deploy".into(),
            failed: result.assignment_failures,
            total: result.target_profiles.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;
    use secrecy::ExposeSecret;

    use airdeploy_core::{DeploymentMode, EntityId};

    use super::*;
    use crate::cli::{Cli, Command};

    fn deploy_args(args: &[&str]) -> DeployArgs {
        let mut argv = vec!["airdeploy", "deploy"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Deploy(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn flags_build_one_policy_per_site() {
        let args = deploy_args(&[
            "--ssid",
            "Guest",
            "--passphrase",
            "correct-horse",
            "--site",
            "hq",
            "--include",
            "lab:p1,p2",
            "--exclude",
            "branch:p9",
            "--band",
            "5",
            "--vlan",
            "30",
        ]);
        let plan = build_plan(&args).unwrap();
        assert_eq!(plan.wlan.ssid, "Guest");
        assert_eq!(plan.wlan.security, WlanSecurity::Wpa2Personal);
        assert_eq!(plan.wlan.band, WlanBand::Band5Ghz);
        assert_eq!(plan.wlan.vlan_id, Some(30));
        assert!(plan.wlan.enabled);
        assert_eq!(
            plan.wlan.passphrase.as_ref().map(|p| p.expose_secret().to_owned()),
            Some("correct-horse".into())
        );

        let modes: Vec<_> = plan
            .policies
            .iter()
            .map(|p| (p.site_id.to_string(), p.deployment_mode))
            .collect();
        assert_eq!(
            modes,
            vec![
                ("hq".into(), DeploymentMode::AllProfilesAtSite),
                ("lab".into(), DeploymentMode::IncludeOnly),
                ("branch".into(), DeploymentMode::ExcludeSome),
            ]
        );
        assert_eq!(
            plan.policies[1].included_profiles,
            vec![EntityId::from("p1"), EntityId::from("p2")]
        );
    }

    #[test]
    fn sites_are_required_without_a_plan_file() {
        let err = build_plan(&deploy_args(&["--ssid", "Guest", "--security", "open"])).unwrap_err();
        assert!(matches!(err, CliError::Validation { ref field, .. } if field == "site"));
    }

    #[test]
    fn plan_file_supplies_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guest.yaml");
        std::fs::write(
            &path,
            "wlan:\n  ssid: Guest\n  security: OPEN\npolicies:\n  - siteId: hq\n    deploymentMode: EXCLUDE_SOME\n    excludedProfiles: [p3]\n",
        )
        .unwrap();
        let args = deploy_args(&["--from-file", path.to_str().unwrap()]);
        let plan = build_plan(&args).unwrap();
        assert_eq!(plan.wlan.security, WlanSecurity::Open);
        assert_eq!(plan.policies.len(), 1);
        assert_eq!(plan.policies[0].excluded_profiles, vec![EntityId::from("p3")]);
    }

    #[test]
    fn flags_override_deploy_settings() {
        let cfg = Config::default();
        let opts = options(&deploy_args(&["--ssid", "G", "--site", "hq"]), &cfg);
        assert_eq!(opts, DeployOptions::default());

        let opts = options(
            &deploy_args(&["--ssid", "G", "--site", "hq", "--dry-run", "--no-sync", "--batch-size", "2"]),
            &cfg,
        );
        assert!(opts.dry_run);
        assert!(!opts.sync);
        assert_eq!(opts.batch_size, 2);
    }
}
