//! `remediate`: plan and apply fixes for a WLAN's mismatches.

use tabled::Tabled;

use airdeploy_config::Config;
use airdeploy_core::{ActionResult, EntityId, RemediationAction, Reconciler, Remediator, plan};

use crate::cli::{GlobalOpts, RemediateArgs};
use crate::config;
use crate::error::CliError;
use crate::output::{self, Tone};

use super::util;

#[derive(Tabled)]
struct ActionRow {
    #[tabled(rename = "Action")]
    kind: String,
    #[tabled(rename = "Profile")]
    profile: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Mismatch")]
    mismatch: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

impl From<&RemediationAction> for ActionRow {
    fn from(a: &RemediationAction) -> Self {
        Self {
            kind: a.kind.to_string(),
            profile: a.profile_id.to_string(),
            name: a.profile_name.clone(),
            mismatch: a.mismatch.to_string(),
            reason: a.reason.clone(),
        }
    }
}

#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "Action")]
    kind: String,
    #[tabled(rename = "Profile")]
    profile: String,
    #[tabled(rename = "Result")]
    result: String,
    #[tabled(rename = "Error")]
    error: String,
}

impl ResultRow {
    fn new(r: &ActionResult, color: bool) -> Self {
        Self {
            kind: r.action.kind.to_string(),
            profile: r.action.profile_id.to_string(),
            result: if r.success {
                output::paint("ok", Tone::Good, color)
            } else {
                output::paint("failed", Tone::Bad, color)
            },
            error: r.error.clone().unwrap_or_default(),
        }
    }
}

pub async fn handle(args: RemediateArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let wlan_id = EntityId::from(args.wlan);
    let store = config::open_store(global, cfg)?;
    util::require_tracked(&store, &wlan_id)?;
    let api = config::connect(global, cfg)?;

    // Mismatches are only as fresh as the last pass.
    if !args.no_reconcile {
        Reconciler::new(api.clone(), store.clone())
            .reconcile(&wlan_id)
            .await?;
    }

    let unhealthy: Vec<_> = store
        .profile_assignments_for_wlan(&wlan_id)
        .into_iter()
        .filter(|p| !p.is_healthy())
        .collect();
    let actions = plan(&unhealthy);
    let skipped = unhealthy.len() - actions.len();

    if actions.is_empty() {
        if !global.quiet {
            eprintln!("Nothing to remediate for WLAN {wlan_id}");
            if skipped > 0 {
                eprintln!("{skipped} mismatch(es) have no automatic fix");
            }
        }
        return Ok(());
    }

    if args.plan_only {
        let out = output::render_list(&global.output, &actions, |a| ActionRow::from(a), |a| {
            a.profile_id.to_string()
        })?;
        output::print_output(&out, global.quiet);
        return Ok(());
    }

    let prompt = format!("Apply {} remediation action(s) to WLAN {wlan_id}?", actions.len());
    if !util::confirm(&prompt, global.yes, "remediate")? {
        return Ok(());
    }

    let report = Remediator::new(api, store).execute(&actions).await;

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| {
            let rows: Vec<ResultRow> = r.results.iter().map(|x| ResultRow::new(x, color)).collect();
            format!(
                "{}\n{} succeeded, {} failed",
                output::render_table(&rows),
                r.successful,
                r.failed
            )
        },
        |r| {
            r.results
                .iter()
                .filter(|x| !x.success)
                .map(|x| x.action.profile_id.to_string())
                .collect::<Vec<_>>()
                .join("\n")
        },
    )?;
    output::print_output(&out, global.quiet);

    if report.failed > 0 {
        return Err(CliError::PartialFailure {
            operation: "remediate".into(),
            failed: report.failed,
            total: actions.len(),
        });
    }
    Ok(())
}
