//! `reconcile`: compare recorded assignments with the controller.

use tabled::Tabled;
use tokio_util::sync::CancellationToken;

use airdeploy_config::Config;
use airdeploy_core::{EntityId, ProfileAssignment, ReconcileAllReport, Reconciler, ReconciliationResult};

use crate::cli::{GlobalOpts, ReconcileArgs};
use crate::config;
use crate::error::CliError;
use crate::output::{self, Tone};

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct MismatchRow {
    #[tabled(rename = "Profile")]
    profile: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Expected")]
    expected: String,
    #[tabled(rename = "Actual")]
    actual: String,
    #[tabled(rename = "Mismatch")]
    mismatch: String,
    #[tabled(rename = "Severity")]
    severity: String,
}

impl MismatchRow {
    fn new(record: &ProfileAssignment, color: bool) -> Self {
        let mismatch = record.effective_mismatch();
        Self {
            profile: record.profile_id.to_string(),
            name: record.profile_name.clone(),
            expected: record.expected_state.to_string(),
            actual: record.actual_state().to_string(),
            mismatch: output::or_dash(mismatch),
            severity: mismatch.map_or_else(
                || "-".into(),
                |m| super::severity_cell(m.severity(), color),
            ),
        }
    }
}

#[derive(Tabled)]
struct WlanRow {
    #[tabled(rename = "WLAN")]
    wlan: String,
    #[tabled(rename = "Expected")]
    expected: usize,
    #[tabled(rename = "Actual")]
    actual: usize,
    #[tabled(rename = "Matched")]
    matched: usize,
    #[tabled(rename = "Mismatched")]
    mismatched: usize,
    #[tabled(rename = "Unchecked")]
    unchecked: usize,
}

impl From<&ReconciliationResult> for WlanRow {
    fn from(r: &ReconciliationResult) -> Self {
        Self {
            wlan: r.wlan_id.to_string(),
            expected: r.expected_count,
            actual: r.actual_count,
            matched: r.matched_count,
            mismatched: r.mismatched_count,
            unchecked: r.failures.len(),
        }
    }
}

fn detail(result: &ReconciliationResult, color: bool) -> String {
    let verdict = if result.is_clean() {
        output::paint("in sync", Tone::Good, color)
    } else {
        output::paint("drift detected", Tone::Warn, color)
    };
    let mut lines = vec![
        format!("WLAN:       {}", result.wlan_id),
        format!("State:      {verdict}"),
        format!(
            "Profiles:   {} expected, {} carrying, {} matched, {} mismatched",
            result.expected_count, result.actual_count, result.matched_count, result.mismatched_count
        ),
        format!("Checked at: {}", result.reconciled_at.format("%Y-%m-%d %H:%M:%S UTC")),
    ];
    if !result.mismatches.is_empty() {
        let rows: Vec<MismatchRow> = result
            .mismatches
            .iter()
            .map(|m| MismatchRow::new(m, color))
            .collect();
        lines.push(output::render_table(&rows));
    }
    for failure in &result.failures {
        lines.push(format!(
            "{} {}: {}",
            output::paint("unchecked", Tone::Muted, color),
            failure.profile_id,
            failure.error
        ));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ReconcileArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let store = config::open_store(global, cfg)?;
    let color = output::should_color(&global.color);

    if let Some(wlan) = args.wlan {
        let wlan_id = EntityId::from(wlan);
        util::require_tracked(&store, &wlan_id)?;
        let api = config::connect(global, cfg)?;
        let result = Reconciler::new(api, store).reconcile(&wlan_id).await?;

        let out = output::render_single(
            &global.output,
            &result,
            |r| detail(r, color),
            |r| {
                r.mismatches
                    .iter()
                    .map(|m| m.profile_id.to_string())
                    .collect::<Vec<_>>()
                    .join("\n")
            },
        )?;
        output::print_output(&out, global.quiet);

        if !result.failures.is_empty() {
            return Err(CliError::PartialFailure {
                operation: "reconcile".into(),
                failed: result.failures.len(),
                total: result.expected_count,
            });
        }
        return Ok(());
    }

    let api = config::connect(global, cfg)?;
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted; finishing the WLAN in progress");
            on_signal.cancel();
        }
    });

    let tracked = store.tracked_wlan_ids().len();
    let report = Reconciler::new(api, store).reconcile_all(&cancel).await;
    watcher.abort();

    render_all(&report, global)?;

    if report.cancelled {
        eprintln!("Reconciliation cancelled before every WLAN was visited");
    }
    if !report.failed.is_empty() {
        return Err(CliError::PartialFailure {
            operation: "reconcile --all".into(),
            failed: report.failed.len(),
            total: tracked,
        });
    }
    Ok(())
}

fn render_all(report: &ReconcileAllReport, global: &GlobalOpts) -> Result<(), CliError> {
    let out = match global.output {
        crate::cli::OutputFormat::Table | crate::cli::OutputFormat::Plain => output::render_list(
            &global.output,
            &report.results,
            |r| WlanRow::from(r),
            |r| r.wlan_id.to_string(),
        )?,
        _ => output::render_single(&global.output, report, |_| String::new(), |_| String::new())?,
    };
    output::print_output(&out, global.quiet);

    for (wlan, reason) in &report.failed {
        eprintln!("{wlan}: {reason}");
    }
    Ok(())
}
