//! Command dispatch: bridges CLI args -> core engines -> output formatting.

pub mod assignments;
pub mod config_cmd;
pub mod delete;
pub mod deploy;
pub mod inventory;
pub mod reconcile;
pub mod remediate;
pub mod status;
pub mod util;

use airdeploy_config::Config;
use airdeploy_core::Severity;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, Tone};

/// Dispatch a store- or controller-bound command to its handler.
///
/// Handlers connect lazily so that input errors surface before any
/// network or disk access.
pub async fn dispatch(cmd: Command, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Deploy(args) => deploy::handle(args, cfg, global).await,
        Command::Reconcile(args) => reconcile::handle(args, cfg, global).await,
        Command::Remediate(args) => remediate::handle(args, cfg, global).await,
        Command::Status(args) => status::handle(args, cfg, global),
        Command::Assignments(args) => assignments::handle(args, cfg, global),
        Command::Inventory(args) => inventory::handle(args, cfg, global).await,
        Command::Delete(args) => delete::handle(args, cfg, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}

pub(crate) fn severity_cell(severity: Severity, color: bool) -> String {
    let tone = match severity {
        Severity::Error => Tone::Bad,
        Severity::Warning => Tone::Warn,
        Severity::Info => Tone::Muted,
    };
    output::paint(&severity.to_string(), tone, color)
}
