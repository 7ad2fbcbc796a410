//! `delete`: remove a WLAN from the controller and forget its assignments.

use airdeploy_config::Config;
use airdeploy_core::{DeleteSummary, EntityId, Orchestrator};

use crate::cli::{DeleteArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

fn detail(s: &DeleteSummary) -> String {
    let remote = if s.remote_deleted {
        "deleted"
    } else {
        "already gone"
    };
    format!(
        "Controller:  {remote}\nForgotten:   {} site policies, {} profile assignments",
        s.site_assignments, s.profile_assignments
    )
}

pub async fn handle(args: DeleteArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let wlan_id = EntityId::from(args.wlan);
    let store = config::open_store(global, cfg)?;
    let api = config::connect(global, cfg)?;

    let prompt = format!("Delete WLAN {wlan_id} from the controller and forget its assignments?");
    if !util::confirm(&prompt, global.yes, "delete")? {
        return Ok(());
    }

    let summary = Orchestrator::new(api, store).delete_wlan(&wlan_id).await?;
    let out = output::render_single(&global.output, &summary, detail, |_| wlan_id.to_string())?;
    output::print_output(&out, global.quiet);
    Ok(())
}
