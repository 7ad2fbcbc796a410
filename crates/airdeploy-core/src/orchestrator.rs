// ── Assignment orchestrator ──
//
// Drives a deployment end to end: validate policies, discover profiles,
// compute the merged target set, create the WLAN, assign it to every target
// in bounded batches, record intended state, then optionally sync.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::DeployOptions;
use crate::discovery::discover_profiles;
use crate::effective::{self, EffectiveProfileSet, EffectiveSetSummary};
use crate::error::CoreError;
use crate::model::{
    AssignmentSource, DeploymentPolicy, EntityId, MismatchReason, ObservedState, Profile,
    ProfileAssignment, SiteAssignment, SyncStatus, Wlan, WlanConfig,
};
use crate::remote::WlanApi;
use crate::store::AssignmentStore;

// ── Result types ─────────────────────────────────────────────────────

/// Per-site view of the computed target set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SitePlan {
    pub site_id: EntityId,
    #[serde(flatten)]
    pub summary: EffectiveSetSummary,
}

/// What happened to one target profile.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileOutcome {
    pub profile_id: EntityId,
    pub profile_name: String,
    pub site_id: Option<EntityId>,
    pub assigned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment_error: Option<String>,
    /// `None` when no sync was attempted for this profile.
    pub sync_status: Option<SyncStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResult {
    /// The created WLAN. `None` on a dry run.
    pub wlan: Option<Wlan>,
    pub dry_run: bool,
    /// `true` iff no profile assignment failed. Sync failures do not count.
    pub success: bool,
    pub sites: Vec<SitePlan>,
    pub target_profiles: Vec<Profile>,
    pub profiles_assigned: usize,
    pub assignment_failures: usize,
    pub sync_failures: usize,
    /// Number of assignment batches issued.
    pub batches: usize,
    pub outcomes: Vec<ProfileOutcome>,
}

/// What `delete_wlan` removed.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSummary {
    /// `false` when the controller no longer had the WLAN.
    pub remote_deleted: bool,
    pub site_assignments: usize,
    pub profile_assignments: usize,
}

// ── Orchestrator ─────────────────────────────────────────────────────

pub struct Orchestrator<A> {
    api: Arc<A>,
    store: Arc<AssignmentStore>,
}

impl<A: WlanApi> Orchestrator<A> {
    pub fn new(api: Arc<A>, store: Arc<AssignmentStore>) -> Self {
        Self { api, store }
    }

    /// Deploy a new WLAN to every profile selected by `policies`.
    ///
    /// Invalid input aborts before any remote call. A failed WLAN creation
    /// aborts before any assignment. Per-profile assignment and sync
    /// failures are reported in the result, not returned as errors.
    pub async fn deploy(
        &self,
        wlan_config: &WlanConfig,
        policies: &[DeploymentPolicy],
        options: DeployOptions,
    ) -> Result<DeploymentResult, CoreError> {
        validate_request(wlan_config, policies)?;

        // ── Plan ─────────────────────────────────────────────────────
        let site_ids: Vec<EntityId> = policies.iter().map(|p| p.site_id.clone()).collect();
        let discovered = discover_profiles(self.api.as_ref(), &site_ids).await;

        let sets: Vec<EffectiveProfileSet> = policies
            .iter()
            .map(|policy| {
                let at_site = discovered
                    .get(&policy.site_id)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                effective::compute_effective_set(policy, at_site)
            })
            .collect();
        let sites: Vec<SitePlan> = sets
            .iter()
            .map(|set| SitePlan {
                site_id: set.site_id.clone(),
                summary: effective::summary(set),
            })
            .collect();
        let targets = effective::merge_effective_sets(&sets);
        debug!(ssid = %wlan_config.ssid, targets = targets.len(), "computed deployment targets");

        if options.dry_run {
            return Ok(DeploymentResult {
                wlan: None,
                dry_run: true,
                success: true,
                sites,
                target_profiles: targets,
                profiles_assigned: 0,
                assignment_failures: 0,
                sync_failures: 0,
                batches: 0,
                outcomes: Vec::new(),
            });
        }

        // ── Create ───────────────────────────────────────────────────
        let wlan = self.api.create_service(wlan_config).await?;
        info!(wlan_id = %wlan.id, ssid = %wlan.ssid, "created WLAN");

        // ── Assign ───────────────────────────────────────────────────
        let batch_size = options.effective_batch_size();
        let mut outcomes = Vec::with_capacity(targets.len());
        let mut batches = 0;
        for chunk in targets.chunks(batch_size) {
            batches += 1;
            let futs = chunk.iter().map(|profile| {
                let api = Arc::clone(&self.api);
                let wlan_id = wlan.id.clone();
                async move {
                    match api.assign_service_to_profile(&wlan_id, &profile.id).await {
                        Ok(()) => outcome(profile, true, None),
                        Err(e) => {
                            warn!(
                                wlan_id = %wlan_id,
                                profile_id = %profile.id,
                                error = %e,
                                "profile assignment failed"
                            );
                            outcome(profile, false, Some(e.to_string()))
                        }
                    }
                }
            });
            outcomes.extend(futures_util::future::join_all(futs).await);
        }

        // ── Record ───────────────────────────────────────────────────
        let stored = self
            .record(&wlan, policies, &targets, &outcomes)
            .inspect_err(|e| {
                error!(wlan_id = %wlan.id, error = %e, "WLAN deployed but intended state was not recorded");
            })?;

        // ── Sync ─────────────────────────────────────────────────────
        if options.sync {
            self.sync(&wlan.id, &stored, &mut outcomes).await?;
        }

        let profiles_assigned = outcomes.iter().filter(|o| o.assigned).count();
        let assignment_failures = outcomes.len() - profiles_assigned;
        let sync_failures = outcomes
            .iter()
            .filter(|o| o.sync_status == Some(SyncStatus::Failed))
            .count();

        info!(
            wlan_id = %wlan.id,
            assigned = profiles_assigned,
            failed = assignment_failures,
            sync_failed = sync_failures,
            batches,
            "deployment finished"
        );

        Ok(DeploymentResult {
            wlan: Some(wlan),
            dry_run: false,
            success: assignment_failures == 0,
            sites,
            target_profiles: targets,
            profiles_assigned,
            assignment_failures,
            sync_failures,
            batches,
            outcomes,
        })
    }

    /// Persist one site assignment per policy and one profile assignment
    /// per target, seeded from the assignment outcomes.
    ///
    /// All or nothing: a site assignment is never left without its profile
    /// assignments.
    fn record(
        &self,
        wlan: &Wlan,
        policies: &[DeploymentPolicy],
        targets: &[Profile],
        outcomes: &[ProfileOutcome],
    ) -> Result<Vec<ProfileAssignment>, CoreError> {
        let records = targets
            .iter()
            .zip(outcomes)
            .map(|(profile, outcome)| {
                let mut record = ProfileAssignment::intended(
                    wlan.id.clone(),
                    profile.id.clone(),
                    profile.site_id.clone(),
                    profile.display_name.clone(),
                    AssignmentSource::SitePropagation,
                );
                if outcome.assigned {
                    record.observation.actual_state = ObservedState::Assigned;
                } else {
                    record.observation.actual_state = ObservedState::Unknown;
                    record.observation.mismatch = Some(MismatchReason::ProvisioningFailed);
                }
                record
            })
            .collect();
        let stored = self.store.batch_save_profile_assignments(records)?;

        for policy in policies {
            let site = SiteAssignment::new(wlan.id.clone(), policy.clone());
            if let Err(e) = self.store.save_site_assignment(site) {
                self.discard_records(&wlan.id);
                return Err(e.into());
            }
        }
        Ok(stored)
    }

    /// Drop whatever `record` managed to write for a freshly created WLAN.
    fn discard_records(&self, wlan_id: &EntityId) {
        let sites = self.store.delete_site_assignments_for_wlan(wlan_id);
        let profiles = self.store.delete_profile_assignments_for_wlan(wlan_id);
        if let Err(e) = sites.and(profiles) {
            warn!(wlan_id = %wlan_id, error = %e, "could not discard partially recorded WLAN");
        }
    }

    /// One batched sync for every assigned profile; per-profile fallback if
    /// the batch call fails. Writes the sync status back to the store.
    async fn sync(
        &self,
        wlan_id: &EntityId,
        stored: &[ProfileAssignment],
        outcomes: &mut [ProfileOutcome],
    ) -> Result<(), CoreError> {
        let assigned: Vec<EntityId> = outcomes
            .iter()
            .filter(|o| o.assigned)
            .map(|o| o.profile_id.clone())
            .collect();
        if assigned.is_empty() {
            return Ok(());
        }

        let mut results: HashMap<EntityId, Result<(), String>> = HashMap::new();
        match self.api.sync_profiles(&assigned).await {
            Ok(()) => {
                for profile_id in &assigned {
                    results.insert(profile_id.clone(), Ok(()));
                }
            }
            Err(e) => {
                warn!(wlan_id = %wlan_id, error = %e, "batch sync failed, syncing profiles individually");
                for profile_id in &assigned {
                    let result = self.api.sync_profile(profile_id).await.map_err(|e| {
                        warn!(profile_id = %profile_id, error = %e, "profile sync failed");
                        e.to_string()
                    });
                    results.insert(profile_id.clone(), result);
                }
            }
        }

        let versions: HashMap<&EntityId, u64> =
            stored.iter().map(|r| (&r.profile_id, r.version)).collect();

        for outcome in outcomes.iter_mut() {
            let Some(result) = results.remove(&outcome.profile_id) else {
                continue;
            };
            let status = if result.is_ok() {
                SyncStatus::Synced
            } else {
                SyncStatus::Failed
            };
            self.store.update_observation(
                wlan_id,
                &outcome.profile_id,
                versions.get(&outcome.profile_id).copied(),
                |obs| {
                    obs.sync_status = status;
                    if status == SyncStatus::Failed {
                        obs.mismatch = Some(MismatchReason::SyncFailed);
                    }
                },
            )?;
            outcome.sync_status = Some(status);
            outcome.sync_error = result.err();
        }
        Ok(())
    }

    /// Delete a WLAN on the controller, then everything recorded for it.
    ///
    /// A WLAN the controller no longer knows is still purged locally.
    pub async fn delete_wlan(&self, wlan_id: &EntityId) -> Result<DeleteSummary, CoreError> {
        let remote_deleted = match self.api.delete_service(wlan_id).await {
            Ok(()) => true,
            Err(e) if e.is_not_found() => {
                warn!(wlan_id = %wlan_id, "WLAN already gone from controller");
                false
            }
            Err(e) => return Err(e),
        };
        let (site_assignments, profile_assignments) = self.store.delete_wlan(wlan_id)?;
        Ok(DeleteSummary {
            remote_deleted,
            site_assignments,
            profile_assignments,
        })
    }
}

fn outcome(profile: &Profile, assigned: bool, assignment_error: Option<String>) -> ProfileOutcome {
    ProfileOutcome {
        profile_id: profile.id.clone(),
        profile_name: profile.display_name.clone(),
        site_id: profile.site_id.clone(),
        assigned,
        assignment_error,
        sync_status: None,
        sync_error: None,
    }
}

/// Fail-fast checks on the request as a whole.
fn validate_request(wlan_config: &WlanConfig, policies: &[DeploymentPolicy]) -> Result<(), CoreError> {
    if wlan_config.ssid.trim().is_empty() {
        return Err(CoreError::ValidationFailed {
            message: "SSID must not be empty".into(),
        });
    }
    if wlan_config.security.requires_passphrase() && wlan_config.passphrase.is_none() {
        return Err(CoreError::ValidationFailed {
            message: format!("security mode {} requires a passphrase", wlan_config.security),
        });
    }
    if policies.is_empty() {
        return Err(CoreError::ValidationFailed {
            message: "at least one site is required".into(),
        });
    }

    let mut seen = std::collections::HashSet::new();
    for policy in policies {
        if !seen.insert(&policy.site_id) {
            return Err(CoreError::ValidationFailed {
                message: format!("site {} listed more than once", policy.site_id),
            });
        }
        effective::validate(policy).into_result(&policy.site_id)?;
    }
    Ok(())
}
