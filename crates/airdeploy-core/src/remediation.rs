// ── Remediation planner / executor ──
//
// Turns classified mismatches into typed corrective actions and applies
// them one at a time against the controller. Each action is independent:
// a failure is recorded and the next action still runs.

use std::sync::Arc;

use serde::Serialize;
use strum::Display;
use tracing::{info, warn};

use crate::error::CoreError;
use crate::model::{
    EntityId, MismatchReason, ObservedState, ProfileAssignment, SyncStatus, classify,
};
use crate::remote::WlanApi;
use crate::store::AssignmentStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RemediationKind {
    AddAssignment,
    RemoveAssignment,
    ResyncProfile,
}

/// Corrective action for one mismatch. `None` means nothing can be done
/// remotely (e.g. the profile no longer exists).
pub fn action_for(reason: MismatchReason) -> Option<RemediationKind> {
    match reason {
        MismatchReason::MissingAssignment | MismatchReason::ProvisioningFailed => {
            Some(RemediationKind::AddAssignment)
        }
        MismatchReason::UnexpectedAssignment => Some(RemediationKind::RemoveAssignment),
        MismatchReason::SyncFailed | MismatchReason::ProfileMoved => {
            Some(RemediationKind::ResyncProfile)
        }
        MismatchReason::ProfileDeleted
        | MismatchReason::SiteAssignmentMissing
        | MismatchReason::ProfileMappingBroken
        | MismatchReason::StaleCache
        | MismatchReason::ObservedOnly
        | MismatchReason::IntendedOnly => None,
    }
}

/// Typed instruction targeting one profile assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemediationAction {
    pub kind: RemediationKind,
    pub wlan_id: EntityId,
    pub profile_id: EntityId,
    pub profile_name: String,
    pub mismatch: MismatchReason,
    pub reason: String,
}

/// One action per remediable mismatch, in input order.
pub fn plan(mismatches: &[ProfileAssignment]) -> Vec<RemediationAction> {
    mismatches
        .iter()
        .filter_map(|record| {
            let mismatch = record.effective_mismatch()?;
            let kind = action_for(mismatch)?;
            Some(RemediationAction {
                kind,
                wlan_id: record.wlan_id.clone(),
                profile_id: record.profile_id.clone(),
                profile_name: record.profile_name.clone(),
                mismatch,
                reason: mismatch.describe().to_owned(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub action: RemediationAction,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemediationReport {
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<ActionResult>,
}

pub struct Remediator<A> {
    api: Arc<A>,
    store: Arc<AssignmentStore>,
}

impl<A: WlanApi> Remediator<A> {
    pub fn new(api: Arc<A>, store: Arc<AssignmentStore>) -> Self {
        Self { api, store }
    }

    /// Run every action in order, isolating failures.
    pub async fn execute(&self, actions: &[RemediationAction]) -> RemediationReport {
        let mut report = RemediationReport::default();
        for action in actions {
            let outcome = self.apply(action).await;
            let error = match outcome {
                Ok(()) => {
                    report.successful += 1;
                    None
                }
                Err(e) => {
                    warn!(
                        kind = %action.kind,
                        wlan_id = %action.wlan_id,
                        profile_id = %action.profile_id,
                        error = %e,
                        "remediation action failed"
                    );
                    report.failed += 1;
                    Some(e.to_string())
                }
            };
            report.results.push(ActionResult {
                action: action.clone(),
                success: error.is_none(),
                error,
            });
        }
        info!(
            successful = report.successful,
            failed = report.failed,
            "remediation finished"
        );
        report
    }

    async fn apply(&self, action: &RemediationAction) -> Result<(), CoreError> {
        let record = self
            .store
            .get_profile_assignment(&action.wlan_id, &action.profile_id)
            .ok_or_else(|| CoreError::NotFound {
                entity_type: "profile assignment".into(),
                identifier: format!("{}/{}", action.wlan_id, action.profile_id),
            })?;
        let expected = record.expected_state;

        match action.kind {
            RemediationKind::AddAssignment => {
                self.api
                    .assign_service_to_profile(&action.wlan_id, &action.profile_id)
                    .await?;
                self.store
                    .update_observation(&action.wlan_id, &action.profile_id, None, |obs| {
                        obs.actual_state = ObservedState::Assigned;
                        obs.mismatch = classify(expected, ObservedState::Assigned);
                        obs.sync_status = SyncStatus::Pending;
                    })?;
            }
            RemediationKind::RemoveAssignment => {
                self.api
                    .unassign_service_from_profile(&action.wlan_id, &action.profile_id)
                    .await?;
                self.store
                    .update_observation(&action.wlan_id, &action.profile_id, None, |obs| {
                        obs.actual_state = ObservedState::NotAssigned;
                        obs.mismatch = classify(expected, ObservedState::NotAssigned);
                    })?;
            }
            RemediationKind::ResyncProfile => {
                self.api.sync_profile(&action.profile_id).await?;
                self.store
                    .update_observation(&action.wlan_id, &action.profile_id, None, |obs| {
                        obs.sync_status = SyncStatus::Synced;
                        if matches!(
                            obs.mismatch,
                            Some(MismatchReason::SyncFailed | MismatchReason::ProfileMoved)
                        ) {
                            obs.mismatch = None;
                        }
                    })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::Ordering;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{AssignmentSource, ExpectedState};
    use crate::test_support::{FakeApi, id};

    fn mismatched(profile: &str, reason: MismatchReason) -> ProfileAssignment {
        let mut r = ProfileAssignment::intended(
            id("w1"),
            id(profile),
            Some(id("s1")),
            profile.to_uppercase(),
            AssignmentSource::SitePropagation,
        );
        r.observation.mismatch = Some(reason);
        r
    }

    #[test]
    fn deleted_profiles_produce_no_action() {
        let actions = plan(&[
            mismatched("p1", MismatchReason::MissingAssignment),
            mismatched("p2", MismatchReason::ProfileDeleted),
        ]);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind, RemediationKind::AddAssignment);
        assert_eq!(actions[0].profile_id, id("p1"));
        assert_eq!(actions[0].mismatch, MismatchReason::MissingAssignment);
    }

    #[test]
    fn action_table() {
        assert_eq!(
            action_for(MismatchReason::UnexpectedAssignment),
            Some(RemediationKind::RemoveAssignment)
        );
        assert_eq!(
            action_for(MismatchReason::SyncFailed),
            Some(RemediationKind::ResyncProfile)
        );
        assert_eq!(
            action_for(MismatchReason::ProfileMoved),
            Some(RemediationKind::ResyncProfile)
        );
        assert_eq!(
            action_for(MismatchReason::ProvisioningFailed),
            Some(RemediationKind::AddAssignment)
        );
        assert_eq!(action_for(MismatchReason::StaleCache), None);
    }

    #[test]
    fn sync_failure_without_mismatch_is_planned() {
        let mut r = mismatched("p1", MismatchReason::MissingAssignment);
        r.observation.mismatch = None;
        r.observation.sync_status = SyncStatus::Failed;
        let actions = plan(&[r]);
        assert_eq!(actions[0].kind, RemediationKind::ResyncProfile);
    }

    fn setup() -> (Arc<FakeApi>, Arc<AssignmentStore>, Remediator<FakeApi>) {
        let api = Arc::new(FakeApi::new().with_site("s1", &[("dg1", &["p1", "p2", "p3"])]));
        let store = Arc::new(AssignmentStore::in_memory());
        let rem = Remediator::new(Arc::clone(&api), Arc::clone(&store));
        (api, store, rem)
    }

    #[tokio::test]
    async fn add_assignment_fixes_remote_and_store() {
        let (api, store, rem) = setup();
        let saved = store
            .save_profile_assignment(mismatched("p1", MismatchReason::MissingAssignment))
            .unwrap();

        let report = rem.execute(&plan(&[saved])).await;
        assert_eq!((report.successful, report.failed), (1, 0));
        assert!(api.profile("p1").unwrap().has_service(&id("w1")));

        let p1 = store.get_profile_assignment(&id("w1"), &id("p1")).unwrap();
        assert_eq!(p1.actual_state(), ObservedState::Assigned);
        assert_eq!(p1.mismatch(), None);
        assert_eq!(p1.sync_status(), SyncStatus::Pending);
    }

    #[tokio::test]
    async fn remove_assignment_unassigns() {
        let (api, store, rem) = setup();
        api.set_assigned("w1", "p2", true);
        let mut record = mismatched("p2", MismatchReason::UnexpectedAssignment);
        record.expected_state = ExpectedState::NotAssigned;
        let saved = store.save_profile_assignment(record).unwrap();

        let report = rem.execute(&plan(&[saved])).await;
        assert_eq!(report.successful, 1);
        assert_eq!(api.unassign_calls.load(Ordering::SeqCst), 1);
        assert!(!api.profile("p2").unwrap().has_service(&id("w1")));

        let p2 = store.get_profile_assignment(&id("w1"), &id("p2")).unwrap();
        assert_eq!(p2.actual_state(), ObservedState::NotAssigned);
        assert_eq!(p2.mismatch(), None);
    }

    #[tokio::test]
    async fn failures_are_isolated() {
        let (api, store, rem) = setup();
        FakeApi::fail(&api.failing_assign, "p1");
        let records = store
            .batch_save_profile_assignments(vec![
                mismatched("p1", MismatchReason::MissingAssignment),
                mismatched("p3", MismatchReason::SyncFailed),
            ])
            .unwrap();

        let report = rem.execute(&plan(&records)).await;
        assert_eq!((report.successful, report.failed), (1, 1));
        assert!(!report.results[0].success);
        assert!(report.results[0].error.is_some());
        assert!(report.results[1].success);

        let p1 = store.get_profile_assignment(&id("w1"), &id("p1")).unwrap();
        assert_eq!(p1.mismatch(), Some(MismatchReason::MissingAssignment));
        let p3 = store.get_profile_assignment(&id("w1"), &id("p3")).unwrap();
        assert_eq!(p3.sync_status(), SyncStatus::Synced);
        assert_eq!(p3.mismatch(), None);
    }

    #[tokio::test]
    async fn action_for_untracked_record_fails_without_remote_call() {
        let (api, _, rem) = setup();
        let actions = plan(&[mismatched("p1", MismatchReason::MissingAssignment)]);
        let report = rem.execute(&actions).await;
        assert_eq!(report.failed, 1);
        assert_eq!(api.assign_calls.load(Ordering::SeqCst), 0);
    }
}
