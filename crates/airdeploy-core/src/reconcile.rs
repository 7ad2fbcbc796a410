// ── Reconciliation engine ──
//
// Re-reads each tracked profile from the controller, compares it with the
// intended state and writes the observation back immediately, one record
// at a time. A pass that stops early leaves every checked record durable.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::CoreError;
use crate::model::{
    EntityId, ExpectedState, MismatchReason, ObservedState, ProfileAssignment, classify,
};
use crate::remote::WlanApi;
use crate::store::{AssignmentStore, StoreError};

/// A profile that could not be checked in this pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileFailure {
    pub profile_id: EntityId,
    pub error: String,
}

/// Snapshot of one reconciliation pass over a WLAN.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResult {
    pub wlan_id: EntityId,
    /// Records intended to carry the WLAN.
    pub expected_count: usize,
    /// Checked records observed carrying the WLAN.
    pub actual_count: usize,
    pub matched_count: usize,
    pub mismatched_count: usize,
    /// Records with an effective mismatch after this pass.
    pub mismatches: Vec<ProfileAssignment>,
    /// Records left untouched because the controller call failed.
    pub failures: Vec<ReconcileFailure>,
    pub reconciled_at: DateTime<Utc>,
}

impl ReconciliationResult {
    fn empty(wlan_id: &EntityId) -> Self {
        Self {
            wlan_id: wlan_id.clone(),
            expected_count: 0,
            actual_count: 0,
            matched_count: 0,
            mismatched_count: 0,
            mismatches: Vec::new(),
            failures: Vec::new(),
            reconciled_at: Utc::now(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.mismatched_count == 0 && self.failures.is_empty()
    }
}

/// Outcome of reconciling every tracked WLAN.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileAllReport {
    pub results: Vec<ReconciliationResult>,
    /// WLANs whose pass aborted, with the reason.
    pub failed: Vec<(EntityId, String)>,
    /// Set when cancellation stopped the run before every WLAN was visited.
    pub cancelled: bool,
}

pub struct Reconciler<A> {
    api: Arc<A>,
    store: Arc<AssignmentStore>,
}

impl<A: WlanApi> Reconciler<A> {
    pub fn new(api: Arc<A>, store: Arc<AssignmentStore>) -> Self {
        Self { api, store }
    }

    /// Reconcile every profile assignment recorded for `wlan_id`.
    ///
    /// Controller errors for a single profile are reported in `failures`
    /// and leave that record untouched. A storage failure aborts the pass.
    pub async fn reconcile(&self, wlan_id: &EntityId) -> Result<ReconciliationResult, CoreError> {
        let records = self.store.profile_assignments_for_wlan(wlan_id);
        let mut result = ReconciliationResult::empty(wlan_id);
        if records.is_empty() {
            return Ok(result);
        }

        for record in records {
            if record.expected_state == ExpectedState::Assigned {
                result.expected_count += 1;
            }

            let (actual, mismatch) = match self.api.profile_by_id(&record.profile_id).await {
                Ok(None) => (ObservedState::Unknown, Some(MismatchReason::ProfileDeleted)),
                Ok(Some(profile)) => {
                    let actual = ObservedState::from_presence(profile.has_service(wlan_id));
                    (actual, classify(record.expected_state, actual))
                }
                Err(e) => {
                    warn!(
                        wlan_id = %wlan_id,
                        profile_id = %record.profile_id,
                        error = %e,
                        "could not fetch profile during reconciliation"
                    );
                    result.failures.push(ReconcileFailure {
                        profile_id: record.profile_id,
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let now = Utc::now();
            let updated = match self.store.update_observation(
                wlan_id,
                &record.profile_id,
                Some(record.version),
                |obs| {
                    obs.actual_state = actual;
                    obs.mismatch = mismatch;
                    obs.last_reconciled = Some(now);
                },
            ) {
                Ok(updated) => updated,
                Err(e @ (StoreError::VersionConflict { .. } | StoreError::NotFound { .. })) => {
                    warn!(
                        wlan_id = %wlan_id,
                        profile_id = %record.profile_id,
                        error = %e,
                        "record changed during reconciliation, skipped"
                    );
                    result.failures.push(ReconcileFailure {
                        profile_id: record.profile_id,
                        error: e.to_string(),
                    });
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if updated.actual_state() == ObservedState::Assigned {
                result.actual_count += 1;
            }
            if updated.is_healthy() {
                result.matched_count += 1;
            } else {
                result.mismatched_count += 1;
                result.mismatches.push(updated);
            }
        }

        result.reconciled_at = Utc::now();
        info!(
            wlan_id = %wlan_id,
            expected = result.expected_count,
            actual = result.actual_count,
            matched = result.matched_count,
            mismatched = result.mismatched_count,
            failed = result.failures.len(),
            "reconciliation finished"
        );
        Ok(result)
    }

    /// Reconcile every tracked WLAN independently.
    ///
    /// One WLAN failing does not stop the others. Cancellation stops
    /// starting new WLANs; the one in progress runs to completion.
    pub async fn reconcile_all(&self, cancel: &CancellationToken) -> ReconcileAllReport {
        let mut report = ReconcileAllReport::default();
        for wlan_id in self.store.tracked_wlan_ids() {
            if cancel.is_cancelled() {
                info!("reconciliation cancelled");
                report.cancelled = true;
                break;
            }
            match self.reconcile(&wlan_id).await {
                Ok(result) => report.results.push(result),
                Err(e) => {
                    warn!(wlan_id = %wlan_id, error = %e, "reconciliation failed for WLAN");
                    report.failed.push((wlan_id, e.to_string()));
                }
            }
        }
        report
    }
}
