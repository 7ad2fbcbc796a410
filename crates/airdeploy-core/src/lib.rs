// airdeploy-core: WLAN deployment planning, reconciliation and remediation
// on top of airdeploy-api.

pub mod config;
pub mod convert;
pub mod discovery;
pub mod effective;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod reconcile;
pub mod remediation;
pub mod remote;
pub mod status;
pub mod store;

#[cfg(test)]
mod test_support;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ControllerConfig, DEFAULT_BATCH_SIZE, DeployOptions, TlsVerification};
pub use error::CoreError;
pub use remote::WlanApi;
pub use store::{AssignmentStore, FileBackend, MemoryBackend, StorageBackend, StoreError};

pub use effective::{
    EffectiveProfileSet, EffectiveSetSummary, PolicyValidation, PolicyViolation,
    compute_effective_set, merge_effective_sets, summary, validate,
};
pub use orchestrator::{DeleteSummary, DeploymentResult, Orchestrator, ProfileOutcome, SitePlan};
pub use reconcile::{ReconcileAllReport, ReconcileFailure, Reconciler, ReconciliationResult};
pub use remediation::{
    ActionResult, RemediationAction, RemediationKind, RemediationReport, Remediator, action_for,
    plan,
};
pub use status::{
    DeploymentStatus, InventoryEntry, SiteWlanInventory, WlanStatus, create_site_inventory,
    derive_status,
};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    AssignmentSource, DeploymentMode, DeploymentPolicy, DeviceGroup, EntityId, ExpectedState,
    MismatchReason, Observation, ObservedState, Profile, ProfileAssignment, Severity, Site,
    SiteAssignment, SyncStatus, Wlan, WlanBand, WlanConfig, WlanSecurity,
};
