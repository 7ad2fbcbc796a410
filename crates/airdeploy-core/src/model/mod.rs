// ── Domain model ──
//
// Canonical representations of controller entities and of the intended
// deployment state recorded by the assignment store. Wire shapes live in
// `airdeploy-api`; `crate::convert` maps them into these types.

pub mod assignment;
pub mod entity_id;
pub mod mismatch;
pub mod network;
pub mod wlan;

// ── Re-exports ──────────────────────────────────────────────────────

pub use entity_id::EntityId;

pub use network::{DeviceGroup, Profile, Site};

pub use wlan::{Wlan, WlanBand, WlanConfig, WlanSecurity};

pub use assignment::{
    AssignmentSource, DeploymentMode, DeploymentPolicy, ExpectedState, Observation,
    ObservedState, ProfileAssignment, SiteAssignment, SyncStatus, classify,
};

pub use mismatch::{MismatchReason, Severity};
