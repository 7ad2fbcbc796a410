// ── Intended-state records ──
//
// SiteAssignment captures the deployment policy for one (WLAN, site) pair.
// ProfileAssignment is the unit of reconciliation for one (WLAN, profile)
// pair. Only its `Observation` half may change after creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::entity_id::{EntityId, composite_key};
use super::mismatch::MismatchReason;

/// Policy deciding which profiles at a site receive a WLAN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum DeploymentMode {
    #[strum(serialize = "all")]
    AllProfilesAtSite,
    #[strum(serialize = "include")]
    IncludeOnly,
    #[strum(serialize = "exclude")]
    ExcludeSome,
}

/// Deployment policy for one site, before a WLAN id exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentPolicy {
    pub site_id: EntityId,
    pub deployment_mode: DeploymentMode,
    #[serde(default)]
    pub included_profiles: Vec<EntityId>,
    #[serde(default)]
    pub excluded_profiles: Vec<EntityId>,
}

impl DeploymentPolicy {
    pub fn all_profiles(site_id: impl Into<EntityId>) -> Self {
        Self {
            site_id: site_id.into(),
            deployment_mode: DeploymentMode::AllProfilesAtSite,
            included_profiles: Vec::new(),
            excluded_profiles: Vec::new(),
        }
    }

    pub fn include_only(site_id: impl Into<EntityId>, profiles: Vec<EntityId>) -> Self {
        Self {
            site_id: site_id.into(),
            deployment_mode: DeploymentMode::IncludeOnly,
            included_profiles: profiles,
            excluded_profiles: Vec::new(),
        }
    }

    pub fn exclude_some(site_id: impl Into<EntityId>, profiles: Vec<EntityId>) -> Self {
        Self {
            site_id: site_id.into(),
            deployment_mode: DeploymentMode::ExcludeSome,
            included_profiles: Vec::new(),
            excluded_profiles: profiles,
        }
    }
}

/// Stored deployment policy for one (WLAN, site) pair.
///
/// Replaced wholesale on re-deployment, never partially updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteAssignment {
    pub wlan_id: EntityId,
    #[serde(flatten)]
    pub policy: DeploymentPolicy,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SiteAssignment {
    pub fn new(wlan_id: EntityId, policy: DeploymentPolicy) -> Self {
        let now = Utc::now();
        Self {
            wlan_id,
            policy,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn site_id(&self) -> &EntityId {
        &self.policy.site_id
    }

    /// Store key: `{wlanId}_{siteId}`.
    pub fn key(&self) -> String {
        composite_key(&self.wlan_id, &self.policy.site_id)
    }
}

/// Intended assignment state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpectedState {
    Assigned,
    NotAssigned,
}

/// Observed assignment state. `Unknown` when the controller could not tell us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ObservedState {
    Assigned,
    NotAssigned,
    Unknown,
}

impl ObservedState {
    pub fn from_presence(present: bool) -> Self {
        if present { Self::Assigned } else { Self::NotAssigned }
    }

    pub fn matches(self, expected: ExpectedState) -> bool {
        matches!(
            (self, expected),
            (Self::Assigned, ExpectedState::Assigned)
                | (Self::NotAssigned, ExpectedState::NotAssigned)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    Pending,
    Synced,
    Failed,
}

/// How a profile assignment came to be intended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentSource {
    /// Derived from a site deployment policy.
    SitePropagation,
    /// Added directly against a single profile.
    Manual,
}

/// The mutable half of a `ProfileAssignment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub actual_state: ObservedState,
    pub mismatch: Option<MismatchReason>,
    pub sync_status: SyncStatus,
    pub last_reconciled: Option<DateTime<Utc>>,
}

/// Intended vs observed state for one (WLAN, profile) pair.
///
/// Identity fields and `expected_state` are fixed at creation; reconciliation
/// and remediation go through [`AssignmentStore::update_observation`], which
/// only exposes the `Observation`.
///
/// [`AssignmentStore::update_observation`]: crate::store::AssignmentStore::update_observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileAssignment {
    pub wlan_id: EntityId,
    pub profile_id: EntityId,
    pub site_id: Option<EntityId>,
    pub profile_name: String,
    pub source: AssignmentSource,
    pub expected_state: ExpectedState,
    #[serde(flatten)]
    pub observation: Observation,
    pub updated_at: DateTime<Utc>,
    /// Bumped by the store on every write.
    #[serde(default)]
    pub version: u64,
}

impl ProfileAssignment {
    /// A freshly intended assignment with nothing observed yet.
    pub fn intended(
        wlan_id: EntityId,
        profile_id: EntityId,
        site_id: Option<EntityId>,
        profile_name: String,
        source: AssignmentSource,
    ) -> Self {
        Self {
            wlan_id,
            profile_id,
            site_id,
            profile_name,
            source,
            expected_state: ExpectedState::Assigned,
            observation: Observation {
                actual_state: ObservedState::Unknown,
                mismatch: None,
                sync_status: SyncStatus::Pending,
                last_reconciled: None,
            },
            updated_at: Utc::now(),
            version: 0,
        }
    }

    /// Store key: `{wlanId}_{profileId}`.
    pub fn key(&self) -> String {
        composite_key(&self.wlan_id, &self.profile_id)
    }

    pub fn actual_state(&self) -> ObservedState {
        self.observation.actual_state
    }

    pub fn mismatch(&self) -> Option<MismatchReason> {
        self.observation.mismatch
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.observation.sync_status
    }

    /// The recorded mismatch, or `SyncFailed` when a sync failure is the
    /// only thing wrong.
    pub fn effective_mismatch(&self) -> Option<MismatchReason> {
        self.observation.mismatch.or(
            if self.observation.sync_status == SyncStatus::Failed {
                Some(MismatchReason::SyncFailed)
            } else {
                None
            },
        )
    }

    /// Healthy: no mismatch and no sync failure.
    pub fn is_healthy(&self) -> bool {
        self.effective_mismatch().is_none()
    }
}

/// Classify a reconciled assignment.
///
/// `None` when the states agree; otherwise the direction of the drift.
pub fn classify(expected: ExpectedState, actual: ObservedState) -> Option<MismatchReason> {
    if actual.matches(expected) {
        return None;
    }
    match (expected, actual) {
        (ExpectedState::Assigned, ObservedState::NotAssigned) => {
            Some(MismatchReason::MissingAssignment)
        }
        (ExpectedState::NotAssigned, ObservedState::Assigned) => {
            Some(MismatchReason::UnexpectedAssignment)
        }
        _ => Some(MismatchReason::StaleCache),
    }
}
