// ── Deployment status aggregator ──
//
// Read-only derivations over the assignment store. Nothing here is cached:
// every call recomputes from the current records.

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::Display;

use crate::model::{
    EntityId, ExpectedState, MismatchReason, Profile, ProfileAssignment, Severity, Site,
    SiteAssignment, Wlan,
};
use crate::store::AssignmentStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentStatus {
    NotDeployed,
    Deployed,
    PartiallyDeployed,
    Unknown,
}

/// Status of a WLAN from its assignment records.
///
/// - no site assignments and no profile assignments: `NotDeployed`
/// - profile assignments without any site assignment: `Unknown`
/// - every profile assignment healthy (or none at all): `Deployed`
/// - any profile assignment with a mismatch or failed sync: `PartiallyDeployed`
pub fn derive_status(sites: &[SiteAssignment], profiles: &[ProfileAssignment]) -> DeploymentStatus {
    if sites.is_empty() {
        return if profiles.is_empty() {
            DeploymentStatus::NotDeployed
        } else {
            DeploymentStatus::Unknown
        };
    }
    if profiles.iter().all(ProfileAssignment::is_healthy) {
        DeploymentStatus::Deployed
    } else {
        DeploymentStatus::PartiallyDeployed
    }
}

/// Per-WLAN rollup for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WlanStatus {
    pub wlan_id: EntityId,
    pub status: DeploymentStatus,
    pub sites: usize,
    pub profiles: usize,
    pub healthy: usize,
    pub unhealthy: usize,
    pub last_reconciled: Option<DateTime<Utc>>,
}

pub fn wlan_status(store: &AssignmentStore, wlan_id: &EntityId) -> WlanStatus {
    let sites = store.site_assignments_for_wlan(wlan_id);
    let profiles = store.profile_assignments_for_wlan(wlan_id);
    let healthy = profiles.iter().filter(|p| p.is_healthy()).count();
    WlanStatus {
        wlan_id: wlan_id.clone(),
        status: derive_status(&sites, &profiles),
        sites: sites.len(),
        profiles: profiles.len(),
        healthy,
        unhealthy: profiles.len() - healthy,
        last_reconciled: profiles
            .iter()
            .filter_map(|p| p.observation.last_reconciled)
            .max(),
    }
}

/// Status of every WLAN the store knows about.
pub fn all_statuses(store: &AssignmentStore) -> Vec<WlanStatus> {
    store
        .tracked_wlan_ids()
        .iter()
        .map(|id| wlan_status(store, id))
        .collect()
}

// ── Site inventory ───────────────────────────────────────────────────

/// Intended vs observed for one WLAN at one site.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEntry {
    pub wlan_id: EntityId,
    pub display_name: String,
    pub intended: bool,
    pub observed: bool,
    pub expected_profiles: usize,
    pub actual_profiles: usize,
    pub mismatch: Option<MismatchReason>,
    pub severity: Option<Severity>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteWlanInventory {
    pub site_id: EntityId,
    pub site_name: String,
    pub entries: Vec<InventoryEntry>,
    pub generated_at: DateTime<Utc>,
}

impl SiteWlanInventory {
    pub fn mismatch_count(&self) -> usize {
        self.entries.iter().filter(|e| e.mismatch.is_some()).count()
    }
}

/// Compare the WLANs intended at a site with what its profiles carry.
///
/// Expected counts come from the store, scoped to the site; actual counts
/// come from `profiles_at_site`. Classification order for intended WLANs:
/// no expected profiles, then nothing provisioned, then a count
/// difference. Not being observed at all overrides all three. Observed
/// WLANs that were never intended are reported as `ObservedOnly`.
pub fn create_site_inventory(
    store: &AssignmentStore,
    site: &Site,
    intended_wlans: &[Wlan],
    profiles_at_site: &[Profile],
    observed_wlans: &[Wlan],
) -> SiteWlanInventory {
    let carrying = |wlan_id: &EntityId| {
        profiles_at_site
            .iter()
            .filter(|p| p.has_service(wlan_id))
            .count()
    };

    let mut entries: Vec<InventoryEntry> = intended_wlans
        .iter()
        .map(|wlan| {
            let expected = store
                .profile_assignments_for_site(&wlan.id, &site.id)
                .iter()
                .filter(|p| p.expected_state == ExpectedState::Assigned)
                .count();
            let actual = carrying(&wlan.id);
            let observed = observed_wlans.iter().any(|o| o.id == wlan.id);

            let mut mismatch = if expected == 0 {
                Some(MismatchReason::SiteAssignmentMissing)
            } else if expected != actual && actual == 0 {
                Some(MismatchReason::ProvisioningFailed)
            } else if expected != actual {
                Some(MismatchReason::MissingAssignment)
            } else {
                None
            };
            if !observed {
                mismatch = Some(MismatchReason::IntendedOnly);
            }

            InventoryEntry {
                wlan_id: wlan.id.clone(),
                display_name: wlan.display_name.clone(),
                intended: true,
                observed,
                expected_profiles: expected,
                actual_profiles: actual,
                mismatch,
                severity: mismatch.map(MismatchReason::severity),
            }
        })
        .collect();

    entries.extend(
        observed_wlans
            .iter()
            .filter(|o| !intended_wlans.iter().any(|w| w.id == o.id))
            .map(|wlan| InventoryEntry {
                wlan_id: wlan.id.clone(),
                display_name: wlan.display_name.clone(),
                intended: false,
                observed: true,
                expected_profiles: 0,
                actual_profiles: carrying(&wlan.id),
                mismatch: Some(MismatchReason::ObservedOnly),
                severity: Some(Severity::Info),
            }),
    );

    SiteWlanInventory {
        site_id: site.id.clone(),
        site_name: site.display_name.clone(),
        entries,
        generated_at: Utc::now(),
    }
}

/// WLANs the store intends at a site, resolved against the controller's
/// WLAN list. Ids the controller no longer reports keep their id as name.
pub fn intended_wlans_at_site(
    store: &AssignmentStore,
    site_id: &EntityId,
    known: &[Wlan],
) -> Vec<Wlan> {
    store
        .wlans_at_site(site_id)
        .into_iter()
        .map(|wlan_id| {
            known
                .iter()
                .find(|w| w.id == wlan_id)
                .cloned()
                .unwrap_or_else(|| Wlan {
                    ssid: wlan_id.to_string(),
                    display_name: wlan_id.to_string(),
                    id: wlan_id,
                    security: None,
                    vlan_id: None,
                    band: crate::model::WlanBand::All,
                    enabled: true,
                })
        })
        .collect()
}

/// WLANs carried by at least one profile at the site.
pub fn observed_wlans_at_site(profiles_at_site: &[Profile], known: &[Wlan]) -> Vec<Wlan> {
    known
        .iter()
        .filter(|w| profiles_at_site.iter().any(|p| p.has_service(&w.id)))
        .cloned()
        .collect()
}
