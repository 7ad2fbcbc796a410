// ── Site / device group / profile reference types ──
//
// Read-only entities fetched from the controller. Names are normalized
// once at conversion time into `display_name`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub id: EntityId,
    pub display_name: String,
}

/// A collection of access points within a site sharing profiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceGroup {
    pub id: EntityId,
    pub display_name: String,
    pub site_id: Option<EntityId>,
}

/// A device configuration template; the unit WLANs are assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: EntityId,
    pub display_name: String,
    pub device_group_id: Option<EntityId>,
    /// Set when the profile was found through site discovery.
    pub site_id: Option<EntityId>,
    /// WLAN (service) ids assigned to this profile, as last observed.
    pub service_ids: BTreeSet<EntityId>,
}

impl Profile {
    pub fn has_service(&self, wlan_id: &EntityId) -> bool {
        self.service_ids.contains(wlan_id)
    }
}
