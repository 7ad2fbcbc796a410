//! Wire types for the controller management API.
//!
//! These mirror the JSON the controller sends and accepts, including its
//! inconsistent naming (`name` vs `profileName`, bare service ids vs
//! `{ "serviceId": ... }` objects). Normalization into canonical domain
//! types happens once, in `airdeploy-core`'s conversion layer.
//! Field names use camelCase via `#[serde(rename_all = "camelCase")]`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Sites ────────────────────────────────────────────────────────────

/// Site overview from `GET v1/sites`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteResponse {
    pub id: String,
    #[serde(default)]
    pub site_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

// ── Device groups ────────────────────────────────────────────────────

/// Device group from `GET v1/sites/{siteId}/devicegroups`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceGroupResponse {
    pub id: String,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub site_id: Option<String>,
}

// ── Profiles ─────────────────────────────────────────────────────────

/// A service reference inside a profile's `services` list.
///
/// Older firmware returns bare id strings; newer firmware returns objects
/// that may carry per-radio settings alongside the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServiceRef {
    Id(String),
    Object(ServiceAssignment),
}

impl ServiceRef {
    /// The referenced service id, regardless of shape.
    pub fn service_id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Object(obj) => &obj.service_id,
        }
    }
}

/// Object form of a profile's service reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAssignment {
    pub service_id: String,
    /// Radio settings and anything else the controller attaches.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Profile from `GET v1/profiles/{id}` and `GET v1/devicegroups/{id}/profiles`.
///
/// Unknown fields are preserved in `extra` so a read-modify-write `PUT`
/// does not drop settings this client does not model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_group_id: Option<String>,
    #[serde(default)]
    pub services: Vec<ServiceRef>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl ProfileResponse {
    /// Whether the given service id is in this profile's service list.
    pub fn has_service(&self, service_id: &str) -> bool {
        self.services.iter().any(|s| s.service_id() == service_id)
    }
}

// ── Services (WLANs) ─────────────────────────────────────────────────

/// Service (WLAN) from `GET v1/services` and `POST v1/services`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResponse {
    pub id: String,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub ssid: Option<String>,
    /// `"enabled"` or `"disabled"`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub security_mode: Option<String>,
    #[serde(default)]
    pub vlan_id: Option<u16>,
    /// One of `"2.4GHz"`, `"5GHz"`, `"6GHz"`, `"all"`.
    #[serde(default)]
    pub band: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Create a service (WLAN).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCreate {
    pub service_name: String,
    pub ssid: String,
    pub status: String,
    pub security_mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passphrase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan_id: Option<u16>,
    pub band: String,
}

// ── Sync ─────────────────────────────────────────────────────────────

/// Body of `POST v1/profiles/sync`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub profile_ids: Vec<String>,
}
