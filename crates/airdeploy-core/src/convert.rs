// ── API-to-domain type conversions ──
//
// Bridges raw `airdeploy_api` wire types into canonical `crate::model`
// domain types. This is the only place that knows about the controller's
// alternative name fields (`name`, `profileName`, `serviceName`, `ssid`)
// and its two service-reference shapes. Everything downstream sees a single
// `display_name` and a set of service ids.

use secrecy::ExposeSecret;

use airdeploy_api::types::{
    DeviceGroupResponse, ProfileResponse, ServiceCreate, ServiceResponse, SiteResponse,
};

use crate::model::{DeviceGroup, EntityId, Profile, Site, Wlan, WlanBand, WlanConfig, WlanSecurity};

// ── Helpers ────────────────────────────────────────────────────────

/// First non-blank candidate, falling back to the entity id.
fn display_name(candidates: &[&Option<String>], id: &str) -> String {
    candidates
        .iter()
        .filter_map(|c| c.as_deref())
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(id)
        .to_owned()
}

fn security_to_wire(security: WlanSecurity) -> &'static str {
    match security {
        WlanSecurity::Open => "OPEN",
        WlanSecurity::Wpa2Personal => "WPA2_PERSONAL",
        WlanSecurity::Wpa3Personal => "WPA3_PERSONAL",
        WlanSecurity::Wpa2Wpa3Personal => "WPA2_WPA3_PERSONAL",
        WlanSecurity::Wpa2Enterprise => "WPA2_ENTERPRISE",
        WlanSecurity::Wpa3Enterprise => "WPA3_ENTERPRISE",
    }
}

/// Unknown modes (newer firmware) map to `None` rather than failing the listing.
fn security_from_wire(raw: &str) -> Option<WlanSecurity> {
    match raw.to_ascii_uppercase().replace('-', "_").as_str() {
        "OPEN" => Some(WlanSecurity::Open),
        "WPA2_PERSONAL" | "WPA2" => Some(WlanSecurity::Wpa2Personal),
        "WPA3_PERSONAL" | "WPA3" => Some(WlanSecurity::Wpa3Personal),
        "WPA2_WPA3_PERSONAL" => Some(WlanSecurity::Wpa2Wpa3Personal),
        "WPA2_ENTERPRISE" => Some(WlanSecurity::Wpa2Enterprise),
        "WPA3_ENTERPRISE" => Some(WlanSecurity::Wpa3Enterprise),
        _ => None,
    }
}

fn band_to_wire(band: WlanBand) -> &'static str {
    match band {
        WlanBand::Band2_4Ghz => "2.4GHz",
        WlanBand::Band5Ghz => "5GHz",
        WlanBand::Band6Ghz => "6GHz",
        WlanBand::All => "all",
    }
}

fn band_from_wire(raw: Option<&str>) -> WlanBand {
    raw.and_then(|b| b.parse().ok()).unwrap_or_default()
}

// ── Site / device group / profile ──────────────────────────────────

impl From<SiteResponse> for Site {
    fn from(s: SiteResponse) -> Self {
        let display_name = display_name(&[&s.site_name, &s.name], &s.id);
        Site {
            id: EntityId::from(s.id),
            display_name,
        }
    }
}

impl From<DeviceGroupResponse> for DeviceGroup {
    fn from(g: DeviceGroupResponse) -> Self {
        let display_name = display_name(&[&g.group_name, &g.name], &g.id);
        DeviceGroup {
            id: EntityId::from(g.id),
            display_name,
            site_id: g.site_id.map(EntityId::from),
        }
    }
}

impl From<ProfileResponse> for Profile {
    fn from(p: ProfileResponse) -> Self {
        let display_name = display_name(&[&p.name, &p.profile_name], &p.id);
        let service_ids = p
            .services
            .iter()
            .map(|s| EntityId::from(s.service_id()))
            .collect();
        Profile {
            id: EntityId::from(p.id),
            display_name,
            device_group_id: p.device_group_id.map(EntityId::from),
            site_id: None,
            service_ids,
        }
    }
}

// ── Service (WLAN) ─────────────────────────────────────────────────

impl From<ServiceResponse> for Wlan {
    fn from(s: ServiceResponse) -> Self {
        let display_name = display_name(&[&s.service_name, &s.ssid], &s.id);
        let enabled = s
            .status
            .as_deref()
            .is_none_or(|st| !st.eq_ignore_ascii_case("disabled"));
        Wlan {
            ssid: s.ssid.clone().unwrap_or_else(|| display_name.clone()),
            security: s.security_mode.as_deref().and_then(security_from_wire),
            band: band_from_wire(s.band.as_deref()),
            vlan_id: s.vlan_id,
            id: EntityId::from(s.id),
            display_name,
            enabled,
        }
    }
}

/// Build the `POST v1/services` body for a new WLAN.
pub(crate) fn service_create(config: &WlanConfig) -> ServiceCreate {
    let service_name = config
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(&config.ssid)
        .to_owned();
    ServiceCreate {
        service_name,
        ssid: config.ssid.clone(),
        status: if config.enabled { "enabled" } else { "disabled" }.into(),
        security_mode: security_to_wire(config.security).into(),
        passphrase: config
            .passphrase
            .as_ref()
            .map(|p| p.expose_secret().to_owned()),
        vlan_id: config.vlan_id,
        band: band_to_wire(config.band).into(),
    }
}
