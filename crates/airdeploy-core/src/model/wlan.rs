// ── WLAN (service) domain types ──

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::entity_id::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[non_exhaustive]
pub enum WlanSecurity {
    Open,
    Wpa2Personal,
    Wpa3Personal,
    Wpa2Wpa3Personal,
    Wpa2Enterprise,
    Wpa3Enterprise,
}

impl WlanSecurity {
    /// Whether this mode needs a pre-shared key.
    pub fn requires_passphrase(self) -> bool {
        matches!(
            self,
            Self::Wpa2Personal | Self::Wpa3Personal | Self::Wpa2Wpa3Personal
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum WlanBand {
    #[serde(rename = "2.4GHz")]
    #[strum(to_string = "2.4ghz", serialize = "2.4")]
    Band2_4Ghz,
    #[serde(rename = "5GHz")]
    #[strum(to_string = "5ghz", serialize = "5")]
    Band5Ghz,
    #[serde(rename = "6GHz")]
    #[strum(to_string = "6ghz", serialize = "6")]
    Band6Ghz,
    #[default]
    #[serde(rename = "all")]
    #[strum(to_string = "all")]
    All,
}

/// The canonical WLAN type, as reported by the controller.
///
/// Owned by the controller; cached locally only for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wlan {
    pub id: EntityId,
    pub ssid: String,
    pub display_name: String,
    pub security: Option<WlanSecurity>,
    pub vlan_id: Option<u16>,
    pub band: WlanBand,
    pub enabled: bool,
}

/// Everything needed to create a WLAN on the controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WlanConfig {
    pub ssid: String,
    /// Defaults to the SSID when absent.
    #[serde(default)]
    pub name: Option<String>,
    pub security: WlanSecurity,
    #[serde(default, skip_serializing)]
    pub passphrase: Option<SecretString>,
    #[serde(default)]
    pub vlan_id: Option<u16>,
    #[serde(default)]
    pub band: WlanBand,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn security_parses_kebab_case() {
        let mode: WlanSecurity = "wpa2-personal".parse().unwrap();
        assert_eq!(mode, WlanSecurity::Wpa2Personal);
        assert!(mode.requires_passphrase());
        assert!(!WlanSecurity::Open.requires_passphrase());
    }

    #[test]
    fn band_parses_short_forms() {
        assert_eq!("5".parse::<WlanBand>().unwrap(), WlanBand::Band5Ghz);
        assert_eq!("2.4GHz".parse::<WlanBand>().unwrap(), WlanBand::Band2_4Ghz);
        assert_eq!("ALL".parse::<WlanBand>().unwrap(), WlanBand::All);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let cfg: WlanConfig = serde_json::from_str(
            r#"{ "ssid": "Guest", "security": "WPA2_PERSONAL", "passphrase": "s3cret-pass" }"#,
        )
        .unwrap();
        assert_eq!(cfg.band, WlanBand::All);
        assert!(cfg.enabled);
        assert!(cfg.passphrase.is_some());
    }
}
