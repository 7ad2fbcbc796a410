// ── Controller object ids ──
//
// WLANs, sites, device groups and profiles are all addressed by an id the
// controller hands out. Newer firmware issues UUIDs, sites imported from
// older installs keep free-form strings; nothing here depends on which.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Id of a WLAN, site, device group or profile, exactly as the controller
/// reports it. Serialized as a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Store key `{wlanId}_{otherId}` for an assignment record.
///
/// `_` is the separator, so inside an id it is written as `%5F` (and `%`
/// as `%25`). Ids containing neither keep the plain form.
pub(crate) fn composite_key(wlan_id: &EntityId, other: &EntityId) -> String {
    format!("{}_{}", key_part(wlan_id), key_part(other))
}

fn key_part(id: &EntityId) -> String {
    let raw = id.as_str();
    if !raw.contains(['_', '%']) {
        return raw.to_owned();
    }
    raw.replace('%', "%25").replace('_', "%5F")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn uuid_and_legacy_ids_are_kept_verbatim() {
        for raw in ["550e8400-e29b-41d4-a716-446655440000", "5f1e9c0a2b3c4d5e6f708192"] {
            let id = EntityId::from(raw);
            assert_eq!(id.as_str(), raw);
            assert_eq!(serde_json::to_string(&id).unwrap(), format!("\"{raw}\""));
            let back: EntityId = serde_json::from_str(&format!("\"{raw}\"")).unwrap();
            assert_eq!(back, id);
        }
    }

    #[test]
    fn ids_order_as_strings() {
        let mut ids = vec![EntityId::from("p2"), EntityId::from("p10"), EntityId::from("p1")];
        ids.sort();
        assert_eq!(ids, vec![EntityId::from("p1"), EntityId::from("p10"), EntityId::from("p2")]);
    }

    #[test]
    fn composite_key_joins_with_underscore() {
        let key = composite_key(&EntityId::from("wlan1"), &EntityId::from("p1"));
        assert_eq!(key, "wlan1_p1");
    }

    #[test]
    fn composite_key_keeps_underscored_ids_apart() {
        let a = composite_key(&EntityId::from("a"), &EntityId::from("b_c"));
        let b = composite_key(&EntityId::from("a_b"), &EntityId::from("c"));
        assert_ne!(a, b);
        assert_eq!(a, "a_b%5Fc");
        assert_eq!(b, "a%5Fb_c");
        assert_ne!(composite_key(&EntityId::from("a%5Fb"), &EntityId::from("c")), b);
    }
}
