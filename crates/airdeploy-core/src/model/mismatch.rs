// ── Mismatch taxonomy ──
//
// A mismatch is a modeled state, not an error: it records how observed
// controller state differs from intended state and drives remediation.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Classified discrepancy between intended and observed state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MismatchReason {
    /// Intended on the profile, absent on the controller.
    MissingAssignment,
    /// Present on the controller, not intended.
    UnexpectedAssignment,
    /// Assignment is in place but pushing it to devices failed.
    SyncFailed,
    /// The target profile no longer exists.
    ProfileDeleted,
    /// The profile now belongs to a different device group.
    ProfileMoved,
    /// No profile at the site is expected to carry the WLAN.
    SiteAssignmentMissing,
    /// A profile can no longer be traced back to its site.
    ProfileMappingBroken,
    /// Locally cached controller data is older than the last change.
    StaleCache,
    /// Expected profiles exist but none carries the WLAN.
    ProvisioningFailed,
    /// Broadcasting at the site but never intended there.
    ObservedOnly,
    /// Intended at the site but not broadcasting.
    IntendedOnly,
}

/// User-visible priority of a mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl MismatchReason {
    /// Fixed severity for every reason.
    pub fn severity(self) -> Severity {
        match self {
            Self::MissingAssignment
            | Self::SyncFailed
            | Self::ProfileDeleted
            | Self::SiteAssignmentMissing
            | Self::ProfileMappingBroken
            | Self::ProvisioningFailed => Severity::Error,
            Self::UnexpectedAssignment | Self::ProfileMoved | Self::IntendedOnly => {
                Severity::Warning
            }
            Self::StaleCache | Self::ObservedOnly => Severity::Info,
        }
    }

    /// Short human-readable explanation.
    pub fn describe(self) -> &'static str {
        match self {
            Self::MissingAssignment => "WLAN should be assigned to this profile but is not",
            Self::UnexpectedAssignment => "WLAN is assigned to this profile but should not be",
            Self::SyncFailed => "profile configuration was not pushed to its devices",
            Self::ProfileDeleted => "profile no longer exists on the controller",
            Self::ProfileMoved => "profile moved to a different device group",
            Self::SiteAssignmentMissing => "no profile at this site is expected to carry the WLAN",
            Self::ProfileMappingBroken => "profile can no longer be mapped to its site",
            Self::StaleCache => "cached controller data is out of date",
            Self::ProvisioningFailed => "none of the expected profiles carry the WLAN",
            Self::ObservedOnly => "WLAN is broadcasting here without being intended",
            Self::IntendedOnly => "WLAN is intended here but not broadcasting",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn every_reason_has_a_description() {
        for reason in MismatchReason::iter() {
            assert!(!reason.describe().is_empty(), "{reason} has no description");
        }
    }

    #[test]
    fn drift_severities() {
        assert_eq!(MismatchReason::ObservedOnly.severity(), Severity::Info);
        assert_eq!(MismatchReason::IntendedOnly.severity(), Severity::Warning);
        assert_eq!(MismatchReason::MissingAssignment.severity(), Severity::Error);
    }

    #[test]
    fn serializes_screaming_snake() {
        let json = serde_json::to_string(&MismatchReason::SiteAssignmentMissing).unwrap_or_default();
        assert_eq!(json, "\"SITE_ASSIGNMENT_MISSING\"");
        assert_eq!(MismatchReason::ProvisioningFailed.to_string(), "PROVISIONING_FAILED");
    }

    #[test]
    fn severity_orders_error_highest() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }
}
