// ── Effective set calculator ──
//
// Pure functions, no I/O. Given a deployment policy and the profiles that
// currently exist at a site, decide which profiles receive the WLAN.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::error::CoreError;
use crate::model::{DeploymentMode, DeploymentPolicy, EntityId, Profile};

// ── Validation ───────────────────────────────────────────────────────

/// One broken rule in a deployment policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyViolation {
    #[error("INCLUDE_ONLY requires at least one included profile")]
    IncludeListEmpty,
    #[error("EXCLUDE_SOME requires at least one excluded profile")]
    ExcludeListEmpty,
    #[error("{mode:?} must not carry an include list")]
    UnexpectedIncludeList { mode: DeploymentMode },
    #[error("{mode:?} must not carry an exclude list")]
    UnexpectedExcludeList { mode: DeploymentMode },
    #[error("profile {0} appears more than once in the include list")]
    DuplicateIncluded(EntityId),
    #[error("profile {0} appears more than once in the exclude list")]
    DuplicateExcluded(EntityId),
}

/// Outcome of [`validate`]: valid iff there are no violations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyValidation {
    pub violations: Vec<PolicyViolation>,
}

impl PolicyValidation {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Turn a failed validation into `CoreError::PolicyInvalid`.
    pub fn into_result(self, site_id: &EntityId) -> Result<(), CoreError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(CoreError::PolicyInvalid {
                site_id: site_id.clone(),
                violations: self.violations,
            })
        }
    }
}

/// Check a policy against the deployment mode rules.
///
/// Reports every violation; never corrects anything.
pub fn validate(policy: &DeploymentPolicy) -> PolicyValidation {
    let mut violations = Vec::new();
    let included = !policy.included_profiles.is_empty();
    let excluded = !policy.excluded_profiles.is_empty();

    match policy.deployment_mode {
        DeploymentMode::AllProfilesAtSite => {
            if included {
                violations.push(PolicyViolation::UnexpectedIncludeList {
                    mode: policy.deployment_mode,
                });
            }
            if excluded {
                violations.push(PolicyViolation::UnexpectedExcludeList {
                    mode: policy.deployment_mode,
                });
            }
        }
        DeploymentMode::IncludeOnly => {
            if !included {
                violations.push(PolicyViolation::IncludeListEmpty);
            }
            if excluded {
                violations.push(PolicyViolation::UnexpectedExcludeList {
                    mode: policy.deployment_mode,
                });
            }
        }
        DeploymentMode::ExcludeSome => {
            if !excluded {
                violations.push(PolicyViolation::ExcludeListEmpty);
            }
            if included {
                violations.push(PolicyViolation::UnexpectedIncludeList {
                    mode: policy.deployment_mode,
                });
            }
        }
    }

    violations.extend(
        duplicates(&policy.included_profiles)
            .into_iter()
            .map(PolicyViolation::DuplicateIncluded),
    );
    violations.extend(
        duplicates(&policy.excluded_profiles)
            .into_iter()
            .map(PolicyViolation::DuplicateExcluded),
    );

    PolicyValidation { violations }
}

/// Ids seen more than once, each reported once, in first-repeat order.
fn duplicates(ids: &[EntityId]) -> Vec<EntityId> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    ids.iter()
        .filter(|id| !seen.insert(*id) && reported.insert(*id))
        .cloned()
        .collect()
}

// ── Effective set ────────────────────────────────────────────────────

/// Selected vs excluded profiles at one site.
///
/// `selected_profiles` and `excluded_profiles` partition `all_profiles`,
/// each keeping the order of `all_profiles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveProfileSet {
    pub site_id: EntityId,
    pub all_profiles: Vec<Profile>,
    pub selected_profiles: Vec<Profile>,
    pub excluded_profiles: Vec<Profile>,
}

pub fn compute_effective_set(
    policy: &DeploymentPolicy,
    all_profiles_at_site: &[Profile],
) -> EffectiveProfileSet {
    let included: HashSet<&EntityId> = policy.included_profiles.iter().collect();
    let excluded: HashSet<&EntityId> = policy.excluded_profiles.iter().collect();

    let (selected_profiles, excluded_profiles): (Vec<Profile>, Vec<Profile>) = all_profiles_at_site
        .iter()
        .cloned()
        .partition(|p| match policy.deployment_mode {
            DeploymentMode::AllProfilesAtSite => true,
            DeploymentMode::IncludeOnly => included.contains(&p.id),
            DeploymentMode::ExcludeSome => !excluded.contains(&p.id),
        });

    EffectiveProfileSet {
        site_id: policy.site_id.clone(),
        all_profiles: all_profiles_at_site.to_vec(),
        selected_profiles,
        excluded_profiles,
    }
}

/// Union of the selected profiles across sites, one entry per profile id.
///
/// The first occurrence of an id wins. Output is sorted by id so the target
/// list does not depend on site order. Profiles without a site attribution
/// inherit the site of the set they came from.
pub fn merge_effective_sets(sets: &[EffectiveProfileSet]) -> Vec<Profile> {
    let mut merged: BTreeMap<EntityId, Profile> = BTreeMap::new();

    for set in sets {
        for profile in &set.selected_profiles {
            if let Some(existing) = merged.get(&profile.id) {
                if existing.device_group_id != profile.device_group_id {
                    warn!(
                        profile_id = %profile.id,
                        kept_site = ?existing.site_id,
                        dropped_site = %set.site_id,
                        "profile appears at two sites with different device groups, keeping first"
                    );
                }
                continue;
            }
            let mut profile = profile.clone();
            profile.site_id.get_or_insert_with(|| set.site_id.clone());
            merged.insert(profile.id.clone(), profile);
        }
    }

    merged.into_values().collect()
}

// ── Summary ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveSetSummary {
    pub total: usize,
    pub assigned: usize,
    pub excluded: usize,
    /// Rounded half up; 0 when the site has no profiles.
    pub assigned_percent: u8,
}

pub fn summary(set: &EffectiveProfileSet) -> EffectiveSetSummary {
    let total = set.all_profiles.len();
    let assigned = set.selected_profiles.len();
    let assigned_percent = if total == 0 {
        0
    } else {
        u8::try_from((assigned * 100 + total / 2) / total).unwrap_or(100)
    };
    EffectiveSetSummary {
        total,
        assigned,
        excluded: set.excluded_profiles.len(),
        assigned_percent,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use pretty_assertions::assert_eq;

    use super::*;

    fn profile(id: &str, group: &str) -> Profile {
        Profile {
            id: EntityId::from(id),
            display_name: id.to_uppercase(),
            device_group_id: Some(EntityId::from(group)),
            site_id: None,
            service_ids: BTreeSet::new(),
        }
    }

    fn site_profiles() -> Vec<Profile> {
        ["p1", "p2", "p3", "p4"]
            .into_iter()
            .map(|id| profile(id, "dg1"))
            .collect()
    }

    fn ids(profiles: &[Profile]) -> Vec<String> {
        profiles.iter().map(|p| p.id.to_string()).collect()
    }

    fn eids(raw: &[&str]) -> Vec<EntityId> {
        raw.iter().map(|s| EntityId::from(*s)).collect()
    }

    #[test]
    fn include_only_selects_listed_profiles() {
        let policy = DeploymentPolicy::include_only("s1", eids(&["p1", "p3"]));
        assert!(validate(&policy).is_valid());

        let set = compute_effective_set(&policy, &site_profiles());
        assert_eq!(ids(&set.selected_profiles), vec!["p1", "p3"]);
        assert_eq!(ids(&set.excluded_profiles), vec!["p2", "p4"]);
        assert_eq!(summary(&set).assigned_percent, 50);
    }

    #[test]
    fn all_profiles_selects_everything() {
        let policy = DeploymentPolicy::all_profiles("s1");
        let set = compute_effective_set(&policy, &site_profiles());
        assert_eq!(set.selected_profiles, set.all_profiles);
        assert!(set.excluded_profiles.is_empty());
    }

    #[test]
    fn exclude_some_selects_complement() {
        let policy = DeploymentPolicy::exclude_some("s1", eids(&["p2"]));
        let set = compute_effective_set(&policy, &site_profiles());
        assert_eq!(ids(&set.excluded_profiles), vec!["p2"]);
        assert_eq!(ids(&set.selected_profiles), vec!["p1", "p3", "p4"]);
    }

    #[test]
    fn partition_is_disjoint_and_complete() {
        for policy in [
            DeploymentPolicy::all_profiles("s1"),
            DeploymentPolicy::include_only("s1", eids(&["p4", "p9"])),
            DeploymentPolicy::exclude_some("s1", eids(&["p1", "p3"])),
        ] {
            let set = compute_effective_set(&policy, &site_profiles());
            let selected: BTreeSet<_> = set.selected_profiles.iter().map(|p| &p.id).collect();
            let excluded: BTreeSet<_> = set.excluded_profiles.iter().map(|p| &p.id).collect();
            let all: BTreeSet<_> = set.all_profiles.iter().map(|p| &p.id).collect();
            assert!(selected.is_disjoint(&excluded));
            assert_eq!(&selected | &excluded, all);
        }
    }

    #[test]
    fn validate_rejects_mode_misuse() {
        let empty_include = DeploymentPolicy::include_only("s1", vec![]);
        assert_eq!(
            validate(&empty_include).violations,
            vec![PolicyViolation::IncludeListEmpty]
        );

        let empty_exclude = DeploymentPolicy::exclude_some("s1", vec![]);
        assert_eq!(
            validate(&empty_exclude).violations,
            vec![PolicyViolation::ExcludeListEmpty]
        );

        let mut all_with_lists = DeploymentPolicy::all_profiles("s1");
        all_with_lists.included_profiles = eids(&["p1"]);
        all_with_lists.excluded_profiles = eids(&["p2"]);
        assert_eq!(validate(&all_with_lists).violations.len(), 2);

        let mut include_with_exclude = DeploymentPolicy::include_only("s1", eids(&["p1"]));
        include_with_exclude.excluded_profiles = eids(&["p2"]);
        assert_eq!(
            validate(&include_with_exclude).violations,
            vec![PolicyViolation::UnexpectedExcludeList {
                mode: DeploymentMode::IncludeOnly
            }]
        );
    }

    #[test]
    fn validate_rejects_duplicates() {
        let policy = DeploymentPolicy::include_only("s1", eids(&["p1", "p2", "p1", "p1"]));
        assert_eq!(
            validate(&policy).violations,
            vec![PolicyViolation::DuplicateIncluded(EntityId::from("p1"))]
        );

        let policy = DeploymentPolicy::exclude_some("s1", eids(&["p3", "p3"]));
        assert_eq!(
            validate(&policy).violations,
            vec![PolicyViolation::DuplicateExcluded(EntityId::from("p3"))]
        );
    }

    #[test]
    fn invalid_policy_becomes_core_error() {
        let err = validate(&DeploymentPolicy::include_only("s1", vec![]))
            .into_result(&EntityId::from("s1"))
            .unwrap_err();
        assert!(matches!(err, CoreError::PolicyInvalid { .. }));
        assert!(err.to_string().contains("at least one included profile"));
    }

    #[test]
    fn merge_dedups_first_seen_and_sorts() {
        let a = compute_effective_set(
            &DeploymentPolicy::include_only("sA", eids(&["p3", "p1"])),
            &[profile("p3", "dgA"), profile("p1", "dgA")],
        );
        let b = compute_effective_set(
            &DeploymentPolicy::all_profiles("sB"),
            &[profile("p1", "dgB"), profile("p2", "dgB")],
        );

        let merged = merge_effective_sets(&[a.clone(), b.clone()]);
        assert_eq!(ids(&merged), vec!["p1", "p2", "p3"]);
        let p1 = merged.iter().find(|p| p.id == EntityId::from("p1")).unwrap();
        assert_eq!(p1.site_id, Some(EntityId::from("sA")));
        assert_eq!(p1.device_group_id, Some(EntityId::from("dgA")));

        let reversed = merge_effective_sets(&[b, a]);
        assert_eq!(ids(&reversed), vec!["p1", "p2", "p3"]);
    }

    #[test]
    fn summary_of_empty_site_is_zero() {
        let set = compute_effective_set(&DeploymentPolicy::all_profiles("s1"), &[]);
        let s = summary(&set);
        assert_eq!((s.total, s.assigned, s.excluded, s.assigned_percent), (0, 0, 0, 0));
    }

    #[test]
    fn summary_rounds_half_up() {
        let profiles: Vec<Profile> = ["a", "b", "c"].into_iter().map(|id| profile(id, "g")).collect();
        let set = compute_effective_set(
            &DeploymentPolicy::include_only("s1", eids(&["a"])),
            &profiles,
        );
        assert_eq!(summary(&set).assigned_percent, 33);

        let profiles: Vec<Profile> = (0..8).map(|i| profile(&format!("x{i}"), "g")).collect();
        let set = compute_effective_set(
            &DeploymentPolicy::exclude_some("s1", eids(&["x0", "x1", "x2"])),
            &profiles,
        );
        // 5/8 = 62.5%
        assert_eq!(summary(&set).assigned_percent, 63);
    }
}
