// ── Assignment store ──
//
// Thread-safe store for site and profile assignments. Reads come from the
// in-memory cache; every write goes through to the backend before it is
// reported as successful.

use std::collections::BTreeSet;

use chrono::Utc;

use super::StoreError;
use super::backend::{MemoryBackend, StorageBackend};
use super::collection::{Change, Collection, Record};
use crate::model::entity_id::composite_key;
use crate::model::{EntityId, Observation, ProfileAssignment, SiteAssignment};

/// Collection holding one `SiteAssignment` per (WLAN, site).
pub const SITE_ASSIGNMENTS: &str = "wlan_site_assignments";
/// Collection holding one `ProfileAssignment` per (WLAN, profile).
pub const PROFILE_ASSIGNMENTS: &str = "wlan_profile_assignments";

/// Durable record of intended deployment state.
///
/// Construct once and share behind an `Arc`. Writes to different keys
/// never contend beyond a short per-collection persist lock; writes to the
/// same profile assignment are guarded by its `version`.
pub struct AssignmentStore {
    backend: Box<dyn StorageBackend>,
    sites: Collection<SiteAssignment>,
    profiles: Collection<ProfileAssignment>,
}

impl AssignmentStore {
    /// Open a store over `backend`, loading both collections.
    pub fn open(backend: Box<dyn StorageBackend>) -> Result<Self, StoreError> {
        let sites = Collection::load(SITE_ASSIGNMENTS, backend.as_ref())?;
        let profiles = Collection::load(PROFILE_ASSIGNMENTS, backend.as_ref())?;
        tracing::debug!(
            sites = sites.len(),
            profiles = profiles.len(),
            "assignment store loaded"
        );
        Ok(Self {
            backend,
            sites,
            profiles,
        })
    }

    /// An empty store with an unbounded in-memory backend.
    pub fn in_memory() -> Self {
        Self {
            backend: Box::new(MemoryBackend::new()),
            sites: Collection::empty(SITE_ASSIGNMENTS),
            profiles: Collection::empty(PROFILE_ASSIGNMENTS),
        }
    }

    // ── Site assignments ─────────────────────────────────────────────

    /// Insert or replace a site assignment. Returns the stored record.
    pub fn save_site_assignment(
        &self,
        record: SiteAssignment,
    ) -> Result<SiteAssignment, StoreError> {
        save(&self.sites, self.backend.as_ref(), record, |_, _| Ok(()))
    }

    pub fn get_site_assignment(
        &self,
        wlan_id: &EntityId,
        site_id: &EntityId,
    ) -> Option<SiteAssignment> {
        self.sites.get(&composite_key(wlan_id, site_id))
    }

    /// All site assignments for a WLAN, ordered by site id.
    pub fn site_assignments_for_wlan(&self, wlan_id: &EntityId) -> Vec<SiteAssignment> {
        let mut records = self.sites.for_wlan(wlan_id);
        records.sort_by(|a, b| a.site_id().cmp(b.site_id()));
        records
    }

    /// Returns `false` if there was nothing to delete.
    pub fn delete_site_assignment(
        &self,
        wlan_id: &EntityId,
        site_id: &EntityId,
    ) -> Result<bool, StoreError> {
        delete(&self.sites, self.backend.as_ref(), &composite_key(wlan_id, site_id))
    }

    /// WLANs with a site assignment for `site_id`, ordered by id.
    pub fn wlans_at_site(&self, site_id: &EntityId) -> Vec<EntityId> {
        let ids: BTreeSet<EntityId> = self
            .sites
            .filter(|r| r.site_id() == site_id)
            .into_iter()
            .map(|r| r.wlan_id)
            .collect();
        ids.into_iter().collect()
    }

    pub fn delete_site_assignments_for_wlan(&self, wlan_id: &EntityId) -> Result<usize, StoreError> {
        delete_for_wlan(&self.sites, self.backend.as_ref(), wlan_id)
    }

    // ── Profile assignments ──────────────────────────────────────────

    /// Insert or replace a profile assignment. Returns the stored record
    /// with its new version and timestamp.
    ///
    /// Replacing an existing record may not change its intended state or
    /// site attribution.
    pub fn save_profile_assignment(
        &self,
        record: ProfileAssignment,
    ) -> Result<ProfileAssignment, StoreError> {
        save(&self.profiles, self.backend.as_ref(), record, check_identity)
    }

    /// Save many profile assignments in one write. Either all are stored or
    /// none are.
    pub fn batch_save_profile_assignments(
        &self,
        records: Vec<ProfileAssignment>,
    ) -> Result<Vec<ProfileAssignment>, StoreError> {
        let now = Utc::now();
        self.profiles.commit(self.backend.as_ref(), |current| {
            let mut stamped: Vec<ProfileAssignment> = Vec::with_capacity(records.len());
            for mut record in records {
                let key = record.key();
                // A later entry for the same key supersedes an earlier one in this batch.
                let previous = stamped
                    .iter()
                    .rev()
                    .find(|r| r.key() == key)
                    .cloned()
                    .or_else(|| current.get(&key));
                if let Some(prev) = &previous {
                    check_identity(prev, &record)?;
                }
                record.stamp(previous.as_ref(), now);
                stamped.push(record);
            }
            let changes = stamped
                .iter()
                .map(|r| (r.key(), Some(r.clone())))
                .collect();
            Ok((changes, stamped))
        })
    }

    pub fn get_profile_assignment(
        &self,
        wlan_id: &EntityId,
        profile_id: &EntityId,
    ) -> Option<ProfileAssignment> {
        self.profiles.get(&composite_key(wlan_id, profile_id))
    }

    /// All profile assignments for a WLAN, ordered by profile id.
    ///
    /// Matches on the record's `wlan_id`, not on a key prefix, so ids that
    /// contain `_` cannot leak between WLANs.
    pub fn profile_assignments_for_wlan(&self, wlan_id: &EntityId) -> Vec<ProfileAssignment> {
        let mut records = self.profiles.for_wlan(wlan_id);
        records.sort_by(|a, b| a.profile_id.cmp(&b.profile_id));
        records
    }

    /// Profile assignments for a WLAN attributed to one site.
    pub fn profile_assignments_for_site(
        &self,
        wlan_id: &EntityId,
        site_id: &EntityId,
    ) -> Vec<ProfileAssignment> {
        let mut records = self
            .profiles
            .filter(|r| &r.wlan_id == wlan_id && r.site_id.as_ref() == Some(site_id));
        records.sort_by(|a, b| a.profile_id.cmp(&b.profile_id));
        records
    }

    pub fn delete_profile_assignment(
        &self,
        wlan_id: &EntityId,
        profile_id: &EntityId,
    ) -> Result<bool, StoreError> {
        delete(
            &self.profiles,
            self.backend.as_ref(),
            &composite_key(wlan_id, profile_id),
        )
    }

    pub fn delete_profile_assignments_for_wlan(
        &self,
        wlan_id: &EntityId,
    ) -> Result<usize, StoreError> {
        delete_for_wlan(&self.profiles, self.backend.as_ref(), wlan_id)
    }

    /// Change only the observed half of a profile assignment.
    ///
    /// With `expected_version`, the update is refused with `VersionConflict`
    /// if the stored record has moved on since it was read.
    pub fn update_observation(
        &self,
        wlan_id: &EntityId,
        profile_id: &EntityId,
        expected_version: Option<u64>,
        update: impl FnOnce(&mut Observation),
    ) -> Result<ProfileAssignment, StoreError> {
        let key = composite_key(wlan_id, profile_id);
        let now = Utc::now();
        self.profiles.commit(self.backend.as_ref(), |current| {
            let previous = current.get(&key).ok_or_else(|| StoreError::NotFound {
                collection: PROFILE_ASSIGNMENTS.to_owned(),
                key: key.clone(),
            })?;
            if let Some(expected) = expected_version {
                if expected != previous.version {
                    return Err(StoreError::VersionConflict {
                        key: key.clone(),
                        expected,
                        found: previous.version,
                    });
                }
            }

            let mut next = previous.clone();
            update(&mut next.observation);
            next.stamp(Some(&previous), now);
            Ok((vec![(key.clone(), Some(next.clone()))], next))
        })
    }

    // ── Cross-collection ─────────────────────────────────────────────

    /// Every WLAN id with at least one record in either collection.
    pub fn tracked_wlan_ids(&self) -> BTreeSet<EntityId> {
        self.sites
            .wlan_ids()
            .into_iter()
            .chain(self.profiles.wlan_ids())
            .collect()
    }

    /// Remove everything recorded for a WLAN. Returns (sites, profiles) removed.
    pub fn delete_wlan(&self, wlan_id: &EntityId) -> Result<(usize, usize), StoreError> {
        let profiles = self.delete_profile_assignments_for_wlan(wlan_id)?;
        let sites = self.delete_site_assignments_for_wlan(wlan_id)?;
        tracing::info!(wlan_id = %wlan_id, sites, profiles, "deleted WLAN assignments");
        Ok((sites, profiles))
    }
}

// ── Shared write helpers ─────────────────────────────────────────────

fn check_identity(previous: &ProfileAssignment, next: &ProfileAssignment) -> Result<(), StoreError> {
    if previous.expected_state != next.expected_state || previous.site_id != next.site_id {
        return Err(StoreError::IdentityChanged { key: previous.key() });
    }
    Ok(())
}

fn save<T: Record>(
    collection: &Collection<T>,
    backend: &dyn StorageBackend,
    mut record: T,
    check: impl FnOnce(&T, &T) -> Result<(), StoreError>,
) -> Result<T, StoreError> {
    let now = Utc::now();
    collection.commit(backend, |current| {
        let key = record.key();
        let previous = current.get(&key);
        if let Some(prev) = &previous {
            check(prev, &record)?;
        }
        record.stamp(previous.as_ref(), now);
        Ok((vec![(key, Some(record.clone()))], record))
    })
}

fn delete<T: Record>(
    collection: &Collection<T>,
    backend: &dyn StorageBackend,
    key: &str,
) -> Result<bool, StoreError> {
    collection.commit(backend, |current| {
        if current.get(key).is_some() {
            Ok((vec![(key.to_owned(), None)], true))
        } else {
            Ok((Vec::new(), false))
        }
    })
}

fn delete_for_wlan<T: Record>(
    collection: &Collection<T>,
    backend: &dyn StorageBackend,
    wlan_id: &EntityId,
) -> Result<usize, StoreError> {
    collection.commit(backend, |current| {
        let changes: Vec<Change<T>> = current
            .for_wlan(wlan_id)
            .iter()
            .map(|r| (r.key(), None))
            .collect();
        let removed = changes.len();
        Ok((changes, removed))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{
        AssignmentSource, DeploymentPolicy, ExpectedState, MismatchReason, ObservedState,
        SyncStatus,
    };
    use crate::store::FileBackend;

    fn pa(wlan: &str, profile: &str, site: &str) -> ProfileAssignment {
        ProfileAssignment::intended(
            EntityId::from(wlan),
            EntityId::from(profile),
            Some(EntityId::from(site)),
            profile.to_uppercase(),
            AssignmentSource::SitePropagation,
        )
    }

    #[test]
    fn save_then_get_round_trips() {
        let store = AssignmentStore::in_memory();
        let original = pa("w1", "p1", "s1");
        let saved = store.save_profile_assignment(original.clone()).unwrap();

        let loaded = store
            .get_profile_assignment(&EntityId::from("w1"), &EntityId::from("p1"))
            .unwrap();
        assert_eq!(loaded, saved);
        assert!(loaded.updated_at >= original.updated_at);
        assert_eq!(
            ProfileAssignment {
                updated_at: original.updated_at,
                version: original.version,
                ..loaded
            },
            original
        );
    }

    #[test]
    fn site_assignment_resave_keeps_created_at() {
        let store = AssignmentStore::in_memory();
        let first = store
            .save_site_assignment(SiteAssignment::new(
                EntityId::from("w1"),
                DeploymentPolicy::all_profiles("s1"),
            ))
            .unwrap();
        let second = store
            .save_site_assignment(SiteAssignment::new(
                EntityId::from("w1"),
                DeploymentPolicy::exclude_some("s1", vec![EntityId::from("p2")]),
            ))
            .unwrap();
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(store.site_assignments_for_wlan(&EntityId::from("w1")).len(), 1);
    }

    #[test]
    fn wlan_scoping_uses_record_not_key_prefix() {
        let store = AssignmentStore::in_memory();
        store
            .batch_save_profile_assignments(vec![
                pa("w1", "p1", "s1"),
                pa("w1_x", "p2", "s1"),
                pa("w1", "x_p3", "s2"),
            ])
            .unwrap();

        let w1 = store.profile_assignments_for_wlan(&EntityId::from("w1"));
        let ids: Vec<String> = w1.iter().map(|r| r.profile_id.to_string()).collect();
        assert_eq!(ids, vec!["p1", "x_p3"]);

        let at_s2 = store.profile_assignments_for_site(&EntityId::from("w1"), &EntityId::from("s2"));
        assert_eq!(at_s2.len(), 1);
    }

    #[test]
    fn underscored_ids_do_not_overwrite_each_other() {
        let store = AssignmentStore::in_memory();
        store.save_profile_assignment(pa("a", "b_c", "s1")).unwrap();
        store.save_profile_assignment(pa("a_b", "c", "s1")).unwrap();

        let first = store
            .get_profile_assignment(&EntityId::from("a"), &EntityId::from("b_c"))
            .unwrap();
        assert_eq!(first.profile_id, EntityId::from("b_c"));
        let second = store
            .get_profile_assignment(&EntityId::from("a_b"), &EntityId::from("c"))
            .unwrap();
        assert_eq!(second.wlan_id, EntityId::from("a_b"));
        assert_eq!(store.tracked_wlan_ids().len(), 2);
    }

    #[test]
    fn update_observation_bumps_version_and_detects_conflicts() {
        let store = AssignmentStore::in_memory();
        let saved = store.save_profile_assignment(pa("w1", "p1", "s1")).unwrap();
        let (w, p) = (EntityId::from("w1"), EntityId::from("p1"));

        let updated = store
            .update_observation(&w, &p, Some(saved.version), |obs| {
                obs.actual_state = ObservedState::NotAssigned;
                obs.mismatch = Some(MismatchReason::MissingAssignment);
            })
            .unwrap();
        assert_eq!(updated.version, saved.version + 1);
        assert_eq!(updated.expected_state, ExpectedState::Assigned);

        let err = store
            .update_observation(&w, &p, Some(saved.version), |obs| {
                obs.sync_status = SyncStatus::Synced;
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict { .. }));

        let missing = store
            .update_observation(&w, &EntityId::from("nope"), None, |_| {})
            .unwrap_err();
        assert!(matches!(missing, StoreError::NotFound { .. }));
    }

    #[test]
    fn resave_cannot_change_intended_state() {
        let store = AssignmentStore::in_memory();
        store.save_profile_assignment(pa("w1", "p1", "s1")).unwrap();

        let mut flipped = pa("w1", "p1", "s1");
        flipped.expected_state = ExpectedState::NotAssigned;
        let err = store.save_profile_assignment(flipped).unwrap_err();
        assert!(matches!(err, StoreError::IdentityChanged { .. }));
    }

    #[test]
    fn batch_save_is_all_or_nothing() {
        let store = AssignmentStore::open(Box::new(MemoryBackend::with_quota(900))).unwrap();
        store.save_profile_assignment(pa("w1", "p0", "s1")).unwrap();

        let batch: Vec<_> = (1..=10).map(|i| pa("w1", &format!("p{i}"), "s1")).collect();
        let err = store.batch_save_profile_assignments(batch).unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { .. }));
        assert_eq!(store.profile_assignments_for_wlan(&EntityId::from("w1")).len(), 1);
    }

    #[test]
    fn delete_wlan_cascades() {
        let store = AssignmentStore::in_memory();
        let w1 = EntityId::from("w1");
        store
            .save_site_assignment(SiteAssignment::new(w1.clone(), DeploymentPolicy::all_profiles("s1")))
            .unwrap();
        store
            .batch_save_profile_assignments(vec![pa("w1", "p1", "s1"), pa("w2", "p1", "s1")])
            .unwrap();
        assert_eq!(
            store.tracked_wlan_ids().into_iter().map(|id| id.to_string()).collect::<Vec<_>>(),
            vec!["w1", "w2"]
        );

        assert_eq!(store.delete_wlan(&w1).unwrap(), (1, 1));
        assert!(store.site_assignments_for_wlan(&w1).is_empty());
        assert!(store.profile_assignments_for_wlan(&w1).is_empty());
        assert_eq!(store.tracked_wlan_ids().len(), 1);
        assert!(!store.delete_profile_assignment(&w1, &EntityId::from("p1")).unwrap());
    }

    #[test]
    fn file_backed_store_survives_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let store = AssignmentStore::open(Box::new(FileBackend::new(tmp.path()))).unwrap();
            store.save_profile_assignment(pa("w1", "p1", "s1")).unwrap();
        }
        let store = AssignmentStore::open(Box::new(FileBackend::new(tmp.path()))).unwrap();
        let record = store
            .get_profile_assignment(&EntityId::from("w1"), &EntityId::from("p1"))
            .unwrap();
        assert_eq!(record.version, 1);
        assert!(tmp.path().join("wlan_profile_assignments.json").exists());
    }

    #[test]
    fn concurrent_writers_on_distinct_keys_all_land() {
        let store = Arc::new(AssignmentStore::in_memory());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .save_profile_assignment(pa("w1", &format!("p{i}"), "s1"))
                        .unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.profile_assignments_for_wlan(&EntityId::from("w1")).len(), 8);
    }
}
