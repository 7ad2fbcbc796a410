// Scripted in-memory controller for engine tests.

#![allow(clippy::unwrap_used)]

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::error::CoreError;
use crate::model::{DeviceGroup, EntityId, Profile, Site, Wlan, WlanConfig};
use crate::remote::WlanApi;
use crate::store::{MemoryBackend, StorageBackend, StoreError};

pub(crate) fn id(raw: &str) -> EntityId {
    EntityId::from(raw)
}

fn api_error(message: &str) -> CoreError {
    CoreError::Api {
        message: message.into(),
        code: None,
        status: Some(500),
    }
}

#[derive(Default)]
pub(crate) struct FakeApi {
    sites: Mutex<BTreeMap<EntityId, Vec<DeviceGroup>>>,
    profiles: Mutex<BTreeMap<EntityId, Profile>>,
    services: Mutex<Vec<Wlan>>,

    pub failing_sites: Mutex<HashSet<EntityId>>,
    pub failing_assign: Mutex<HashSet<EntityId>>,
    pub failing_sync: Mutex<HashSet<EntityId>>,
    pub failing_fetch: Mutex<HashSet<EntityId>>,
    pub fail_batch_sync: AtomicBool,
    pub fail_create: AtomicBool,

    pub create_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub assign_calls: AtomicUsize,
    pub unassign_calls: AtomicUsize,
    pub sync_calls: AtomicUsize,
    pub batch_sync_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,

    pub assign_log: Mutex<Vec<EntityId>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add a site with one device group per `(group, profiles)` entry.
    pub(crate) fn with_site(self, site: &str, groups: &[(&str, &[&str])]) -> Self {
        {
            let mut sites = self.sites.lock().unwrap();
            let mut profiles = self.profiles.lock().unwrap();
            let entry = sites.entry(id(site)).or_default();
            for (group, members) in groups {
                entry.push(DeviceGroup {
                    id: id(group),
                    display_name: group.to_uppercase(),
                    site_id: Some(id(site)),
                });
                for member in *members {
                    profiles.insert(
                        id(member),
                        Profile {
                            id: id(member),
                            display_name: member.to_uppercase(),
                            device_group_id: Some(id(group)),
                            site_id: None,
                            service_ids: BTreeSet::new(),
                        },
                    );
                }
            }
        }
        self
    }

    pub(crate) fn profile(&self, profile: &str) -> Option<Profile> {
        self.profiles.lock().unwrap().get(&id(profile)).cloned()
    }

    pub(crate) fn set_assigned(&self, wlan: &str, profile: &str, assigned: bool) {
        let mut profiles = self.profiles.lock().unwrap();
        let p = profiles.get_mut(&id(profile)).unwrap();
        if assigned {
            p.service_ids.insert(id(wlan));
        } else {
            p.service_ids.remove(&id(wlan));
        }
    }

    pub(crate) fn remove_profile(&self, profile: &str) {
        self.profiles.lock().unwrap().remove(&id(profile));
    }

    pub(crate) fn fail(set: &Mutex<HashSet<EntityId>>, raw: &str) {
        set.lock().unwrap().insert(id(raw));
    }

    pub(crate) fn writes(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
            + self.delete_calls.load(Ordering::SeqCst)
            + self.assign_calls.load(Ordering::SeqCst)
            + self.unassign_calls.load(Ordering::SeqCst)
            + self.sync_calls.load(Ordering::SeqCst)
            + self.batch_sync_calls.load(Ordering::SeqCst)
    }

    fn contains(set: &Mutex<HashSet<EntityId>>, key: &EntityId) -> bool {
        set.lock().unwrap().contains(key)
    }
}

impl WlanApi for FakeApi {
    async fn list_sites(&self) -> Result<Vec<Site>, CoreError> {
        Ok(self
            .sites
            .lock()
            .unwrap()
            .keys()
            .map(|s| Site {
                id: s.clone(),
                display_name: s.to_string(),
            })
            .collect())
    }

    async fn device_groups_by_site(&self, site_id: &EntityId) -> Result<Vec<DeviceGroup>, CoreError> {
        if Self::contains(&self.failing_sites, site_id) {
            return Err(api_error("site lookup failed"));
        }
        Ok(self
            .sites
            .lock()
            .unwrap()
            .get(site_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn profiles_by_device_group(
        &self,
        device_group_id: &EntityId,
    ) -> Result<Vec<Profile>, CoreError> {
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.device_group_id.as_ref() == Some(device_group_id))
            .cloned()
            .collect())
    }

    async fn profile_by_id(&self, profile_id: &EntityId) -> Result<Option<Profile>, CoreError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if Self::contains(&self.failing_fetch, profile_id) {
            return Err(api_error("profile fetch failed"));
        }
        Ok(self.profiles.lock().unwrap().get(profile_id).cloned())
    }

    async fn list_services(&self) -> Result<Vec<Wlan>, CoreError> {
        Ok(self.services.lock().unwrap().clone())
    }

    async fn create_service(&self, config: &WlanConfig) -> Result<Wlan, CoreError> {
        let n = self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(api_error("service creation failed"));
        }
        let wlan = Wlan {
            id: id(&format!("wlan-{}", n + 1)),
            ssid: config.ssid.clone(),
            display_name: config.name.clone().unwrap_or_else(|| config.ssid.clone()),
            security: Some(config.security),
            vlan_id: config.vlan_id,
            band: config.band,
            enabled: config.enabled,
        };
        self.services.lock().unwrap().push(wlan.clone());
        Ok(wlan)
    }

    async fn delete_service(&self, wlan_id: &EntityId) -> Result<(), CoreError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let mut services = self.services.lock().unwrap();
        let before = services.len();
        services.retain(|w| &w.id != wlan_id);
        if services.len() == before {
            return Err(CoreError::NotFound {
                entity_type: "service".into(),
                identifier: wlan_id.to_string(),
            });
        }
        Ok(())
    }

    async fn assign_service_to_profile(
        &self,
        wlan_id: &EntityId,
        profile_id: &EntityId,
    ) -> Result<(), CoreError> {
        self.assign_calls.fetch_add(1, Ordering::SeqCst);
        self.assign_log.lock().unwrap().push(profile_id.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if Self::contains(&self.failing_assign, profile_id) {
            return Err(api_error("assignment rejected"));
        }
        let mut profiles = self.profiles.lock().unwrap();
        let profile = profiles.get_mut(profile_id).ok_or_else(|| CoreError::NotFound {
            entity_type: "profile".into(),
            identifier: profile_id.to_string(),
        })?;
        profile.service_ids.insert(wlan_id.clone());
        Ok(())
    }

    async fn unassign_service_from_profile(
        &self,
        wlan_id: &EntityId,
        profile_id: &EntityId,
    ) -> Result<(), CoreError> {
        self.unassign_calls.fetch_add(1, Ordering::SeqCst);
        let mut profiles = self.profiles.lock().unwrap();
        if let Some(profile) = profiles.get_mut(profile_id) {
            profile.service_ids.remove(wlan_id);
        }
        Ok(())
    }

    async fn sync_profile(&self, profile_id: &EntityId) -> Result<(), CoreError> {
        self.sync_calls.fetch_add(1, Ordering::SeqCst);
        if Self::contains(&self.failing_sync, profile_id) {
            return Err(api_error("sync failed"));
        }
        Ok(())
    }

    async fn sync_profiles(&self, _profile_ids: &[EntityId]) -> Result<(), CoreError> {
        self.batch_sync_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_batch_sync.load(Ordering::SeqCst) {
            return Err(api_error("batch sync failed"));
        }
        Ok(())
    }
}

/// Backend that accepts a fixed number of writes, then reports a full disk
/// for a while.
pub(crate) struct FlakyBackend {
    inner: MemoryBackend,
    remaining: AtomicUsize,
    rejections: AtomicUsize,
}

impl FlakyBackend {
    /// Accepts `writes` writes, then rejects every later one.
    pub(crate) fn accepting(writes: usize) -> Self {
        Self::rejecting(writes, usize::MAX)
    }

    /// Accepts `writes` writes, rejects the next `rejected`, then recovers.
    pub(crate) fn rejecting(writes: usize, rejected: usize) -> Self {
        Self {
            inner: MemoryBackend::new(),
            remaining: AtomicUsize::new(writes),
            rejections: AtomicUsize::new(rejected),
        }
    }
}

impl StorageBackend for FlakyBackend {
    fn load(&self, collection: &str) -> Result<Option<String>, StoreError> {
        self.inner.load(collection)
    }

    fn persist(&self, collection: &str, contents: &str) -> Result<(), StoreError> {
        let left = self.remaining.load(Ordering::SeqCst);
        let rejections = self.rejections.load(Ordering::SeqCst);
        if left == 0 && rejections > 0 {
            self.rejections.store(rejections - 1, Ordering::SeqCst);
            return Err(StoreError::QuotaExceeded {
                collection: collection.to_owned(),
                required: contents.len() as u64,
                limit: 0,
            });
        }
        self.remaining.store(left.saturating_sub(1), Ordering::SeqCst);
        self.inner.persist(collection, contents)
    }
}
