// ── Remote controller port ──
//
// The engines talk to the controller only through `WlanApi`. The real
// implementation is `airdeploy_api::Client`; tests substitute a scripted
// fake. Every call returns domain types and `CoreError`.

use std::future::Future;

use airdeploy_api::Client;

use crate::convert::service_create;
use crate::error::CoreError;
use crate::model::{DeviceGroup, EntityId, Profile, Site, Wlan, WlanConfig};

/// Remote operations consumed by discovery, deployment, reconciliation
/// and remediation.
pub trait WlanApi: Send + Sync {
    fn list_sites(&self) -> impl Future<Output = Result<Vec<Site>, CoreError>> + Send;

    fn device_groups_by_site(
        &self,
        site_id: &EntityId,
    ) -> impl Future<Output = Result<Vec<DeviceGroup>, CoreError>> + Send;

    fn profiles_by_device_group(
        &self,
        device_group_id: &EntityId,
    ) -> impl Future<Output = Result<Vec<Profile>, CoreError>> + Send;

    /// `Ok(None)` when the controller no longer knows the profile.
    fn profile_by_id(
        &self,
        profile_id: &EntityId,
    ) -> impl Future<Output = Result<Option<Profile>, CoreError>> + Send;

    fn list_services(&self) -> impl Future<Output = Result<Vec<Wlan>, CoreError>> + Send;

    fn create_service(
        &self,
        config: &WlanConfig,
    ) -> impl Future<Output = Result<Wlan, CoreError>> + Send;

    fn delete_service(
        &self,
        wlan_id: &EntityId,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn assign_service_to_profile(
        &self,
        wlan_id: &EntityId,
        profile_id: &EntityId,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn unassign_service_from_profile(
        &self,
        wlan_id: &EntityId,
        profile_id: &EntityId,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn sync_profile(
        &self,
        profile_id: &EntityId,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Batch sync. May fail wholesale.
    fn sync_profiles(
        &self,
        profile_ids: &[EntityId],
    ) -> impl Future<Output = Result<(), CoreError>> + Send;
}

// ── airdeploy_api::Client adapter ────────────────────────────────────

impl WlanApi for Client {
    async fn list_sites(&self) -> Result<Vec<Site>, CoreError> {
        let sites = Client::list_sites(self).await?;
        Ok(sites.into_iter().map(Site::from).collect())
    }

    async fn device_groups_by_site(&self, site_id: &EntityId) -> Result<Vec<DeviceGroup>, CoreError> {
        let site = site_id.to_string();
        let groups = self.list_device_groups(&site).await?;
        Ok(groups
            .into_iter()
            .map(|g| {
                let mut group = DeviceGroup::from(g);
                group.site_id.get_or_insert_with(|| site_id.clone());
                group
            })
            .collect())
    }

    async fn profiles_by_device_group(
        &self,
        device_group_id: &EntityId,
    ) -> Result<Vec<Profile>, CoreError> {
        let profiles = self.list_profiles(&device_group_id.to_string()).await?;
        Ok(profiles
            .into_iter()
            .map(|p| {
                let mut profile = Profile::from(p);
                profile
                    .device_group_id
                    .get_or_insert_with(|| device_group_id.clone());
                profile
            })
            .collect())
    }

    async fn profile_by_id(&self, profile_id: &EntityId) -> Result<Option<Profile>, CoreError> {
        match self.get_profile(&profile_id.to_string()).await {
            Ok(p) => Ok(Some(Profile::from(p))),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_services(&self) -> Result<Vec<Wlan>, CoreError> {
        let services = Client::list_services(self).await?;
        Ok(services.into_iter().map(Wlan::from).collect())
    }

    async fn create_service(&self, config: &WlanConfig) -> Result<Wlan, CoreError> {
        let body = service_create(config);
        let created = Client::create_service(self, &body).await?;
        Ok(Wlan::from(created))
    }

    async fn delete_service(&self, wlan_id: &EntityId) -> Result<(), CoreError> {
        Client::delete_service(self, &wlan_id.to_string()).await?;
        Ok(())
    }

    async fn assign_service_to_profile(
        &self,
        wlan_id: &EntityId,
        profile_id: &EntityId,
    ) -> Result<(), CoreError> {
        Client::assign_service_to_profile(self, &wlan_id.to_string(), &profile_id.to_string())
            .await?;
        Ok(())
    }

    async fn unassign_service_from_profile(
        &self,
        wlan_id: &EntityId,
        profile_id: &EntityId,
    ) -> Result<(), CoreError> {
        Client::unassign_service_from_profile(self, &wlan_id.to_string(), &profile_id.to_string())
            .await?;
        Ok(())
    }

    async fn sync_profile(&self, profile_id: &EntityId) -> Result<(), CoreError> {
        Client::sync_profile(self, &profile_id.to_string()).await?;
        Ok(())
    }

    async fn sync_profiles(&self, profile_ids: &[EntityId]) -> Result<(), CoreError> {
        let ids: Vec<String> = profile_ids.iter().map(ToString::to_string).collect();
        Client::sync_profiles(self, &ids).await?;
        Ok(())
    }
}
