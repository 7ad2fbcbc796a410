// ── Profile discovery ──
//
// Resolves the profiles available at each site: device groups per site,
// then profiles per group. Sites are queried concurrently; a site that
// fails degrades to an empty list and never aborts its siblings.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::{EntityId, Profile};
use crate::remote::WlanApi;

/// Profiles per site. Every requested site has an entry.
pub async fn discover_profiles<A: WlanApi>(
    api: &A,
    site_ids: &[EntityId],
) -> BTreeMap<EntityId, Vec<Profile>> {
    let unique: BTreeSet<&EntityId> = site_ids.iter().collect();

    let futs = unique.into_iter().map(|site_id| async move {
        match profiles_at_site(api, site_id).await {
            Ok(profiles) => {
                debug!(site_id = %site_id, count = profiles.len(), "discovered profiles");
                (site_id.clone(), profiles)
            }
            Err(e) => {
                warn!(site_id = %site_id, error = %e, "profile discovery failed for site");
                (site_id.clone(), Vec::new())
            }
        }
    });

    futures_util::future::join_all(futs)
        .await
        .into_iter()
        .collect()
}

/// Every profile reachable from a site's device groups, attributed to the site.
pub async fn profiles_at_site<A: WlanApi>(
    api: &A,
    site_id: &EntityId,
) -> Result<Vec<Profile>, CoreError> {
    let groups = api.device_groups_by_site(site_id).await?;
    let mut seen = BTreeSet::new();
    let mut profiles = Vec::new();

    for group in groups {
        for mut profile in api.profiles_by_device_group(&group.id).await? {
            if !seen.insert(profile.id.clone()) {
                continue;
            }
            profile.site_id = Some(site_id.clone());
            profile.device_group_id.get_or_insert_with(|| group.id.clone());
            profiles.push(profile);
        }
    }
    Ok(profiles)
}
