use std::sync::Arc;
use tracing::{debug, info};

use crate::dns::provider::DnsProvider;
use crate::dns::record_types::{canonical_name, strip_root, PublishedRecord, RecordSet, MANAGED_TYPE};
use crate::error::{KeeperError, Result};

/// Read side of the DNS provider for the one managed zone.
///
/// The zone id is resolved once in [`PublishedState::connect`] and reused for
/// every later call.
pub struct PublishedState {
    provider: Arc<dyn DnsProvider>,
    zone_apex: String,
    zone_id: String,
}

impl PublishedState {
    pub async fn connect(provider: Arc<dyn DnsProvider>, zone_apex: &str) -> Result<Self> {
        let zones = provider.hosted_zones_by_name(zone_apex).await?;
        let wanted = canonical_name(zone_apex);

        let zone = zones
            .into_iter()
            .find(|zone| canonical_name(&zone.name).eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| KeeperError::ZoneNotFound(zone_apex.to_string()))?;

        info!(zone = %zone_apex, zone_id = %zone.id, "Resolved hosted zone");

        Ok(Self {
            provider,
            zone_apex: strip_root(zone_apex).to_string(),
            zone_id: zone.id,
        })
    }

    pub fn zone_apex(&self) -> &str {
        &self.zone_apex
    }

    pub fn zone_id(&self) -> &str {
        &self.zone_id
    }

    pub fn provider(&self) -> &Arc<dyn DnsProvider> {
        &self.provider
    }

    /// Every address record set in the zone.
    pub async fn list_address_records(&self) -> Result<Vec<PublishedRecord>> {
        let sets = self.provider.list_record_sets(&self.zone_id, None).await?;

        Ok(sets
            .into_iter()
            .filter(|set| set.record_type == MANAGED_TYPE)
            .map(PublishedRecord::from)
            .collect())
    }

    /// The address record set named exactly `name`. A miss is `Ok(None)`,
    /// never an error.
    pub async fn get_record(&self, name: &str) -> Result<Option<PublishedRecord>> {
        let wanted = canonical_name(name);
        let sets = self
            .provider
            .list_record_sets(&self.zone_id, Some((wanted.as_str(), MANAGED_TYPE)))
            .await?;

        let found = sets
            .into_iter()
            .find(|set: &RecordSet| set.record_type == MANAGED_TYPE && set.name == wanted)
            .map(PublishedRecord::from);

        if found.is_none() {
            debug!(name = %name, "No address record set published");
        }

        Ok(found)
    }
}
