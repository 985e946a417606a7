use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

use crate::dns::published::PublishedState;
use crate::dns::record_types::{
    canonical_name, ChangeAction, ChangeInfo, ChangeStatus, RecordSet, MANAGED_TYPE,
};
use crate::dns::PropagationPolicy;
use crate::error::{KeeperError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// A change was submitted and reported in sync
    Applied,
    /// The address was already published; nothing was submitted
    AlreadyPresent,
}

/// Adds or removes single addresses on a record set, merging with whatever
/// is already published, and waits for the provider to confirm.
pub struct ChangeApplier {
    published: Arc<PublishedState>,
    policy: PropagationPolicy,
    default_ttl: u32,
}

impl ChangeApplier {
    pub fn new(published: Arc<PublishedState>, policy: PropagationPolicy, default_ttl: u32) -> Self {
        Self {
            published,
            policy,
            default_ttl,
        }
    }

    /// Publish `ip` under `name`.
    ///
    /// Adding an address that is already present succeeds without a write.
    pub async fn add_address(&self, name: &str, ip: &str) -> Result<ApplyOutcome> {
        let existing = match self.published.get_record(name).await {
            Ok(existing) => existing,
            Err(e) => {
                warn!(name = %name, error = %e, "Record lookup failed, treating as absent");
                None
            }
        };

        let record_set = match existing {
            Some(record) if record.contains(ip) => {
                info!(name = %name, ip = %ip, "Detected existing entry");
                return Ok(ApplyOutcome::AlreadyPresent);
            }
            Some(record) => {
                let mut set = RecordSet::from(&record);
                set.values.push(ip.to_string());
                set
            }
            None => {
                debug!(name = %name, ip = %ip, "Adding a new record set");
                RecordSet {
                    name: canonical_name(name),
                    record_type: MANAGED_TYPE,
                    ttl: self.default_ttl,
                    values: vec![ip.to_string()],
                }
            }
        };

        self.update(ChangeAction::Upsert, &record_set).await?;
        Ok(ApplyOutcome::Applied)
    }

    /// Withdraw `ip` from `name`, deleting the record set when it was the last value.
    pub async fn remove_address(&self, name: &str, ip: &str) -> Result<ApplyOutcome> {
        let existing = self
            .published
            .get_record(name)
            .await
            .map_err(|e| KeeperError::LookupFailed {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        let record = match existing {
            Some(record) if record.contains(ip) => record,
            _ => {
                info!(name = %name, ip = %ip, "Did not find address to remove");
                return Err(KeeperError::NotPresent {
                    name: name.to_string(),
                    ip: ip.to_string(),
                });
            }
        };

        let mut set = RecordSet::from(&record);
        let remaining: Vec<String> = set.values.iter().filter(|value| *value != ip).cloned().collect();

        if remaining.is_empty() {
            trace!(name = %name, "No other values on record set, deleting it");
            self.update(ChangeAction::Delete, &set).await?;
        } else {
            trace!(name = %name, remaining = remaining.len(), "Other values remain on record set");
            set.values = remaining;
            self.update(ChangeAction::Upsert, &set).await?;
        }

        Ok(ApplyOutcome::Applied)
    }

    async fn update(&self, action: ChangeAction, record_set: &RecordSet) -> Result<()> {
        debug!(action = %action, name = %record_set.name, "DNS update");

        let change = self
            .published
            .provider()
            .change_record_set(self.published.zone_id(), action, record_set)
            .await
            .map_err(|e| {
                error!(action = %action, name = %record_set.name, error = %e, "Record set change failed");
                e
            })?;

        trace!(change_id = %change.id, "DNS update submitted");
        self.await_propagation(&change).await
    }

    async fn await_propagation(&self, change: &ChangeInfo) -> Result<()> {
        let provider = self.published.provider();

        for attempt in 1..=self.policy.max_attempts {
            tokio::time::sleep(self.policy.interval).await;

            match provider.get_change(&change.id).await {
                Ok(info) if info.status == ChangeStatus::InSync => {
                    info!(change_id = %change.id, attempt, "DNS change in sync");
                    return Ok(());
                }
                Ok(_) => trace!(change_id = %change.id, attempt, "Awaiting record synchronization"),
                Err(e) => error!(change_id = %change.id, attempt, error = %e, "Change status check failed"),
            }
        }

        warn!(change_id = %change.id, attempts = self.policy.max_attempts, "DNS change not confirmed in time");
        Err(KeeperError::PropagationTimeout {
            change_id: change.id.clone(),
            attempts: self.policy.max_attempts,
        })
    }
}
