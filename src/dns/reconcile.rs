//! Reconciliation between the fleet roster and the published zone.
//!
//! A snapshot pairs every roster server with its domain
//! (`subdomain.zone`). When the domain is published and already carries the
//! server's address the operator is offered a removal; otherwise an addition.
//! Published addresses that no server claims are never turned into actions,
//! they only show up in the published listing.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::api::validators::{valid_domain, valid_ip};
use crate::database::models::ServerRecord;
use crate::database::roster::RosterStore;
use crate::dns::change_applier::{ApplyOutcome, ChangeApplier};
use crate::dns::published::PublishedState;
use crate::dns::record_types::PublishedRecord;
use crate::error::{KeeperError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Add,
    Remove,
}

/// One proposed change, offered to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationAction {
    pub kind: ActionKind,
    pub server_name: String,
    pub domain: String,
    pub ip: String,
}

/// One address of the published listing, with the server that claims it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedRow {
    pub domain: String,
    pub ip: String,
    pub friendly_name: String,
    pub cluster_name: String,
    /// False when no roster server claims this address
    pub matched: bool,
}

/// An operator request to apply one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub kind: ActionKind,
    pub domain: String,
    pub ip: String,
}

/// Compute the actions for one snapshot pair.
///
/// Output follows the order of `servers`; the same inputs always give the
/// same output.
pub fn diff_actions(
    servers: &[ServerRecord],
    published: &[PublishedRecord],
    zone_apex: &str,
) -> Vec<ReconciliationAction> {
    let mut published_by_domain: HashMap<&str, BTreeSet<&str>> = HashMap::new();
    for record in published {
        let ips = published_by_domain.entry(record.name.as_str()).or_default();
        ips.extend(record.ip_list.iter().map(String::as_str));
    }

    servers
        .iter()
        .map(|server| {
            let domain = server.domain(zone_apex);
            let kind = match published_by_domain.get(domain.as_str()) {
                Some(ips) if ips.contains(server.ip.as_str()) => ActionKind::Remove,
                _ => ActionKind::Add,
            };

            ReconciliationAction {
                kind,
                server_name: server.friendly_name.clone(),
                domain,
                ip: server.ip.clone(),
            }
        })
        .collect()
}

pub struct ReconciliationEngine {
    roster: Arc<dyn RosterStore>,
    published: Arc<PublishedState>,
    applier: ChangeApplier,
    /// Held while a snapshot is computed so two views never race a change
    snapshot_lock: Mutex<()>,
}

impl ReconciliationEngine {
    pub fn new(
        roster: Arc<dyn RosterStore>,
        published: Arc<PublishedState>,
        applier: ChangeApplier,
    ) -> Self {
        Self {
            roster,
            published,
            applier,
            snapshot_lock: Mutex::new(()),
        }
    }

    pub fn zone_apex(&self) -> &str {
        self.published.zone_apex()
    }

    /// Fresh reconciliation snapshot. Unreachable sources count as empty.
    ///
    /// An unreachable provider with a reachable roster therefore offers Add
    /// for every server; the snapshot is not suppressed in that case.
    pub async fn compute_actions(&self) -> Vec<ReconciliationAction> {
        let _guard = self.snapshot_lock.lock().await;

        let published = self.published.list_address_records().await.unwrap_or_else(|e| {
            warn!(error = %e, "Published records unavailable");
            Vec::new()
        });

        let servers = self.roster.list_servers(None, None).await.unwrap_or_else(|e| {
            warn!(error = %e, "Roster unavailable");
            Vec::new()
        });

        let actions = diff_actions(&servers, &published, self.zone_apex());
        debug!(
            servers = servers.len(),
            records = published.len(),
            actions = actions.len(),
            "Computed reconciliation snapshot"
        );
        actions
    }

    /// Every published address, paired with the servers that claim it.
    pub async fn published_listing(&self) -> Vec<PublishedRow> {
        let published = self.published.list_address_records().await.unwrap_or_else(|e| {
            warn!(error = %e, "Published records unavailable");
            Vec::new()
        });

        let mut rows = Vec::new();
        for record in &published {
            for ip in &record.ip_list {
                let servers = match self.roster.list_servers(Some(&record.name), Some(ip)).await {
                    Ok(servers) => servers,
                    Err(e) => {
                        warn!(domain = %record.name, ip = %ip, error = %e, "Roster lookup failed");
                        Vec::new()
                    }
                };

                if servers.is_empty() {
                    rows.push(PublishedRow {
                        domain: record.name.clone(),
                        ip: ip.clone(),
                        friendly_name: "not found".to_string(),
                        cluster_name: "N/A".to_string(),
                        matched: false,
                    });
                }

                rows.extend(servers.into_iter().map(|server| PublishedRow {
                    domain: record.name.clone(),
                    ip: ip.clone(),
                    friendly_name: server.friendly_name,
                    cluster_name: server.cluster_name,
                    matched: true,
                }));
            }
        }

        rows
    }

    /// Validate and apply one operator action.
    pub async fn apply(&self, request: &ActionRequest) -> Result<ApplyOutcome> {
        if !valid_domain(&request.domain) || !valid_ip(&request.ip) {
            warn!(
                kind = ?request.kind,
                domain = %request.domain,
                ip = %request.ip,
                "Suspect input detected, request ignored"
            );
            return Err(KeeperError::Validation(format!(
                "{} / {}",
                request.domain, request.ip
            )));
        }

        match request.kind {
            ActionKind::Add => self.applier.add_address(&request.domain, &request.ip).await,
            ActionKind::Remove => self.applier.remove_address(&request.domain, &request.ip).await,
        }
    }
}
