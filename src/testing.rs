// In-memory roster and provider used by the unit tests
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::database::models::{ClusterRecord, ServerRecord};
use crate::database::roster::{RosterStore, ServerFilter};
use crate::dns::provider::DnsProvider;
use crate::dns::record_types::{
    canonical_name, ChangeAction, ChangeInfo, ChangeStatus, HostedZone, RecordSet, RecordType,
};
use crate::error::{KeeperError, Result};

pub const ZONE_ID: &str = "Z0TEST";

#[derive(Default)]
struct State {
    sets: BTreeMap<(String, String), RecordSet>,
    writes: Vec<(ChangeAction, RecordSet)>,
    polls: u32,
    next_change: u32,
}

pub struct FakeProvider {
    zones: Vec<HostedZone>,
    state: Mutex<State>,
    /// Polls answered PENDING before a change reports INSYNC; None never syncs
    pub polls_until_sync: Option<u32>,
    /// Polls that fail outright before the pending/insync logic applies
    pub failing_polls: u32,
    pub reject_writes: bool,
    pub fail_reads: bool,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self {
            zones: vec![HostedZone {
                id: ZONE_ID.to_string(),
                name: "example.com.".to_string(),
            }],
            state: Mutex::new(State::default()),
            polls_until_sync: Some(0),
            failing_polls: 0,
            reject_writes: false,
            fail_reads: false,
        }
    }

    pub fn without_zones() -> Self {
        Self {
            zones: Vec::new(),
            ..Self::new()
        }
    }

    pub fn with_record(self, name: &str, record_type: RecordType, ttl: u32, values: &[&str]) -> Self {
        let set = RecordSet {
            name: canonical_name(name),
            record_type,
            ttl,
            values: values.iter().map(|v| v.to_string()).collect(),
        };
        self.state
            .lock()
            .unwrap()
            .sets
            .insert((set.name.clone(), set.record_type.to_string()), set);
        self
    }

    pub fn record(&self, name: &str) -> Option<RecordSet> {
        self.state
            .lock()
            .unwrap()
            .sets
            .get(&(canonical_name(name), RecordType::A.to_string()))
            .cloned()
    }

    pub fn writes(&self) -> Vec<(ChangeAction, RecordSet)> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn polls(&self) -> u32 {
        self.state.lock().unwrap().polls
    }
}

#[async_trait]
impl DnsProvider for FakeProvider {
    async fn hosted_zones_by_name(&self, _dns_name: &str) -> Result<Vec<HostedZone>> {
        Ok(self.zones.clone())
    }

    async fn list_record_sets(
        &self,
        zone_id: &str,
        start: Option<(&str, RecordType)>,
    ) -> Result<Vec<RecordSet>> {
        assert_eq!(zone_id, ZONE_ID);
        if self.fail_reads {
            return Err(KeeperError::Connection("provider unreachable".to_string()));
        }

        let state = self.state.lock().unwrap();
        let sets = state
            .sets
            .iter()
            .filter(|((name, _), _)| match start {
                Some((start_name, _)) => name.as_str() >= start_name,
                None => true,
            })
            .map(|(_, set)| set.clone())
            .collect();
        Ok(sets)
    }

    async fn change_record_set(
        &self,
        zone_id: &str,
        action: ChangeAction,
        record_set: &RecordSet,
    ) -> Result<ChangeInfo> {
        assert_eq!(zone_id, ZONE_ID);
        if self.reject_writes {
            return Err(KeeperError::SubmitRejected("InvalidChangeBatch".to_string()));
        }

        let mut state = self.state.lock().unwrap();
        let key = (record_set.name.clone(), record_set.record_type.to_string());
        match action {
            ChangeAction::Upsert => {
                state.sets.insert(key, record_set.clone());
            }
            ChangeAction::Delete => {
                state.sets.remove(&key);
            }
        }
        state.writes.push((action, record_set.clone()));
        state.next_change += 1;

        Ok(ChangeInfo {
            id: format!("C{}", state.next_change),
            status: ChangeStatus::Pending,
        })
    }

    async fn get_change(&self, change_id: &str) -> Result<ChangeInfo> {
        let mut state = self.state.lock().unwrap();
        state.polls += 1;
        let poll = state.polls;

        if poll <= self.failing_polls {
            return Err(KeeperError::Connection("throttled".to_string()));
        }

        let answered = poll - self.failing_polls;
        let status = match self.polls_until_sync {
            Some(pending) if answered > pending => ChangeStatus::InSync,
            _ => ChangeStatus::Pending,
        };

        Ok(ChangeInfo {
            id: change_id.to_string(),
            status,
        })
    }
}

pub fn server(id: i32, name: &str, ip: &str, subdomain: &str) -> ServerRecord {
    ServerRecord {
        id,
        ip: ip.to_string(),
        friendly_name: name.to_string(),
        cluster_id: 100 + id,
        cluster_name: format!("{} cluster", subdomain),
        subdomain: subdomain.to_string(),
    }
}

pub struct FakeRoster {
    pub servers: Vec<ServerRecord>,
    pub unreachable: bool,
}

impl FakeRoster {
    pub fn new(servers: Vec<ServerRecord>) -> Self {
        Self {
            servers,
            unreachable: false,
        }
    }

    fn check(&self) -> Result<()> {
        if self.unreachable {
            return Err(KeeperError::Connection("database unreachable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RosterStore for FakeRoster {
    async fn list_servers(
        &self,
        subdomain: Option<&str>,
        ip: Option<&str>,
    ) -> Result<Vec<ServerRecord>> {
        self.check()?;
        let filter = ServerFilter::new(subdomain, ip);
        Ok(self.servers.iter().filter(|s| filter.matches(s)).cloned().collect())
    }

    async fn list_clusters(&self) -> Result<Vec<ClusterRecord>> {
        self.check()?;
        let mut clusters: Vec<ClusterRecord> = Vec::new();
        for s in &self.servers {
            if !clusters.iter().any(|c| c.id == s.cluster_id) {
                clusters.push(ClusterRecord {
                    id: s.cluster_id,
                    name: s.cluster_name.clone(),
                    subdomain: s.subdomain.clone(),
                });
            }
        }
        Ok(clusters)
    }

    async fn list_servers_by_subdomains(&self, subdomains: &[String]) -> Result<Vec<ServerRecord>> {
        self.check()?;
        Ok(self
            .servers
            .iter()
            .filter(|s| subdomains.contains(&s.subdomain))
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        self.check()
    }
}
