//! Client side of the authoritative DNS provider.
//!
//! The provider speaks a Route53-shaped JSON API: hosted zones are looked up
//! by name, record sets are listed per zone, writes are submitted as change
//! batches and every change gets an id whose status can be polled until it
//! reports `INSYNC`.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, trace, warn};

use crate::config::DnsConfig;
use crate::dns::record_types::{ChangeAction, ChangeInfo, ChangeStatus, HostedZone, RecordSet, RecordType};
use crate::error::{KeeperError, Result};

#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Hosted zones whose name matches `dns_name`.
    async fn hosted_zones_by_name(&self, dns_name: &str) -> Result<Vec<HostedZone>>;

    /// Record sets of a zone, optionally starting at a given name and type.
    async fn list_record_sets(
        &self,
        zone_id: &str,
        start: Option<(&str, RecordType)>,
    ) -> Result<Vec<RecordSet>>;

    /// Submit one change for one record set.
    async fn change_record_set(
        &self,
        zone_id: &str,
        action: ChangeAction,
        record_set: &RecordSet,
    ) -> Result<ChangeInfo>;

    async fn get_change(&self, change_id: &str) -> Result<ChangeInfo>;
}

/// Provider ids come back with a path prefix (`/hostedzone/Z1`) that
/// later calls do not accept.
pub fn short_id(id: &str) -> &str {
    id.rsplit('/').next().unwrap_or(id)
}

// Wire types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HostedZonesResponse {
    #[serde(default)]
    hosted_zones: Vec<WireHostedZone>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireHostedZone {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RecordSetsResponse {
    #[serde(default)]
    resource_record_sets: Vec<WireRecordSet>,
    #[serde(default)]
    is_truncated: bool,
    #[serde(default)]
    next_record_name: Option<String>,
    #[serde(default)]
    next_record_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireRecordSet {
    name: String,
    #[serde(rename = "Type")]
    record_type: String,
    #[serde(rename = "TTL", default)]
    ttl: u32,
    #[serde(default)]
    resource_records: Vec<WireResourceRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireResourceRecord {
    value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ChangeBatchRequest<'a> {
    change_batch: ChangeBatch<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ChangeBatch<'a> {
    comment: &'a str,
    changes: Vec<WireChange>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct WireChange {
    action: String,
    resource_record_set: WireRecordSet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ChangeResponse {
    change_info: WireChangeInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireChangeInfo {
    id: String,
    status: String,
}

impl From<&RecordSet> for WireRecordSet {
    fn from(set: &RecordSet) -> Self {
        Self {
            name: set.name.clone(),
            record_type: set.record_type.to_string(),
            ttl: set.ttl,
            resource_records: set
                .values
                .iter()
                .map(|value| WireResourceRecord { value: value.clone() })
                .collect(),
        }
    }
}

impl WireRecordSet {
    /// None for record types this service does not know about.
    fn into_record_set(self) -> Option<RecordSet> {
        let record_type = RecordType::from_str(&self.record_type).ok()?;
        Some(RecordSet {
            name: self.name,
            record_type,
            ttl: self.ttl,
            values: self.resource_records.into_iter().map(|rr| rr.value).collect(),
        })
    }
}

impl From<WireChangeInfo> for ChangeInfo {
    fn from(info: WireChangeInfo) -> Self {
        let status = if info.status.eq_ignore_ascii_case("INSYNC") {
            ChangeStatus::InSync
        } else {
            ChangeStatus::Pending
        };
        Self {
            id: short_id(&info.id).to_string(),
            status,
        }
    }
}

/// HTTP implementation of [`DnsProvider`].
#[derive(Clone)]
pub struct HttpDnsProvider {
    http: HttpClient,
    base_url: String,
    token: Option<String>,
}

impl HttpDnsProvider {
    pub fn new(config: &DnsConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.provider_endpoint.trim_end_matches('/').to_string(),
            token: config.provider_token.clone(),
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "GET request");

        let response = self
            .authorize(self.http.get(&url).query(query))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KeeperError::Connection(format!("GET {} returned {}: {}", path, status, body)));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl DnsProvider for HttpDnsProvider {
    async fn hosted_zones_by_name(&self, dns_name: &str) -> Result<Vec<HostedZone>> {
        let response: HostedZonesResponse = self
            .get_json("/hostedzonesbyname", &[("dnsname", dns_name)])
            .await?;

        Ok(response
            .hosted_zones
            .into_iter()
            .map(|zone| HostedZone {
                id: short_id(&zone.id).to_string(),
                name: zone.name,
            })
            .collect())
    }

    async fn list_record_sets(
        &self,
        zone_id: &str,
        start: Option<(&str, RecordType)>,
    ) -> Result<Vec<RecordSet>> {
        let path = format!("/hostedzone/{}/rrset", zone_id);
        let mut sets = Vec::new();

        // A start position asks for the page beginning at that record only
        if let Some((name, record_type)) = start {
            let record_type = record_type.to_string();
            let page: RecordSetsResponse = self
                .get_json(&path, &[("name", name), ("type", record_type.as_str())])
                .await?;
            sets.extend(page.resource_record_sets.into_iter().filter_map(WireRecordSet::into_record_set));
            return Ok(sets);
        }

        let mut cursor: Option<(String, Option<String>)> = None;
        loop {
            let page: RecordSetsResponse = match &cursor {
                Some((name, Some(record_type))) => {
                    self.get_json(&path, &[("name", name.as_str()), ("type", record_type.as_str())])
                        .await?
                }
                Some((name, None)) => self.get_json(&path, &[("name", name.as_str())]).await?,
                None => self.get_json(&path, &[]).await?,
            };

            sets.extend(page.resource_record_sets.into_iter().filter_map(WireRecordSet::into_record_set));

            match (page.is_truncated, page.next_record_name) {
                (true, Some(next)) => {
                    trace!(next = %next, "Record set listing truncated, fetching next page");
                    cursor = Some((next, page.next_record_type));
                }
                (true, None) => {
                    warn!("Record set listing truncated without a continuation name");
                    break;
                }
                _ => break,
            }
        }

        Ok(sets)
    }

    async fn change_record_set(
        &self,
        zone_id: &str,
        action: ChangeAction,
        record_set: &RecordSet,
    ) -> Result<ChangeInfo> {
        let url = format!("{}/hostedzone/{}/rrset", self.base_url, zone_id);
        debug!(url = %url, action = %action, name = %record_set.name, "POST change batch");

        let body = ChangeBatchRequest {
            change_batch: ChangeBatch {
                comment: "Automated",
                changes: vec![WireChange {
                    action: action.to_string(),
                    resource_record_set: WireRecordSet::from(record_set),
                }],
            },
        };

        let response = self
            .authorize(self.http.post(&url).json(&body))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KeeperError::SubmitRejected(format!("{}: {}", status, body)));
        }

        let change: ChangeResponse = response.json().await?;
        Ok(change.change_info.into())
    }

    async fn get_change(&self, change_id: &str) -> Result<ChangeInfo> {
        let path = format!("/change/{}", short_id(change_id));
        let change: ChangeResponse = self.get_json(&path, &[]).await?;
        Ok(change.change_info.into())
    }
}
