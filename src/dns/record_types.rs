use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::KeeperError;

/// Record types the service can tell apart. Anything else in the zone is
/// dropped when the listing is parsed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    A,
    TXT,
    NS,
}

/// The only record type this service reads or writes.
pub const MANAGED_TYPE: RecordType = RecordType::A;

impl FromStr for RecordType {
    type Err = KeeperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "TXT" => Ok(RecordType::TXT),
            "NS" => Ok(RecordType::NS),
            _ => Err(KeeperError::Provider(format!("Unknown DNS record type: {}", s))),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordType::A => "A",
            RecordType::TXT => "TXT",
            RecordType::NS => "NS",
        };
        f.write_str(name)
    }
}

/// A record set as the provider stores it. `name` is in canonical,
/// dot-terminated form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSet {
    pub name: String,
    pub record_type: RecordType,
    pub ttl: u32,
    pub values: Vec<String>,
}

/// An address record set as the rest of the service sees it: root label stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedRecord {
    pub name: String,
    pub ip_list: Vec<String>,
    pub ttl: u32,
    pub record_type: RecordType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    Upsert,
    Delete,
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeAction::Upsert => f.write_str("UPSERT"),
            ChangeAction::Delete => f.write_str("DELETE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    Pending,
    InSync,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeInfo {
    pub id: String,
    pub status: ChangeStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedZone {
    pub id: String,
    pub name: String,
}

/// Dot-terminated form of `name`.
pub fn canonical_name(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{}.", name)
    }
}

/// `name` without its trailing root label.
pub fn strip_root(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

impl From<RecordSet> for PublishedRecord {
    fn from(set: RecordSet) -> Self {
        Self {
            name: strip_root(&set.name).to_string(),
            ip_list: set.values,
            ttl: set.ttl,
            record_type: set.record_type,
        }
    }
}

impl From<&PublishedRecord> for RecordSet {
    fn from(record: &PublishedRecord) -> Self {
        Self {
            name: canonical_name(&record.name),
            record_type: record.record_type,
            ttl: record.ttl,
            values: record.ip_list.clone(),
        }
    }
}

impl PublishedRecord {
    pub fn contains(&self, ip: &str) -> bool {
        self.ip_list.iter().any(|value| value == ip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_type_parsing() {
        assert_eq!(RecordType::from_str("A").unwrap(), RecordType::A);
        assert_eq!(RecordType::from_str("txt").unwrap(), RecordType::TXT);
        assert!(RecordType::from_str("BOGUS").is_err());
        assert!(RecordType::from_str("AAAA").is_err());
        assert_eq!(RecordType::NS.to_string(), "NS");
    }

    #[test]
    fn test_canonical_name_round_trip() {
        assert_eq!(canonical_name("web.example.com"), "web.example.com.");
        assert_eq!(canonical_name("web.example.com."), "web.example.com.");
        assert_eq!(strip_root("web.example.com."), "web.example.com");
        assert_eq!(strip_root("web.example.com"), "web.example.com");
    }

    #[test]
    fn test_published_record_strips_root() {
        let record = PublishedRecord::from(RecordSet {
            name: "web.example.com.".to_string(),
            record_type: RecordType::A,
            ttl: 300,
            values: vec!["10.0.0.1".to_string()],
        });
        assert_eq!(record.name, "web.example.com");
        assert!(record.contains("10.0.0.1"));
        assert!(!record.contains("10.0.0.2"));

        let set = RecordSet::from(&record);
        assert_eq!(set.name, "web.example.com.");
        assert_eq!(set.ttl, 300);
    }
}
