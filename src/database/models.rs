use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One fleet member joined with its cluster.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ServerRecord {
    pub id: i32,
    pub ip: String,
    pub friendly_name: String,
    pub cluster_id: i32,
    pub cluster_name: String,
    pub subdomain: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ClusterRecord {
    pub id: i32,
    pub name: String,
    pub subdomain: String,
}

impl ServerRecord {
    /// Fully-qualified name this server is published under, without the
    /// root label so it compares equal to published record names.
    pub fn domain(&self, zone_apex: &str) -> String {
        let apex = zone_apex.strip_suffix('.').unwrap_or(zone_apex);
        format!("{}.{}", self.subdomain, apex)
    }
}
