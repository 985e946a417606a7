// Runtime SQL queries for the fleet roster
use crate::database::models::{ClusterRecord, ServerRecord};
use crate::error::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::trace;

const SERVER_SELECT: &str = r#"
    SELECT A.id AS id,
           A.ip_string AS ip,
           A.friendly_name AS friendly_name,
           A.cluster_id AS cluster_id,
           B.name AS cluster_name,
           B.subdomain AS subdomain
    FROM server A
    JOIN cluster B ON A.cluster_id = B.id
"#;

/// Read access to the desired state: which servers should be published where.
#[async_trait]
pub trait RosterStore: Send + Sync {
    /// Servers, optionally narrowed to one subdomain and then to one IP.
    ///
    /// An IP filter without a subdomain is ignored: the same address may
    /// legitimately sit in several clusters.
    async fn list_servers(
        &self,
        subdomain: Option<&str>,
        ip: Option<&str>,
    ) -> Result<Vec<ServerRecord>>;

    async fn list_clusters(&self) -> Result<Vec<ClusterRecord>>;

    /// Union of servers in any of `subdomains`. An empty slice matches nothing.
    async fn list_servers_by_subdomains(&self, subdomains: &[String]) -> Result<Vec<ServerRecord>>;

    async fn ping(&self) -> Result<()>;
}

/// Leftmost label of a domain, or the whole string when it has no dots.
pub fn subdomain_label(domain: &str) -> &str {
    domain.split('.').next().unwrap_or(domain)
}

/// Which rows a `list_servers` call selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerFilter<'a> {
    All,
    Subdomain(&'a str),
    SubdomainAndIp(&'a str, &'a str),
}

impl<'a> ServerFilter<'a> {
    /// Empty strings count as absent. A full domain is reduced to its
    /// leftmost label. An IP is only honoured together with a subdomain.
    pub fn new(subdomain: Option<&'a str>, ip: Option<&'a str>) -> Self {
        let subdomain = subdomain.filter(|s| !s.is_empty()).map(subdomain_label);
        let ip = ip.filter(|s| !s.is_empty());

        match (subdomain, ip) {
            (Some(subdomain), Some(ip)) => ServerFilter::SubdomainAndIp(subdomain, ip),
            (Some(subdomain), None) => ServerFilter::Subdomain(subdomain),
            (None, _) => ServerFilter::All,
        }
    }

    pub fn matches(&self, server: &ServerRecord) -> bool {
        match *self {
            ServerFilter::All => true,
            ServerFilter::Subdomain(subdomain) => server.subdomain == subdomain,
            ServerFilter::SubdomainAndIp(subdomain, ip) => {
                server.subdomain == subdomain && server.ip == ip
            }
        }
    }
}

pub struct PgRoster {
    db: PgPool,
}

impl PgRoster {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RosterStore for PgRoster {
    async fn list_servers(
        &self,
        subdomain: Option<&str>,
        ip: Option<&str>,
    ) -> Result<Vec<ServerRecord>> {
        let servers = match ServerFilter::new(subdomain, ip) {
            ServerFilter::SubdomainAndIp(subdomain, ip) => {
                let stmt = format!(
                    "{SERVER_SELECT} WHERE B.subdomain = $1 AND A.ip_string = $2 ORDER BY A.id"
                );
                trace!(subdomain, ip, "Listing servers by subdomain and ip");
                sqlx::query_as::<_, ServerRecord>(&stmt)
                    .bind(subdomain)
                    .bind(ip)
                    .fetch_all(&self.db)
                    .await?
            }
            ServerFilter::Subdomain(subdomain) => {
                let stmt = format!("{SERVER_SELECT} WHERE B.subdomain = $1 ORDER BY A.id");
                trace!(subdomain, "Listing servers by subdomain");
                sqlx::query_as::<_, ServerRecord>(&stmt)
                    .bind(subdomain)
                    .fetch_all(&self.db)
                    .await?
            }
            ServerFilter::All => {
                let stmt = format!("{SERVER_SELECT} ORDER BY A.id");
                trace!("Listing all servers");
                sqlx::query_as::<_, ServerRecord>(&stmt)
                    .fetch_all(&self.db)
                    .await?
            }
        };

        Ok(servers)
    }

    async fn list_clusters(&self) -> Result<Vec<ClusterRecord>> {
        let clusters = sqlx::query_as::<_, ClusterRecord>(
            r#"
            SELECT id, name, subdomain
            FROM cluster
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(clusters)
    }

    async fn list_servers_by_subdomains(&self, subdomains: &[String]) -> Result<Vec<ServerRecord>> {
        if subdomains.is_empty() {
            return Ok(Vec::new());
        }

        let stmt = format!("{SERVER_SELECT} WHERE B.subdomain = ANY($1) ORDER BY A.id");
        trace!(count = subdomains.len(), "Listing servers for subdomain set");

        let servers = sqlx::query_as::<_, ServerRecord>(&stmt)
            .bind(subdomains.to_vec())
            .fetch_all(&self.db)
            .await?;

        Ok(servers)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }
}
