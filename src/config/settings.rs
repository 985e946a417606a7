use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use anyhow::Result;

use crate::api::validators::validate_zone_apex;
use crate::dns::{PropagationPolicy, DEFAULT_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL, DEFAULT_TTL};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub dns: DnsConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
    /// Seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsConfig {
    /// Zone apex, e.g. "example.com"
    pub zone: String,
    /// Base URL of the provider API
    pub provider_endpoint: String,
    #[serde(default)]
    pub provider_token: Option<String>,
    /// TTL given to newly created record sets
    #[serde(default = "default_ttl")]
    pub ttl_default: u32,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_poll_attempts")]
    pub poll_attempts: u32,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_www_dir")]
    pub www_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            www_dir: default_www_dir(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_idle_timeout() -> u64 {
    300
}

fn default_ttl() -> u32 {
    DEFAULT_TTL
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}

fn default_poll_attempts() -> u32 {
    DEFAULT_POLL_ATTEMPTS
}

fn default_request_timeout() -> u64 {
    30
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_www_dir() -> PathBuf {
    PathBuf::from("./www")
}

impl Settings {
    pub fn load(config_path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("DNSKEEPER").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.url.is_empty() {
            anyhow::bail!("Database URL is required");
        }

        if !validate_zone_apex(&self.dns.zone) {
            anyhow::bail!("DNS zone '{}' is not a valid domain name", self.dns.zone);
        }

        if self.dns.provider_endpoint.is_empty() {
            anyhow::bail!("DNS provider endpoint is required");
        }

        if self.dns.poll_attempts == 0 {
            anyhow::bail!("DNS poll_attempts must be at least 1");
        }

        if self.dns.ttl_default == 0 {
            anyhow::bail!("DNS ttl_default must be greater than zero");
        }

        Ok(())
    }

    pub fn propagation_policy(&self) -> PropagationPolicy {
        PropagationPolicy {
            interval: Duration::from_secs(self.dns.poll_interval_secs),
            max_attempts: self.dns.poll_attempts,
        }
    }
}
