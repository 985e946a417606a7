mod settings;

pub use settings::{ApiConfig, DatabaseConfig, DnsConfig, ServerConfig, Settings};
