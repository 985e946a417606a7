use thiserror::Error;

/// Errors raised by the roster store, the DNS provider, and the engine on top of them.
#[derive(Debug, Error)]
pub enum KeeperError {
    /// Store or provider unreachable
    #[error("Connection error: {0}")]
    Connection(String),

    /// The provider refused a record set change
    #[error("Change rejected by provider: {0}")]
    SubmitRejected(String),

    /// The change was submitted but never reported in sync
    #[error("Change {change_id} not confirmed after {attempts} status checks")]
    PropagationTimeout { change_id: String, attempts: u32 },

    /// Pre-check lookup of the existing record set failed
    #[error("Record lookup failed for {name}: {reason}")]
    LookupFailed { name: String, reason: String },

    /// Removal requested for an address that is not published
    #[error("Address {ip} is not published under {name}")]
    NotPresent { name: String, ip: String },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("No hosted zone found for {0}")]
    ZoneNotFound(String),

    /// Unexpected reply shape from the provider
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl KeeperError {
    /// True when a write went out but its propagation could not be confirmed.
    pub fn is_timeout(&self) -> bool {
        matches!(self, KeeperError::PropagationTimeout { .. })
    }
}

impl From<sqlx::Error> for KeeperError {
    fn from(err: sqlx::Error) -> Self {
        KeeperError::Connection(err.to_string())
    }
}

impl From<reqwest::Error> for KeeperError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            KeeperError::Provider(err.to_string())
        } else {
            KeeperError::Connection(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, KeeperError>;
