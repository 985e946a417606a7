pub mod change_applier;
pub mod provider;
pub mod published;
pub mod reconcile;
pub mod record_types;

use std::time::Duration;

pub use change_applier::{ApplyOutcome, ChangeApplier};
pub use provider::{DnsProvider, HttpDnsProvider};
pub use published::PublishedState;
pub use reconcile::{ActionKind, PublishedRow, ReconciliationAction, ReconciliationEngine};
pub use record_types::{PublishedRecord, RecordSet, RecordType};

/// TTL for record sets created from scratch.
pub const DEFAULT_TTL: u32 = 60;

/// Delay before each change-status check.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Change-status checks before giving up on propagation.
pub const DEFAULT_POLL_ATTEMPTS: u32 = 120;

/// How long to wait for a submitted change to report in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropagationPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PropagationPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_POLL_ATTEMPTS,
        }
    }
}
