use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::dns::reconcile::{ActionKind, ActionRequest};

/// Query string of the console's `/add` and `/remove` links.
#[derive(Debug, Deserialize)]
pub struct ActionQuery {
    #[serde(default)]
    pub name: Option<String>,
    pub domain: String,
    pub ip: String,
}

impl ActionQuery {
    pub fn into_request(self, kind: ActionKind) -> ActionRequest {
        ActionRequest {
            kind,
            domain: self.domain,
            ip: self.ip,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApplyResponse {
    pub status: String,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub zone: String,
    pub timestamp: DateTime<Utc>,
}
