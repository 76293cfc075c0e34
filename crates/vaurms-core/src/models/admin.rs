use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::timestamp;

/// An entry of `GET /admin/audit`, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub action: String,
    /// `"System"` for events with no user.
    pub user_email: String,
    #[serde(default, deserialize_with = "timestamp::optional")]
    pub timestamp: Option<NaiveDateTime>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
}

/// A background job from `GET /admin/jobs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    #[serde(rename = "type")]
    pub job_type: String,
    pub status: String,
    #[serde(default, deserialize_with = "timestamp::optional")]
    pub created_at: Option<NaiveDateTime>,
}
