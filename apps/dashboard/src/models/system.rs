use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::timestamp;

/// Point-in-time backend health. Never persisted, only cached briefly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub services: Option<ServiceStatuses>,
}

/// Per-dependency health as reported by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServiceStatuses {
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default, rename = "redis")]
    pub cache: Option<String>,
    #[serde(default, rename = "celery")]
    pub task_queue: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScraperStatus {
    pub status: String,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default, with = "timestamp::option")]
    pub last_run_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_error: Option<String>,
}

/// Acknowledgement returned by scraper commands.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandAck {
    pub detail: String,
}
