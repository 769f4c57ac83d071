//! Connection state types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Latest per-zone counts (zone id -> count)
pub type ZoneCounts = BTreeMap<String, u64>;

/// Reference to a live source (processing task) on the streaming service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub task_id: String,
}

impl SourceRef {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.task_id)
    }
}

/// Push channel lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Connecting,
    Live,
    Stopped,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Live => "live",
            ConnectionState::Stopped => "stopped",
        }
    }
}

/// Why the manager is stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum StopReason {
    /// Explicit `stop()`
    UserRequested,
    /// Channel kept dropping; `attempts` reconnects were made
    RetriesExhausted { attempts: u32 },
    /// Application-level error payload from the stream
    Fatal { message: String },
    /// Polling reported the stream as ended for the whole grace window
    PollingEnded,
}

/// Read-only view of a manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSnapshot {
    pub state: ConnectionState,
    pub source: Option<SourceRef>,
    pub retry_count: u32,
    pub max_retries: u32,
    /// Consecutive `running: false` poll readings
    pub missed_polls: u32,
    pub counts: ZoneCounts,
    pub stop_reason: Option<StopReason>,
    pub last_frame_at: Option<DateTime<Utc>>,
    pub last_counts_at: Option<DateTime<Utc>>,
}

impl ConnectionSnapshot {
    pub(crate) fn idle(max_retries: u32) -> Self {
        Self {
            state: ConnectionState::Stopped,
            source: None,
            retry_count: 0,
            max_retries,
            missed_polls: 0,
            counts: ZoneCounts::new(),
            stop_reason: None,
            last_frame_at: None,
            last_counts_at: None,
        }
    }
}
