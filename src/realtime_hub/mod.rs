//! RealtimeHub - WebSocket Distribution
//!
//! ## Responsibilities
//!
//! - WebSocket client connection management
//! - Broadcasting console events (connection state, counts, zone edits, alerts)
//! - Frame update notifications (triggers clients to fetch the new image)
//!
//! Note: Only frame update NOTIFICATIONS are sent via WebSocket (sequence + timestamp).
//! Actual image data is fetched via HTTP GET /api/live/frame.jpg

use crate::count_alert_tracker::AlertEvent;
use crate::geometry_mapper::DimensionsChanged;
use crate::stream_manager::{ConnectionState, StopReason, ZoneCounts};
use crate::zone_editor::ZonesChanged;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Hub message types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
#[serde(rename_all = "snake_case")]
pub enum HubMessage {
    ConnectionState(ConnectionStateMessage),
    Counts(CountsMessage),
    /// Notification that the live frame has been updated
    /// Client should fetch new image via HTTP GET
    FrameUpdated(FrameUpdatedMessage),
    ZonesChanged(ZonesChanged),
    /// Display surface or native resolution changed
    ViewportChanged(DimensionsChanged),
    CountAlert(CountAlertMessage),
}

impl HubMessage {
    fn kind(&self) -> &'static str {
        match self {
            HubMessage::ConnectionState(_) => "connection_state",
            HubMessage::Counts(_) => "counts",
            HubMessage::FrameUpdated(_) => "frame_updated",
            HubMessage::ZonesChanged(_) => "zones_changed",
            HubMessage::ViewportChanged(_) => "viewport_changed",
            HubMessage::CountAlert(_) => "count_alert",
        }
    }

    /// High-rate messages are logged at trace level only
    fn is_high_rate(&self) -> bool {
        matches!(self, HubMessage::Counts(_) | HubMessage::FrameUpdated(_))
    }
}

/// Live connection state change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionStateMessage {
    pub state: ConnectionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<StopReason>,
    pub timestamp: String,
}

/// Latest per-zone counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountsMessage {
    pub counts: ZoneCounts,
    pub timestamp: String,
}

/// Frame updated notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameUpdatedMessage {
    pub sequence: u64,
    pub size_bytes: usize,
    pub content_type: String,
    pub timestamp: String,
}

/// Zone count alert transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountAlertMessage {
    pub zone_id: String,
    pub event: AlertEvent,
    pub count: u64,
    pub threshold: Option<u64>,
    pub peak_count: u64,
    pub timestamp: String,
}

/// Client connection
struct ClientConnection {
    id: Uuid,
    tx: mpsc::UnboundedSender<String>,
}

/// RealtimeHub instance
pub struct RealtimeHub {
    connections: RwLock<HashMap<Uuid, ClientConnection>>,
    connection_count: AtomicU64,
}

impl RealtimeHub {
    /// Create new RealtimeHub
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            connection_count: AtomicU64::new(0),
        }
    }

    /// Register a new client
    pub async fn register(&self) -> (Uuid, mpsc::UnboundedReceiver<String>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();

        self.connections
            .write()
            .await
            .insert(id, ClientConnection { id, tx });
        self.connection_count.fetch_add(1, Ordering::Relaxed);

        tracing::info!(connection_id = %id, "Client connected");

        (id, rx)
    }

    /// Unregister a client
    pub async fn unregister(&self, id: &Uuid) {
        let mut connections = self.connections.write().await;
        if connections.remove(id).is_some() {
            self.connection_count.fetch_sub(1, Ordering::Relaxed);
            tracing::info!(connection_id = %id, "Client disconnected");
        }
    }

    /// Broadcast message to all clients
    pub async fn broadcast(&self, message: HubMessage) {
        if message.is_high_rate() {
            tracing::trace!(message_type = %message.kind(), "Broadcasting message to clients");
        } else {
            tracing::info!(message_type = %message.kind(), "Broadcasting message to clients");
        }

        let json = match serde_json::to_string(&message) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize message");
                return;
            }
        };

        let connections = self.connections.read().await;
        for conn in connections.values() {
            if let Err(e) = conn.tx.send(json.clone()) {
                tracing::warn!(connection_id = %conn.id, error = %e, "Failed to send message");
            }
        }
    }

    /// Get connection count
    pub fn connection_count(&self) -> u64 {
        self.connection_count.load(Ordering::Relaxed)
    }
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new()
    }
}
