//! LiveBridge - Stream Consumer to Console Fan-out
//!
//! ## Responsibilities
//!
//! - Implement `StreamConsumer` for the connection manager
//! - Forward updates, in order, through one queue to a single forwarder task
//! - Feed the frame cache, the alert tracker and the realtime hub
//!
//! The consumer callbacks run on the manager's actor task and never block:
//! they only enqueue.

use crate::count_alert_tracker::CountAlertTracker;
use crate::latest_frame_cache::LatestFrameCache;
use crate::realtime_hub::{
    ConnectionStateMessage, CountAlertMessage, CountsMessage, FrameUpdatedMessage, HubMessage,
    RealtimeHub,
};
use crate::stream_manager::{ConnectionState, StopReason, StreamConsumer, ZoneCounts};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

enum LiveUpdate {
    Frame(Vec<u8>),
    Counts(ZoneCounts),
    State(ConnectionState, Option<StopReason>),
}

/// Stream consumer that feeds the console components
pub struct LiveBridge {
    tx: mpsc::UnboundedSender<LiveUpdate>,
}

impl LiveBridge {
    /// Create the bridge and spawn its forwarder task
    pub fn spawn(
        hub: Arc<RealtimeHub>,
        frames: Arc<LatestFrameCache>,
        alerts: Arc<CountAlertTracker>,
    ) -> (Arc<Self>, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let forwarder = Forwarder {
            hub,
            frames,
            alerts,
            last_state: ConnectionState::Stopped,
        };
        let handle = tokio::spawn(forwarder.run(rx));
        (Arc::new(Self { tx }), handle)
    }

    fn enqueue(&self, update: LiveUpdate) {
        if self.tx.send(update).is_err() {
            tracing::warn!("Live bridge forwarder has ended, dropping update");
        }
    }
}

impl StreamConsumer for LiveBridge {
    fn on_frame(&self, frame: Vec<u8>) {
        self.enqueue(LiveUpdate::Frame(frame));
    }

    fn on_counts(&self, counts: &ZoneCounts) {
        self.enqueue(LiveUpdate::Counts(counts.clone()));
    }

    fn on_state_change(&self, state: ConnectionState, reason: Option<&StopReason>) {
        self.enqueue(LiveUpdate::State(state, reason.cloned()));
    }
}

struct Forwarder {
    hub: Arc<RealtimeHub>,
    frames: Arc<LatestFrameCache>,
    alerts: Arc<CountAlertTracker>,
    last_state: ConnectionState,
}

impl Forwarder {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<LiveUpdate>) {
        while let Some(update) = rx.recv().await {
            match update {
                LiveUpdate::Frame(frame) => self.forward_frame(frame).await,
                LiveUpdate::Counts(counts) => self.forward_counts(counts).await,
                LiveUpdate::State(state, reason) => self.forward_state(state, reason).await,
            }
        }
        tracing::debug!("Live bridge forwarder exited");
    }

    async fn forward_frame(&self, frame: Vec<u8>) {
        let meta = self.frames.store(frame).await;
        self.hub
            .broadcast(HubMessage::FrameUpdated(FrameUpdatedMessage {
                sequence: meta.sequence,
                size_bytes: meta.size_bytes,
                content_type: meta.content_type.to_string(),
                timestamp: meta.received_at.to_rfc3339(),
            }))
            .await;
    }

    async fn forward_counts(&self, counts: ZoneCounts) {
        let timestamp = chrono::Utc::now().to_rfc3339();

        for (zone_id, count) in &counts {
            let Some(event) = self.alerts.update_count(zone_id, *count).await else {
                continue;
            };
            let status = self.alerts.get_status(zone_id).await;
            self.hub
                .broadcast(HubMessage::CountAlert(CountAlertMessage {
                    zone_id: zone_id.clone(),
                    event,
                    count: *count,
                    threshold: status.as_ref().and_then(|s| s.threshold),
                    peak_count: status.map(|s| s.peak_count).unwrap_or(*count),
                    timestamp: timestamp.clone(),
                }))
                .await;
        }

        self.hub
            .broadcast(HubMessage::Counts(CountsMessage { counts, timestamp }))
            .await;
    }

    async fn forward_state(&mut self, state: ConnectionState, reason: Option<StopReason>) {
        // A new session starts from scratch
        if self.last_state == ConnectionState::Stopped && state == ConnectionState::Connecting {
            self.alerts.reset_counts().await;
            self.frames.clear().await;
        }
        self.last_state = state;

        self.hub
            .broadcast(HubMessage::ConnectionState(ConnectionStateMessage {
                state,
                stop_reason: reason,
                timestamp: chrono::Utc::now().to_rfc3339(),
            }))
            .await;
    }
}
