//! Application state
//!
//! Holds all shared components and state

use crate::count_alert_tracker::CountAlertTracker;
use crate::error::Result;
use crate::geometry_mapper::Viewport;
use crate::latest_frame_cache::LatestFrameCache;
use crate::live_bridge::LiveBridge;
use crate::realtime_hub::{HubMessage, RealtimeHub};
use crate::stream_manager::{
    HttpCountsPoller, ManagerConfig, StreamConnectionManager, WebSocketTransport,
};
use crate::zone_editor::{EditorConfig, ZoneEditController};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Streaming service WebSocket base (push channel)
    pub stream_ws_base: String,
    /// Streaming service HTTP base (polling endpoint)
    pub stream_api_base: String,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub poll_interval_ms: u64,
    /// Consecutive "not running" polls before the session ends
    pub poll_grace_polls: u32,
    /// Polygon point cap
    pub zone_max_points: usize,
    /// Snap-to-close radius (display px)
    pub snap_radius_px: f64,
    /// Frontend bundle served as fallback
    pub static_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_or("PORT", 8090),
            stream_ws_base: std::env::var("STREAM_WS_BASE")
                .unwrap_or_else(|_| "ws://localhost:8000".to_string()),
            stream_api_base: std::env::var("STREAM_API_BASE")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            max_retries: env_or("MAX_RETRIES", 3),
            retry_delay_ms: env_or("RETRY_DELAY_MS", 1000),
            poll_interval_ms: env_or("POLL_INTERVAL_MS", 1000),
            poll_grace_polls: env_or("POLL_GRACE_POLLS", 6),
            zone_max_points: env_or("ZONE_MAX_POINTS", 12),
            snap_radius_px: env_or("SNAP_RADIUS_PX", 20.0),
            static_dir: std::env::var("STATIC_DIR").ok().map(PathBuf::from),
        }
    }
}

impl AppConfig {
    pub fn manager_config(&self) -> ManagerConfig {
        ManagerConfig {
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms.max(1)),
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            poll_grace: self.poll_grace_polls.max(1),
        }
    }

    pub fn editor_config(&self) -> EditorConfig {
        EditorConfig {
            max_points: self.zone_max_points.max(3),
            snap_radius_px: self.snap_radius_px.max(0.0),
        }
    }
}

/// Parse an env var, falling back to `default` when unset or unparseable
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: AppConfig,
    /// ZoneEditController (zone store + editing rules)
    pub editor: Arc<RwLock<ZoneEditController>>,
    /// Viewport (display surface / native size mapping)
    pub viewport: Arc<RwLock<Viewport>>,
    /// StreamConnectionManager (live channel lifecycle)
    pub live: StreamConnectionManager,
    /// RealtimeHub (WebSocket)
    pub realtime: Arc<RealtimeHub>,
    /// LatestFrameCache
    pub frames: Arc<LatestFrameCache>,
    /// CountAlertTracker
    pub alerts: Arc<CountAlertTracker>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Wire every component. Must run inside the tokio runtime.
    pub fn build(config: AppConfig) -> Result<Self> {
        let realtime = Arc::new(RealtimeHub::new());
        let frames = Arc::new(LatestFrameCache::with_defaults());
        let alerts = Arc::new(CountAlertTracker::new());

        let editor = ZoneEditController::new(config.editor_config());
        spawn_hub_relay(editor.subscribe(), realtime.clone(), HubMessage::ZonesChanged);
        let viewport = Viewport::new();
        spawn_hub_relay(viewport.subscribe(), realtime.clone(), HubMessage::ViewportChanged);

        let (bridge, _forwarder) = LiveBridge::spawn(realtime.clone(), frames.clone(), alerts.clone());
        let transport = Arc::new(WebSocketTransport::new(config.stream_ws_base.clone()));
        let poller = Arc::new(HttpCountsPoller::new(
            config.stream_api_base.clone(),
            Duration::from_secs(5),
        )?);
        let live = StreamConnectionManager::spawn(config.manager_config(), transport, poller, bridge);

        Ok(Self {
            config,
            editor: Arc::new(RwLock::new(editor)),
            viewport: Arc::new(RwLock::new(viewport)),
            live,
            realtime,
            frames,
            alerts,
            started_at: Utc::now(),
        })
    }
}

/// Forward editor/viewport notifications to hub clients
fn spawn_hub_relay<T>(
    mut rx: broadcast::Receiver<T>,
    hub: Arc<RealtimeHub>,
    wrap: fn(T) -> HubMessage,
) where
    T: Clone + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => hub.broadcast(wrap(event)).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Hub relay lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}
