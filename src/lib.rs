//! ZoneNet Console Library
//!
//! Zone geometry editing on a letterboxed video surface plus a resilient
//! live telemetry connection.
//!
//! ## Architecture (9 Components)
//!
//! 1. GeometryMapper - Display/native coordinate mapping, Viewport
//! 2. ZoneStore - Authoritative zone collection + active zone
//! 3. ZoneEditController - Editing rules, pointer intents, import/export
//! 4. StreamConnectionManager - Push channel lifecycle + polling fallback
//! 5. CountAlertTracker - Per-zone thresholds and peaks
//! 6. LatestFrameCache - Most recent live frame
//! 7. LiveBridge - Stream consumer feeding the console
//! 8. RealtimeHub - WebSocket distribution
//! 9. WebAPI - REST API endpoints
//!
//! ## Design Principles
//!
//! - Native pixel space is the only persisted coordinate space
//! - One actor owns the connection lifecycle; the running flag is the
//!   single source of truth for "should retry"

pub mod count_alert_tracker;
pub mod error;
pub mod geometry_mapper;
pub mod latest_frame_cache;
pub mod live_bridge;
pub mod models;
pub mod realtime_hub;
pub mod state;
pub mod stream_manager;
pub mod web_api;
pub mod zone_editor;
pub mod zone_store;

pub use error::{Error, Result};
pub use state::AppState;
