//! LatestFrameCache - Most Recent Live Frame
//!
//! ## Responsibilities
//!
//! - Hold the latest frame received from the live channel
//! - Track receive timestamp and a monotonically increasing sequence number
//! - Serve the image to HTTP clients (hub clients are only notified)

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Frame metadata stored with the image
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameMeta {
    /// Increments with every stored frame
    pub sequence: u64,
    pub received_at: DateTime<Utc>,
    pub size_bytes: usize,
    /// Sniffed from the image magic bytes
    pub content_type: &'static str,
}

struct CacheEntry {
    data: Arc<Vec<u8>>,
    meta: FrameMeta,
}

/// LatestFrameCache configuration
#[derive(Debug, Clone)]
pub struct LatestFrameCacheConfig {
    /// Maximum frame age in seconds before it is considered stale
    pub max_age_secs: i64,
}

impl Default for LatestFrameCacheConfig {
    fn default() -> Self {
        Self { max_age_secs: 30 }
    }
}

/// LatestFrameCache service
pub struct LatestFrameCache {
    entry: RwLock<Option<CacheEntry>>,
    config: LatestFrameCacheConfig,
}

impl LatestFrameCache {
    pub fn new(config: LatestFrameCacheConfig) -> Self {
        Self {
            entry: RwLock::new(None),
            config,
        }
    }

    /// Create with default config
    pub fn with_defaults() -> Self {
        Self::new(LatestFrameCacheConfig::default())
    }

    /// Replace the cached frame, returning its metadata
    pub async fn store(&self, data: Vec<u8>) -> FrameMeta {
        let mut entry = self.entry.write().await;
        let sequence = entry.as_ref().map(|e| e.meta.sequence + 1).unwrap_or(1);

        let meta = FrameMeta {
            sequence,
            received_at: Utc::now(),
            size_bytes: data.len(),
            content_type: sniff_content_type(&data),
        };
        *entry = Some(CacheEntry {
            data: Arc::new(data),
            meta: meta.clone(),
        });

        tracing::trace!(sequence, size = meta.size_bytes, "Stored live frame");
        meta
    }

    /// Latest non-stale frame
    pub async fn get(&self) -> Option<(Arc<Vec<u8>>, FrameMeta)> {
        let entry = self.entry.read().await;
        let entry = entry.as_ref()?;

        let age = Utc::now().signed_duration_since(entry.meta.received_at);
        if age.num_seconds() > self.config.max_age_secs {
            tracing::debug!(age_secs = age.num_seconds(), "Cached live frame is stale");
            return None;
        }
        Some((entry.data.clone(), entry.meta.clone()))
    }

    /// Metadata of the latest frame, stale or not
    pub async fn meta(&self) -> Option<FrameMeta> {
        self.entry.read().await.as_ref().map(|e| e.meta.clone())
    }

    /// Drop the cached frame (new live session)
    pub async fn clear(&self) {
        *self.entry.write().await = None;
    }
}

fn sniff_content_type(data: &[u8]) -> &'static str {
    match data {
        [0xff, 0xd8, 0xff, ..] => "image/jpeg",
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "application/octet-stream",
    }
}
