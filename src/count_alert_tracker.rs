//! Count Alert Tracker
//!
//! Per-zone count thresholds and peak counts for the live session.
//! Only transitions are reported (raised / cleared) so a zone sitting above
//! its threshold does not spam the hub on every counts message.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Alert state of one zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertState {
    /// Below threshold (or no count seen yet)
    Normal,
    /// Count at or above threshold
    Alerting,
}

/// Alert transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertEvent {
    /// Count reached the threshold
    Raised,
    /// Count dropped back below the threshold
    Cleared,
}

/// Current alert view of a zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneAlertStatus {
    pub zone_id: String,
    pub threshold: Option<u64>,
    pub last_count: Option<u64>,
    pub peak_count: u64,
    pub state: AlertState,
}

#[derive(Debug, Clone)]
struct AlertEntry {
    threshold: Option<u64>,
    last_count: Option<u64>,
    peak_count: u64,
    state: AlertState,
}

impl Default for AlertEntry {
    fn default() -> Self {
        Self {
            threshold: None,
            last_count: None,
            peak_count: 0,
            state: AlertState::Normal,
        }
    }
}

/// Tracks per-zone thresholds and detects alert transitions
pub struct CountAlertTracker {
    entries: RwLock<HashMap<String, AlertEntry>>,
}

impl CountAlertTracker {
    /// Create new tracker
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Set (or clear with `None`/`0`) a zone's threshold.
    ///
    /// Returns `Some(Cleared)` when removing the threshold ends an active alert.
    pub async fn set_threshold(&self, zone_id: &str, threshold: Option<u64>) -> Option<AlertEvent> {
        let threshold = threshold.filter(|t| *t > 0);
        let mut entries = self.entries.write().await;
        let entry = entries.entry(zone_id.to_string()).or_default();
        entry.threshold = threshold;

        tracing::debug!(zone_id = %zone_id, threshold = ?threshold, "Count threshold updated");

        // Re-evaluate against the last known count
        let next = Self::evaluate(threshold, entry.last_count);
        Self::transition(zone_id, entry, next)
    }

    /// Record a zone count and return the alert transition, if any
    ///
    /// Returns:
    /// - `Some(Raised)` if the count reached the threshold
    /// - `Some(Cleared)` if an alerting zone dropped below it
    /// - `None` otherwise (including zones without a threshold)
    pub async fn update_count(&self, zone_id: &str, count: u64) -> Option<AlertEvent> {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(zone_id.to_string()).or_default();
        entry.last_count = Some(count);
        entry.peak_count = entry.peak_count.max(count);

        let next = Self::evaluate(entry.threshold, Some(count));
        Self::transition(zone_id, entry, next)
    }

    fn evaluate(threshold: Option<u64>, count: Option<u64>) -> AlertState {
        match (threshold, count) {
            (Some(t), Some(c)) if c >= t => AlertState::Alerting,
            _ => AlertState::Normal,
        }
    }

    fn transition(zone_id: &str, entry: &mut AlertEntry, next: AlertState) -> Option<AlertEvent> {
        let prev = entry.state;
        entry.state = next;

        match (prev, next) {
            (AlertState::Normal, AlertState::Alerting) => {
                tracing::warn!(
                    zone_id = %zone_id,
                    count = ?entry.last_count,
                    threshold = ?entry.threshold,
                    "Zone count alert raised"
                );
                Some(AlertEvent::Raised)
            }
            (AlertState::Alerting, AlertState::Normal) => {
                tracing::info!(zone_id = %zone_id, count = ?entry.last_count, "Zone count alert cleared");
                Some(AlertEvent::Cleared)
            }
            _ => None,
        }
    }

    /// Current status of one zone
    pub async fn get_status(&self, zone_id: &str) -> Option<ZoneAlertStatus> {
        self.entries
            .read()
            .await
            .get(zone_id)
            .map(|e| Self::status(zone_id, e))
    }

    /// Zones currently alerting
    pub async fn alerts(&self) -> Vec<ZoneAlertStatus> {
        let mut alerts: Vec<_> = self
            .entries
            .read()
            .await
            .iter()
            .filter(|(_, e)| e.state == AlertState::Alerting)
            .map(|(id, e)| Self::status(id, e))
            .collect();
        alerts.sort_by(|a, b| a.zone_id.cmp(&b.zone_id));
        alerts
    }

    /// Every tracked zone
    pub async fn all_status(&self) -> Vec<ZoneAlertStatus> {
        let mut all: Vec<_> = self
            .entries
            .read()
            .await
            .iter()
            .map(|(id, e)| Self::status(id, e))
            .collect();
        all.sort_by(|a, b| a.zone_id.cmp(&b.zone_id));
        all
    }

    /// Forget counts and peaks (new live session). Thresholds are kept.
    pub async fn reset_counts(&self) {
        let mut entries = self.entries.write().await;
        for entry in entries.values_mut() {
            entry.last_count = None;
            entry.peak_count = 0;
            entry.state = AlertState::Normal;
        }
    }

    /// Remove zone from tracking (e.g., when deleted)
    pub async fn remove(&self, zone_id: &str) {
        self.entries.write().await.remove(zone_id);
    }

    fn status(zone_id: &str, entry: &AlertEntry) -> ZoneAlertStatus {
        ZoneAlertStatus {
            zone_id: zone_id.to_string(),
            threshold: entry.threshold,
            last_count: entry.last_count,
            peak_count: entry.peak_count,
            state: entry.state,
        }
    }
}

impl Default for CountAlertTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_threshold_no_event() {
        let tracker = CountAlertTracker::new();
        assert!(tracker.update_count("door", 50).await.is_none());
        assert!(tracker.alerts().await.is_empty());
    }

    #[tokio::test]
    async fn test_reaching_threshold_raises_once() {
        let tracker = CountAlertTracker::new();
        tracker.set_threshold("door", Some(5)).await;

        assert!(tracker.update_count("door", 4).await.is_none());
        assert_eq!(tracker.update_count("door", 5).await, Some(AlertEvent::Raised));
        assert!(tracker.update_count("door", 9).await.is_none());
        assert_eq!(tracker.alerts().await.len(), 1);
    }

    #[tokio::test]
    async fn test_dropping_below_clears() {
        let tracker = CountAlertTracker::new();
        tracker.set_threshold("door", Some(3)).await;
        tracker.update_count("door", 3).await;

        assert_eq!(tracker.update_count("door", 2).await, Some(AlertEvent::Cleared));
        assert!(tracker.update_count("door", 1).await.is_none());
        assert!(tracker.alerts().await.is_empty());
    }

    #[tokio::test]
    async fn test_zero_threshold_disables_and_clears() {
        let tracker = CountAlertTracker::new();
        tracker.set_threshold("door", Some(2)).await;
        tracker.update_count("door", 4).await;

        assert_eq!(tracker.set_threshold("door", Some(0)).await, Some(AlertEvent::Cleared));
        assert_eq!(tracker.get_status("door").await.unwrap().threshold, None);
    }

    #[tokio::test]
    async fn test_lowering_threshold_raises_immediately() {
        let tracker = CountAlertTracker::new();
        tracker.update_count("lot", 6).await;
        assert_eq!(tracker.set_threshold("lot", Some(6)).await, Some(AlertEvent::Raised));
    }

    #[tokio::test]
    async fn test_peak_tracked_and_reset() {
        let tracker = CountAlertTracker::new();
        for c in [1, 7, 3] {
            tracker.update_count("lot", c).await;
        }
        let status = tracker.get_status("lot").await.unwrap();
        assert_eq!(status.peak_count, 7);
        assert_eq!(status.last_count, Some(3));

        tracker.reset_counts().await;
        assert_eq!(tracker.get_status("lot").await.unwrap().peak_count, 0);
    }
}
