//! Push channel and polling endpoint adapters

use super::message::{parse_counts, ChannelFrame};
use super::state::{SourceRef, ZoneCounts};
use crate::error::{Error, Result};
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::{FutureExt, StreamExt};
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;

/// Frames of one established channel. The stream ending means the channel dropped.
pub type FrameStream = BoxStream<'static, Result<ChannelFrame>>;

/// Push channel factory. One call = one connection attempt.
pub trait Transport: Send + Sync + 'static {
    /// Resolves once the channel is open
    fn connect(&self, source: &SourceRef) -> BoxFuture<'static, Result<FrameStream>>;
}

/// One polling endpoint reading
#[derive(Debug, Clone, PartialEq)]
pub struct PollSnapshot {
    /// `None` when the counts field was missing or malformed
    pub counts: Option<ZoneCounts>,
    pub running: bool,
}

impl PollSnapshot {
    /// Decode `{counts, running}`
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        let running = value
            .get("running")
            .and_then(serde_json::Value::as_bool)
            .ok_or_else(|| Error::Upstream("poll response without running flag".to_string()))?;
        let counts = value.get("counts").and_then(parse_counts);
        Ok(Self { counts, running })
    }
}

/// Fallback counts endpoint
pub trait CountsPoller: Send + Sync + 'static {
    fn poll(&self, source: &SourceRef) -> BoxFuture<'static, Result<PollSnapshot>>;
}

/// WebSocket push channel (`{base}/ws/live/{task_id}`)
pub struct WebSocketTransport {
    base_url: String,
}

impl WebSocketTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn url_for(&self, source: &SourceRef) -> String {
        format!(
            "{}/ws/live/{}",
            self.base_url,
            urlencoding::encode(&source.task_id)
        )
    }
}

impl Transport for WebSocketTransport {
    fn connect(&self, source: &SourceRef) -> BoxFuture<'static, Result<FrameStream>> {
        let url = self.url_for(source);
        async move {
            tracing::debug!(url = %url, "Opening live channel");
            let (ws, _response) = tokio_tungstenite::connect_async(url.as_str()).await?;

            let frames = ws
                .filter_map(|msg| async move {
                    match msg {
                        Ok(Message::Text(text)) => Some(Ok(ChannelFrame::Text(text))),
                        Ok(Message::Binary(bytes)) => Some(Ok(ChannelFrame::Binary(bytes))),
                        Ok(_) => None,
                        Err(e) => Some(Err(Error::from(e))),
                    }
                })
                .boxed();
            Ok(frames)
        }
        .boxed()
    }
}

/// HTTP counts endpoint (`{base}/api/live/{task_id}/counts`)
pub struct HttpCountsPoller {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCountsPoller {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, source: &SourceRef) -> String {
        format!(
            "{}/api/live/{}/counts",
            self.base_url,
            urlencoding::encode(&source.task_id)
        )
    }
}

impl CountsPoller for HttpCountsPoller {
    fn poll(&self, source: &SourceRef) -> BoxFuture<'static, Result<PollSnapshot>> {
        let client = self.client.clone();
        let url = self.url_for(source);
        async move {
            let resp = client.get(&url).send().await?;
            if !resp.status().is_success() {
                return Err(Error::Upstream(format!(
                    "counts endpoint returned {}",
                    resp.status()
                )));
            }
            let json: serde_json::Value = resp.json().await?;
            PollSnapshot::from_value(&json)
        }
        .boxed()
    }
}
