//! StreamConnectionManager - Live Telemetry Connection Lifecycle
//!
//! ## Responsibilities
//!
//! - Own the push channel: connect, bounded silent retries, explicit stop/restart
//! - Run the fallback polling loop and end the session after the grace window
//! - Deliver frames, counts and state changes to a `StreamConsumer`, in order
//!
//! ## Design
//!
//! One actor task per manager drains a single event queue (commands, channel
//! events, timer firings, poll results). Attempt and session generations tag
//! every spawned task's events so late events of a torn-down attempt are
//! dropped. The `running` flag is flipped synchronously by `stop()` and
//! `restart()` before their command is queued.

mod message;
mod state;
mod transport;

pub use message::{parse_counts, ChannelFrame, TelemetryMessage};
pub use state::*;
pub use transport::{
    CountsPoller, FrameStream, HttpCountsPoller, PollSnapshot, Transport, WebSocketTransport,
};

use crate::error::{Error, Result};
use futures::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Manager tuning
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    pub max_retries: u32,
    /// Delay before each reconnect (one time unit)
    pub retry_delay: Duration,
    pub poll_interval: Duration,
    /// Consecutive `running: false` readings that end the session
    pub poll_grace: u32,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            poll_interval: Duration::from_secs(1),
            poll_grace: 6,
        }
    }
}

/// Receives live updates. Called from the actor task, in order.
pub trait StreamConsumer: Send + Sync + 'static {
    fn on_frame(&self, frame: Vec<u8>);
    fn on_counts(&self, counts: &ZoneCounts);
    fn on_state_change(&self, state: ConnectionState, reason: Option<&StopReason>);
}

enum Command {
    Start(SourceRef),
    Stop,
    Restart,
}

enum Event {
    Command(Command),
    Opened { attempt: u64 },
    Message { attempt: u64, message: TelemetryMessage },
    Dropped { attempt: u64, reason: String },
    RetryDue { attempt: u64 },
    Polled { session: u64, result: Result<PollSnapshot> },
    Shutdown,
}

struct Shared {
    tx: mpsc::UnboundedSender<Event>,
    running: Arc<AtomicBool>,
    started: AtomicBool,
    snapshot: watch::Receiver<ConnectionSnapshot>,
}

impl Drop for Shared {
    fn drop(&mut self) {
        let _ = self.tx.send(Event::Shutdown);
    }
}

/// Handle to a manager actor. Cheap to clone.
#[derive(Clone)]
pub struct StreamConnectionManager {
    shared: Arc<Shared>,
}

impl StreamConnectionManager {
    /// Spawn the actor on the current tokio runtime
    pub fn spawn(
        config: ManagerConfig,
        transport: Arc<dyn Transport>,
        poller: Arc<dyn CountsPoller>,
        consumer: Arc<dyn StreamConsumer>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let running = Arc::new(AtomicBool::new(false));
        let (snapshot_tx, snapshot_rx) =
            watch::channel(ConnectionSnapshot::idle(config.max_retries));

        let actor = Actor {
            config,
            transport,
            poller,
            consumer,
            running: running.clone(),
            tx: tx.clone(),
            snapshot_tx,
            source: None,
            attempt: 0,
            session: 0,
            state: ConnectionState::Stopped,
            retry_count: 0,
            missed_polls: 0,
            attempt_task: None,
            retry_task: None,
            poll_task: None,
        };
        tokio::spawn(actor.run(rx));

        Self {
            shared: Arc::new(Shared {
                tx,
                running,
                started: AtomicBool::new(false),
                snapshot: snapshot_rx,
            }),
        }
    }

    /// Begin streaming `source`. No-op while already running.
    pub fn start(&self, source: SourceRef) -> Result<()> {
        if self.shared.running.swap(true, Ordering::SeqCst) {
            tracing::info!(source = %source, "Start ignored: already running");
            return Ok(());
        }
        self.shared.started.store(true, Ordering::SeqCst);
        self.send(Event::Command(Command::Start(source)))
    }

    /// User stop. Clears the running flag before the transport is torn down.
    pub fn stop(&self) -> Result<()> {
        self.shared.running.store(false, Ordering::SeqCst);
        self.send(Event::Command(Command::Stop))
    }

    /// Reconnect the last source with a fresh retry budget
    pub fn restart(&self) -> Result<()> {
        if !self.shared.started.load(Ordering::SeqCst) {
            return Err(Error::Validation(
                "restart requires a previous start".to_string(),
            ));
        }
        self.shared.running.store(true, Ordering::SeqCst);
        self.send(Event::Command(Command::Restart))
    }

    /// User-intended-running flag
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> ConnectionSnapshot {
        self.shared.snapshot.borrow().clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.snapshot.borrow().state
    }

    pub fn counts(&self) -> ZoneCounts {
        self.shared.snapshot.borrow().counts.clone()
    }

    /// Watch snapshot updates
    pub fn subscribe(&self) -> watch::Receiver<ConnectionSnapshot> {
        self.shared.snapshot.clone()
    }

    fn send(&self, event: Event) -> Result<()> {
        self.shared
            .tx
            .send(event)
            .map_err(|_| Error::ManagerUnavailable("actor task has ended".to_string()))
    }
}

struct Actor {
    config: ManagerConfig,
    transport: Arc<dyn Transport>,
    poller: Arc<dyn CountsPoller>,
    consumer: Arc<dyn StreamConsumer>,
    running: Arc<AtomicBool>,
    tx: mpsc::UnboundedSender<Event>,
    snapshot_tx: watch::Sender<ConnectionSnapshot>,
    source: Option<SourceRef>,
    /// Generation of the current channel attempt
    attempt: u64,
    /// Generation of the current start/restart session (polling)
    session: u64,
    state: ConnectionState,
    retry_count: u32,
    missed_polls: u32,
    attempt_task: Option<JoinHandle<()>>,
    retry_task: Option<JoinHandle<()>>,
    poll_task: Option<JoinHandle<()>>,
}

impl Actor {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Event>) {
        while let Some(event) = rx.recv().await {
            match event {
                Event::Command(Command::Start(source)) => self.handle_start(source),
                Event::Command(Command::Stop) => self.handle_stop(),
                Event::Command(Command::Restart) => self.handle_restart(),
                Event::Opened { attempt } => self.handle_opened(attempt),
                Event::Message { attempt, message } => self.handle_message(attempt, message),
                Event::Dropped { attempt, reason } => self.handle_dropped(attempt, reason),
                Event::RetryDue { attempt } => self.handle_retry_due(attempt),
                Event::Polled { session, result } => self.handle_polled(session, result),
                Event::Shutdown => break,
            }
        }

        self.teardown();
        tracing::debug!("Stream manager actor exited");
    }

    // ========================================
    // Commands
    // ========================================

    fn handle_start(&mut self, source: SourceRef) {
        self.source = Some(source.clone());
        if !self.running.load(Ordering::SeqCst) {
            // stop() raced ahead of this start
            return;
        }
        tracing::info!(source = %source, "Live stream starting");
        self.begin_session();
    }

    fn handle_stop(&mut self) {
        // A start()/restart() queued behind this stop has already set the flag
        // again; end the current session anyway so it is observed as stopped.
        self.end_session(StopReason::UserRequested);
    }

    fn handle_restart(&mut self) {
        if !self.running.load(Ordering::SeqCst) {
            return;
        }
        tracing::info!(source = ?self.source, "Live stream restarting");
        self.teardown();
        self.begin_session();
    }

    fn begin_session(&mut self) {
        self.session += 1;
        self.retry_count = 0;
        self.missed_polls = 0;
        self.publish_snapshot(|s| {
            s.stop_reason = None;
            s.counts.clear();
        });
        self.set_state(ConnectionState::Connecting, None);
        self.spawn_attempt();
        self.spawn_poll_loop();
    }

    // ========================================
    // Push channel
    // ========================================

    fn spawn_attempt(&mut self) {
        let Some(source) = self.source.clone() else {
            return;
        };

        // Release the previous transport before establishing a new one
        if let Some(task) = self.attempt_task.take() {
            task.abort();
        }

        self.attempt += 1;
        let attempt = self.attempt;
        let tx = self.tx.clone();
        let connecting = self.transport.connect(&source);

        tracing::debug!(source = %source, attempt, retry = self.retry_count, "Connecting live channel");

        self.attempt_task = Some(tokio::spawn(async move {
            let mut frames = match connecting.await {
                Ok(frames) => frames,
                Err(e) => {
                    let _ = tx.send(Event::Dropped {
                        attempt,
                        reason: e.to_string(),
                    });
                    return;
                }
            };
            let _ = tx.send(Event::Opened { attempt });

            while let Some(item) = frames.next().await {
                match item {
                    Ok(frame) => {
                        let message = TelemetryMessage::from(frame);
                        if tx.send(Event::Message { attempt, message }).is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Event::Dropped {
                            attempt,
                            reason: e.to_string(),
                        });
                        return;
                    }
                }
            }
            let _ = tx.send(Event::Dropped {
                attempt,
                reason: "channel closed".to_string(),
            });
        }));
    }

    fn is_current(&self, attempt: u64) -> bool {
        attempt == self.attempt && self.running.load(Ordering::SeqCst)
    }

    fn handle_opened(&mut self, attempt: u64) {
        if !self.is_current(attempt) {
            return;
        }
        tracing::info!(source = ?self.source, attempt, "Live channel open");
        self.retry_count = 0;
        self.set_state(ConnectionState::Live, None);
    }

    fn handle_message(&mut self, attempt: u64, message: TelemetryMessage) {
        if !self.is_current(attempt) {
            return;
        }
        match message {
            TelemetryMessage::Frame(frame) => self.deliver_frame(frame),
            TelemetryMessage::Counts(counts) => self.deliver_counts(counts),
            TelemetryMessage::FrameAndCounts { frame, counts } => {
                self.deliver_frame(frame);
                self.deliver_counts(counts);
            }
            TelemetryMessage::Fatal(message) => {
                tracing::error!(source = ?self.source, error = %message, "Live stream reported fatal error");
                self.enter_stopped(StopReason::Fatal { message });
            }
            TelemetryMessage::Empty => {
                tracing::debug!("Telemetry message carried nothing usable");
            }
        }
    }

    fn handle_dropped(&mut self, attempt: u64, reason: String) {
        if !self.is_current(attempt) {
            return;
        }
        self.attempt_task = None;

        if self.retry_count >= self.config.max_retries {
            tracing::warn!(
                source = ?self.source,
                retries = self.retry_count,
                reason = %reason,
                "Live channel dropped, retries exhausted"
            );
            self.enter_stopped(StopReason::RetriesExhausted {
                attempts: self.retry_count,
            });
            return;
        }

        self.retry_count += 1;
        tracing::warn!(
            source = ?self.source,
            retry = self.retry_count,
            max_retries = self.config.max_retries,
            reason = %reason,
            "Live channel dropped, scheduling reconnect"
        );
        self.set_state(ConnectionState::Connecting, None);

        let tx = self.tx.clone();
        let delay = self.config.retry_delay;
        self.retry_task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Event::RetryDue { attempt });
        }));
    }

    fn handle_retry_due(&mut self, attempt: u64) {
        if !self.is_current(attempt) {
            return;
        }
        self.retry_task = None;
        self.spawn_attempt();
    }

    // ========================================
    // Polling fallback
    // ========================================

    fn spawn_poll_loop(&mut self) {
        let Some(source) = self.source.clone() else {
            return;
        };
        if let Some(task) = self.poll_task.take() {
            task.abort();
        }

        let session = self.session;
        let tx = self.tx.clone();
        let poller = self.poller.clone();
        let running = self.running.clone();
        let period = self.config.poll_interval.max(Duration::from_millis(1));

        self.poll_task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                let result = poller.poll(&source).await;
                if tx.send(Event::Polled { session, result }).is_err() {
                    break;
                }
            }
        }));
    }

    fn handle_polled(&mut self, session: u64, result: Result<PollSnapshot>) {
        if session != self.session || !self.running.load(Ordering::SeqCst) {
            return;
        }

        let reading = match result {
            Ok(reading) => reading,
            Err(e) => {
                tracing::debug!(error = %e, "Counts poll failed");
                return;
            }
        };

        if let Some(counts) = reading.counts {
            self.deliver_counts(counts);
        }

        if reading.running {
            self.missed_polls = 0;
        } else {
            self.missed_polls += 1;
            tracing::debug!(
                missed = self.missed_polls,
                grace = self.config.poll_grace,
                "Poll reports stream not running"
            );
        }
        let missed = self.missed_polls;
        self.publish_snapshot(|s| s.missed_polls = missed);

        if self.missed_polls >= self.config.poll_grace {
            tracing::info!(source = ?self.source, polls = missed, "Polling reports stream ended");
            self.enter_stopped(StopReason::PollingEnded);
        }
    }

    // ========================================
    // Delivery / state
    // ========================================

    fn deliver_frame(&mut self, frame: Vec<u8>) {
        self.consumer.on_frame(frame);
        let now = chrono::Utc::now();
        self.publish_snapshot(|s| s.last_frame_at = Some(now));
    }

    fn deliver_counts(&mut self, counts: ZoneCounts) {
        self.consumer.on_counts(&counts);
        let now = chrono::Utc::now();
        self.publish_snapshot(|s| {
            s.counts = counts;
            s.last_counts_at = Some(now);
        });
    }

    fn enter_stopped(&mut self, reason: StopReason) {
        self.running.store(false, Ordering::SeqCst);
        self.end_session(reason);
    }

    fn end_session(&mut self, reason: StopReason) {
        self.teardown();
        if self.state == ConnectionState::Stopped {
            return;
        }

        tracing::info!(source = ?self.source, reason = ?reason, "Live stream stopped");
        let stored = reason.clone();
        self.publish_snapshot(|s| s.stop_reason = Some(stored));
        self.set_state(ConnectionState::Stopped, Some(&reason));
    }

    /// Abort every in-flight task and invalidate their pending events
    fn teardown(&mut self) {
        for task in [
            self.attempt_task.take(),
            self.retry_task.take(),
            self.poll_task.take(),
        ]
        .into_iter()
        .flatten()
        {
            task.abort();
        }
        self.attempt += 1;
        self.session += 1;
    }

    fn set_state(&mut self, state: ConnectionState, reason: Option<&StopReason>) {
        let changed = self.state != state;
        self.state = state;

        let retry_count = self.retry_count;
        let source = self.source.clone();
        self.publish_snapshot(|s| {
            s.state = state;
            s.retry_count = retry_count;
            s.source = source;
        });

        if changed {
            self.consumer.on_state_change(state, reason);
        }
    }

    fn publish_snapshot(&self, update: impl FnOnce(&mut ConnectionSnapshot)) {
        self.snapshot_tx.send_modify(update);
    }
}
