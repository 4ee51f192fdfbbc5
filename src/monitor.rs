//! The consumer poll loop.
//!
//! A fixed-interval loop that snapshots the ingest buffer, verifies and
//! classifies every retained reading, folds the result into the session
//! aggregates, and hands one [`MonitorFrame`] per cycle to the caller's
//! renderer. The loop itself knows nothing about presentation; the frame is
//! the consumer-facing read API.

use crate::buffer::IngestBuffer;
use crate::config::{MonitorSettings, Settings};
use crate::core::ProcessedReading;
use crate::error::AppResult;
use crate::mqtt::Subscriber;
use crate::session::{AggregateState, SessionAggregator, WindowStats};
use chrono::{DateTime, Utc};
use tracing::info;

/// Everything a consumer needs to render one processing cycle.
#[derive(Debug, Clone)]
pub struct MonitorFrame {
    /// Most recent reading with its derived verdicts, if any data arrived.
    pub latest: Option<ProcessedReading>,
    /// Session aggregates as of this cycle.
    pub aggregates: AggregateState,
    /// Rolling-window statistics, `None` while the buffer is empty.
    pub window: Option<WindowStats>,
    /// Whether the subscriber currently holds a broker connection.
    pub connected: bool,
    /// Most recent payload decode failure, if any.
    pub last_decode_error: Option<String>,
}

/// Explicitly owned state for the consumer loop: the buffer handle plus the
/// session aggregator. Constructed once at startup and threaded through
/// every cycle; there is no process-wide singleton behind it.
pub struct MonitorContext {
    buffer: IngestBuffer,
    aggregator: SessionAggregator,
}

impl MonitorContext {
    /// Build a context around an existing buffer handle.
    pub fn new(buffer: IngestBuffer, settings: &MonitorSettings) -> Self {
        Self {
            buffer,
            aggregator: SessionAggregator::new(settings.history_window, settings.alert_capacity),
        }
    }

    /// Run one processing cycle: snapshot, verify, classify, aggregate.
    pub fn tick(&mut self, now: DateTime<Utc>, connected: bool) -> MonitorFrame {
        let processed: Vec<ProcessedReading> = self
            .buffer
            .snapshot()
            .into_iter()
            .map(ProcessedReading::evaluate)
            .collect();

        let aggregates = self
            .aggregator
            .observe(&processed, self.buffer.total_pushed(), now);
        let window = self.aggregator.window_stats(&processed, now);

        MonitorFrame {
            latest: processed.last().cloned(),
            aggregates,
            window,
            connected,
            last_decode_error: self.buffer.last_error(),
        }
    }
}

/// Run the monitor until Ctrl-C: spawn the subscriber, poll on the
/// configured interval, and pass each frame to `render`.
pub async fn run<F: FnMut(&MonitorFrame)>(settings: &Settings, mut render: F) -> AppResult<()> {
    let buffer = IngestBuffer::new(settings.ingest.buffer_capacity);
    let subscriber = Subscriber::spawn(&settings.mqtt, buffer.clone());
    let mut context = MonitorContext::new(buffer, &settings.monitor);
    let mut interval = tokio::time::interval(settings.monitor.poll_interval);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let frame = context.tick(Utc::now(), subscriber.is_connected());
                render(&frame);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    info!("shutting down monitor");
    subscriber.shutdown().await;
    Ok(())
}
