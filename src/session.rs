//! Rolling session state derived from buffer snapshots.
//!
//! The aggregator deliberately recomputes `integrity_violations` from the
//! current snapshot on every cycle instead of keeping an incremental
//! counter: the count then always reflects exactly the retained window and
//! cannot drift from evicted history. `total_packets` is the opposite — it
//! comes from the buffer's monotonic push counter and only ever grows.

use crate::classify::{self, RiskBand};
use crate::core::ProcessedReading;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

/// How many readings to fall back to when the rolling window is empty.
const WINDOW_FALLBACK_LEN: usize = 100;

/// Why an alert was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    /// The latest reading failed integrity verification.
    IntegrityViolation,
    /// The latest reading sits in a non-normal risk band.
    Risk(RiskBand),
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertKind::IntegrityViolation => write!(f, "INTEGRITY VIOLATION"),
            AlertKind::Risk(band) => write!(f, "{} RISK", band.to_string().to_uppercase()),
        }
    }
}

/// One entry in the bounded alert history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    /// When the alert was raised (consumer clock).
    pub raised_at: DateTime<Utc>,
    /// Alert category.
    pub kind: AlertKind,
    /// Rendered alert text; also the deduplication key.
    pub message: String,
}

/// Aggregate counters for the current session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateState {
    /// Count of all readings ever pushed, independent of buffer eviction.
    pub total_packets: u64,
    /// Count of currently-buffered readings failing verification.
    pub integrity_violations: usize,
    /// `100 · (1 − violations / total)`, 100 when nothing was seen yet.
    pub integrity_score: f64,
    /// Bounded FIFO of recent alert events, oldest first.
    pub alert_history: Vec<AlertEvent>,
}

/// Statistics over the rolling time window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    /// Readings contributing to the statistics.
    pub count: usize,
    /// Mean temperature in the window, °C.
    pub temperature_mean: f64,
    /// Maximum temperature in the window, °C.
    pub temperature_max: f64,
    /// Mean pressure in the window, PSI.
    pub pressure_mean: f64,
    /// Maximum pressure in the window, PSI.
    pub pressure_max: f64,
}

/// Maintains rolling counts and the alert history across processing cycles.
///
/// Owned by the monitor loop; all state is process-scoped and lost on
/// restart.
pub struct SessionAggregator {
    window: Duration,
    alert_capacity: usize,
    alerts: VecDeque<AlertEvent>,
}

impl SessionAggregator {
    /// Create an aggregator with the given rolling window and alert bound.
    pub fn new(window: Duration, alert_capacity: usize) -> Self {
        Self {
            window,
            alert_capacity: alert_capacity.max(1),
            alerts: VecDeque::with_capacity(alert_capacity.max(1)),
        }
    }

    /// Run one processing cycle over a snapshot.
    ///
    /// Recomputes the violation count from the snapshot, evaluates the
    /// latest reading for a new alert, and returns the current aggregate
    /// state. `total_pushed` is the buffer's monotonic counter.
    pub fn observe(
        &mut self,
        snapshot: &[ProcessedReading],
        total_pushed: u64,
        now: DateTime<Utc>,
    ) -> AggregateState {
        let integrity_violations = snapshot.iter().filter(|r| !r.integrity_ok).count();

        if let Some(latest) = snapshot.last() {
            self.maybe_raise_alert(latest, now);
        }

        let integrity_score = if total_pushed == 0 {
            100.0
        } else {
            100.0 * (1.0 - integrity_violations as f64 / total_pushed as f64)
        };

        AggregateState {
            total_packets: total_pushed,
            integrity_violations,
            integrity_score,
            alert_history: self.alerts.iter().cloned().collect(),
        }
    }

    /// Statistics over readings whose producer timestamp falls inside the
    /// rolling window.
    ///
    /// When the window holds nothing (e.g. stale buffered history after a
    /// transport outage) the most recent [`WINDOW_FALLBACK_LEN`] readings
    /// are used instead, so the display keeps serving the last known state.
    /// Returns `None` only when the snapshot itself is empty.
    pub fn window_stats(
        &self,
        snapshot: &[ProcessedReading],
        now: DateTime<Utc>,
    ) -> Option<WindowStats> {
        if snapshot.is_empty() {
            return None;
        }

        let window = chrono::Duration::from_std(self.window)
            .unwrap_or_else(|_| chrono::Duration::days(365));
        let window_start = now - window;

        let recent: Vec<&ProcessedReading> = snapshot
            .iter()
            .filter(|r| r.reading.timestamp >= window_start)
            .collect();
        let recent = if recent.is_empty() {
            snapshot
                .iter()
                .skip(snapshot.len().saturating_sub(WINDOW_FALLBACK_LEN))
                .collect()
        } else {
            recent
        };

        let count = recent.len();
        let mut temperature_sum = 0.0;
        let mut temperature_max = f64::MIN;
        let mut pressure_sum = 0.0;
        let mut pressure_max = f64::MIN;
        for r in &recent {
            temperature_sum += r.reading.temperature;
            temperature_max = temperature_max.max(r.reading.temperature);
            pressure_sum += r.reading.pressure;
            pressure_max = pressure_max.max(r.reading.pressure);
        }

        Some(WindowStats {
            count,
            temperature_mean: temperature_sum / count as f64,
            temperature_max,
            pressure_mean: pressure_sum / count as f64,
            pressure_max,
        })
    }

    fn maybe_raise_alert(&mut self, latest: &ProcessedReading, now: DateTime<Utc>) {
        let temperature_band = classify::temperature_risk(latest.reading.temperature);
        let pressure_band = classify::pressure_risk(latest.reading.pressure);
        let band = temperature_band.max(pressure_band);

        if latest.integrity_ok && band == RiskBand::Normal {
            return;
        }

        let kind = if latest.integrity_ok {
            AlertKind::Risk(band)
        } else {
            AlertKind::IntegrityViolation
        };
        let message = format!(
            "Temp: {:.1}°C, Pressure: {:.1} PSI",
            latest.reading.temperature, latest.reading.pressure
        );

        // Suppress steady-state flooding: identical consecutive messages
        // collapse into one entry.
        if self.alerts.back().is_some_and(|last| last.message == message) {
            return;
        }

        if self.alerts.len() >= self.alert_capacity {
            self.alerts.pop_front();
        }
        self.alerts.push_back(AlertEvent {
            raised_at: now,
            kind,
            message,
        });
    }
}
