//! Threshold classification of boiler readings.
//!
//! Three separate scales are applied to the same temperature/pressure pair:
//!
//! - **Threat level** (`LOW`/`MEDIUM`/`HIGH`): the security axis. An
//!   integrity failure always dominates and yields `HIGH` regardless of the
//!   physical values.
//! - **Operational status** (`OK`/`Warning`/`Critical`): the producer-side
//!   axis, computed by the publisher and attached to the wire message.
//! - **Risk bands** (`normal`/`warning`/`critical` per metric): drive
//!   alerting and rendering on the consumer side.
//!
//! The scales are close but intentionally not identical (e.g. status goes
//! `Critical` at 95 °C while threat goes `HIGH` at 100 °C). They must stay
//! distinct; unifying them changes observable behavior.
//!
//! Classification is memoryless: no hysteresis, recomputed fresh from the
//! latest values on every call.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Threat scale: `HIGH` boundary.
pub const THREAT_HIGH_TEMP: f64 = 100.0;
/// Threat scale: `HIGH` boundary (pressure).
pub const THREAT_HIGH_PRESSURE: f64 = 50.0;
/// Threat scale: `MEDIUM` boundary.
pub const THREAT_MEDIUM_TEMP: f64 = 85.0;
/// Threat scale: `MEDIUM` boundary (pressure).
pub const THREAT_MEDIUM_PRESSURE: f64 = 40.0;

/// Status scale: `Critical` boundary.
pub const STATUS_CRITICAL_TEMP: f64 = 95.0;
/// Status scale: `Critical` boundary (pressure).
pub const STATUS_CRITICAL_PRESSURE: f64 = 45.0;
/// Status scale: `Warning` boundary.
pub const STATUS_WARNING_TEMP: f64 = 85.0;
/// Status scale: `Warning` boundary (pressure).
pub const STATUS_WARNING_PRESSURE: f64 = 35.0;

/// Coarse severity combining integrity status and physical thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThreatLevel {
    /// Values in the normal operating range, integrity intact.
    Low,
    /// Elevated temperature or pressure.
    Medium,
    /// Integrity violation, or values past the high boundary.
    High,
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ThreatLevel::Low => "LOW",
            ThreatLevel::Medium => "MEDIUM",
            ThreatLevel::High => "HIGH",
        };
        write!(f, "{}", label)
    }
}

/// Producer-side operational status band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OperationalStatus {
    /// Normal operation.
    Ok,
    /// Elevated values, attention recommended.
    Warning,
    /// Values past the critical boundary.
    Critical,
}

impl fmt::Display for OperationalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OperationalStatus::Ok => "OK",
            OperationalStatus::Warning => "Warning",
            OperationalStatus::Critical => "Critical",
        };
        write!(f, "{}", label)
    }
}

/// Per-metric risk band used for alerting and display emphasis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    /// Within the normal range.
    Normal,
    /// Elevated.
    Warning,
    /// Past the critical boundary.
    Critical,
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskBand::Normal => "normal",
            RiskBand::Warning => "warning",
            RiskBand::Critical => "critical",
        };
        write!(f, "{}", label)
    }
}

/// Result of classifying a single reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Operational status derived from the physical values.
    pub status: OperationalStatus,
    /// Threat level combining integrity and physical values.
    pub threat: ThreatLevel,
}

/// Classify a reading into an operational status and a threat level.
///
/// Precedence: a tamper signal (`integrity_ok == false`) always yields
/// `HIGH` threat, before any physical threshold is consulted.
pub fn classify(temperature: f64, pressure: f64, integrity_ok: bool) -> Classification {
    Classification {
        status: operational_status(temperature, pressure),
        threat: threat_level(temperature, pressure, integrity_ok),
    }
}

/// Threat level for a reading.
pub fn threat_level(temperature: f64, pressure: f64, integrity_ok: bool) -> ThreatLevel {
    if !integrity_ok {
        return ThreatLevel::High;
    }
    if temperature >= THREAT_HIGH_TEMP || pressure >= THREAT_HIGH_PRESSURE {
        ThreatLevel::High
    } else if temperature >= THREAT_MEDIUM_TEMP || pressure >= THREAT_MEDIUM_PRESSURE {
        ThreatLevel::Medium
    } else {
        ThreatLevel::Low
    }
}

/// Operational status band for a reading (the producer-side scale).
pub fn operational_status(temperature: f64, pressure: f64) -> OperationalStatus {
    if temperature >= STATUS_CRITICAL_TEMP || pressure >= STATUS_CRITICAL_PRESSURE {
        OperationalStatus::Critical
    } else if temperature >= STATUS_WARNING_TEMP || pressure >= STATUS_WARNING_PRESSURE {
        OperationalStatus::Warning
    } else {
        OperationalStatus::Ok
    }
}

/// Risk band for a temperature value.
pub fn temperature_risk(temperature: f64) -> RiskBand {
    if temperature >= 100.0 {
        RiskBand::Critical
    } else if temperature >= 85.0 {
        RiskBand::Warning
    } else {
        RiskBand::Normal
    }
}

/// Risk band for a pressure value.
pub fn pressure_risk(pressure: f64) -> RiskBand {
    if pressure >= 50.0 {
        RiskBand::Critical
    } else if pressure >= 40.0 {
        RiskBand::Warning
    } else {
        RiskBand::Normal
    }
}
