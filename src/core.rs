//! Core data types for the telemetry pipeline.

use crate::classify::{self, Classification};
use crate::error::DecodeError;
use crate::integrity;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// A single ingested boiler reading.
///
/// A `Reading` is created once, on message receipt, and never mutated
/// afterwards; integrity and classification are computed on access. The full
/// decoded wire object is retained alongside the typed fields so that
/// canonicalization always operates on the exact values the producer hashed
/// (re-serializing parsed floats or timestamps could change their textual
/// form and break verification for honest traffic), and so that extra wire
/// keys stay available for display.
#[derive(Debug, Clone)]
pub struct Reading {
    /// Producer identity, `"unknown"` when absent from the wire.
    pub device_id: String,
    /// Producer timestamp, parsed from RFC-3339 wire text.
    pub timestamp: DateTime<Utc>,
    /// Boiler temperature in °C, `0.0` when absent from the wire.
    pub temperature: f64,
    /// Boiler pressure in PSI, `0.0` when absent from the wire.
    pub pressure: f64,
    /// Producer-supplied status label, `"Unknown"` when absent.
    pub status: String,
    /// Carried integrity digest; absence is itself a verification failure.
    pub hash: Option<String>,
    /// Local receipt instant. Not part of the hashed fields.
    pub received_at: DateTime<Utc>,
    payload: Map<String, Value>,
}

impl Reading {
    /// Decode a raw wire message into a `Reading`.
    ///
    /// A message is malformed (and dropped by the caller) when it is not a
    /// JSON object or its `timestamp` is missing or unparseable. All other
    /// fields are lenient: missing values fall back to display defaults and
    /// surface as verification failures rather than decode errors.
    pub fn decode(raw: &[u8]) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_slice(raw)?;
        match value {
            Value::Object(payload) => Self::from_payload(payload),
            _ => Err(DecodeError::NotAnObject),
        }
    }

    /// Build a `Reading` from an already-decoded wire object.
    pub fn from_payload(payload: Map<String, Value>) -> Result<Self, DecodeError> {
        let timestamp_text = payload
            .get("timestamp")
            .and_then(Value::as_str)
            .ok_or(DecodeError::MissingTimestamp)?;
        let timestamp = DateTime::parse_from_rfc3339(timestamp_text)?.with_timezone(&Utc);

        Ok(Self {
            device_id: payload
                .get("device_id")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
            temperature: payload
                .get("temperature")
                .and_then(Value::as_f64)
                .unwrap_or(0.0),
            pressure: payload
                .get("pressure")
                .and_then(Value::as_f64)
                .unwrap_or(0.0),
            status: payload
                .get("status")
                .and_then(Value::as_str)
                .unwrap_or("Unknown")
                .to_string(),
            hash: payload
                .get("hash")
                .and_then(Value::as_str)
                .map(str::to_owned),
            timestamp,
            received_at: Utc::now(),
            payload,
        })
    }

    /// Verify the carried digest against the recomputed one.
    ///
    /// Pure function of the hashed field values and the carried `hash`;
    /// independent of arrival order and buffer state.
    pub fn verify(&self) -> bool {
        integrity::verify(&self.payload)
    }

    /// The full decoded wire object, extra keys included.
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }
}

/// A reading together with its derived integrity verdict and classification.
///
/// This is what the consumer-facing snapshot carries: the verdict is
/// computed once per processing cycle, never stored back onto the reading.
#[derive(Debug, Clone)]
pub struct ProcessedReading {
    /// The underlying reading.
    pub reading: Reading,
    /// Whether the carried digest matched the recomputed one.
    pub integrity_ok: bool,
    /// Status and threat classification.
    pub classification: Classification,
}

impl ProcessedReading {
    /// Verify and classify a reading.
    pub fn evaluate(reading: Reading) -> Self {
        let integrity_ok = reading.verify();
        let classification =
            classify::classify(reading.temperature, reading.pressure, integrity_ok);
        Self {
            reading,
            integrity_ok,
            classification,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ThreatLevel;
    use serde_json::json;

    fn wire(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn decodes_a_well_formed_message() {
        let raw = wire(json!({
            "device_id": "boiler_01",
            "timestamp": "2024-01-01T00:00:00Z",
            "temperature": 70.0,
            "pressure": 20.0,
            "status": "OK",
            "hash": "deadbeef",
        }));
        let reading = Reading::decode(&raw).unwrap();
        assert_eq!(reading.device_id, "boiler_01");
        assert_eq!(reading.temperature, 70.0);
        assert_eq!(reading.pressure, 20.0);
        assert_eq!(reading.status, "OK");
        assert_eq!(reading.hash.as_deref(), Some("deadbeef"));
        assert_eq!(reading.timestamp.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn missing_optional_fields_fall_back_to_defaults() {
        let raw = wire(json!({ "timestamp": "2024-01-01T00:00:00Z" }));
        let reading = Reading::decode(&raw).unwrap();
        assert_eq!(reading.device_id, "unknown");
        assert_eq!(reading.temperature, 0.0);
        assert_eq!(reading.pressure, 0.0);
        assert_eq!(reading.status, "Unknown");
        assert!(reading.hash.is_none());
        assert!(!reading.verify());
    }

    #[test]
    fn rejects_non_json_and_non_objects() {
        assert!(matches!(
            Reading::decode(b"not json at all"),
            Err(DecodeError::Json(_))
        ));
        assert!(matches!(
            Reading::decode(b"[1, 2, 3]"),
            Err(DecodeError::NotAnObject)
        ));
    }

    #[test]
    fn rejects_missing_or_malformed_timestamps() {
        assert!(matches!(
            Reading::decode(&wire(json!({ "device_id": "boiler_01" }))),
            Err(DecodeError::MissingTimestamp)
        ));
        assert!(matches!(
            Reading::decode(&wire(json!({ "timestamp": "yesterday-ish" }))),
            Err(DecodeError::Timestamp(_))
        ));
    }

    #[test]
    fn offset_timestamps_normalize_to_utc() {
        let raw = wire(json!({ "timestamp": "2024-01-01T05:30:00+05:30" }));
        let reading = Reading::decode(&raw).unwrap();
        assert_eq!(reading.timestamp.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn extra_keys_are_preserved_on_the_payload() {
        let raw = wire(json!({
            "timestamp": "2024-01-01T00:00:00Z",
            "firmware": "v2.1",
        }));
        let reading = Reading::decode(&raw).unwrap();
        assert_eq!(reading.payload().get("firmware"), Some(&json!("v2.1")));
    }

    #[test]
    fn evaluation_of_a_tampered_reading_is_high_threat() {
        let mut payload = match json!({
            "device_id": "boiler_01",
            "timestamp": "2024-01-01T00:00:00Z",
            "temperature": 70.0,
            "pressure": 20.0,
            "status": "OK",
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        payload.insert("hash".into(), json!(crate::integrity::digest(&payload)));
        // Overwrite the temperature after hashing, as the attack publisher does.
        payload.insert("temperature".into(), json!(100.0));

        let processed = ProcessedReading::evaluate(Reading::from_payload(payload).unwrap());
        assert!(!processed.integrity_ok);
        assert_eq!(processed.classification.threat, ThreatLevel::High);
    }
}
