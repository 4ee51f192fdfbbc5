//! Custom error types for the application.
//!
//! This module defines the primary error type, `WatchError`, for the entire
//! application. Using the `thiserror` crate, it provides a centralized and
//! consistent way to handle the different kinds of errors that can occur,
//! from configuration and I/O issues to MQTT client problems.
//!
//! Decode failures for individual telemetry payloads are deliberately kept in
//! their own small `DecodeError` type: a malformed message is dropped and
//! recorded on the ingest buffer, never propagated as a fatal fault, so it
//! must not flow through `WatchError` at all.

use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type AppResult<T> = std::result::Result<T, WatchError>;

/// Application-level error type.
#[derive(Error, Debug)]
pub enum WatchError {
    /// Configuration file or environment parsing failed.
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    /// Configuration parsed but contains logically invalid values.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// File or network I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Request to the MQTT client (subscribe, publish, disconnect) failed.
    #[error("MQTT client error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// Outbound payload could not be serialized.
    #[error("Payload encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// Tracing subscriber could not be installed.
    #[error("Tracing initialization error: {0}")]
    Tracing(String),
}

/// Why an inbound telemetry payload could not be turned into a `Reading`.
///
/// These are recoverable per-message failures: the subscriber drops the
/// message, records the error on the buffer, and keeps the subscription
/// alive.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The payload bytes are not valid JSON.
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload parsed but is not a JSON object.
    #[error("payload is not a JSON object")]
    NotAnObject,

    /// The payload carries no `timestamp` string.
    #[error("payload has no timestamp field")]
    MissingTimestamp,

    /// The `timestamp` string is not RFC-3339.
    #[error("timestamp is not RFC-3339: {0}")]
    Timestamp(#[from] chrono::ParseError),
}
