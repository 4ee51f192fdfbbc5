//! # boilerwatch
//!
//! Integrity-verified live monitoring of industrial boiler telemetry over
//! MQTT. The library ingests readings from a publish/subscribe transport,
//! detects false-data injection via canonical-form SHA-256 verification, and
//! classifies every reading into operational and threat severities.
//!
//! ## Crate Structure
//!
//! - **`buffer`**: The bounded, thread-safe `IngestBuffer` decoupling
//!   network delivery from consumption.
//! - **`classify`**: Threshold classification (threat level, operational
//!   status, per-metric risk bands).
//! - **`config`**: Strongly-typed settings loaded from TOML and the
//!   environment. See `config::Settings`.
//! - **`core`**: The `Reading` data model and per-reading evaluation.
//! - **`error`**: The `WatchError` application error type and the
//!   per-message `DecodeError`.
//! - **`integrity`**: Canonical serialization and digest verification — the
//!   trust anchor shared by producers and the monitor.
//! - **`logging`**: Tracing subscriber setup.
//! - **`monitor`**: The consumer poll loop and its `MonitorFrame` output.
//! - **`mqtt`**: The subscriber task and shared MQTT client plumbing.
//! - **`session`**: Rolling session aggregates and the bounded alert
//!   history.
//! - **`simulator`**: Boiler and attack publisher personalities for
//!   exercising the pipeline end to end.

pub mod buffer;
pub mod classify;
pub mod config;
pub mod core;
pub mod error;
pub mod integrity;
pub mod logging;
pub mod monitor;
pub mod mqtt;
pub mod session;
pub mod simulator;
