//! Configuration loading and validation.
//!
//! Strongly-typed settings loaded from:
//! 1. a TOML file (`config/default.toml` unless overridden on the CLI)
//! 2. environment variables prefixed with `BOILERWATCH_`
//!
//! Every tunable has a serde default matching the reference deployment, so
//! an empty file (or none at all) yields a runnable configuration pointed at
//! the public test broker.

use crate::error::{AppResult, WatchError};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Application-level settings (logging).
    #[serde(default)]
    pub application: ApplicationSettings,
    /// Broker connection settings.
    #[serde(default)]
    pub mqtt: MqttSettings,
    /// Ingestion buffer settings.
    #[serde(default)]
    pub ingest: IngestSettings,
    /// Consumer poll-loop settings.
    #[serde(default)]
    pub monitor: MonitorSettings,
    /// Telemetry simulator settings (publisher subcommands).
    #[serde(default)]
    pub simulator: SimulatorSettings,
}

/// Application-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationSettings {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Logging output format (pretty, compact, json).
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

/// MQTT broker connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttSettings {
    /// Broker hostname.
    #[serde(default = "default_broker")]
    pub broker: String,
    /// Broker port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Telemetry topic to subscribe/publish on.
    #[serde(default = "default_topic")]
    pub topic: String,
    /// Quality-of-service level (0, 1 or 2).
    #[serde(default = "default_qos")]
    pub qos: u8,
    /// Client id prefix; a role suffix is appended per connection.
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// MQTT keep-alive interval.
    #[serde(default = "default_keep_alive", with = "humantime_serde")]
    pub keep_alive: Duration,
}

/// Ingestion buffer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestSettings {
    /// Maximum readings retained; older entries are evicted FIFO.
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
}

/// Consumer poll-loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSettings {
    /// Interval between snapshot/render cycles.
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Rolling window for live statistics.
    #[serde(default = "default_history_window", with = "humantime_serde")]
    pub history_window: Duration,
    /// Maximum retained alert events.
    #[serde(default = "default_alert_capacity")]
    pub alert_capacity: usize,
}

/// Telemetry simulator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorSettings {
    /// Device identity stamped on published readings.
    #[serde(default = "default_device_id")]
    pub device_id: String,
    /// Interval between published readings.
    #[serde(default = "default_publish_interval", with = "humantime_serde")]
    pub publish_interval: Duration,
    /// Lower bound of the initial temperature draw, °C.
    #[serde(default = "default_temp_min")]
    pub temp_min: f64,
    /// Upper bound of the initial temperature draw, °C.
    #[serde(default = "default_temp_max")]
    pub temp_max: f64,
    /// Lower bound of the initial pressure draw, PSI.
    #[serde(default = "default_pressure_min")]
    pub pressure_min: f64,
    /// Upper bound of the initial pressure draw, PSI.
    #[serde(default = "default_pressure_max")]
    pub pressure_max: f64,
}

// Default value functions

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_broker() -> String {
    "test.mosquitto.org".to_string()
}

fn default_port() -> u16 {
    1883
}

fn default_topic() -> String {
    "cu/bca/boiler/secure_digital_twin".to_string()
}

fn default_qos() -> u8 {
    1
}

fn default_client_id() -> String {
    "boilerwatch".to_string()
}

fn default_keep_alive() -> Duration {
    Duration::from_secs(60)
}

fn default_buffer_capacity() -> usize {
    10_000
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_history_window() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_alert_capacity() -> usize {
    50
}

fn default_device_id() -> String {
    "boiler_01".to_string()
}

fn default_publish_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_temp_min() -> f64 {
    65.0
}

fn default_temp_max() -> f64 {
    92.0
}

fn default_pressure_min() -> f64 {
    18.0
}

fn default_pressure_max() -> f64 {
    42.0
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

impl Default for MqttSettings {
    fn default() -> Self {
        Self {
            broker: default_broker(),
            port: default_port(),
            topic: default_topic(),
            qos: default_qos(),
            client_id: default_client_id(),
            keep_alive: default_keep_alive(),
        }
    }
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            buffer_capacity: default_buffer_capacity(),
        }
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            history_window: default_history_window(),
            alert_capacity: default_alert_capacity(),
        }
    }
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            device_id: default_device_id(),
            publish_interval: default_publish_interval(),
            temp_min: default_temp_min(),
            temp_max: default_temp_max(),
            pressure_min: default_pressure_min(),
            pressure_max: default_pressure_max(),
        }
    }
}

impl Settings {
    /// Load configuration from the given TOML file and the environment.
    ///
    /// Environment variables override file values with the prefix
    /// `BOILERWATCH_` and `__` as the section separator, e.g.
    /// `BOILERWATCH_MQTT__BROKER=localhost`.
    pub fn load<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let settings: Settings = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("BOILERWATCH_").split("__"))
            .extract()?;
        settings.validate().map_err(WatchError::Configuration)?;
        Ok(settings)
    }

    /// Validate configuration after loading.
    pub fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            ));
        }

        let valid_formats = ["pretty", "compact", "json"];
        if !valid_formats.contains(&self.application.log_format.as_str()) {
            return Err(format!(
                "Invalid log_format '{}'. Must be one of: {}",
                self.application.log_format,
                valid_formats.join(", ")
            ));
        }

        if self.mqtt.broker.is_empty() {
            return Err("MQTT broker hostname must not be empty".to_string());
        }
        if self.mqtt.port == 0 {
            return Err("MQTT port must be greater than 0".to_string());
        }
        if self.mqtt.topic.is_empty() {
            return Err("MQTT topic must not be empty".to_string());
        }
        if self.mqtt.qos > 2 {
            return Err(format!("Invalid QoS {}. Must be 0, 1 or 2", self.mqtt.qos));
        }

        if self.ingest.buffer_capacity == 0 {
            return Err("Ingest buffer capacity must be greater than 0".to_string());
        }

        if self.monitor.poll_interval.is_zero() {
            return Err("Monitor poll interval must be greater than 0".to_string());
        }
        if self.monitor.alert_capacity == 0 {
            return Err("Alert history capacity must be greater than 0".to_string());
        }

        if self.simulator.temp_min >= self.simulator.temp_max {
            return Err("Simulator temperature range is empty".to_string());
        }
        if self.simulator.pressure_min >= self.simulator.pressure_max {
            return Err("Simulator pressure range is empty".to_string());
        }

        Ok(())
    }
}
