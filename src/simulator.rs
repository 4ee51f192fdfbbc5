//! Simulated boiler telemetry publishers.
//!
//! Two publisher personalities, both driving the same MQTT topic the
//! monitor subscribes to:
//!
//! - the **boiler** publisher emits a smooth random walk of plausible
//!   temperature/pressure values, each payload correctly hashed;
//! - the **attack** publisher builds an equally legitimate payload, hashes
//!   it, then overwrites the temperature while keeping the stale hash and a
//!   reassuring `OK` status. This is the false-data-injection case the
//!   verifier exists to catch.

use crate::classify;
use crate::config::{Settings, SimulatorSettings};
use crate::error::AppResult;
use crate::integrity;
use crate::mqtt;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Map, Value};
use tracing::info;

/// Temperature injected by the attack publisher after hashing.
const INJECTED_TEMPERATURE: f64 = 100.0;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Random-walk state for one simulated boiler.
pub struct BoilerSimulator {
    device_id: String,
    temperature: f64,
    pressure: f64,
    rng: StdRng,
}

impl BoilerSimulator {
    /// Create a simulator with state drawn from the configured ranges.
    pub fn new(settings: &SimulatorSettings) -> Self {
        Self::with_rng(settings, StdRng::from_entropy())
    }

    /// Create a simulator with a fixed seed, for reproducible tests.
    pub fn seeded(settings: &SimulatorSettings, seed: u64) -> Self {
        Self::with_rng(settings, StdRng::seed_from_u64(seed))
    }

    fn with_rng(settings: &SimulatorSettings, mut rng: StdRng) -> Self {
        let temperature = rng.gen_range(settings.temp_min..settings.temp_max);
        let pressure = rng.gen_range(settings.pressure_min..settings.pressure_max);
        Self {
            device_id: settings.device_id.clone(),
            temperature,
            pressure,
            rng,
        }
    }

    /// Produce the next legitimate payload, hash attached.
    ///
    /// Temperature drifts with a slight upward bias; pressure follows the
    /// temperature plus noise. Both are clamped to physically plausible
    /// ranges and rounded to two decimals before hashing, so the hashed
    /// text is exactly what goes on the wire.
    pub fn next_payload(&mut self) -> Map<String, Value> {
        self.temperature =
            (self.temperature + self.rng.gen_range(-0.6..0.8)).clamp(50.0, 110.0);
        self.pressure = (self.pressure
            + (self.temperature - 75.0) * 0.01
            + self.rng.gen_range(-0.4..0.4))
        .clamp(10.0, 55.0);

        let temperature = round2(self.temperature);
        let pressure = round2(self.pressure);
        let status = classify::operational_status(temperature, pressure);

        self.sealed_payload(temperature, pressure, &status.to_string())
    }

    /// Produce the next tampered payload.
    ///
    /// The payload is built and hashed exactly like a legitimate one (with
    /// a gentler drift and a hardcoded `OK` status), then the temperature
    /// is overwritten without recomputing the hash.
    pub fn next_tampered_payload(&mut self) -> Map<String, Value> {
        self.temperature =
            (self.temperature + self.rng.gen_range(-0.4..0.6)).clamp(50.0, 110.0);
        self.pressure =
            (self.pressure + self.rng.gen_range(-0.3..0.3)).clamp(10.0, 55.0);

        let mut payload =
            self.sealed_payload(round2(self.temperature), round2(self.pressure), "OK");
        payload.insert("temperature".into(), json!(INJECTED_TEMPERATURE));
        payload
    }

    fn sealed_payload(
        &self,
        temperature: f64,
        pressure: f64,
        status: &str,
    ) -> Map<String, Value> {
        let mut payload = Map::new();
        payload.insert("device_id".into(), json!(self.device_id));
        payload.insert("timestamp".into(), json!(Utc::now().to_rfc3339()));
        payload.insert("temperature".into(), json!(temperature));
        payload.insert("pressure".into(), json!(pressure));
        payload.insert("status".into(), json!(status));
        payload.insert("hash".into(), json!(integrity::digest(&payload)));
        payload
    }
}

/// Run a publisher until the task is cancelled.
///
/// `tampered` selects the attack personality. Publishes one payload per
/// configured interval at the configured QoS.
pub async fn run_publisher(settings: &Settings, tampered: bool) -> AppResult<()> {
    let role = if tampered { "attacker" } else { "publisher" };
    let client = mqtt::spawn_publisher(&settings.mqtt, role)?;
    let qos = mqtt::qos_level(settings.mqtt.qos);
    let mut simulator = BoilerSimulator::new(&settings.simulator);
    let mut interval = tokio::time::interval(settings.simulator.publish_interval);

    info!(
        broker = %settings.mqtt.broker,
        topic = %settings.mqtt.topic,
        role,
        "publishing telemetry"
    );

    loop {
        interval.tick().await;
        let payload = if tampered {
            simulator.next_tampered_payload()
        } else {
            simulator.next_payload()
        };
        let body = serde_json::to_vec(&payload)?;
        client
            .publish(&settings.mqtt.topic, qos, false, body)
            .await?;
        info!(
            temperature = payload.get("temperature").and_then(serde_json::Value::as_f64),
            pressure = payload.get("pressure").and_then(serde_json::Value::as_f64),
            status = payload.get("status").and_then(serde_json::Value::as_str),
            "published reading"
        );
    }
}
