//! End-to-end pipeline tests: wire bytes → decode → buffer → verify →
//! classify → aggregate, without a live broker.
//!
//! The MQTT layer is exercised only through the same entry points it uses
//! (`Reading::decode` + `IngestBuffer::push`), so these tests cover every
//! consumer-visible behavior of the core.

use boilerwatch::buffer::IngestBuffer;
use boilerwatch::classify::{OperationalStatus, ThreatLevel};
use boilerwatch::config::{MonitorSettings, SimulatorSettings};
use boilerwatch::core::Reading;
use boilerwatch::integrity;
use boilerwatch::monitor::MonitorContext;
use boilerwatch::simulator::BoilerSimulator;
use chrono::Utc;
use serde_json::{json, Map, Value};

fn sealed_wire_message(device_id: &str, temperature: f64, pressure: f64, status: &str) -> Vec<u8> {
    let mut payload = object(json!({
        "device_id": device_id,
        "timestamp": "2024-01-01T00:00:00Z",
        "temperature": temperature,
        "pressure": pressure,
        "status": status,
    }));
    payload.insert("hash".into(), json!(integrity::digest(&payload)));
    serde_json::to_vec(&payload).unwrap()
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {}", other),
    }
}

#[test]
fn verified_normal_reading_is_low_threat() {
    // A correctly hashed in-range reading.
    let raw = sealed_wire_message("boiler_01", 70.0, 20.0, "OK");

    let buffer = IngestBuffer::new(16);
    buffer.push(Reading::decode(&raw).unwrap());

    let mut context = MonitorContext::new(buffer, &MonitorSettings::default());
    let frame = context.tick(Utc::now(), true);
    let latest = frame.latest.unwrap();

    assert!(latest.integrity_ok);
    assert_eq!(latest.classification.threat, ThreatLevel::Low);
    assert_eq!(latest.classification.status, OperationalStatus::Ok);
    assert_eq!(frame.aggregates.integrity_violations, 0);
    assert_eq!(frame.aggregates.integrity_score, 100.0);
    assert!(frame.aggregates.alert_history.is_empty());
}

#[test]
fn temperature_overwritten_after_hashing_is_high_threat() {
    // The same reading with the temperature overwritten post-hash.
    let mut payload = object(json!({
        "device_id": "boiler_01",
        "timestamp": "2024-01-01T00:00:00Z",
        "temperature": 70.0,
        "pressure": 20.0,
        "status": "OK",
    }));
    payload.insert("hash".into(), json!(integrity::digest(&payload)));
    payload.insert("temperature".into(), json!(100.0));
    let raw = serde_json::to_vec(&payload).unwrap();

    let buffer = IngestBuffer::new(16);
    buffer.push(Reading::decode(&raw).unwrap());

    let mut context = MonitorContext::new(buffer, &MonitorSettings::default());
    let frame = context.tick(Utc::now(), true);
    let latest = frame.latest.unwrap();

    assert!(!latest.integrity_ok);
    assert_eq!(latest.classification.threat, ThreatLevel::High);
    assert_eq!(frame.aggregates.integrity_violations, 1);
    assert_eq!(frame.aggregates.alert_history.len(), 1);
}

#[test]
fn elevated_but_verified_reading_is_medium_threat() {
    // 90 °C with a valid hash.
    let raw = sealed_wire_message("boiler_01", 90.0, 20.0, "Warning");

    let reading = Reading::decode(&raw).unwrap();
    assert!(reading.verify());

    let processed = boilerwatch::core::ProcessedReading::evaluate(reading);
    assert_eq!(processed.classification.threat, ThreatLevel::Medium);
    assert_eq!(processed.classification.status, OperationalStatus::Warning);
}

#[test]
fn buffer_keeps_the_newest_readings() {
    // Capacity 3, push four readings, snapshot holds the last three.
    let buffer = IngestBuffer::new(3);
    for n in 1..=4 {
        let raw = sealed_wire_message(&format!("boiler_{:02}", n), 70.0, 20.0, "OK");
        buffer.push(Reading::decode(&raw).unwrap());
    }

    let ids: Vec<String> = buffer
        .snapshot()
        .iter()
        .map(|r| r.device_id.clone())
        .collect();
    assert_eq!(ids, ["boiler_02", "boiler_03", "boiler_04"]);
}

#[test]
fn empty_session_scores_perfect_integrity() {
    // No packets seen yet.
    let buffer = IngestBuffer::new(3);
    let mut context = MonitorContext::new(buffer, &MonitorSettings::default());
    let frame = context.tick(Utc::now(), false);

    assert_eq!(frame.aggregates.total_packets, 0);
    assert_eq!(frame.aggregates.integrity_score, 100.0);
    assert!(frame.latest.is_none());
}

#[test]
fn wire_key_order_does_not_affect_verification() {
    // The same values hashed by the producer verify regardless of how the
    // transport happens to order the JSON keys.
    let mut payload = object(json!({
        "device_id": "boiler_01",
        "timestamp": "2024-01-01T00:00:00Z",
        "temperature": 70.0,
        "pressure": 20.0,
        "status": "OK",
    }));
    let digest = integrity::digest(&payload);
    payload.insert("hash".into(), json!(digest));

    let reordered = format!(
        r#"{{"status":"OK","hash":"{}","pressure":20.0,"device_id":"boiler_01","temperature":70.0,"timestamp":"2024-01-01T00:00:00Z","site":"plant-7"}}"#,
        digest
    );
    let reading = Reading::decode(reordered.as_bytes()).unwrap();
    assert!(reading.verify());
    assert_eq!(reading.payload().get("site"), Some(&json!("plant-7")));
}

#[test]
fn simulated_attack_traffic_degrades_the_integrity_score() {
    let settings = SimulatorSettings::default();
    let mut legit = BoilerSimulator::seeded(&settings, 11);
    let mut attacker = BoilerSimulator::seeded(&settings, 13);

    let buffer = IngestBuffer::new(64);
    for _ in 0..6 {
        let raw = serde_json::to_vec(&legit.next_payload()).unwrap();
        buffer.push(Reading::decode(&raw).unwrap());
    }
    for _ in 0..2 {
        let raw = serde_json::to_vec(&attacker.next_tampered_payload()).unwrap();
        buffer.push(Reading::decode(&raw).unwrap());
    }

    let mut context = MonitorContext::new(buffer, &MonitorSettings::default());
    let frame = context.tick(Utc::now(), true);

    assert_eq!(frame.aggregates.total_packets, 8);
    assert_eq!(frame.aggregates.integrity_violations, 2);
    assert_eq!(frame.aggregates.integrity_score, 75.0);
    let latest = frame.latest.unwrap();
    assert!(!latest.integrity_ok);
    assert_eq!(latest.classification.threat, ThreatLevel::High);
}

#[test]
fn malformed_messages_never_reach_the_buffer() {
    let buffer = IngestBuffer::new(8);

    for raw in [&b"{ not json"[..], b"[1,2,3]", b"{\"timestamp\": 12}"] {
        match Reading::decode(raw) {
            Ok(_) => panic!("malformed message decoded"),
            Err(e) => buffer.record_decode_error(e.to_string()),
        }
    }

    assert!(buffer.is_empty());
    assert_eq!(buffer.total_pushed(), 0);
    assert!(buffer.last_error().is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_producer_and_consumer_stay_consistent() {
    let buffer = IngestBuffer::new(32);
    let writer = buffer.clone();

    let producer = tokio::spawn(async move {
        let settings = SimulatorSettings::default();
        let mut sim = BoilerSimulator::seeded(&settings, 99);
        for _ in 0..500 {
            let raw = serde_json::to_vec(&sim.next_payload()).unwrap();
            writer.push(Reading::decode(&raw).unwrap());
            tokio::task::yield_now().await;
        }
    });

    let mut context = MonitorContext::new(buffer.clone(), &MonitorSettings::default());
    for _ in 0..50 {
        let frame = context.tick(Utc::now(), true);
        if let Some(window) = frame.window {
            assert!(window.count <= 32);
        }
        assert_eq!(frame.aggregates.integrity_violations, 0);
        tokio::task::yield_now().await;
    }

    producer.await.unwrap();
    let frame = context.tick(Utc::now(), true);
    assert_eq!(frame.aggregates.total_packets, 500);
    assert_eq!(buffer.len(), 32);
    assert_eq!(frame.aggregates.integrity_score, 100.0);
}
