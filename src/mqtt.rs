//! MQTT transport: the telemetry subscriber task and shared client plumbing.
//!
//! The subscriber owns the broker connection on a spawned tokio task and is
//! the only writer into the [`IngestBuffer`]. Message arrival is strictly a
//! message-passing boundary: the task decodes each publish packet and pushes
//! the resulting `Reading`; the consumer never touches the network client.
//!
//! Failure policy per message: a payload that does not decode is dropped and
//! recorded as the buffer's last error. It is never allowed to take down the
//! subscription. Connection-level errors are logged and retried with a short
//! backoff; `rumqttc` re-establishes the session on the next poll, and the
//! task re-subscribes on every connection acknowledgment so a broker restart
//! does not silently end the stream.

use crate::buffer::IngestBuffer;
use crate::config::MqttSettings;
use crate::core::Reading;
use crate::error::AppResult;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Delay before re-polling the event loop after a connection error.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Map a configured QoS level onto the client's enum.
///
/// Levels are validated to 0..=2 at configuration time; anything else falls
/// back to at-least-once, the reference deployment's level.
pub fn qos_level(level: u8) -> QoS {
    match level {
        0 => QoS::AtMostOnce,
        2 => QoS::ExactlyOnce,
        _ => QoS::AtLeastOnce,
    }
}

/// Build client options for a connection with the given role suffix.
pub fn client_options(settings: &MqttSettings, role: &str) -> MqttOptions {
    let client_id = format!("{}_{}", settings.client_id, role);
    let mut options = MqttOptions::new(client_id, settings.broker.clone(), settings.port);
    options.set_keep_alive(settings.keep_alive);
    options.set_clean_session(true);
    options
}

/// Handle to the running subscriber task.
pub struct Subscriber {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
    connected: Arc<AtomicBool>,
}

impl Subscriber {
    /// Spawn the subscriber task feeding `buffer`.
    pub fn spawn(settings: &MqttSettings, buffer: IngestBuffer) -> Self {
        let options = client_options(settings, "monitor");
        let topic = settings.topic.clone();
        let qos = qos_level(settings.qos);
        let connected = Arc::new(AtomicBool::new(false));
        let (stop, stop_rx) = watch::channel(false);

        let handle = tokio::spawn(subscriber_loop(
            options,
            topic,
            qos,
            buffer,
            Arc::clone(&connected),
            stop_rx,
        ));

        Self {
            stop,
            handle,
            connected,
        }
    }

    /// Whether the broker connection is currently established.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Stop the subscriber task.
    ///
    /// Readings already pushed into the buffer are untouched; only the
    /// network task terminates.
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        let _ = self.handle.await;
    }
}

async fn subscriber_loop(
    options: MqttOptions,
    topic: String,
    qos: QoS,
    buffer: IngestBuffer,
    connected: Arc<AtomicBool>,
    mut stop: watch::Receiver<bool>,
) {
    let (client, mut eventloop) = AsyncClient::new(options, 64);
    info!(topic = %topic, "starting telemetry subscriber");

    loop {
        tokio::select! {
            _ = stop.changed() => break,
            event = eventloop.poll() => match event {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    connected.store(true, Ordering::Relaxed);
                    info!(topic = %topic, "connected to broker, subscribing");
                    if let Err(e) = client.subscribe(&topic, qos).await {
                        warn!(error = %e, "subscribe request failed");
                    }
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    match Reading::decode(&publish.payload) {
                        Ok(reading) => {
                            trace!(device_id = %reading.device_id, "buffered reading");
                            buffer.push(reading);
                        }
                        Err(e) => {
                            // Recoverable: drop the single message, keep the
                            // subscription alive.
                            warn!(error = %e, "dropping malformed telemetry payload");
                            buffer.record_decode_error(e.to_string());
                        }
                    }
                }
                Ok(Event::Incoming(Packet::Disconnect)) => {
                    connected.store(false, Ordering::Relaxed);
                    debug!("broker sent disconnect");
                }
                Ok(_) => {}
                Err(e) => {
                    connected.store(false, Ordering::Relaxed);
                    warn!(error = %e, "mqtt connection error, retrying");
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            }
        }
    }

    connected.store(false, Ordering::Relaxed);
    let _ = client.disconnect().await;
    info!("telemetry subscriber stopped");
}

/// Connect a publisher client and keep its event loop polled in the
/// background.
///
/// Returns the client; the driving task runs until the process exits and
/// retries on connection errors just like the subscriber.
pub fn spawn_publisher(settings: &MqttSettings, role: &str) -> AppResult<AsyncClient> {
    let options = client_options(settings, role);
    let (client, mut eventloop) = AsyncClient::new(options, 16);

    tokio::spawn(async move {
        loop {
            if let Err(e) = eventloop.poll().await {
                warn!(error = %e, "mqtt connection error, retrying");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    });

    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qos_levels_map_onto_client_enum() {
        assert_eq!(qos_level(0), QoS::AtMostOnce);
        assert_eq!(qos_level(1), QoS::AtLeastOnce);
        assert_eq!(qos_level(2), QoS::ExactlyOnce);
    }

    #[test]
    fn client_ids_carry_the_role_suffix() {
        let settings = MqttSettings::default();
        let options = client_options(&settings, "monitor");
        assert_eq!(options.client_id(), "boilerwatch_monitor");
    }

    #[tokio::test]
    async fn shutdown_leaves_buffered_readings_intact() {
        let buffer = IngestBuffer::new(8);
        let settings = MqttSettings {
            // Nothing listens here; the task will sit in its retry loop.
            broker: "127.0.0.1".to_string(),
            port: 59999,
            ..MqttSettings::default()
        };
        let subscriber = Subscriber::spawn(&settings, buffer.clone());

        // Data that arrived before shutdown must survive it.
        let payload = match serde_json::json!({
            "device_id": "boiler_01",
            "timestamp": "2024-01-01T00:00:00Z",
            "temperature": 70.0,
            "pressure": 20.0,
            "status": "OK",
        }) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        buffer.push(crate::core::Reading::from_payload(payload).unwrap());

        assert!(!subscriber.is_connected());
        subscriber.shutdown().await;
        assert_eq!(buffer.len(), 1);
    }
}
