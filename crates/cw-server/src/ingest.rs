//! Sensor feed ingestion.
//!
//! Payloads arrive over MQTT (or from `cw ingest`), are decoded into readings
//! stamped with the time of receipt, and appended to the store. Each publish is
//! stored on its own task; a semaphore caps how many are in flight so a slow
//! database pauses polling instead of piling up tasks.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use cw_core::{Classroom, SensorMessage};
use cw_db::{PoolError, StorePool};
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::config::MqttSettings;

/// Capacity of the request channel between the client handle and its event loop.
const CLIENT_CHANNEL_CAPACITY: usize = 100;

/// What happened to one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Readings were appended to the store.
    Stored {
        classroom: Classroom,
        /// False when the temperature field was not numeric.
        temperature: bool,
    },
    /// The payload was malformed and nothing was recorded.
    Dropped,
}

/// Turns raw payloads into stored readings.
#[derive(Clone)]
pub struct Ingestor {
    pool: StorePool,
}

impl Ingestor {
    pub const fn new(pool: StorePool) -> Self {
        Self { pool }
    }

    /// Decodes `payload` and appends its readings, timestamped `received_at`.
    ///
    /// Malformed payloads are logged and dropped. Only storage failures are
    /// returned as errors. The light and temperature rows are written one after
    /// the other, not as a single transaction.
    pub async fn handle_payload(
        &self,
        payload: &[u8],
        received_at: DateTime<Utc>,
    ) -> Result<IngestOutcome, PoolError> {
        let readings =
            match SensorMessage::parse(payload).and_then(|message| message.into_readings(received_at)) {
                Ok(readings) => readings,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        payload = %String::from_utf8_lossy(payload),
                        "dropping malformed sensor message"
                    );
                    return Ok(IngestOutcome::Dropped);
                }
            };

        let classroom = readings.light.classroom.clone();
        let temperature = readings.temperature.is_some();

        self.pool
            .run(move |db| {
                db.append_light(&readings.light)?;
                if let Some(reading) = &readings.temperature {
                    db.append_temperature(reading)?;
                }
                Ok(())
            })
            .await?;

        tracing::debug!(%classroom, temperature, %received_at, "stored sensor readings");
        Ok(IngestOutcome::Stored {
            classroom,
            temperature,
        })
    }
}

/// Builds client options from settings.
pub fn mqtt_options(settings: &MqttSettings) -> MqttOptions {
    let client_id = settings
        .client_id
        .clone()
        .unwrap_or_else(|| format!("classwatch-{}", Uuid::new_v4()));

    let mut options = MqttOptions::new(client_id, settings.host.clone(), settings.port);
    options.set_keep_alive(Duration::from_secs(settings.keep_alive_secs));

    if let Some((username, password)) = credentials(settings) {
        options.set_credentials(username, password);
    }

    options
}

/// Username and password to send, if any.
///
/// A username without a password is sent with an empty password. A password
/// without a username cannot be sent and is ignored with a warning.
fn credentials(settings: &MqttSettings) -> Option<(&str, &str)> {
    match (&settings.username, &settings.password) {
        (Some(username), password) => Some((username.as_str(), password.as_deref().unwrap_or(""))),
        (None, Some(_)) => {
            tracing::warn!("mqtt.password is set without mqtt.username; connecting anonymously");
            None
        }
        (None, None) => None,
    }
}

/// Subscribes to the sensor topic and stores every publish until the task is aborted.
///
/// The subscription is renewed on every connection acknowledgement. Connection
/// errors are logged; polling resumes after `reconnect_delay_ms` and the client
/// reconnects on its own.
pub async fn run_subscriber(settings: MqttSettings, ingestor: Ingestor) {
    let (client, mut eventloop) = AsyncClient::new(mqtt_options(&settings), CLIENT_CHANNEL_CAPACITY);
    let in_flight = Arc::new(Semaphore::new(settings.max_in_flight.max(1)));
    let reconnect_delay = Duration::from_millis(settings.reconnect_delay_ms);

    tracing::info!(
        host = %settings.host,
        port = settings.port,
        topic = %settings.topic,
        "starting MQTT subscriber"
    );

    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                tracing::info!(host = %settings.host, port = settings.port, "MQTT connected");
                if let Err(e) = client.try_subscribe(settings.topic.clone(), QoS::AtLeastOnce) {
                    tracing::error!(topic = %settings.topic, error = %e, "MQTT subscribe failed");
                }
            }
            Ok(Event::Incoming(Packet::SubAck(_))) => {
                tracing::info!(topic = %settings.topic, "subscribed to sensor topic");
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let received_at = Utc::now();
                let Ok(permit) = Arc::clone(&in_flight).acquire_owned().await else {
                    tracing::error!("ingest limiter closed; stopping subscriber");
                    return;
                };
                let ingestor = ingestor.clone();
                tokio::spawn(async move {
                    let _permit = permit;
                    if let Err(e) = ingestor.handle_payload(&publish.payload, received_at).await {
                        tracing::error!(
                            topic = %publish.topic,
                            error = %e,
                            "failed to store sensor readings"
                        );
                    }
                });
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    retry_in_ms = settings.reconnect_delay_ms,
                    "MQTT connection error"
                );
                tokio::time::sleep(reconnect_delay).await;
            }
        }
    }
}
