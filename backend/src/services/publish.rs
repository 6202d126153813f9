//! Delivery of reports to the message broker
//!
//! Per species three retained messages go to `<base>/<slug>/attributes`,
//! `/state` and `/todo`. Home Assistant discovery configs for the
//! probability sensor and the tips sensor are sent once per topic.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use serde_json::json;
use shared::ScoredResult;
use tokio::task::JoinHandle;

use crate::config::MqttConfig;
use crate::error::AppResult;
use crate::services::report::{build_report, write_reports, Report};

/// Requests buffered between the client and the event loop
const REQUEST_CAPACITY: usize = 256;
const RECONNECT_DELAY: Duration = Duration::from_secs(5);
/// Time queued messages get to reach the broker on shutdown
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
pub struct MqttMessage {
    pub topic: String,
    pub payload: String,
    pub retain: bool,
}

impl MqttMessage {
    fn retained(topic: String, payload: String) -> Self {
        Self {
            topic,
            payload,
            retain: true,
        }
    }
}

/// Discovery configs of the probability sensor and the tips sensor
pub fn discovery_messages(base_topic: &str, report: &Report<'_>) -> Vec<MqttMessage> {
    let species = report.attributes.species();
    let slug = &report.slug;
    let topic = format!("{base_topic}/{slug}");

    let status = json!({
        "name": format!("{species}-Sensor"),
        "unique_id": format!("fischsensor_{slug}"),
        "state_topic": format!("{topic}/state"),
        "json_attributes_topic": format!("{topic}/attributes"),
        "icon": "mdi:fish",
        "unit_of_measurement": "%",
        "state_class": "measurement",
        "value_template": "{{ value_json.status | float }}",
        "device": {
            "identifiers": ["fischsensor"],
            "name": "Fischsensor",
            "model": "Fishcast",
            "manufacturer": "Eigenentwicklung",
        },
    });
    let tips = json!({
        "name": format!("{species}-Tipps"),
        "unique_id": format!("fischsensor_{slug}_todo"),
        "state_topic": format!("{topic}/todo"),
        "json_attributes_topic": format!("{topic}/todo"),
        "icon": "mdi:lightbulb-on-outline",
        "entity_category": "diagnostic",
        "value_template": "{{ value_json.todo_count }}",
        "device": {
            "identifiers": ["fischsensor"],
        },
    });

    vec![
        MqttMessage::retained(format!("{topic}/config"), status.to_string()),
        MqttMessage::retained(format!("{topic}/todo/config"), tips.to_string()),
    ]
}

/// Attribute, state and to-do messages of one report
pub fn data_messages(base_topic: &str, report: &Report<'_>) -> AppResult<Vec<MqttMessage>> {
    let topic = format!("{base_topic}/{}", report.slug);
    Ok(vec![
        MqttMessage::retained(
            format!("{topic}/attributes"),
            serde_json::to_string(report.attributes)?,
        ),
        MqttMessage::retained(format!("{topic}/state"), serde_json::to_string(&report.state)?),
        MqttMessage::retained(format!("{topic}/todo"), serde_json::to_string(&report.todo)?),
    ])
}

/// Publisher keeping one broker connection for the life of the process
pub struct MqttPublisher {
    client: AsyncClient,
    base_topic: String,
    announced: Mutex<HashSet<String>>,
    driver: Option<JoinHandle<()>>,
}

impl MqttPublisher {
    /// Create the client and drive its connection on a background task
    pub fn connect(config: &MqttConfig) -> Self {
        let (mut publisher, eventloop) = Self::new(config);
        let broker = format!("{}:{}", config.broker, config.port);
        publisher.driver = Some(tokio::spawn(drive(eventloop, broker)));
        publisher
    }

    fn new(config: &MqttConfig) -> (Self, EventLoop) {
        let mut options = MqttOptions::new(&config.client_id, &config.broker, config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs.max(5)));
        if let Some(username) = &config.username {
            options.set_credentials(username, config.password.clone().unwrap_or_default());
        }
        let (client, eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);
        let publisher = Self {
            client,
            base_topic: config.base_topic(),
            announced: Mutex::new(HashSet::new()),
            driver: None,
        };
        (publisher, eventloop)
    }

    /// Messages for the results, with discovery configs not sent before
    fn pending_messages(&self, results: &[ScoredResult]) -> AppResult<Vec<MqttMessage>> {
        let mut announced = self
            .announced
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut messages = Vec::new();
        for result in results {
            let report = build_report(result);
            messages.extend(
                discovery_messages(&self.base_topic, &report)
                    .into_iter()
                    .filter(|m| announced.insert(m.topic.clone())),
            );
            messages.extend(data_messages(&self.base_topic, &report)?);
        }
        Ok(messages)
    }

    fn forget(&self, topic: &str) {
        self.announced
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(topic);
    }

    /// Queue every message; a rejected discovery config is retried with the
    /// next batch
    pub fn publish(&self, results: &[ScoredResult]) -> AppResult<()> {
        let messages = self.pending_messages(results)?;
        let mut failed = 0usize;
        for message in messages {
            if let Err(e) = self.client.try_publish(
                message.topic.clone(),
                QoS::AtMostOnce,
                message.retain,
                message.payload,
            ) {
                tracing::warn!(topic = %message.topic, "MQTT publish rejected: {}", e);
                if message.topic.ends_with("/config") {
                    self.forget(&message.topic);
                }
                failed += 1;
            }
        }
        tracing::info!(
            species = results.len(),
            failed,
            base_topic = %self.base_topic,
            "Reports published"
        );
        Ok(())
    }

    /// Queue a disconnect behind the pending messages and wait for the
    /// connection task to flush them
    pub async fn disconnect(self) -> AppResult<()> {
        self.client.disconnect().await?;
        if let Some(driver) = self.driver {
            if tokio::time::timeout(DRAIN_TIMEOUT, driver).await.is_err() {
                tracing::warn!("MQTT connection did not drain in time");
            }
        }
        tracing::info!("MQTT session closed");
        Ok(())
    }
}

async fn drive(mut eventloop: EventLoop, broker: String) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                tracing::info!(%broker, "Connected to MQTT broker");
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                tracing::info!(%broker, "MQTT broker closed the session");
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(%broker, "MQTT connection error: {}", e);
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

/// Where the reports of a run go
pub enum ReportSink {
    Stdout,
    Mqtt(MqttPublisher),
}

impl ReportSink {
    pub fn deliver(&self, results: &[ScoredResult]) -> AppResult<()> {
        match self {
            ReportSink::Stdout => write_reports(results, std::io::stdout().lock()),
            ReportSink::Mqtt(publisher) => publisher.publish(results),
        }
    }

    pub async fn close(self) {
        if let ReportSink::Mqtt(publisher) = self {
            if let Err(e) = publisher.disconnect().await {
                tracing::warn!("MQTT disconnect failed: {}", e);
            }
        }
    }
}
