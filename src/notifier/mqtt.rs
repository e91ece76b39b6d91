// MIT License - Copyright (c) 2026 Peter Wright
// MQTT notifier: publishes each event as a JSON document

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rumqttc::{AsyncClient, Event as MqttEvent, MqttOptions, Packet, QoS};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::catalog::Priority;
use crate::error::{Result, TpiError};
use crate::event::{Event, NameTables};
use crate::notifier::{DEFAULT_LAYOUT, Notifier, render_layout};

pub const DEFAULT_CLIENT_ID: &str = "evl-daemon";
pub const DEFAULT_TOPIC: &str = "evl";
const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(30);
const REQUEST_CHANNEL_CAPACITY: usize = 256;

/// Broker connection settings for one MQTT notifier.
#[derive(Debug, Clone)]
pub struct MqttSettings {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub topic: String,
    pub keep_alive: Duration,
}

impl MqttSettings {
    /// Settings for `url` with the default client id, topic and keep-alive.
    pub fn from_url(url: &str) -> Result<Self> {
        let (host, port) = parse_mqtt_url(url)?;
        Ok(Self {
            host,
            port,
            client_id: DEFAULT_CLIENT_ID.to_string(),
            topic: DEFAULT_TOPIC.to_string(),
            keep_alive: DEFAULT_KEEP_ALIVE,
        })
    }
}

/// Split `mqtt://host:port` (or `tcp://host:port`, or bare `host:port`).
pub fn parse_mqtt_url(url: &str) -> Result<(String, u16)> {
    let stripped = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url);

    let (host, port) = stripped
        .rsplit_once(':')
        .ok_or_else(|| TpiError::config(format!("MQTT URL must be mqtt://host:port, got {url}")))?;
    if host.is_empty() {
        return Err(TpiError::config(format!("MQTT URL has no host: {url}")));
    }
    let port: u16 = port
        .parse()
        .map_err(|_| TpiError::config(format!("invalid MQTT port in {url}")))?;

    Ok((host.to_string(), port))
}

/// Wire document published for every event: `{now, op:"EVENT", code, ...}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MqttEventPayload {
    pub now: u64,
    pub op: &'static str,
    pub code: String,
    pub command: String,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    pub description: String,
    pub message: String,
    /// Event time, RFC 3339 in UTC.
    pub timestamp: String,
}

impl MqttEventPayload {
    pub fn new(event: &Event, names: &NameTables, layout: &str) -> Self {
        let timestamp = Utc
            .timestamp_opt(event.timestamp, 0)
            .single()
            .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
            .unwrap_or_else(|| event.timestamp.to_string());

        Self {
            now: Utc::now().timestamp_millis() as u64,
            op: "EVENT",
            code: event.command.code.clone(),
            command: event.command.to_string(),
            priority: event.priority,
            partition: event.partition.clone(),
            partition_name: event.partition.as_deref().map(|p| names.partition_name(p)),
            zone: event.zone.clone(),
            zone_name: event.zone.as_deref().map(|z| names.zone_name(z)),
            data: event.describe_data(),
            description: event.describe(names),
            message: render_layout(layout, event, names),
            timestamp,
        }
    }
}

/// Publishes events at or above `threshold` to a broker topic.
pub struct MqttNotifier {
    name: String,
    threshold: Priority,
    layout: String,
    topic: String,
    names: Arc<NameTables>,
    client: AsyncClient,
    poller: JoinHandle<()>,
}

impl MqttNotifier {
    /// Create the client and start its network event loop.
    ///
    /// The broker connection is established lazily by the event loop; a
    /// broker that is down only surfaces as publish errors and reconnects.
    pub fn start(
        name: impl Into<String>,
        threshold: Priority,
        layout: Option<String>,
        settings: MqttSettings,
        names: Arc<NameTables>,
    ) -> Self {
        let name = name.into();
        let mut opts = MqttOptions::new(&settings.client_id, &settings.host, settings.port);
        opts.set_keep_alive(settings.keep_alive);
        let (client, mut eventloop) = AsyncClient::new(opts, REQUEST_CHANNEL_CAPACITY);

        info!(
            "MQTT notifier {name}: publishing to {}:{} topic {}",
            settings.host, settings.port, settings.topic
        );

        let poller_name = name.clone();
        let poller = tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(MqttEvent::Incoming(Packet::ConnAck(_))) => {
                        info!("MQTT notifier {poller_name}: connected");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("MQTT notifier {poller_name}: connection error: {e}");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        Self {
            name,
            threshold,
            layout: layout.unwrap_or_else(|| DEFAULT_LAYOUT.to_string()),
            topic: settings.topic,
            names,
            client,
            poller,
        }
    }
}

impl Drop for MqttNotifier {
    fn drop(&mut self) {
        self.poller.abort();
    }
}

#[async_trait]
impl Notifier for MqttNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn notify(&self, event: &Event) -> Result<()> {
        if event.priority < self.threshold {
            return Ok(());
        }
        let payload = MqttEventPayload::new(event, &self.names, &self.layout);
        let json = serde_json::to_string(&payload).map_err(|e| TpiError::notifier(&self.name, e))?;
        debug!("MQTT notifier {}: publishing {json}", self.name);
        self.client
            .publish(&self.topic, QoS::AtLeastOnce, false, json)
            .await
            .map_err(|e| TpiError::notifier(&self.name, e))
    }
}
