//! MQTT client adapter.
//!
//! Implements [`BrokerPort`].  Connection acknowledgements, session loss,
//! publish acknowledgements and inbound messages are all pushed into the
//! [`EventQueue`]; nothing here touches controller state directly.
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::mqtt::client::EspMqttClient`.
//!   The connection is drained on a dedicated thread.  The client is built
//!   on the first `connect()` with a retained last-will of `"offline"` on
//!   the status topic, and re-dials on its own after that.
//! - **all other targets**: an in-memory broker that acknowledges
//!   everything immediately and records what was sent.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::{BrokerPort, MessageId, QoS};
use crate::config::BrokerConfig;
use crate::error::BrokerError;
use crate::events::{EventQueue, NetEvent};

#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::{
    EspMqttClient, EspMqttConnection, EventPayload, LwtConfiguration, MqttClientConfiguration,
    QoS as EspQoS,
};

/// Stack for the connection-draining thread.
#[cfg(target_os = "espidf")]
const POLL_STACK_SIZE: usize = 6 * 1024;

/// A message the simulated broker accepted.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimPublish {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QoS,
    pub retain: bool,
}

pub struct MqttAdapter {
    events: &'static EventQueue,
    url: String,
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    config: BrokerConfig,
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    status_topic: String,
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    reconnect_backoff_ms: u64,
    connected: Arc<AtomicBool>,
    #[cfg(target_os = "espidf")]
    client: Option<EspMqttClient<'static>>,
    #[cfg(not(target_os = "espidf"))]
    sim: SimBroker,
}

#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
struct SimBroker {
    next_id: MessageId,
    connects: u32,
    refuse: bool,
    published: Vec<SimPublish>,
    subscriptions: Vec<String>,
}

impl MqttAdapter {
    pub fn new(
        config: &BrokerConfig,
        status_topic: &str,
        reconnect_backoff_ms: u64,
        events: &'static EventQueue,
    ) -> Self {
        Self {
            events,
            url: format!("mqtt://{}:{}", config.host, config.port),
            config: config.clone(),
            status_topic: status_topic.into(),
            reconnect_backoff_ms,
            connected: Arc::new(AtomicBool::new(false)),
            #[cfg(target_os = "espidf")]
            client: None,
            #[cfg(not(target_os = "espidf"))]
            sim: SimBroker::default(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Translate one client event into queue traffic.
    fn on_event(events: &EventQueue, connected: &AtomicBool, event: NetEvent) {
        match event {
            NetEvent::BrokerConnected { .. } => connected.store(true, Ordering::Release),
            NetEvent::BrokerDisconnected => connected.store(false, Ordering::Release),
            _ => {}
        }
        events.push(event);
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), BrokerError> {
        use core::time::Duration;

        if self.client.is_some() {
            // The client re-dials by itself; the outcome arrives as an event.
            return Ok(());
        }

        let conf = MqttClientConfiguration {
            client_id: Some(self.config.client_id.as_str()),
            username: self.config.username.as_deref(),
            password: self.config.password.as_deref(),
            lwt: Some(LwtConfiguration {
                topic: self.status_topic.as_str(),
                payload: crate::broker::OFFLINE.as_bytes(),
                qos: EspQoS::AtLeastOnce,
                retain: true,
            }),
            reconnect_timeout: Some(Duration::from_millis(self.reconnect_backoff_ms)),
            ..Default::default()
        };

        let (client, conn) = EspMqttClient::new(&self.url, &conf).map_err(|e| {
            warn!("MQTT: client creation failed ({})", e);
            BrokerError::ConnectFailed
        })?;

        let events = self.events;
        let connected = Arc::clone(&self.connected);
        std::thread::Builder::new()
            .name("mqtt-poll".into())
            .stack_size(POLL_STACK_SIZE)
            .spawn(move || drain_connection(conn, events, &connected))
            .map_err(|_| BrokerError::ConnectFailed)?;

        info!("MQTT: client started for {}", self.url);
        self.client = Some(client);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), BrokerError> {
        self.sim.connects += 1;
        if self.sim.refuse {
            return Err(BrokerError::ConnectFailed);
        }
        info!("MQTT(sim): session open on {}", self.url);
        Self::on_event(
            self.events,
            &self.connected,
            NetEvent::BrokerConnected {
                session_present: false,
            },
        );
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<MessageId, BrokerError> {
        let client = self.client.as_mut().ok_or(BrokerError::NotConnected)?;
        client
            .enqueue(topic, esp_qos(qos), retain, payload)
            .map_err(|_| BrokerError::PublishRejected)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<MessageId, BrokerError> {
        self.sim.next_id += 1;
        let id = self.sim.next_id;
        self.sim.published.push(SimPublish {
            topic: topic.into(),
            payload: payload.to_vec(),
            qos,
            retain,
        });
        if qos == QoS::AtLeastOnce {
            self.events.push(NetEvent::PublishAcked(id));
        }
        Ok(id)
    }

    #[cfg(target_os = "espidf")]
    fn platform_subscribe(&mut self, topic: &str, qos: QoS) -> Result<MessageId, BrokerError> {
        let client = self.client.as_mut().ok_or(BrokerError::NotConnected)?;
        client
            .subscribe(topic, esp_qos(qos))
            .map_err(|_| BrokerError::SubscribeRejected)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_subscribe(&mut self, topic: &str, _qos: QoS) -> Result<MessageId, BrokerError> {
        self.sim.next_id += 1;
        if !self.sim.subscriptions.iter().any(|t| t == topic) {
            self.sim.subscriptions.push(topic.into());
        }
        Ok(self.sim.next_id)
    }

    // ── Simulation controls ───────────────────────────────────

    /// Simulation: deliver `payload` on `topic` if subscribed.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_inject(&mut self, topic: &str, payload: &[u8]) -> bool {
        if !self.is_connected() || !self.sim.subscriptions.iter().any(|t| t == topic) {
            return false;
        }
        match NetEvent::message(topic, payload) {
            Some(ev) => self.events.push(ev),
            None => false,
        }
    }

    /// Simulation: the broker closes the session.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_drop(&mut self) {
        if self.is_connected() {
            // Subscriptions do not survive a clean-session reconnect.
            self.sim.subscriptions.clear();
            Self::on_event(self.events, &self.connected, NetEvent::BrokerDisconnected);
        }
    }

    /// Simulation: make subsequent connect requests fail.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_refuse(&mut self, refuse: bool) {
        self.sim.refuse = refuse;
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_published(&self) -> &[SimPublish] {
        &self.sim.published
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_subscriptions(&self) -> &[String] {
        &self.sim.subscriptions
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_connects(&self) -> u32 {
        self.sim.connects
    }
}

#[cfg(target_os = "espidf")]
fn esp_qos(qos: QoS) -> EspQoS {
    match qos {
        QoS::AtMostOnce => EspQoS::AtMostOnce,
        QoS::AtLeastOnce => EspQoS::AtLeastOnce,
    }
}

/// Connection loop for the `mqtt-poll` thread.  Returns when the client is
/// dropped.
#[cfg(target_os = "espidf")]
fn drain_connection(mut conn: EspMqttConnection, events: &'static EventQueue, connected: &AtomicBool) {
    while let Ok(event) = conn.next() {
        let mapped = match event.payload() {
            EventPayload::Connected(session_present) => {
                info!("MQTT: connected (session_present={})", session_present);
                Some(NetEvent::BrokerConnected { session_present })
            }
            EventPayload::Disconnected => {
                warn!("MQTT: disconnected");
                Some(NetEvent::BrokerDisconnected)
            }
            EventPayload::Published(id) => Some(NetEvent::PublishAcked(id)),
            EventPayload::Received {
                topic: Some(topic),
                data,
                ..
            } => {
                let ev = NetEvent::message(topic, data);
                if ev.is_none() {
                    warn!("MQTT: oversized message on '{}' dropped", topic);
                }
                ev
            }
            EventPayload::Error(e) => {
                warn!("MQTT: client error ({:?})", e);
                None
            }
            _ => None,
        };
        if let Some(ev) = mapped {
            MqttAdapter::on_event(events, connected, ev);
        }
    }
    info!("MQTT: connection closed");
}

// ───────────────────────────────────────────────────────────────
// BrokerPort
// ───────────────────────────────────────────────────────────────

impl BrokerPort for MqttAdapter {
    fn connect(&mut self) -> Result<(), BrokerError> {
        self.platform_connect()
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<MessageId, BrokerError> {
        if !self.is_connected() {
            return Err(BrokerError::NotConnected);
        }
        self.platform_publish(topic, payload, qos, retain)
    }

    fn subscribe(&mut self, topic: &str, qos: QoS) -> Result<MessageId, BrokerError> {
        if !self.is_connected() {
            return Err(BrokerError::NotConnected);
        }
        self.platform_subscribe(topic, qos)
    }
}
