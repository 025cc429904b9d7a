//! Broker session: the device's view of the publish/subscribe client.
//!
//! Wraps any [`BrokerPort`] with the firmware's publishing policy:
//!
//! - every publish requests QoS 1 with the retain flag set;
//! - a fixed pacing delay follows each accepted publish so a burst of
//!   telemetry cannot overrun the client's outbound buffer;
//! - publishing without a session fails fast with
//!   [`BrokerError::NotConnected`] and no delay.
//!
//! It also owns the (re)connect ritual (reset every pump topic, subscribe
//! to every pump topic, announce availability) and routes inbound
//! messages to [`PumpCommand`]s.

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::app::commands::{self, PumpCommand, RESET};
use crate::app::ports::{BrokerPort, MessageId, QoS};
use crate::config::SystemConfig;
use crate::error::{BrokerError, CommandError};
use crate::topics;

/// Availability payloads on the status topic.
pub const ONLINE: &str = "online";
pub const OFFLINE: &str = "offline";

/// Counters for the current boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishStats {
    pub accepted: u32,
    pub rejected: u32,
    pub acknowledged: u32,
}

pub struct BrokerSession {
    pump_base: String,
    pump_topics: Vec<String>,
    status_topic: String,
    pacing_ms: u32,
    stats: PublishStats,
}

impl BrokerSession {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            pump_base: config.topics.pump.clone(),
            pump_topics: topics::channel_topics(&config.topics.pump, config.pump_count),
            status_topic: config.topics.status.clone(),
            pacing_ms: config.publish_pacing_ms,
            stats: PublishStats::default(),
        }
    }

    pub fn pump_topics(&self) -> &[String] {
        &self.pump_topics
    }

    pub fn pump_topic(&self, channel: usize) -> Option<&str> {
        self.pump_topics.get(channel).map(String::as_str)
    }

    pub fn status_topic(&self) -> &str {
        &self.status_topic
    }

    pub fn stats(&self) -> PublishStats {
        self.stats
    }

    /// Paced, retained, at-least-once publish.
    pub fn publish(
        &mut self,
        broker: &mut impl BrokerPort,
        delay: &mut impl DelayNs,
        topic: &str,
        payload: &str,
    ) -> Result<MessageId, BrokerError> {
        if !broker.is_connected() {
            return Err(BrokerError::NotConnected);
        }
        let result = broker.publish(topic, payload.as_bytes(), QoS::AtLeastOnce, true);
        delay.delay_ms(self.pacing_ms);
        match result {
            Ok(id) => {
                self.stats.accepted += 1;
                debug!("Broker: publish {} -> {} (id {})", topic, payload, id);
            }
            Err(e) => {
                self.stats.rejected += 1;
                warn!("Broker: publish to {} failed: {}", topic, e);
            }
        }
        result
    }

    /// Publish the reset sentinel on a pump's topic.
    pub fn publish_reset(
        &mut self,
        broker: &mut impl BrokerPort,
        delay: &mut impl DelayNs,
        channel: usize,
    ) -> Result<MessageId, BrokerError> {
        let Some(topic) = self.pump_topics.get(channel).cloned() else {
            return Err(BrokerError::PublishRejected);
        };
        self.publish(broker, delay, &topic, RESET)
    }

    /// Re-establish session state after the broker acknowledges a connect.
    ///
    /// Resets go out before the subscriptions so a stale retained "1" is
    /// overwritten before the broker can replay it to us.
    pub fn on_connected(&mut self, broker: &mut impl BrokerPort, delay: &mut impl DelayNs) {
        for ch in 0..self.pump_topics.len() {
            // Failures are logged inside `publish`.
            let _ = self.publish_reset(broker, delay, ch);
        }

        for topic in &self.pump_topics {
            match broker.subscribe(topic, QoS::AtLeastOnce) {
                Ok(id) => debug!("Broker: subscribed {} (id {})", topic, id),
                Err(e) => warn!("Broker: subscribe {} failed: {}", topic, e),
            }
        }

        let status = self.status_topic.clone();
        let _ = self.publish(broker, delay, &status, ONLINE);
        info!(
            "Broker: session ready ({} pump topics)",
            self.pump_topics.len()
        );
    }

    pub fn on_publish_acked(&mut self, id: MessageId) {
        self.stats.acknowledged += 1;
        debug!("Broker: publish acknowledged, id {}", id);
    }

    /// Interpret an inbound message.  Never panics on bad input.
    pub fn route_message(&self, topic: &str, payload: &[u8]) -> Result<PumpCommand, CommandError> {
        commands::parse_pump_command(topic, payload, &self.pump_base, self.pump_topics.len())
    }
}
