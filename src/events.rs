//! Network event queue.
//!
//! The WiFi and MQTT clients report outcomes from their own callback
//! contexts.  Those callbacks only push a [`NetEvent`] here; the main loop
//! drains the queue once per tick and applies each event in order, so all
//! device state is mutated from a single context.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ WiFi events │────▶│              │     │              │
//! │ MQTT events │────▶│  EventQueue  │────▶│  Main Loop   │
//! │ (callbacks) │     │  (bounded)   │     │  (consumer)  │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use crate::app::ports::MessageId;

/// Maximum number of pending events.
pub const EVENT_QUEUE_CAP: usize = 16;
/// Longest inbound topic carried by an event.
pub const TOPIC_CAP: usize = 96;
/// Longest inbound payload carried by an event.
pub const PAYLOAD_CAP: usize = 16;

pub type TopicBuf = heapless::String<TOPIC_CAP>;
pub type PayloadBuf = heapless::Vec<u8, PAYLOAD_CAP>;

/// Link, broker, and inbound-message notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetEvent {
    /// Station associated and got an address.
    LinkUp,
    /// Station lost its association (or an attempt failed).
    LinkDown,
    /// Broker acknowledged the connect.
    BrokerConnected { session_present: bool },
    /// Broker session closed.
    BrokerDisconnected,
    /// Payload received on a subscribed topic.
    Message { topic: TopicBuf, payload: PayloadBuf },
    /// Broker acknowledged a QoS 1 publish.
    PublishAcked(MessageId),
}

impl NetEvent {
    /// Build a `Message` event.  `None` if the topic or payload exceeds the
    /// event buffers; oversized messages are never valid commands.
    pub fn message(topic: &str, payload: &[u8]) -> Option<Self> {
        let mut t = TopicBuf::new();
        t.push_str(topic).ok()?;
        let p = PayloadBuf::from_slice(payload).ok()?;
        Some(Self::Message {
            topic: t,
            payload: p,
        })
    }
}

/// Bounded multi-producer queue of [`NetEvent`]s.
///
/// `const`-constructible so the firmware can keep one in a `static` that
/// transport callbacks capture by `&'static` reference.
pub struct EventQueue {
    channel: Channel<CriticalSectionRawMutex, NetEvent, EVENT_QUEUE_CAP>,
    dropped: AtomicU32,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Push an event.  Safe to call from any task or callback.
    /// Returns `false` if the queue is full (event dropped).
    pub fn push(&self, event: NetEvent) -> bool {
        match self.channel.try_send(event) {
            Ok(()) => true,
            Err(_) => {
                let n = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!("EventQueue: full, event dropped ({} total)", n);
                false
            }
        }
    }

    /// Pop the next event, or `None` if empty.
    pub fn pop(&self) -> Option<NetEvent> {
        self.channel.try_receive().ok()
    }

    /// Drain all pending events into a callback, in FIFO order.
    pub fn drain(&self, mut handler: impl FnMut(NetEvent)) {
        while let Some(event) = self.pop() {
            handler(event);
        }
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    /// Events lost to overflow since boot.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order() {
        let q = EventQueue::new();
        assert!(q.push(NetEvent::LinkUp));
        assert!(q.push(NetEvent::BrokerConnected { session_present: false }));
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop(), Some(NetEvent::LinkUp));
        assert_eq!(q.pop(), Some(NetEvent::BrokerConnected { session_present: false }));
        assert!(q.is_empty());
    }

    #[test]
    fn overflow_drops_and_counts() {
        let q = EventQueue::new();
        for _ in 0..EVENT_QUEUE_CAP {
            assert!(q.push(NetEvent::PublishAcked(1)));
        }
        assert!(!q.push(NetEvent::LinkDown));
        assert_eq!(q.dropped(), 1);
        let mut n = 0;
        q.drain(|_| n += 1);
        assert_eq!(n, EVENT_QUEUE_CAP);
    }

    #[test]
    fn oversized_message_rejected() {
        assert!(NetEvent::message("gh/pump/0", b"1").is_some());
        let long = "x".repeat(TOPIC_CAP + 1);
        assert!(NetEvent::message(&long, b"1").is_none());
        assert!(NetEvent::message("gh/pump/0", &[b'1'; PAYLOAD_CAP + 1]).is_none());
    }
}
