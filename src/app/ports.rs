//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Controller (domain)
//! ```
//!
//! Driven adapters (sensors, pumps, WiFi, MQTT, clock, event sinks)
//! implement these traits.  The [`Controller`](super::service::Controller)
//! consumes them via generics, so the domain core never touches hardware
//! or sockets directly.
//!
//! Blocking delays (publish pacing, polling reconnect backoff) go through
//! [`embedded_hal::delay::DelayNs`] rather than a port of our own.

use crate::error::{BrokerError, LinkError, SensorError};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to sample sensors on demand.
pub trait SensorPort {
    /// Temperature (°C) and relative humidity (%) from climate sensor
    /// `sensor`.  Either value may be NaN; callers must validate.
    fn read_temperature_humidity(&mut self, sensor: usize) -> Result<(f32, f32), SensorError>;

    /// Raw ADC sample from soil probe `sensor`.  Fails when the probe has
    /// no channel or the conversion does not complete.
    fn read_soil_raw(&mut self, sensor: usize) -> Result<u16, SensorError>;

    /// Ambient illuminance (lux).  Always available.
    fn read_illuminance(&mut self) -> f32;

    /// UV intensity (µW/cm²).  Always available.
    fn read_ultraviolet(&mut self) -> f32;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to drive outputs.
pub trait ActuatorPort {
    /// Energise or release pump `channel`.
    fn set_output(&mut self, channel: usize, on: bool);

    /// Connection indicator.
    fn set_status_led(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Network ports
// ───────────────────────────────────────────────────────────────

/// Network association (WiFi station).
///
/// `connect` only *requests* association.  The outcome arrives later as
/// [`NetEvent::LinkUp`](crate::events::NetEvent::LinkUp) or
/// [`NetEvent::LinkDown`](crate::events::NetEvent::LinkDown) through the
/// event queue.
pub trait LinkPort {
    fn connect(&mut self) -> Result<(), LinkError>;
    fn is_connected(&self) -> bool;
}

/// Delivery assurance requested from the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QoS {
    AtMostOnce,
    AtLeastOnce,
}

/// Identifier the client assigns to an outbound publish or subscribe.
pub type MessageId = u32;

/// Publish/subscribe session with the broker.
///
/// Like [`LinkPort::connect`], `connect` is a request.  Acknowledgement
/// and loss are reported through the event queue, as are inbound messages.
pub trait BrokerPort {
    fn connect(&mut self) -> Result<(), BrokerError>;

    fn is_connected(&self) -> bool;

    /// Enqueue a publish.  `Ok` means the client accepted it, not that the
    /// broker acknowledged it.
    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<MessageId, BrokerError>;

    fn subscribe(&mut self, topic: &str, qos: QoS) -> Result<MessageId, BrokerError>;

    /// Service transport I/O.  Clients that run their own task need not
    /// override this.
    fn poll(&mut self) {}
}

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond counter.
pub trait ClockPort {
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
