//! Unified error types for the Irrigator firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! control loop's error handling uniform.  All variants are `Copy` so they
//! can be logged and passed around without allocation.
//!
//! None of these are fatal.  The control loop logs each one where it is
//! handled and carries on with the next duty.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor reading was unavailable or failed validation.
    Sensor(SensorError),
    /// The network link is down or could not be brought up.
    Link(LinkError),
    /// The broker session failed.
    Broker(BrokerError),
    /// An inbound command could not be interpreted.
    Command(CommandError),
    /// Configuration failed validation.  Names the offending field.
    Config(&'static str),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Broker(e) => write!(f, "broker: {e}"),
            Self::Command(e) => write!(f, "command: {e}"),
            Self::Config(field) => write!(f, "config: invalid {field}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The sensor produced no usable value (NaN or no response).
    Unavailable,
    /// A bounded wait on the sensor's data line expired.
    Timeout,
    /// The sensor frame failed its checksum.
    Checksum,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "reading unavailable"),
            Self::Timeout => write!(f, "timed out waiting for sensor"),
            Self::Checksum => write!(f, "checksum mismatch"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Link errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// No SSID configured.
    NoCredentials,
    /// SSID or password outside what the radio accepts.
    InvalidCredentials,
    /// The association request was refused or failed immediately.
    ConnectFailed,
    /// The link dropped, or an attempt never completed.
    Lost,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidCredentials => write!(f, "WiFi credentials invalid (SSID 1-32 printable bytes, password empty or 8-64)"),
            Self::ConnectFailed => write!(f, "WiFi connect failed"),
            Self::Lost => write!(f, "WiFi link lost"),
        }
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Broker errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerError {
    /// Operation attempted without an established session.
    NotConnected,
    /// The connect request could not be issued.
    ConnectFailed,
    /// The client refused to enqueue a publish.
    PublishRejected,
    /// The client refused to enqueue a subscribe.
    SubscribeRejected,
    /// The session dropped.
    Lost,
}

impl fmt::Display for BrokerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "not connected to broker"),
            Self::ConnectFailed => write!(f, "MQTT connect failed"),
            Self::PublishRejected => write!(f, "MQTT publish not acknowledged"),
            Self::SubscribeRejected => write!(f, "MQTT subscribe rejected"),
            Self::Lost => write!(f, "MQTT session lost"),
        }
    }
}

impl From<BrokerError> for Error {
    fn from(e: BrokerError) -> Self {
        Self::Broker(e)
    }
}

// ---------------------------------------------------------------------------
// Command errors
// ---------------------------------------------------------------------------

/// Reasons an inbound message on a command topic was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Topic does not belong to the pump command tree.
    UnknownTopic,
    /// Topic suffix is not a decimal channel index.
    BadIndex,
    /// Channel index is not configured on this device.
    IndexOutOfRange(usize),
    /// Payload is neither the activation nor the reset sentinel.
    UnsupportedPayload,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTopic => write!(f, "topic is not a pump command topic"),
            Self::BadIndex => write!(f, "topic suffix is not a channel index"),
            Self::IndexOutOfRange(i) => write!(f, "channel {i} is not configured"),
            Self::UnsupportedPayload => write!(f, "unsupported payload"),
        }
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
