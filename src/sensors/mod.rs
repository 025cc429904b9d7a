//! Sensor subsystem: conversions and the climate driver contract.
//!
//! The [`HardwareAdapter`](crate::adapters::hardware::HardwareAdapter)
//! owns the drivers and exposes them through
//! [`SensorPort`](crate::app::ports::SensorPort).  Everything here is pure
//! arithmetic apart from the DHT bit-banging in [`dht`].

pub mod climate;
pub mod dht;
pub mod light;
pub mod soil;

use crate::error::SensorError;
use climate::ClimateReading;

/// A temperature/humidity chip.
pub trait ClimateSensor {
    /// Take one measurement.  NaN or garbled frames are reported as errors.
    fn read(&mut self) -> Result<ClimateReading, SensorError>;
}
