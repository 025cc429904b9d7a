//! DHT11 / DHT22 single-wire temperature and humidity driver.
//!
//! ```text
//!  host  ──┐ start ┌── release ─────────────────────────────────
//!          └───────┘
//!  sensor             ┐ 80µs ┌ 80µs ┐ 50µs ┌ 26µs=0 / 70µs=1 ┐ ×40
//!                     └──────┘      └──────┘                 └──
//! ```
//!
//! Every wait on the data line is bounded: a sensor that stops answering
//! yields [`SensorError::Timeout`] instead of stalling the control loop.
//! Phase lengths are measured on a [`MicroTimer`], so GPIO read overhead
//! does not shorten them.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use super::climate::ClimateReading;
use super::ClimateSensor;
use crate::error::SensorError;

/// Longest any single line phase may last before the read is abandoned.
const PHASE_TIMEOUT_US: u32 = 100;
/// High pulses longer than this encode a `1` bit.
const BIT_THRESHOLD_US: u32 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhtModel {
    Dht11,
    Dht22,
}

impl DhtModel {
    fn start_low_ms(self) -> u32 {
        match self {
            Self::Dht11 => 18,
            Self::Dht22 => 2,
        }
    }
}

/// Free-running microsecond counter.
pub trait MicroTimer {
    fn now_us(&self) -> u64;
}

/// Driver for one sensor on an open-drain data pin.
pub struct Dht<P, D, T> {
    pin: P,
    delay: D,
    timer: T,
    model: DhtModel,
}

impl<P, D, T> Dht<P, D, T>
where
    P: InputPin + OutputPin,
    D: DelayNs,
    T: MicroTimer,
{
    pub fn new(pin: P, delay: D, timer: T, model: DhtModel) -> Self {
        Self {
            pin,
            delay,
            timer,
            model,
        }
    }

    fn read_frame(&mut self) -> Result<[u8; 5], SensorError> {
        self.pin.set_low().map_err(|_| SensorError::Unavailable)?;
        self.delay.delay_ms(self.model.start_low_ms());
        self.pin.set_high().map_err(|_| SensorError::Unavailable)?;

        // Response: sensor pulls low, then high, then low before data.
        self.wait_while(true)?;
        self.wait_while(false)?;
        self.wait_while(true)?;

        let mut frame = [0u8; 5];
        for bit in 0..40 {
            self.wait_while(false)?;
            let high_us = self.wait_while(true)?;
            if high_us > BIT_THRESHOLD_US {
                frame[bit / 8] |= 0x80 >> (bit % 8);
            }
        }
        Ok(frame)
    }

    /// Spin while the line sits at `level`.  Returns how long it stayed
    /// there, or `Timeout` once [`PHASE_TIMEOUT_US`] is exceeded.
    fn wait_while(&mut self, level: bool) -> Result<u32, SensorError> {
        wait_while_level(&mut self.pin, &self.timer, level, PHASE_TIMEOUT_US)
    }
}

pub(crate) fn wait_while_level<P: InputPin, T: MicroTimer>(
    pin: &mut P,
    timer: &T,
    level: bool,
    timeout_us: u32,
) -> Result<u32, SensorError> {
    let start = timer.now_us();
    loop {
        let at_level = pin.is_high().map_err(|_| SensorError::Unavailable)? == level;
        let elapsed = u32::try_from(timer.now_us().saturating_sub(start)).unwrap_or(u32::MAX);
        if !at_level {
            return Ok(elapsed);
        }
        if elapsed >= timeout_us {
            return Err(SensorError::Timeout);
        }
    }
}

/// Decode a 5-byte frame into a reading, verifying the checksum.
pub fn decode_frame(model: DhtModel, frame: [u8; 5]) -> Result<ClimateReading, SensorError> {
    let sum = frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != frame[4] {
        return Err(SensorError::Checksum);
    }

    let (humidity, temperature) = match model {
        DhtModel::Dht11 => (
            f32::from(frame[0]) + f32::from(frame[1]) / 10.0,
            f32::from(frame[2] & 0x7F) + f32::from(frame[3]) / 10.0,
        ),
        DhtModel::Dht22 => {
            let rh = u16::from_be_bytes([frame[0], frame[1]]);
            let t = u16::from_be_bytes([frame[2] & 0x7F, frame[3]]);
            let t = f32::from(t) / 10.0;
            let t = if frame[2] & 0x80 != 0 { -t } else { t };
            (f32::from(rh) / 10.0, t)
        }
    };

    ClimateReading::validated(temperature, humidity).ok_or(SensorError::Unavailable)
}

impl<P, D, T> ClimateSensor for Dht<P, D, T>
where
    P: InputPin + OutputPin,
    D: DelayNs,
    T: MicroTimer,
{
    fn read(&mut self) -> Result<ClimateReading, SensorError> {
        let frame = self.read_frame();
        // Release the line whatever happened so the next start pulse is clean.
        let _ = self.pin.set_high();
        decode_frame(self.model, frame?)
    }
}
