//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the climate sensor drivers, the pump bank, and the status LED,
//! exposing them through [`SensorPort`] and [`ActuatorPort`].  Analog
//! channels are sampled through [`hw_init::adc1_read`]; on non-espidf
//! targets that reads the simulation table.

use embedded_hal::digital::OutputPin;

use log::warn;

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::drivers::hw_init;
use crate::drivers::pump::PumpBank;
use crate::drivers::status_led::StatusLed;
use crate::error::SensorError;
use crate::sensors::ClimateSensor;
use crate::sensors::light;

/// ADC1 channel assignment for the analog sensors.
#[derive(Debug, Clone)]
pub struct AnalogChannels {
    pub soil: Vec<u32>,
    pub light: u32,
    pub uv: u32,
}

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<C, P> {
    climate: Vec<C>,
    pumps: PumpBank<P>,
    led: StatusLed,
    analog: AnalogChannels,
}

impl<C, P> HardwareAdapter<C, P>
where
    C: ClimateSensor,
    P: OutputPin,
{
    pub fn new(climate: Vec<C>, pumps: PumpBank<P>, led: StatusLed, analog: AnalogChannels) -> Self {
        Self {
            climate,
            pumps,
            led,
            analog,
        }
    }

    pub fn pumps(&self) -> &PumpBank<P> {
        &self.pumps
    }

    pub fn led(&self) -> &StatusLed {
        &self.led
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<C, P> SensorPort for HardwareAdapter<C, P>
where
    C: ClimateSensor,
    P: OutputPin,
{
    fn read_temperature_humidity(&mut self, sensor: usize) -> Result<(f32, f32), SensorError> {
        let dev = self.climate.get_mut(sensor).ok_or(SensorError::Unavailable)?;
        let r = dev.read()?;
        Ok((r.temperature_c, r.humidity_pct))
    }

    fn read_soil_raw(&mut self, sensor: usize) -> Result<u16, SensorError> {
        let ch = self.analog.soil.get(sensor).ok_or(SensorError::Unavailable)?;
        hw_init::adc1_read(*ch)
    }

    fn read_illuminance(&mut self) -> f32 {
        light::illuminance_lux(sample_or_dark(self.analog.light))
    }

    fn read_ultraviolet(&mut self) -> f32 {
        light::uv_intensity(sample_or_dark(self.analog.uv))
    }
}

/// Light and UV have no unavailable state; a failed conversion reads dark.
fn sample_or_dark(channel: u32) -> u16 {
    hw_init::adc1_read(channel).unwrap_or_else(|e| {
        warn!("Hardware: ADC1 CH{}: {}, reading as 0", channel, e);
        0
    })
}

// ── ActuatorPort implementation ───────────────────────────────

impl<C, P> ActuatorPort for HardwareAdapter<C, P>
where
    C: ClimateSensor,
    P: OutputPin,
{
    fn set_output(&mut self, channel: usize, on: bool) {
        self.pumps.set(channel, on);
    }

    fn set_status_led(&mut self, on: bool) {
        self.led.set(on);
    }
}
