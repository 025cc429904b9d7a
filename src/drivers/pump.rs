//! Pump bank driver.
//!
//! One digital output per pump channel (relay or MOSFET, active HIGH),
//! in channel-index order.  Generic over [`OutputPin`] so host tests can
//! substitute recording pins.
//!
//! ## Safety contract
//!
//! This driver is a dumb actuator.  Pulse timing and the guaranteed
//! shutoff live in the actuator scheduler.

use embedded_hal::digital::OutputPin;
use log::warn;

pub struct PumpBank<P> {
    outputs: Vec<P>,
    on: Vec<bool>,
}

impl<P: OutputPin> PumpBank<P> {
    /// Takes ownership of the pins and drives them all low.
    pub fn new(outputs: Vec<P>) -> Self {
        let mut bank = Self {
            on: vec![false; outputs.len()],
            outputs,
        };
        bank.stop_all();
        bank
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    pub fn set(&mut self, channel: usize, on: bool) {
        let Some(pin) = self.outputs.get_mut(channel) else {
            warn!("Pump {}: no output configured", channel);
            return;
        };
        let result = if on { pin.set_high() } else { pin.set_low() };
        if result.is_err() {
            warn!("Pump {}: output write failed", channel);
            return;
        }
        self.on[channel] = on;
    }

    pub fn is_on(&self, channel: usize) -> bool {
        self.on.get(channel).copied().unwrap_or(false)
    }

    pub fn stop_all(&mut self) {
        for ch in 0..self.outputs.len() {
            self.set(ch, false);
        }
    }
}
