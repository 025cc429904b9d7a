//! Connection indicator LED.
//!
//! A single GPIO, lit only while the broker session is ready.  Polarity
//! comes from [`pins::STATUS_LED_ACTIVE_LOW`].
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the pin via hw_init.
//! On host/test: hw_init records the level in memory.

use crate::drivers::hw_init;
use crate::pins;

pub struct StatusLed {
    gpio: i32,
    active_low: bool,
    lit: bool,
}

impl Default for StatusLed {
    fn default() -> Self {
        Self::new(pins::STATUS_LED_GPIO, pins::STATUS_LED_ACTIVE_LOW)
    }
}

impl StatusLed {
    /// Starts dark.
    pub fn new(gpio: i32, active_low: bool) -> Self {
        let mut led = Self {
            gpio,
            active_low,
            lit: true,
        };
        led.set(false);
        led
    }

    pub fn set(&mut self, lit: bool) {
        hw_init::gpio_write(self.gpio, lit != self.active_low);
        self.lit = lit;
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }
}
