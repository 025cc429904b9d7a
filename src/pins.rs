//! GPIO / peripheral pin assignments for the Irrigator controller board.
//!
//! Single source of truth. Every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Pumps (relay or MOSFET, active HIGH)
// ---------------------------------------------------------------------------

/// One output per pump channel, in channel-index order.
pub const PUMP_GPIOS: [i32; 2] = [14, 13];

// ---------------------------------------------------------------------------
// Sensors: single-wire
// ---------------------------------------------------------------------------

/// DHT data lines (open-drain), one per climate sensor, in sensor-index order.
pub const DHT_GPIOS: [i32; 1] = [12];

// ---------------------------------------------------------------------------
// Sensors: analog (ADC1)
// ---------------------------------------------------------------------------

/// Capacitive soil probes.  ADC1 channels, in sensor-index order.
pub const SOIL_ADC_CHANNELS: [u32; 1] = [3];

/// TEMT6000 ambient light sensor.  ADC1 channel 5.
pub const LIGHT_ADC_CHANNEL: u32 = 5;

/// GUVA-S12SD UV photodiode amplifier.  ADC1 channel 6.
pub const UV_ADC_CHANNEL: u32 = 6;

// ---------------------------------------------------------------------------
// Status LED
// ---------------------------------------------------------------------------

/// Connection indicator.  Lit while the broker session is ready.
pub const STATUS_LED_GPIO: i32 = 15;

/// The on-board LED sinks current: driving the pin low lights it.
pub const STATUS_LED_ACTIVE_LOW: bool = true;
