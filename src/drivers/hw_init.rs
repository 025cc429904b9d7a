//! One-shot hardware peripheral initialization.
//!
//! Configures the ADC1 channels (soil probes, light, UV) and the status LED
//! output using raw ESP-IDF sys calls.  Called once from `main()` before
//! the control loop starts.
//!
//! Pump outputs and DHT data lines are owned by `esp-idf-hal` pin drivers
//! and are not touched here.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::{info, warn};

use crate::error::{Error, SensorError};
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
        }
    }
}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        match e {
            HwInitError::AdcInitFailed(_) => Error::Init("ADC1"),
            HwInitError::GpioConfigFailed(_) => Error::Init("GPIO"),
        }
    }
}

/// Every ADC1 channel the firmware samples.
fn adc_channels() -> impl Iterator<Item = u32> {
    pins::SOIL_ADC_CHANNELS
        .into_iter()
        .chain([pins::LIGHT_ADC_CHANNEL, pins::UV_ADC_CHANNEL])
}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the control loop; single-threaded.
    unsafe {
        init_adc()?;
        init_gpio_outputs()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped ({} ADC channels)", adc_channels().count());
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the single-threaded init path or the
/// main-loop ADC read path.  `init_adc()` completes before the loop starts.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };

    for channel in adc_channels() {
        let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), channel, &chan_cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::AdcInitFailed(ret));
        }
    }

    info!("hw_init: ADC1 configured (soil={:?}, light=CH{}, uv=CH{})",
        pins::SOIL_ADC_CHANNELS, pins::LIGHT_ADC_CHANNEL, pins::UV_ADC_CHANNEL);
    Ok(())
}

/// 12-bit raw sample.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Result<u16, SensorError> {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract, single-threaded main-loop access only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        warn!("hw_init: ADC1 CH{} read failed (rc={})", channel, ret);
        return Err(SensorError::Unavailable);
    }
    Ok(raw.clamp(0, 4095) as u16)
}

// Host builds read from a settable table so adapters can be exercised.
#[cfg(not(target_os = "espidf"))]
static SIM_ADC: [core::sync::atomic::AtomicU16; 10] =
    [const { core::sync::atomic::AtomicU16::new(0) }; 10];

/// Marks a simulated channel whose reads fail.
#[cfg(not(target_os = "espidf"))]
const SIM_ADC_FAULT: u16 = u16::MAX;

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(channel: u32) -> Result<u16, SensorError> {
    match SIM_ADC
        .get(channel as usize)
        .map(|v| v.load(core::sync::atomic::Ordering::Relaxed))
    {
        Some(raw) if raw != SIM_ADC_FAULT => Ok(raw),
        _ => Err(SensorError::Unavailable),
    }
}

/// Simulation: set the value the next `adc1_read(channel)` returns.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_adc(channel: u32, raw: u16) {
    if let Some(v) = SIM_ADC.get(channel as usize) {
        v.store(raw.min(4095), core::sync::atomic::Ordering::Relaxed);
    }
}

/// Simulation: make reads of `channel` fail until the next `sim_set_adc`.
#[cfg(not(target_os = "espidf"))]
pub fn sim_fail_adc(channel: u32) {
    if let Some(v) = SIM_ADC.get(channel as usize) {
        v.store(SIM_ADC_FAULT, core::sync::atomic::Ordering::Relaxed);
    }
}

// ── GPIO Outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::STATUS_LED_GPIO,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    // LED dark until the broker session is up.
    unsafe { gpio_set_level(pins::STATUS_LED_GPIO, u32::from(pins::STATUS_LED_ACTIVE_LOW)) };

    info!("hw_init: GPIO outputs configured");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes to an already-configured output pin.
    // Main-loop only.
    unsafe {
        gpio_set_level(pin, u32::from(high));
    }
}

#[cfg(not(target_os = "espidf"))]
static SIM_GPIO: core::sync::atomic::AtomicU64 = core::sync::atomic::AtomicU64::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(pin: i32, high: bool) {
    use core::sync::atomic::Ordering;
    let Ok(bit) = u32::try_from(pin) else { return };
    let Some(mask) = 1u64.checked_shl(bit) else { return };
    if high {
        SIM_GPIO.fetch_or(mask, Ordering::Relaxed);
    } else {
        SIM_GPIO.fetch_and(!mask, Ordering::Relaxed);
    }
}

/// Simulation: last level written to `pin`.
#[cfg(not(target_os = "espidf"))]
pub fn sim_gpio_level(pin: i32) -> bool {
    let Ok(bit) = u32::try_from(pin) else { return false };
    1u64.checked_shl(bit)
        .is_some_and(|mask| SIM_GPIO.load(core::sync::atomic::Ordering::Relaxed) & mask != 0)
}
