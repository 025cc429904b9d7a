//! Ambient light and UV conversions.
//!
//! Both sensors are analog front-ends on ADC1.  The photo-transistor
//! (TEMT6000) sources ~2 µA per lux into a 10 kΩ load; the UV photodiode
//! amplifier (GUVA-S12SD) outputs ~0.1 V per mW/cm² of UVA.

const ADC_MAX: f32 = 4095.0;
const V_REF: f32 = 3.3;
/// Load resistor on the light sensor output (Ω).
const LIGHT_LOAD_OHMS: f32 = 10_000.0;
/// Sensor current per lux (A).
const LIGHT_AMPS_PER_LUX: f32 = 2.0e-6;
/// UV amplifier gain (V per µW/cm²).
const UV_VOLTS_PER_UW_CM2: f32 = 1.0e-4;
/// Intensity per UV index step (µW/cm²).  The GUVA-S12SD tracks the index
/// at roughly one step per 0.1 V of output.
pub const UV_INDEX_STEP_UW_CM2: f32 = 1_000.0;

fn adc_to_volts(raw: u16) -> f32 {
    f32::from(raw.min(ADC_MAX as u16)) / ADC_MAX * V_REF
}

/// Illuminance (lux) from a raw 12-bit light-sensor sample.
pub fn illuminance_lux(raw: u16) -> f32 {
    adc_to_volts(raw) / LIGHT_LOAD_OHMS / LIGHT_AMPS_PER_LUX
}

/// UV intensity (µW/cm²) from a raw 12-bit UV-sensor sample.
pub fn uv_intensity(raw: u16) -> f32 {
    adc_to_volts(raw) / UV_VOLTS_PER_UW_CM2
}

/// UV index: intensity divided by the per-step intensity, rounded to the
/// nearest whole step.  Negative or NaN input reads as index 0.
pub fn uv_index(intensity: f32, step: f32) -> u8 {
    if intensity.is_nan() || step <= 0.0 {
        return 0;
    }
    (intensity / step).round().clamp(0.0, f32::from(u8::MAX)) as u8
}
