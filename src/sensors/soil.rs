//! Capacitive soil moisture probe calibration.
//!
//! The probe's ADC output falls as the soil gets wetter.  A calibration
//! records the raw reading in dry air and fully submerged; readings are
//! mapped linearly between the two and clamped to 0–100 %.

use serde::{Deserialize, Serialize};

/// Raw ADC reading at 0 % (`dry_raw`) and 100 % (`wet_raw`) moisture.
///
/// Either orientation is accepted, so probes whose output rises with
/// moisture calibrate the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoilCalibration {
    pub dry_raw: u16,
    pub wet_raw: u16,
}

impl Default for SoilCalibration {
    /// Typical v1.2 capacitive probe on a 12-bit ADC at 11 dB attenuation.
    fn default() -> Self {
        Self {
            dry_raw: 2800,
            wet_raw: 1200,
        }
    }
}

impl SoilCalibration {
    /// A calibration with identical endpoints cannot be mapped.
    pub fn is_degenerate(&self) -> bool {
        self.dry_raw == self.wet_raw
    }

    /// Map a raw reading to a moisture percentage in `0.0..=100.0`.
    pub fn moisture_percent(&self, raw: u16) -> f32 {
        if self.is_degenerate() {
            return 0.0;
        }
        let dry = f32::from(self.dry_raw);
        let wet = f32::from(self.wet_raw);
        let fraction = (f32::from(raw) - dry) / (wet - dry);
        (fraction * 100.0).clamp(0.0, 100.0)
    }
}
