//! Temperature / humidity readings and the derived heat index.
//!
//! The heat index uses the NWS Rothfusz regression with the Steadman
//! approximation below 80 °F, computed in Fahrenheit and converted back.

/// One validated temperature/humidity sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateReading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

impl ClimateReading {
    /// `None` if either component is NaN.
    pub fn validated(temperature_c: f32, humidity_pct: f32) -> Option<Self> {
        if temperature_c.is_nan() || humidity_pct.is_nan() {
            return None;
        }
        Some(Self {
            temperature_c,
            humidity_pct,
        })
    }

    pub fn heat_index_c(&self) -> f32 {
        heat_index_c(self.temperature_c, self.humidity_pct)
    }
}

fn c_to_f(c: f32) -> f32 {
    c * 1.8 + 32.0
}

fn f_to_c(f: f32) -> f32 {
    (f - 32.0) * 0.555_555_6
}

/// Apparent temperature (°C) for air temperature `temp_c` and relative
/// humidity `rh` (%).
pub fn heat_index_c(temp_c: f32, rh: f32) -> f32 {
    let t = c_to_f(temp_c);

    let mut hi = 0.5 * (t + 61.0 + ((t - 68.0) * 1.2) + (rh * 0.094));

    if hi > 79.0 {
        hi = -42.379 + 2.049_015_2 * t + 10.143_331 * rh
            - 0.224_755_4 * t * rh
            - 0.006_837_83 * t * t
            - 0.054_817_17 * rh * rh
            + 0.001_228_74 * t * t * rh
            + 0.000_852_82 * t * rh * rh
            - 0.000_001_99 * t * t * rh * rh;

        if rh < 13.0 && (80.0..=112.0).contains(&t) {
            hi -= ((13.0 - rh) * 0.25) * ((17.0 - (t - 95.0).abs()) * 0.058_82).sqrt();
        } else if rh > 85.0 && (80.0..=87.0).contains(&t) {
            hi += ((rh - 85.0) * 0.1) * ((87.0 - t) * 0.2);
        }
    }

    f_to_c(hi)
}
