//! Telemetry Scheduler: periodic sensor sampling and publishing.
//!
//! One fixed interval governs every sensor.  When it elapses the scheduler
//! walks the sensors in a fixed order and pushes each value through the
//! [`BrokerSession`]:
//!
//! ```text
//!  climate[i]  → humidity, temperature, heat index   (skipped on NaN)
//!  soil[j]     → moisture %                          (calibrated, clamped)
//!  light       → illuminance, UV intensity, UV index
//! ```
//!
//! Floating values are formatted with two fraction digits, the UV index as
//! an integer.  The [`SensorSnapshot`] keeps the last good value per slot;
//! a rejected reading leaves the previous one in place.

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::app::ports::{BrokerPort, SensorPort};
use crate::broker::BrokerSession;
use crate::config::SystemConfig;
use crate::error::BrokerError;
use crate::sensors::climate::ClimateReading;
use crate::sensors::light;
use crate::sensors::soil::SoilCalibration;
use crate::topics;

/// Climate triple for one sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateSample {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub heat_index_c: f32,
}

/// Last accepted readings, overwritten in place every cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSnapshot {
    pub climate: Vec<Option<ClimateSample>>,
    pub soil: Vec<Option<f32>>,
    pub illuminance: f32,
    pub uv_intensity: f32,
    pub uv_index: u8,
}

impl SensorSnapshot {
    fn new(climate_sensors: usize, soil_sensors: usize) -> Self {
        Self {
            climate: vec![None; climate_sensors],
            soil: vec![None; soil_sensors],
            illuminance: 0.0,
            uv_intensity: 0.0,
            uv_index: 0,
        }
    }
}

/// Summary of one publish batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TelemetryReport {
    /// Publishes the client accepted.
    pub published: usize,
    /// Publishes that were rejected or found no session.
    pub failed: usize,
    /// Climate sensors whose triple was withheld this cycle.
    pub skipped_sensors: usize,
}

struct ClimateTopics {
    humidity: String,
    temperature: String,
    heat_index: String,
}

pub struct TelemetryScheduler {
    interval_ms: u64,
    last_publish: u64,
    uv_index_step: f32,
    climate_topics: Vec<ClimateTopics>,
    soil_topics: Vec<String>,
    soil_calibration: Vec<SoilCalibration>,
    illuminance_topic: String,
    uv_intensity_topic: String,
    uv_index_topic: String,
    snapshot: SensorSnapshot,
}

impl TelemetryScheduler {
    pub fn new(config: &SystemConfig) -> Self {
        let t = &config.topics;
        let n = config.climate_sensor_count;
        let climate_topics = (0..n)
            .map(|i| ClimateTopics {
                humidity: topics::channel_topic(&t.humidity, i, n),
                temperature: topics::channel_topic(&t.temperature, i, n),
                heat_index: topics::channel_topic(&t.heat_index, i, n),
            })
            .collect();

        Self {
            interval_ms: config.telemetry_interval_ms,
            last_publish: 0,
            uv_index_step: config.uv_index_step,
            climate_topics,
            soil_topics: topics::channel_topics(&t.soil_moisture, config.soil_sensor_count),
            soil_calibration: (0..config.soil_sensor_count)
                .map(|i| config.soil_calibration_for(i))
                .collect(),
            illuminance_topic: t.illuminance.clone(),
            uv_intensity_topic: t.uv_intensity.clone(),
            uv_index_topic: t.uv_index.clone(),
            snapshot: SensorSnapshot::new(n, config.soil_sensor_count),
        }
    }

    pub fn snapshot(&self) -> &SensorSnapshot {
        &self.snapshot
    }

    pub fn last_publish(&self) -> u64 {
        self.last_publish
    }

    pub fn is_due(&self, now: u64) -> bool {
        now.saturating_sub(self.last_publish) >= self.interval_ms
    }

    /// Run one publish batch if the interval has elapsed.
    pub fn maybe_tick(
        &mut self,
        now: u64,
        sensors: &mut impl SensorPort,
        session: &mut BrokerSession,
        broker: &mut impl BrokerPort,
        delay: &mut impl DelayNs,
    ) -> Option<TelemetryReport> {
        if !self.is_due(now) {
            return None;
        }
        self.last_publish = now;

        let mut out = Batch {
            session,
            broker,
            delay,
            report: TelemetryReport::default(),
            offline: 0,
        };

        // ── Climate ───────────────────────────────────────────
        for (i, topics) in self.climate_topics.iter().enumerate() {
            let reading = sensors
                .read_temperature_humidity(i)
                .ok()
                .and_then(|(t, h)| ClimateReading::validated(t, h));
            let Some(r) = reading else {
                warn!("Telemetry: climate sensor {} unavailable, skipping", i);
                out.report.skipped_sensors += 1;
                continue;
            };

            let sample = ClimateSample {
                temperature_c: r.temperature_c,
                humidity_pct: r.humidity_pct,
                heat_index_c: r.heat_index_c(),
            };
            self.snapshot.climate[i] = Some(sample);

            out.send(&topics.humidity, &format!("{:.2}", sample.humidity_pct));
            out.send(&topics.temperature, &format!("{:.2}", sample.temperature_c));
            out.send(&topics.heat_index, &format!("{:.2}", sample.heat_index_c));
        }

        // ── Soil ──────────────────────────────────────────────
        for (j, topic) in self.soil_topics.iter().enumerate() {
            let raw = match sensors.read_soil_raw(j) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("Telemetry: soil probe {} {}, skipping", j, e);
                    out.report.skipped_sensors += 1;
                    continue;
                }
            };
            let pct = self.soil_calibration[j].moisture_percent(raw);
            self.snapshot.soil[j] = Some(pct);
            out.send(topic, &format!("{:.2}", pct));
        }

        // ── Light / UV ────────────────────────────────────────
        let lux = sensors.read_illuminance();
        let uv = sensors.read_ultraviolet();
        let uv_index = light::uv_index(uv, self.uv_index_step);
        self.snapshot.illuminance = lux;
        self.snapshot.uv_intensity = uv;
        self.snapshot.uv_index = uv_index;

        out.send(&self.illuminance_topic, &format!("{:.2}", lux));
        out.send(&self.uv_intensity_topic, &format!("{:.2}", uv));
        out.send(&self.uv_index_topic, &format!("{}", uv_index));

        if out.offline > 0 {
            warn!("Telemetry: broker offline, {} values not sent", out.offline);
        }
        info!(
            "Telemetry: batch at {} ms, {} sent, {} failed, {} sensors skipped",
            now, out.report.published, out.report.failed, out.report.skipped_sensors
        );
        Some(out.report)
    }
}

/// Publish helper for one batch.
struct Batch<'a, B, D> {
    session: &'a mut BrokerSession,
    broker: &'a mut B,
    delay: &'a mut D,
    report: TelemetryReport,
    offline: usize,
}

impl<B: BrokerPort, D: DelayNs> Batch<'_, B, D> {
    fn send(&mut self, topic: &str, payload: &str) {
        match self.session.publish(self.broker, self.delay, topic, payload) {
            Ok(_) => self.report.published += 1,
            Err(BrokerError::NotConnected) => {
                self.report.failed += 1;
                self.offline += 1;
            }
            // Already logged by the session; fresh data goes out next cycle.
            Err(_) => self.report.failed += 1,
        }
    }
}
