//! System configuration parameters
//!
//! All tunable parameters for the Irrigator controller.  Values are fixed at
//! build time: [`compiled`] starts from [`SystemConfig::default`] and fills
//! in network and broker credentials from the build environment.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pins;
use crate::sensors::light;
use crate::sensors::soil::SoilCalibration;

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Pumps ---
    /// Number of pump channels.  Channel indices are `0..pump_count`.
    pub pump_count: usize,
    /// How long a pump runs after an activation command (milliseconds).
    pub pump_duration_ms: u64,

    // --- Sensors ---
    /// Number of temperature/humidity sensors.
    pub climate_sensor_count: usize,
    /// Number of soil moisture probes.
    pub soil_sensor_count: usize,
    /// Per-probe calibration.  `None` (or a missing entry) falls back to
    /// `default_soil_calibration`.
    pub soil_calibration: Vec<Option<SoilCalibration>>,
    /// Calibration used for probes without their own.
    pub default_soil_calibration: SoilCalibration,
    /// UV intensity (µW/cm²) per UV index step.
    pub uv_index_step: f32,

    // --- Timing ---
    /// Telemetry publish interval (milliseconds).
    pub telemetry_interval_ms: u64,
    /// Blocking cooldown after each outbound publish (milliseconds).
    pub publish_pacing_ms: u32,
    /// Fixed delay before a link or broker reconnect attempt (milliseconds).
    pub reconnect_backoff_ms: u64,
    /// A link attempt with no outcome after this long counts as lost.
    pub link_attempt_timeout_ms: u64,
    /// Blocking reconnect attempts per tick in polling mode.
    pub polling_max_attempts: u32,

    // --- Topics / endpoints ---
    pub topics: TopicConfig,
    pub network: NetworkConfig,
    pub broker: BrokerConfig,
}

/// Base topic names.  Multi-instance channels get a `/<index>` suffix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicConfig {
    pub humidity: String,
    pub temperature: String,
    pub heat_index: String,
    pub soil_moisture: String,
    pub illuminance: String,
    pub uv_intensity: String,
    pub uv_index: String,
    /// Pump command and reset topic.
    pub pump: String,
    /// Availability topic ("online" / last-will "offline").
    pub status: String,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            humidity: "greenhouse/humidity".into(),
            temperature: "greenhouse/temperature".into(),
            heat_index: "greenhouse/heat_index".into(),
            soil_moisture: "greenhouse/soil".into(),
            illuminance: "greenhouse/light".into(),
            uv_intensity: "greenhouse/uv".into(),
            uv_index: "greenhouse/uv_index".into(),
            pump: "greenhouse/pump".into(),
            status: "greenhouse/status".into(),
        }
    }
}

/// WiFi station credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub ssid: String,
    pub password: String,
}

/// MQTT broker endpoint and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "192.168.1.10".into(),
            port: 1883,
            username: None,
            password: None,
            client_id: "irrigator".into(),
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Pumps
            pump_count: 2,
            pump_duration_ms: 2_000,

            // Sensors
            climate_sensor_count: 1,
            soil_sensor_count: 1,
            soil_calibration: Vec::new(),
            default_soil_calibration: SoilCalibration::default(),
            uv_index_step: light::UV_INDEX_STEP_UW_CM2,

            // Timing
            telemetry_interval_ms: 30_000,
            publish_pacing_ms: 50,
            reconnect_backoff_ms: 2_000,
            link_attempt_timeout_ms: 15_000,
            polling_max_attempts: 5,

            topics: TopicConfig::default(),
            network: NetworkConfig::default(),
            broker: BrokerConfig::default(),
        }
    }
}

impl SystemConfig {
    /// Reject configurations the control loop cannot run safely.
    pub fn validate(&self) -> Result<()> {
        // Counts are bounded by what the board wires up.
        if self.pump_count > pins::PUMP_GPIOS.len() {
            return Err(Error::Config("pump_count"));
        }
        if self.pump_duration_ms == 0 {
            return Err(Error::Config("pump_duration_ms"));
        }
        if self.climate_sensor_count > pins::DHT_GPIOS.len() {
            return Err(Error::Config("climate_sensor_count"));
        }
        if self.soil_sensor_count > pins::SOIL_ADC_CHANNELS.len() {
            return Err(Error::Config("soil_sensor_count"));
        }
        if self.telemetry_interval_ms == 0 {
            return Err(Error::Config("telemetry_interval_ms"));
        }
        if self.reconnect_backoff_ms == 0 {
            return Err(Error::Config("reconnect_backoff_ms"));
        }
        if self.polling_max_attempts == 0 {
            return Err(Error::Config("polling_max_attempts"));
        }
        if self.uv_index_step.is_nan() || self.uv_index_step <= 0.0 {
            return Err(Error::Config("uv_index_step"));
        }
        if self.default_soil_calibration.is_degenerate()
            || self.soil_calibration.iter().flatten().any(SoilCalibration::is_degenerate)
        {
            return Err(Error::Config("soil_calibration"));
        }
        let t = &self.topics;
        let bases = [
            &t.humidity,
            &t.temperature,
            &t.heat_index,
            &t.soil_moisture,
            &t.illuminance,
            &t.uv_intensity,
            &t.uv_index,
            &t.pump,
            &t.status,
        ];
        if bases.iter().any(|b| b.is_empty() || b.ends_with('/')) {
            return Err(Error::Config("topics"));
        }
        Ok(())
    }

    /// Calibration for soil probe `sensor`, falling back to the default.
    pub fn soil_calibration_for(&self, sensor: usize) -> SoilCalibration {
        self.soil_calibration
            .get(sensor)
            .copied()
            .flatten()
            .unwrap_or(self.default_soil_calibration)
    }
}

/// The build-time configuration: defaults plus credentials taken from the
/// build environment (`IRRIGATOR_WIFI_SSID`, `IRRIGATOR_WIFI_PASS`,
/// `IRRIGATOR_MQTT_HOST`, `IRRIGATOR_MQTT_PORT`, `IRRIGATOR_MQTT_USER`,
/// `IRRIGATOR_MQTT_PASS`).
pub fn compiled() -> SystemConfig {
    let mut c = SystemConfig::default();
    c.network.ssid = option_env!("IRRIGATOR_WIFI_SSID").unwrap_or_default().into();
    c.network.password = option_env!("IRRIGATOR_WIFI_PASS").unwrap_or_default().into();
    if let Some(host) = option_env!("IRRIGATOR_MQTT_HOST") {
        c.broker.host = host.into();
    }
    if let Some(port) = option_env!("IRRIGATOR_MQTT_PORT").and_then(|p| p.parse().ok()) {
        c.broker.port = port;
    }
    c.broker.username = option_env!("IRRIGATOR_MQTT_USER").map(Into::into);
    c.broker.password = option_env!("IRRIGATOR_MQTT_PASS").map(Into::into);
    c
}
