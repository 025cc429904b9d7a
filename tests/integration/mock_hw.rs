//! Mock hardware and test rig for integration tests.
//!
//! `MockHw` records every actuator call so tests can assert on the full
//! output history without touching real GPIO.  The network side uses the
//! library's own simulated WiFi and MQTT adapters, wired to a leaked
//! `'static` event queue exactly as the firmware wires `NET_EVENTS`.

use embedded_hal::delay::DelayNs;

use irrigator::adapters::mqtt::{MqttAdapter, SimPublish};
use irrigator::adapters::wifi::WifiAdapter;
use irrigator::app::events::AppEvent;
use irrigator::app::ports::{ActuatorPort, EventSink, SensorPort};
use irrigator::app::service::Controller;
use irrigator::config::SystemConfig;
use irrigator::error::SensorError;
use irrigator::events::EventQueue;
use irrigator::supervisor::SupervisorMode;

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCall {
    SetOutput { channel: usize, on: bool },
    SetLed(bool),
}

// ── MockHw ────────────────────────────────────────────────────

pub struct MockHw {
    pub calls: Vec<ActuatorCall>,
    pub climate: Vec<Result<(f32, f32), SensorError>>,
    pub soil_raw: u16,
    pub lux: f32,
    pub uv: f32,
}

#[allow(dead_code)]
impl MockHw {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            climate: vec![Ok((22.0, 55.0))],
            soil_raw: 2000,
            lux: 350.0,
            uv: 2_000.0,
        }
    }

    /// Output calls for `channel`, oldest first.
    pub fn outputs(&self, channel: usize) -> Vec<bool> {
        self.calls
            .iter()
            .filter_map(|c| match *c {
                ActuatorCall::SetOutput { channel: ch, on } if ch == channel => Some(on),
                _ => None,
            })
            .collect()
    }

    pub fn led_lit(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match *c {
                ActuatorCall::SetLed(on) => Some(on),
                ActuatorCall::SetOutput { .. } => None,
            })
            .unwrap_or(false)
    }
}

impl Default for MockHw {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHw {
    fn read_temperature_humidity(&mut self, sensor: usize) -> Result<(f32, f32), SensorError> {
        self.climate.get(sensor).copied().unwrap_or(Err(SensorError::Unavailable))
    }

    fn read_soil_raw(&mut self, _sensor: usize) -> Result<u16, SensorError> {
        Ok(self.soil_raw)
    }

    fn read_illuminance(&mut self) -> f32 {
        self.lux
    }

    fn read_ultraviolet(&mut self) -> f32 {
        self.uv
    }
}

impl ActuatorPort for MockHw {
    fn set_output(&mut self, channel: usize, on: bool) {
        self.calls.push(ActuatorCall::SetOutput { channel, on });
    }

    fn set_status_led(&mut self, on: bool) {
        self.calls.push(ActuatorCall::SetLed(on));
    }
}

// ── Delay / sink ──────────────────────────────────────────────

/// Publish pacing and polling backoff return immediately; total requested
/// time is kept for assertions.
#[derive(Default)]
pub struct NoDelay {
    pub total_ms: u64,
}

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.total_ms += u64::from(ms);
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Rig ───────────────────────────────────────────────────────

/// Controller plus every adapter it needs, driven by an explicit clock.
pub struct Rig {
    pub queue: &'static EventQueue,
    pub controller: Controller,
    pub hw: MockHw,
    pub wifi: WifiAdapter,
    pub mqtt: MqttAdapter,
    pub delay: NoDelay,
    pub sink: RecordingSink,
    pub now: u64,
}

#[allow(dead_code)]
impl Rig {
    pub fn new(config: &SystemConfig) -> Self {
        Self::with_mode(config, SupervisorMode::EventDriven)
    }

    pub fn with_mode(config: &SystemConfig, mode: SupervisorMode) -> Self {
        let queue: &'static EventQueue = Box::leak(Box::new(EventQueue::new()));
        Self {
            queue,
            controller: Controller::with_mode(config, mode),
            hw: MockHw::new(),
            wifi: WifiAdapter::new(&config.network, queue),
            mqtt: MqttAdapter::new(
                &config.broker,
                &config.topics.status,
                config.reconnect_backoff_ms,
                queue,
            ),
            delay: NoDelay::default(),
            sink: RecordingSink::default(),
            now: 0,
        }
    }

    pub fn start(&mut self) {
        self.controller
            .start(self.now, &mut self.hw, &mut self.wifi, &mut self.sink);
    }

    /// Advance the clock to `now` and run one tick.
    pub fn tick_at(&mut self, now: u64) {
        self.now = now;
        self.controller.tick(
            now,
            self.queue,
            &mut self.hw,
            &mut self.wifi,
            &mut self.mqtt,
            &mut self.delay,
            &mut self.sink,
        );
    }

    /// Advance the clock by `ms` and run one tick.
    pub fn advance(&mut self, ms: u64) {
        self.tick_at(self.now + ms);
    }

    /// Publishes on `topic` so far, oldest first.
    pub fn published_on(&self, topic: &str) -> Vec<&SimPublish> {
        self.mqtt
            .sim_published()
            .iter()
            .filter(|p| p.topic == topic)
            .collect()
    }

    /// Start and run until the first broker session is ready.
    pub fn started_ready(config: &SystemConfig) -> Self {
        let mut rig = Self::new(config);
        rig.start();
        rig.advance(1);
        assert!(rig.controller.supervisor().is_ready(), "rig did not reach Ready");
        rig
    }
}

/// Default configuration with credentials the simulated radio accepts.
pub fn test_config() -> SystemConfig {
    let mut c = SystemConfig::default();
    c.network.ssid = "greenhouse-net".into();
    c.network.password = "tomatoes123".into();
    c
}
