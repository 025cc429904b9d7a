//! Irrigator Firmware: main entry point
//!
//! Hexagonal architecture with a single-context control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   Esp32TimeAdapter             │
//! │  (Sensor+Actuator) (EventSink)    (ClockPort)                  │
//! │  WifiAdapter       MqttAdapter                                 │
//! │  (LinkPort)        (BrokerPort)                                │
//! │        │                │                                      │
//! │        └──── NET_EVENTS (bounded queue) ────┐                  │
//! │                                             ▼                  │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              Controller (pure logic)                   │    │
//! │  │  Supervisor · ActuatorScheduler · Telemetry · Session  │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Result, anyhow};
use log::{error, info};

use esp_idf_hal::delay::{Ets, FreeRtos};
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, PinDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;

use irrigator::adapters::hardware::{AnalogChannels, HardwareAdapter};
use irrigator::adapters::log_sink::LogEventSink;
use irrigator::adapters::mqtt::MqttAdapter;
use irrigator::adapters::time::Esp32TimeAdapter;
use irrigator::adapters::wifi::WifiAdapter;
use irrigator::app::ports::ClockPort;
use irrigator::app::service::Controller;
use irrigator::config;
use irrigator::drivers::{hw_init, pump::PumpBank, status_led::StatusLed, watchdog::Watchdog};
use irrigator::events::EventQueue;
use irrigator::pins;
use irrigator::sensors::dht::{Dht, DhtModel};

/// Network callbacks push here; the control loop drains it every tick.
static NET_EVENTS: EventQueue = EventQueue::new();

/// Control loop period.
const LOOP_PERIOD_MS: u32 = 10;

/// The board ships with DHT11 sensors.
const DHT_MODEL: DhtModel = DhtModel::Dht11;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Irrigator v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Peripherals ────────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        // Without ADC and GPIO there is nothing to run; the watchdog
        // never gets subscribed so the device idles here.
        error!("HAL init failed: {}, halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }
    let watchdog = Watchdog::new();

    // ── 3. Configuration ──────────────────────────────────────
    let config = config::compiled();
    config.validate().map_err(|e| anyhow!("{e}"))?;
    info!(
        "Config: {} pumps ({} ms), {} climate, {} soil, telemetry every {} ms",
        config.pump_count,
        config.pump_duration_ms,
        config.climate_sensor_count,
        config.soil_sensor_count,
        config.telemetry_interval_ms
    );

    // ── 4. Hardware adapter ───────────────────────────────────
    let peripherals = Peripherals::take()?;

    let mut pump_outputs = Vec::with_capacity(config.pump_count);
    for &gpio in pins::PUMP_GPIOS.iter().take(config.pump_count) {
        // SAFETY: each pump GPIO is listed once in `pins` and claimed by
        // nothing else.
        let pin = unsafe { AnyOutputPin::new(gpio) };
        pump_outputs.push(PinDriver::output(pin)?);
    }

    let mut climate = Vec::with_capacity(config.climate_sensor_count);
    for &gpio in pins::DHT_GPIOS.iter().take(config.climate_sensor_count) {
        // SAFETY: DHT data lines are dedicated to their sensor.
        let pin = unsafe { AnyIOPin::new(gpio) };
        climate.push(Dht::new(
            PinDriver::input_output_od(pin)?,
            Ets,
            Esp32TimeAdapter::new(),
            DHT_MODEL,
        ));
    }

    let analog = AnalogChannels {
        soil: pins::SOIL_ADC_CHANNELS
            .iter()
            .copied()
            .take(config.soil_sensor_count)
            .collect(),
        light: pins::LIGHT_ADC_CHANNEL,
        uv: pins::UV_ADC_CHANNEL,
    };

    let mut hw = HardwareAdapter::new(climate, PumpBank::new(pump_outputs), StatusLed::default(), analog);

    // ── 5. Network adapters ───────────────────────────────────
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let mut wifi = WifiAdapter::new(peripherals.modem, sysloop, nvs, &config.network, &NET_EVENTS)
        .map_err(|e| anyhow!("{e}"))?;
    let mut mqtt = MqttAdapter::new(
        &config.broker,
        &config.topics.status,
        config.reconnect_backoff_ms,
        &NET_EVENTS,
    );

    // ── 6. Controller ─────────────────────────────────────────
    let clock = Esp32TimeAdapter::new();
    let mut sink = LogEventSink::new();
    let mut pacing = FreeRtos;
    let mut controller = Controller::new(&config);
    controller.start(clock.now_ms(), &mut hw, &mut wifi, &mut sink);

    info!("System ready. Entering control loop.");

    // ── 7. Control loop ───────────────────────────────────────
    loop {
        controller.tick(
            clock.now_ms(),
            &NET_EVENTS,
            &mut hw,
            &mut wifi,
            &mut mqtt,
            &mut pacing,
            &mut sink,
        );
        watchdog.feed();
        FreeRtos::delay_ms(LOOP_PERIOD_MS);
    }
}
