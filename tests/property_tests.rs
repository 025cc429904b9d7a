//! Property tests for the pump windows, telemetry rate limiting, NaN
//! handling, and soil calibration.
//!
//! Runs on host (x86_64) only; proptest is not available for ESP32 targets.
//! On ESP32, these tests are compiled out.

#![cfg(not(target_os = "espidf"))]

use embedded_hal::delay::DelayNs;
use proptest::prelude::*;

use irrigator::actuator::{ActuatorScheduler, Transition};
use irrigator::app::ports::{ActuatorPort, BrokerPort, MessageId, QoS, SensorPort};
use irrigator::broker::BrokerSession;
use irrigator::config::SystemConfig;
use irrigator::error::{BrokerError, SensorError};
use irrigator::sensors::soil::SoilCalibration;
use irrigator::telemetry::TelemetryScheduler;

// ── Test doubles ──────────────────────────────────────────────

#[derive(Default)]
struct Outputs(Vec<(usize, bool)>);

impl ActuatorPort for Outputs {
    fn set_output(&mut self, channel: usize, on: bool) {
        self.0.push((channel, on));
    }
    fn set_status_led(&mut self, _on: bool) {}
}

struct Sensors {
    climate: Vec<(f32, f32)>,
}

impl SensorPort for Sensors {
    fn read_temperature_humidity(&mut self, sensor: usize) -> Result<(f32, f32), SensorError> {
        self.climate.get(sensor).copied().ok_or(SensorError::Unavailable)
    }
    fn read_soil_raw(&mut self, _sensor: usize) -> Result<u16, SensorError> {
        Ok(2000)
    }
    fn read_illuminance(&mut self) -> f32 {
        100.0
    }
    fn read_ultraviolet(&mut self) -> f32 {
        1_000.0
    }
}

#[derive(Default)]
struct Broker {
    topics: Vec<String>,
}

impl BrokerPort for Broker {
    fn connect(&mut self) -> Result<(), BrokerError> {
        Ok(())
    }
    fn is_connected(&self) -> bool {
        true
    }
    fn publish(&mut self, topic: &str, _p: &[u8], _q: QoS, _r: bool) -> Result<MessageId, BrokerError> {
        self.topics.push(topic.into());
        Ok(self.topics.len() as MessageId)
    }
    fn subscribe(&mut self, _topic: &str, _qos: QoS) -> Result<MessageId, BrokerError> {
        Ok(0)
    }
}

struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

// ── Pump windows ──────────────────────────────────────────────

proptest! {
    /// Output is on exactly inside `[t0, t0 + D)` and exactly one
    /// `TurnedOff` follows, however often `tick` runs after expiry.
    #[test]
    fn window_is_exact_and_turns_off_once(
        t0 in 0u64..1_000_000,
        d in 1u64..100_000,
        probes in proptest::collection::vec(0u64..200_000, 1..40),
    ) {
        let mut pumps = ActuatorScheduler::new(1, d);
        let mut out = Outputs::default();
        pumps.activate(0, t0).unwrap();

        let mut times: Vec<u64> = probes.iter().map(|p| t0 + p).collect();
        times.sort_unstable();

        let mut offs = 0;
        for now in times {
            let t = pumps.tick(0, now, &mut out);
            if t == Transition::TurnedOff {
                offs += 1;
            }
            let on = pumps.channel(0).unwrap().is_on();
            prop_assert_eq!(on, now < t0 + d, "now={} t0={} d={}", now, t0, d);
        }
        // Well past expiry, repeatedly.
        for k in 0..3 {
            if pumps.tick(0, t0 + d + 200_000 + k, &mut out) == Transition::TurnedOff {
                offs += 1;
            }
        }
        prop_assert_eq!(offs, 1);
    }

    /// Re-activation while on restarts the window from the new time.
    #[test]
    fn reactivation_restarts_window(
        t0 in 0u64..1_000_000,
        d in 2u64..100_000,
        offset in 1u64..100_000,
    ) {
        let offset = offset % d;
        prop_assume!(offset > 0);
        let t_new = t0 + offset;

        let mut pumps = ActuatorScheduler::new(1, d);
        let mut out = Outputs::default();
        pumps.activate(0, t0).unwrap();
        pumps.tick(0, t0, &mut out);
        prop_assert!(pumps.channel(0).unwrap().is_on());

        pumps.activate(0, t_new).unwrap();
        for now in [t_new, t0 + d, t_new + d - 1] {
            prop_assert_ne!(pumps.tick(0, now, &mut out), Transition::TurnedOff);
            prop_assert!(pumps.channel(0).unwrap().is_on(), "off early at {}", now);
        }
        prop_assert_eq!(pumps.tick(0, t_new + d, &mut out), Transition::TurnedOff);
    }
}

// ── Telemetry ─────────────────────────────────────────────────

fn telemetry_config(climate: usize) -> SystemConfig {
    let mut c = SystemConfig::default();
    c.climate_sensor_count = climate;
    c.publish_pacing_ms = 0;
    c
}

proptest! {
    /// At most one batch per interval, and exactly one more once it elapses.
    #[test]
    fn telemetry_rate_limited(
        calls in proptest::collection::vec(0u64..30_000, 1..30),
    ) {
        let config = telemetry_config(1);
        let interval = config.telemetry_interval_ms;
        let mut tel = TelemetryScheduler::new(&config);
        let mut session = BrokerSession::new(&config);
        let mut broker = Broker::default();
        let mut sensors = Sensors { climate: vec![(21.0, 50.0)] };

        let base = interval;
        let mut calls = calls;
        calls.sort_unstable();

        let mut batches = 0;
        for c in &calls {
            if tel
                .maybe_tick(base + c, &mut sensors, &mut session, &mut broker, &mut NoDelay)
                .is_some()
            {
                batches += 1;
            }
        }
        prop_assert!(batches <= 1);

        let first = tel.last_publish();
        let after = tel.maybe_tick(first + interval, &mut sensors, &mut session, &mut broker, &mut NoDelay);
        prop_assert!(after.is_some());
        let again = tel.maybe_tick(first + interval, &mut sensors, &mut session, &mut broker, &mut NoDelay);
        prop_assert!(again.is_none());
    }

    /// A NaN in either value withholds that sensor's triple only.
    #[test]
    fn nan_sensor_withheld_alone(
        bad in 0usize..4,
        nan_temp in any::<bool>(),
    ) {
        let config = telemetry_config(4);
        let mut tel = TelemetryScheduler::new(&config);
        let mut session = BrokerSession::new(&config);
        let mut broker = Broker::default();

        let mut climate = vec![(20.0, 45.0); 4];
        if nan_temp {
            climate[bad].0 = f32::NAN;
        } else {
            climate[bad].1 = f32::NAN;
        }
        let mut sensors = Sensors { climate };

        let report = tel
            .maybe_tick(config.telemetry_interval_ms, &mut sensors, &mut session, &mut broker, &mut NoDelay)
            .unwrap();
        prop_assert_eq!(report.skipped_sensors, 1);

        let t = &config.topics;
        for i in 0..4 {
            for base in [&t.temperature, &t.humidity, &t.heat_index] {
                let topic = format!("{base}/{i}");
                let sent = broker.topics.contains(&topic);
                prop_assert_eq!(sent, i != bad, "{}", topic);
            }
        }
    }
}

// ── Soil calibration ──────────────────────────────────────────

proptest! {
    /// Monotonic toward wet, clamped at both extremes, 50 at the midpoint.
    #[test]
    fn soil_mapping_monotonic_and_clamped(
        dry in 1500u16..4095,
        span in 2u16..1500,
        a in 0u16..4096,
        b in 0u16..4096,
    ) {
        let wet = dry - span;
        let cal = SoilCalibration { dry_raw: dry, wet_raw: wet };

        prop_assert_eq!(cal.moisture_percent(dry), 0.0);
        prop_assert_eq!(cal.moisture_percent(dry.saturating_add(100)), 0.0);
        prop_assert_eq!(cal.moisture_percent(wet), 100.0);
        prop_assert_eq!(cal.moisture_percent(wet.saturating_sub(100)), 100.0);

        if span % 2 == 0 {
            let mid = wet + span / 2;
            prop_assert!((cal.moisture_percent(mid) - 50.0).abs() < 1e-3);
        }

        // Lower raw means wetter.
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(cal.moisture_percent(lo) >= cal.moisture_percent(hi));

        let p = cal.moisture_percent(a);
        prop_assert!((0.0..=100.0).contains(&p));
    }
}
