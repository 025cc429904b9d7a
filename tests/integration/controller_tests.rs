//! Integration tests: inbound command → pump window → reset publish, and
//! the telemetry batch, through the full Controller tick.

use crate::mock_hw::{Rig, test_config};

use irrigator::app::events::AppEvent;
use irrigator::app::ports::QoS;
use irrigator::error::CommandError;
use irrigator::events::NetEvent;

const PUMP_0: &str = "greenhouse/pump/0";
const PUMP_1: &str = "greenhouse/pump/1";

fn count(rig: &Rig, wanted: &AppEvent) -> usize {
    rig.sink.events.iter().filter(|e| *e == wanted).count()
}

// ── Pump command lifecycle ────────────────────────────────────

#[test]
fn pump_command_runs_for_duration_then_resets_once() {
    let mut rig = Rig::started_ready(&test_config());
    let resets_before = rig.published_on(PUMP_1).len();

    assert!(rig.mqtt.sim_inject(PUMP_1, b"1"));
    rig.tick_at(1_000);
    assert_eq!(rig.hw.outputs(1).last(), Some(&true), "setOutput(1, true) expected");
    assert!(rig.controller.pumps().channel(1).unwrap().is_on());

    rig.tick_at(2_999);
    assert!(rig.controller.pumps().channel(1).unwrap().is_on());

    rig.tick_at(3_000);
    assert_eq!(rig.hw.outputs(1), vec![false, true, false]);

    let resets = rig.published_on(PUMP_1);
    assert_eq!(resets.len(), resets_before + 1, "exactly one reset publish");
    let reset = resets.last().unwrap();
    assert_eq!(reset.payload, b"0");
    assert_eq!(reset.qos, QoS::AtLeastOnce);
    assert!(reset.retain);

    // Further ticks after expiry change nothing.
    rig.tick_at(3_100);
    rig.tick_at(10_000);
    assert_eq!(rig.published_on(PUMP_1).len(), resets_before + 1);
    assert_eq!(rig.hw.outputs(1), vec![false, true, false]);

    // Channel 0 only saw the boot-time all-off.
    assert_eq!(rig.hw.outputs(0), vec![false]);
    assert_eq!(count(&rig, &AppEvent::PumpStarted(1)), 1);
    assert_eq!(count(&rig, &AppEvent::PumpStopped(1)), 1);
}

#[test]
fn repeated_activation_restarts_window() {
    let mut rig = Rig::started_ready(&test_config());
    let resets_before = rig.published_on(PUMP_0).len();

    rig.mqtt.sim_inject(PUMP_0, b"1");
    rig.tick_at(1_000);
    rig.mqtt.sim_inject(PUMP_0, b"1");
    rig.tick_at(2_500);

    // The first window would have ended at 3_000.
    rig.tick_at(3_500);
    assert!(rig.controller.pumps().channel(0).unwrap().is_on());

    rig.tick_at(4_500);
    assert!(!rig.controller.pumps().channel(0).unwrap().is_on());
    assert_eq!(rig.hw.outputs(0), vec![false, true, false]);
    assert_eq!(rig.published_on(PUMP_0).len(), resets_before + 1);
}

#[test]
fn reset_echo_is_ignored() {
    let mut rig = Rig::started_ready(&test_config());

    rig.mqtt.sim_inject(PUMP_0, b"0");
    rig.tick_at(500);

    assert_eq!(rig.hw.outputs(0), vec![false]);
    assert!(
        !rig
            .sink
            .events
            .iter()
            .any(|e| matches!(e, AppEvent::CommandRejected(_))),
        "our own reset echo must not be reported"
    );
}

#[test]
fn malformed_commands_are_rejected_and_logged() {
    let mut rig = Rig::started_ready(&test_config());

    rig.queue
        .push(NetEvent::message("greenhouse/pump/7", b"1").unwrap());
    rig.queue.push(NetEvent::message(PUMP_0, b"2").unwrap());
    rig.queue
        .push(NetEvent::message("greenhouse/pump/x", b"1").unwrap());
    rig.tick_at(500);

    assert_eq!(
        count(&rig, &AppEvent::CommandRejected(CommandError::IndexOutOfRange(7))),
        1
    );
    assert_eq!(
        count(&rig, &AppEvent::CommandRejected(CommandError::UnsupportedPayload)),
        1
    );
    assert_eq!(count(&rig, &AppEvent::CommandRejected(CommandError::BadIndex)), 1);
    assert_eq!(rig.hw.outputs(0), vec![false]);
    assert_eq!(rig.hw.outputs(1), vec![false]);
}

// ── Telemetry ─────────────────────────────────────────────────

#[test]
fn telemetry_batch_publishes_after_interval() {
    let mut rig = Rig::started_ready(&test_config());

    rig.tick_at(29_999);
    assert!(!rig.sink.events.iter().any(|e| matches!(e, AppEvent::Telemetry(_))));

    rig.tick_at(30_000);
    let reports: Vec<_> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::Telemetry(r) => Some(*r),
            _ => None,
        })
        .collect();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].published, 7);
    assert_eq!(reports[0].failed, 0);

    assert_eq!(rig.published_on("greenhouse/temperature")[0].payload, b"22.00");
    assert_eq!(rig.published_on("greenhouse/humidity")[0].payload, b"55.00");
    assert_eq!(rig.published_on("greenhouse/soil")[0].payload, b"50.00");
    assert_eq!(rig.published_on("greenhouse/light")[0].payload, b"350.00");
    assert_eq!(rig.published_on("greenhouse/uv")[0].payload, b"2000.00");
    assert_eq!(rig.published_on("greenhouse/uv_index")[0].payload, b"2");

    // Same interval: no second batch.
    rig.tick_at(30_001);
    rig.tick_at(59_999);
    assert_eq!(rig.published_on("greenhouse/light").len(), 1);

    rig.tick_at(60_000);
    assert_eq!(rig.published_on("greenhouse/light").len(), 2);
}

#[test]
fn nan_climate_reading_withholds_its_values() {
    let mut config = test_config();
    config.climate_sensor_count = 2;
    let mut rig = Rig::started_ready(&config);
    rig.hw.climate = vec![Ok((f32::NAN, 50.0)), Ok((20.0, 40.0))];

    rig.tick_at(30_000);

    assert!(rig.published_on("greenhouse/temperature/0").is_empty());
    assert!(rig.published_on("greenhouse/humidity/0").is_empty());
    assert!(rig.published_on("greenhouse/heat_index/0").is_empty());
    assert_eq!(rig.published_on("greenhouse/temperature/1")[0].payload, b"20.00");
    assert_eq!(rig.published_on("greenhouse/humidity/1")[0].payload, b"40.00");
    assert_eq!(rig.published_on("greenhouse/heat_index/1").len(), 1);
    assert!(rig.controller.telemetry().snapshot().climate[0].is_none());
}
