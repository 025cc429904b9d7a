//! Integration tests: reconnection supervisor driven by simulated WiFi and
//! MQTT events through the Controller.

use crate::mock_hw::{Rig, test_config};

use irrigator::app::events::AppEvent;
use irrigator::broker::ONLINE;
use irrigator::config::SystemConfig;
use irrigator::supervisor::{ConnectionState, SupervisorMode, SupervisorState};

const PUMP_TOPICS: [&str; 2] = ["greenhouse/pump/0", "greenhouse/pump/1"];
const STATUS: &str = "greenhouse/status";

#[test]
fn boot_reaches_ready_and_announces_session() {
    let rig = Rig::started_ready(&test_config());

    assert_eq!(rig.controller.connection(), ConnectionState::Ready);
    assert!(rig.hw.led_lit());
    assert_eq!(rig.mqtt.sim_subscriptions(), PUMP_TOPICS);
    for topic in PUMP_TOPICS {
        assert_eq!(rig.published_on(topic)[0].payload, b"0");
    }
    assert_eq!(rig.published_on(STATUS)[0].payload, ONLINE.as_bytes());
    assert!(rig.sink.events.contains(&AppEvent::ConnectionChanged {
        from: ConnectionState::LinkUpBrokerPending,
        to: ConnectionState::Ready,
    }));
}

#[test]
fn link_loss_waits_for_link_before_redialling_broker() {
    let mut rig = Rig::started_ready(&test_config());
    let broker_connects = rig.mqtt.sim_connects();
    let published_before = rig.mqtt.sim_published().len();

    // The radio drops; the broker session goes with it.
    rig.wifi.sim_drop();
    rig.mqtt.sim_drop();
    rig.tick_at(100);

    assert_eq!(rig.controller.supervisor().state(), SupervisorState::Disconnected);
    assert!(!rig.hw.led_lit());
    assert!(rig.sink.events.contains(&AppEvent::ConnectionChanged {
        from: ConnectionState::Ready,
        to: ConnectionState::Disconnected,
    }));

    // Backoff running: nothing is dialled.
    rig.tick_at(1_000);
    rig.tick_at(2_099);
    assert_eq!(rig.wifi.attempts(), 1);
    assert_eq!(rig.mqtt.sim_connects(), broker_connects);

    // Link retry fires; the broker still waits for the link event.
    rig.tick_at(2_100);
    assert_eq!(rig.wifi.attempts(), 2);
    assert_eq!(rig.controller.connection(), ConnectionState::LinkPending);
    assert_eq!(rig.mqtt.sim_connects(), broker_connects);

    // Link event → broker connect → acknowledgement → session ritual.
    rig.tick_at(2_101);
    assert_eq!(rig.mqtt.sim_connects(), broker_connects + 1);
    assert!(rig.controller.supervisor().is_ready());
    assert!(rig.hw.led_lit());
    assert_eq!(rig.mqtt.sim_subscriptions(), PUMP_TOPICS);

    let republished = &rig.mqtt.sim_published()[published_before..];
    for topic in PUMP_TOPICS {
        assert_eq!(
            republished
                .iter()
                .filter(|p| p.topic == topic && p.payload == b"0")
                .count(),
            1,
            "reset republished on {topic}"
        );
    }
    assert!(republished.iter().any(|p| p.topic == STATUS));
}

#[test]
fn broker_loss_with_link_up_retries_after_backoff() {
    let mut rig = Rig::started_ready(&test_config());
    let broker_connects = rig.mqtt.sim_connects();

    rig.mqtt.sim_drop();
    rig.tick_at(100);
    assert_eq!(rig.controller.supervisor().state(), SupervisorState::LinkUp);
    assert_eq!(rig.controller.supervisor().broker_retry_at(), Some(2_100));
    assert!(!rig.hw.led_lit());

    rig.tick_at(2_099);
    assert_eq!(rig.mqtt.sim_connects(), broker_connects);

    rig.tick_at(2_100);
    assert_eq!(rig.mqtt.sim_connects(), broker_connects + 1);
    rig.tick_at(2_101);
    assert!(rig.controller.supervisor().is_ready());
    assert_eq!(rig.mqtt.sim_subscriptions(), PUMP_TOPICS);
    assert_eq!(rig.wifi.attempts(), 1, "link was never re-associated");
}

#[test]
fn refused_link_is_retried_on_backoff() {
    let mut rig = Rig::new(&test_config());
    rig.wifi.sim_refuse(true);
    rig.start();

    rig.tick_at(1);
    assert_eq!(rig.controller.connection(), ConnectionState::Disconnected);

    rig.tick_at(2_000);
    assert_eq!(rig.wifi.attempts(), 1);
    rig.tick_at(2_001);
    assert_eq!(rig.wifi.attempts(), 2);

    rig.wifi.sim_refuse(false);
    rig.tick_at(2_002);
    rig.tick_at(4_002);
    rig.tick_at(4_003);
    assert!(rig.controller.supervisor().is_ready());
}

#[test]
fn silent_link_attempt_times_out() {
    let mut rig = Rig::new(&test_config());
    rig.start();
    // The association outcome never reaches the loop.
    rig.queue.drain(|_| {});

    rig.tick_at(14_999);
    assert_eq!(rig.controller.connection(), ConnectionState::LinkPending);

    rig.tick_at(15_000);
    assert_eq!(rig.controller.connection(), ConnectionState::Disconnected);

    rig.tick_at(17_000);
    assert_eq!(rig.wifi.attempts(), 2);
    rig.tick_at(17_001);
    assert!(rig.controller.supervisor().is_ready());
}

#[test]
fn missing_credentials_never_leave_disconnected() {
    let mut rig = Rig::new(&SystemConfig::default());
    rig.start();

    for t in [1, 2_000, 4_000, 6_000] {
        rig.tick_at(t);
        assert_eq!(rig.controller.connection(), ConnectionState::Disconnected);
    }
    assert_eq!(rig.wifi.attempts(), 0);
    assert_eq!(rig.mqtt.sim_connects(), 0);
}

// ── Polling mode ──────────────────────────────────────────────

#[test]
fn polling_mode_connects_in_one_blocking_tick() {
    let config = test_config();
    let mut rig = Rig::with_mode(&config, SupervisorMode::Polling);
    rig.start();
    assert_eq!(rig.wifi.attempts(), 0, "polling mode dials from tick()");

    rig.tick_at(1);
    assert!(rig.controller.supervisor().is_ready());
    assert_eq!(rig.mqtt.sim_subscriptions(), PUMP_TOPICS);
    assert!(rig.delay.total_ms >= 2 * config.reconnect_backoff_ms);

    // Queued events are informational in this mode.
    rig.tick_at(2);
    assert!(rig.controller.supervisor().is_ready());
}

#[test]
fn polling_mode_gives_up_after_attempt_budget() {
    let config = test_config();
    let mut rig = Rig::with_mode(&config, SupervisorMode::Polling);
    rig.wifi.sim_refuse(true);
    rig.start();

    rig.tick_at(1);
    assert_eq!(rig.wifi.attempts(), config.polling_max_attempts);
    assert_eq!(rig.controller.connection(), ConnectionState::Disconnected);
    assert_eq!(rig.mqtt.sim_connects(), 0);
}

#[test]
fn polling_mode_broker_loss_restores_session() {
    let config = test_config();
    let mut rig = Rig::with_mode(&config, SupervisorMode::Polling);
    rig.start();
    rig.tick_at(1);
    assert!(rig.controller.supervisor().is_ready());
    let broker_connects = rig.mqtt.sim_connects();
    let published_before = rig.mqtt.sim_published().len();

    // Lost and regained inside a single blocking poll.
    rig.mqtt.sim_drop();
    assert!(rig.mqtt.sim_subscriptions().is_empty());
    rig.tick_at(2);

    assert!(rig.controller.supervisor().is_ready());
    assert_eq!(rig.mqtt.sim_connects(), broker_connects + 1);
    assert_eq!(rig.mqtt.sim_subscriptions(), PUMP_TOPICS);
    assert!(rig.hw.led_lit());

    let republished = &rig.mqtt.sim_published()[published_before..];
    for topic in PUMP_TOPICS {
        assert!(
            republished.iter().any(|p| p.topic == topic && p.payload == b"0"),
            "reset republished on {topic}"
        );
    }
    assert!(republished.iter().any(|p| p.topic == STATUS && p.payload == ONLINE.as_bytes()));

    // A pump command on the restored subscription is honoured.
    assert!(rig.mqtt.sim_inject(PUMP_TOPICS[0], b"1"));
    rig.tick_at(3);
    assert!(rig.controller.pumps().channel(0).unwrap().is_on());
}
