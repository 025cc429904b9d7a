//! Application service: the hexagonal core.
//!
//! [`Controller`] owns the device context (pump channels, sensor snapshot,
//! connection supervisor, broker session) and runs one main-loop
//! iteration per [`Controller::tick`].  All I/O flows through port traits
//! injected at call sites, making the whole loop testable with mock
//! adapters.
//!
//! ```text
//!   EventQueue ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!   SensorPort ──▶ │          Controller           │
//!                  │ Supervisor · Pumps · Telemetry│ ──▶ BrokerPort
//! ActuatorPort ◀── └──────────────────────────────┘ ──▶ LinkPort
//! ```

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::actuator::{ActuatorScheduler, Transition};
use crate::broker::BrokerSession;
use crate::config::SystemConfig;
use crate::events::{EventQueue, NetEvent};
use crate::supervisor::{ConnectionState, Supervisor, SupervisorMode, SupervisorState};
use crate::telemetry::TelemetryScheduler;

use super::commands::PumpCommand;
use super::events::AppEvent;
use super::ports::{ActuatorPort, BrokerPort, EventSink, LinkPort, SensorPort};

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

/// The main loop's device context.
pub struct Controller {
    pumps: ActuatorScheduler,
    telemetry: TelemetryScheduler,
    supervisor: Supervisor,
    session: BrokerSession,
    tick_count: u64,
}

impl Controller {
    /// Event-driven controller.  Call [`start`](Self::start) next.
    pub fn new(config: &SystemConfig) -> Self {
        Self::with_mode(config, SupervisorMode::EventDriven)
    }

    pub fn with_mode(config: &SystemConfig, mode: SupervisorMode) -> Self {
        Self {
            pumps: ActuatorScheduler::new(config.pump_count, config.pump_duration_ms),
            telemetry: TelemetryScheduler::new(config),
            supervisor: Supervisor::new(config, mode),
            session: BrokerSession::new(config),
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive every output to a known state and request the first link.
    pub fn start(
        &mut self,
        now: u64,
        hw: &mut impl ActuatorPort,
        link: &mut impl LinkPort,
        sink: &mut impl EventSink,
    ) {
        self.pumps.all_off(hw);
        hw.set_status_led(false);

        if self.supervisor.mode() == SupervisorMode::EventDriven {
            self.supervisor.start(now, link);
        }

        sink.emit(&AppEvent::Started {
            pumps: self.pumps.len(),
            mode: self.supervisor.mode(),
        });
        info!(
            "Controller started: {} pumps, {:?} supervisor",
            self.pumps.len(),
            self.supervisor.mode()
        );
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one main-loop iteration:
    /// events → supervisor → pumps → telemetry → broker I/O.
    ///
    /// `hw` satisfies both [`SensorPort`] and [`ActuatorPort`], avoiding
    /// a double mutable borrow of the hardware adapter.
    #[allow(clippy::too_many_arguments)]
    pub fn tick(
        &mut self,
        now: u64,
        events: &EventQueue,
        hw: &mut (impl SensorPort + ActuatorPort),
        link: &mut impl LinkPort,
        broker: &mut impl BrokerPort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;

        // 1. Apply queued network events in arrival order
        while let Some(event) = events.pop() {
            let prev = self.supervisor.state();
            self.handle_event(event, now, link, broker, sink);
            self.after_transition(prev, false, hw, broker, delay, sink);
        }

        // 2. Reconnection timers (or the blocking poll fallback)
        let prev = self.supervisor.state();
        let redialled = match self.supervisor.mode() {
            SupervisorMode::EventDriven => {
                self.supervisor.poll(now, link, broker);
                false
            }
            SupervisorMode::Polling => self.supervisor.poll_blocking(link, broker, delay),
        };
        self.after_transition(prev, redialled, hw, broker, delay, sink);

        // 3. Pump windows
        for ch in 0..self.pumps.len() {
            match self.pumps.tick(ch, now, hw) {
                Transition::TurnedOn => sink.emit(&AppEvent::PumpStarted(ch)),
                Transition::TurnedOff => {
                    if let Err(e) = self.session.publish_reset(broker, delay, ch) {
                        warn!("Pump {}: reset not published: {}", ch, e);
                    }
                    sink.emit(&AppEvent::PumpStopped(ch));
                }
                Transition::NoChange => {}
            }
        }

        // 4. Telemetry, if due
        if let Some(report) = self.telemetry.maybe_tick(now, hw, &mut self.session, broker, delay) {
            sink.emit(&AppEvent::Telemetry(report));
        }

        // 5. Transport I/O
        broker.poll();
    }

    fn handle_event(
        &mut self,
        event: NetEvent,
        now: u64,
        link: &mut impl LinkPort,
        broker: &mut impl BrokerPort,
        sink: &mut impl EventSink,
    ) {
        let event_driven = self.supervisor.mode() == SupervisorMode::EventDriven;
        match event {
            NetEvent::LinkUp if event_driven => self.supervisor.on_link_up(now, broker),
            NetEvent::LinkDown if event_driven => self.supervisor.on_link_down(now),
            NetEvent::BrokerConnected { session_present } if event_driven => {
                self.supervisor.on_broker_connected(session_present);
            }
            NetEvent::BrokerDisconnected if event_driven => {
                self.supervisor.on_broker_lost(now, link);
            }
            // Polling mode learns connection state from `is_connected()`.
            NetEvent::LinkUp
            | NetEvent::LinkDown
            | NetEvent::BrokerConnected { .. }
            | NetEvent::BrokerDisconnected => {}
            NetEvent::PublishAcked(id) => self.session.on_publish_acked(id),
            NetEvent::Message { topic, payload } => {
                match self.session.route_message(&topic, &payload) {
                    Ok(PumpCommand::Activate(ch)) => {
                        if let Err(e) = self.pumps.activate(ch, now) {
                            warn!("Command: {} ignored: {}", topic, e);
                            sink.emit(&AppEvent::CommandRejected(e));
                        }
                    }
                    Ok(PumpCommand::ResetEcho(_)) => {}
                    Err(e) => {
                        warn!("Command: {} ignored: {}", topic, e);
                        sink.emit(&AppEvent::CommandRejected(e));
                    }
                }
            }
        }
    }

    /// Side effects of a supervisor state change: session ritual on
    /// reaching `Ready`, status LED, connection event.
    ///
    /// `redialled` forces the ritual when a blocking poll lost and
    /// regained the broker within one call.
    fn after_transition(
        &mut self,
        prev: SupervisorState,
        redialled: bool,
        hw: &mut impl ActuatorPort,
        broker: &mut impl BrokerPort,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) {
        let next = self.supervisor.state();
        if next == prev && !redialled {
            return;
        }
        if next == SupervisorState::Ready {
            self.session.on_connected(broker, delay);
        }
        hw.set_status_led(next == SupervisorState::Ready);

        let (from, to) = (prev.connection(), next.connection());
        if from != to {
            info!("Connection: {:?} -> {:?}", from, to);
            sink.emit(&AppEvent::ConnectionChanged { from, to });
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn connection(&self) -> ConnectionState {
        self.supervisor.connection()
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    pub fn pumps(&self) -> &ActuatorScheduler {
        &self.pumps
    }

    pub fn telemetry(&self) -> &TelemetryScheduler {
        &self.telemetry
    }

    pub fn session(&self) -> &BrokerSession {
        &self.session
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}

// ───────────────────────────────────────────────────────────────
// Unit tests (host only)
// ───────────────────────────────────────────────────────────────
