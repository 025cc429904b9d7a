//! Outbound application events.
//!
//! The [`Controller`](super::service::Controller) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, count them in tests.

use crate::error::CommandError;
use crate::supervisor::{ConnectionState, SupervisorMode};
use crate::telemetry::TelemetryReport;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The controller has started.
    Started { pumps: usize, mode: SupervisorMode },

    /// Derived connection status changed.
    ConnectionChanged {
        from: ConnectionState,
        to: ConnectionState,
    },

    /// A pump output was energised.
    PumpStarted(usize),

    /// A pump pulse ended (its reset notification has been attempted).
    PumpStopped(usize),

    /// A message on the command tree was ignored.
    CommandRejected(CommandError),

    /// A telemetry batch went out.
    Telemetry(TelemetryReport),
}
