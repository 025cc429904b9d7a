//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(r) => {
                info!(
                    "TELEM | sent={} failed={} skipped_sensors={}",
                    r.published, r.failed, r.skipped_sensors
                );
            }
            AppEvent::ConnectionChanged { from, to } => {
                info!("CONN  | {:?} -> {:?}", from, to);
            }
            AppEvent::PumpStarted(ch) => {
                info!("PUMP  | {} on", ch);
            }
            AppEvent::PumpStopped(ch) => {
                info!("PUMP  | {} off", ch);
            }
            AppEvent::CommandRejected(e) => {
                info!("CMD   | rejected: {}", e);
            }
            AppEvent::Started { pumps, mode } => {
                info!("START | pumps={} supervisor={:?}", pumps, mode);
            }
        }
    }
}
