//! Application core: pure domain logic, zero I/O.
//!
//! This module holds the irrigation controller's orchestration: the
//! per-tick main loop body, inbound command interpretation, and the
//! structured events it reports.  All interaction with hardware and the
//! network happens through **port traits** defined in [`ports`], keeping
//! this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
