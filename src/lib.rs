//! Irrigator firmware library.
//!
//! Greenhouse telemetry and irrigation controller.  Exposes the pure-logic
//! modules for integration testing and host-side simulation.  All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module.

#![deny(unused_must_use)]

pub mod actuator;
pub mod app;
pub mod broker;
pub mod config;
pub mod error;
pub mod events;
pub mod pins;
pub mod supervisor;
pub mod telemetry;
pub mod topics;

pub mod adapters;
pub mod drivers;
pub mod sensors;
