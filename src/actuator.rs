//! Actuator Scheduler: timed pump pulses.
//!
//! Each pump channel is a small state machine.  An activation opens the
//! window `[start, start + duration)`; the per-tick scheduler drives the
//! output from that window and surfaces exactly one [`Transition::TurnedOff`]
//! per activation so the caller publishes a single reset notification.
//!
//! ```text
//!            activate(t0)             tick(now ≥ t0+D)
//!   Idle ───────────────▶ Running ────────────────────▶ Idle
//!    ▲   reset_notified    │  ▲                         reset_notified
//!    │       = true        │  │ activate(t1)             = true
//!    │                     └──┘ (window restarts at t1)
//! ```
//!
//! The output never outlives its window: no inbound message is needed to
//! switch a pump off.

use log::info;

use crate::app::ports::ActuatorPort;
use crate::error::CommandError;

/// Outcome of one scheduler step for a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    NoChange,
    TurnedOn,
    TurnedOff,
}

/// One pump channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActuatorChannel {
    index: usize,
    output: bool,
    activation_start: Option<u64>,
    reset_notified: bool,
}

impl ActuatorChannel {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            output: false,
            activation_start: None,
            reset_notified: true,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_on(&self) -> bool {
        self.output
    }

    pub fn activation_start(&self) -> Option<u64> {
        self.activation_start
    }

    pub fn reset_notified(&self) -> bool {
        self.reset_notified
    }

    /// Open (or restart) the pulse window at `now`.
    pub fn activate(&mut self, now: u64) {
        self.activation_start = Some(now);
        self.reset_notified = false;
    }

    /// Advance the state machine.  Pure: does not touch the driver.
    pub fn step(&mut self, now: u64, duration_ms: u64) -> Transition {
        let Some(start) = self.activation_start else {
            return Transition::NoChange;
        };

        let in_window = now >= start && now - start < duration_ms;

        if in_window {
            if self.output {
                return Transition::NoChange;
            }
            self.output = true;
            return Transition::TurnedOn;
        }

        self.output = false;
        self.activation_start = None;
        if self.reset_notified {
            Transition::NoChange
        } else {
            self.reset_notified = true;
            Transition::TurnedOff
        }
    }
}

/// All pump channels, sized once from configuration.
#[derive(Debug, Clone)]
pub struct ActuatorScheduler {
    channels: Vec<ActuatorChannel>,
    duration_ms: u64,
}

impl ActuatorScheduler {
    pub fn new(count: usize, duration_ms: u64) -> Self {
        Self {
            channels: (0..count).map(ActuatorChannel::new).collect(),
            duration_ms,
        }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn channels(&self) -> &[ActuatorChannel] {
        &self.channels
    }

    pub fn channel(&self, index: usize) -> Option<&ActuatorChannel> {
        self.channels.get(index)
    }

    /// Start (or extend) a pulse on `index`.  Last activation wins; there
    /// is no additive queuing.
    pub fn activate(&mut self, index: usize, now: u64) -> Result<(), CommandError> {
        let ch = self
            .channels
            .get_mut(index)
            .ok_or(CommandError::IndexOutOfRange(index))?;
        if ch.is_on() {
            info!("Pump {}: re-triggered, window restarts", index);
        } else {
            info!("Pump {}: activation for {} ms", index, self.duration_ms);
        }
        ch.activate(now);
        Ok(())
    }

    /// Step channel `index` and apply any transition to the driver.
    pub fn tick(&mut self, index: usize, now: u64, driver: &mut impl ActuatorPort) -> Transition {
        let Some(ch) = self.channels.get_mut(index) else {
            return Transition::NoChange;
        };
        let t = ch.step(now, self.duration_ms);
        match t {
            Transition::TurnedOn => {
                driver.set_output(index, true);
                info!("Pump {}: ON", index);
            }
            Transition::TurnedOff => {
                driver.set_output(index, false);
                info!("Pump {}: OFF", index);
            }
            Transition::NoChange => {}
        }
        t
    }

    /// Force every output off without reporting transitions.
    pub fn all_off(&mut self, driver: &mut impl ActuatorPort) {
        for ch in &mut self.channels {
            ch.output = false;
            ch.activation_start = None;
            ch.reset_notified = true;
            driver.set_output(ch.index, false);
        }
    }
}
