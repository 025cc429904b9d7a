//! Inbound pump commands.
//!
//! Messages on the pump command tree are interpreted here.  Only the
//! activation sentinel does anything; the reset sentinel is the device's
//! own retained echo and is dropped quietly.

use crate::error::CommandError;
use crate::topics;

/// Payload that starts a pulse.
pub const ACTIVATE: &str = "1";
/// Payload published when a pulse ends (and on every broker connect).
pub const RESET: &str = "0";

/// Commands the broker can deliver to the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpCommand {
    /// Start (or restart) a pulse on the channel.
    Activate(usize),
    /// Reset echo for the channel.  No action.
    ResetEcho(usize),
}

impl PumpCommand {
    pub fn channel(&self) -> usize {
        match *self {
            Self::Activate(ch) | Self::ResetEcho(ch) => ch,
        }
    }
}

/// Interpret a message received on `topic` against the pump base topic.
pub fn parse_pump_command(
    topic: &str,
    payload: &[u8],
    base: &str,
    count: usize,
) -> Result<PumpCommand, CommandError> {
    let channel = topics::parse_channel(topic, base, count)?;
    if payload == ACTIVATE.as_bytes() {
        Ok(PumpCommand::Activate(channel))
    } else if payload == RESET.as_bytes() {
        Ok(PumpCommand::ResetEcho(channel))
    } else {
        Err(CommandError::UnsupportedPayload)
    }
}
