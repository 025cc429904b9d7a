//! Reconnection Supervisor.
//!
//! Orders recovery so the broker is only ever dialled over a live link, and
//! spaces retries with a fixed backoff.
//!
//! ```text
//!                 link down / attempt timeout
//!   ┌──────────────────────────────────────────────────────────┐
//!   ▼                                                          │
//! Disconnected ──backoff──▶ LinkReconnecting ──link up──▶ LinkUp
//!                                                        │    ▲
//!                                    request broker ─────┘    │ broker lost
//!                                                        ▼    │ (+backoff)
//!                               BrokerReconnecting ──ack──▶ Ready
//! ```
//!
//! Two modes:
//!
//! - **Event-driven**: transitions come from [`NetEvent`]s drained by the
//!   main loop; [`Supervisor::poll`] only fires due retry timers.  Never
//!   blocks.
//! - **Polling**: for transports that only expose `is_connected()`.
//!   [`Supervisor::poll_blocking`] retries in place with the backoff
//!   between attempts, bounded by a maximum attempt count.  This path
//!   blocks the loop while the connection is down.
//!
//! [`NetEvent`]: crate::events::NetEvent

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::app::ports::{BrokerPort, LinkPort};
use crate::config::SystemConfig;

/// Supervisor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// No link.  A link retry may be scheduled.
    Disconnected,
    /// Link association requested, outcome pending.
    LinkReconnecting,
    /// Link up, no broker session.  A broker retry may be scheduled.
    LinkUp,
    /// Broker connect requested, acknowledgement pending.
    BrokerReconnecting,
    /// Link and broker session both up.
    Ready,
}

/// Coarse connection status derived from [`SupervisorState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    LinkPending,
    LinkUpBrokerPending,
    Ready,
}

impl SupervisorState {
    pub fn connection(self) -> ConnectionState {
        match self {
            Self::Disconnected => ConnectionState::Disconnected,
            Self::LinkReconnecting => ConnectionState::LinkPending,
            Self::LinkUp | Self::BrokerReconnecting => ConnectionState::LinkUpBrokerPending,
            Self::Ready => ConnectionState::Ready,
        }
    }

    fn link_is_up(self) -> bool {
        matches!(self, Self::LinkUp | Self::BrokerReconnecting | Self::Ready)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorMode {
    EventDriven,
    Polling,
}

pub struct Supervisor {
    state: SupervisorState,
    mode: SupervisorMode,
    backoff_ms: u64,
    link_attempt_timeout_ms: u64,
    polling_max_attempts: u32,
    link_retry_at: Option<u64>,
    link_attempt_deadline: Option<u64>,
    broker_retry_at: Option<u64>,
}

impl Supervisor {
    pub fn new(config: &SystemConfig, mode: SupervisorMode) -> Self {
        Self {
            state: SupervisorState::Disconnected,
            mode,
            backoff_ms: config.reconnect_backoff_ms,
            link_attempt_timeout_ms: config.link_attempt_timeout_ms,
            polling_max_attempts: config.polling_max_attempts,
            link_retry_at: None,
            link_attempt_deadline: None,
            broker_retry_at: None,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn mode(&self) -> SupervisorMode {
        self.mode
    }

    pub fn connection(&self) -> ConnectionState {
        self.state.connection()
    }

    pub fn is_ready(&self) -> bool {
        self.state == SupervisorState::Ready
    }

    pub fn link_retry_at(&self) -> Option<u64> {
        self.link_retry_at
    }

    pub fn broker_retry_at(&self) -> Option<u64> {
        self.broker_retry_at
    }

    /// Kick off the first link attempt.
    pub fn start(&mut self, now: u64, link: &mut impl LinkPort) {
        self.request_link(now, link);
    }

    // ── Event handlers ────────────────────────────────────────

    /// Link lost (or an attempt failed).  Broker retries are cancelled
    /// until the link is back.
    pub fn on_link_down(&mut self, now: u64) {
        if self.state == SupervisorState::Disconnected && self.link_retry_at.is_some() {
            return;
        }
        warn!("Supervisor: link lost, retry in {} ms", self.backoff_ms);
        self.state = SupervisorState::Disconnected;
        self.broker_retry_at = None;
        self.link_attempt_deadline = None;
        self.link_retry_at = Some(now + self.backoff_ms);
    }

    /// Link established.  The broker is dialled immediately.
    ///
    /// A repeat while the link is already up (a DHCP lease renewal) leaves
    /// the broker session and any pending retry alone.
    pub fn on_link_up(&mut self, now: u64, broker: &mut impl BrokerPort) {
        if self.state.link_is_up() {
            debug!("Supervisor: link up again in {:?}, ignored", self.state);
            return;
        }
        info!("Supervisor: link up");
        self.state = SupervisorState::LinkUp;
        self.link_retry_at = None;
        self.link_attempt_deadline = None;
        self.request_broker(now, broker);
    }

    pub fn on_broker_connected(&mut self, session_present: bool) {
        if !self.state.link_is_up() {
            warn!("Supervisor: broker ack without link, ignored");
            return;
        }
        info!("Supervisor: broker connected (session present: {})", session_present);
        self.state = SupervisorState::Ready;
        self.broker_retry_at = None;
    }

    /// Broker session lost.  Retried after the backoff while the link
    /// holds; otherwise link recovery takes over.
    pub fn on_broker_lost(&mut self, now: u64, link: &impl LinkPort) {
        if !self.state.link_is_up() {
            return;
        }
        if !link.is_connected() {
            self.on_link_down(now);
            return;
        }
        warn!("Supervisor: broker lost, retry in {} ms", self.backoff_ms);
        self.state = SupervisorState::LinkUp;
        self.broker_retry_at = Some(now + self.backoff_ms);
    }

    // ── Timers ────────────────────────────────────────────────

    /// Fire any due retry or attempt timeout.  Non-blocking.
    pub fn poll(&mut self, now: u64, link: &mut impl LinkPort, broker: &mut impl BrokerPort) {
        let due = |at: Option<u64>| at.is_some_and(|t| now >= t);

        if self.state == SupervisorState::LinkReconnecting && due(self.link_attempt_deadline) {
            warn!("Supervisor: link attempt timed out");
            self.on_link_down(now);
        }

        if self.state == SupervisorState::Disconnected && due(self.link_retry_at) {
            self.request_link(now, link);
        }

        if self.state == SupervisorState::LinkUp && due(self.broker_retry_at) {
            self.request_broker(now, broker);
        }
    }

    /// Polling-mode recovery.  Blocks, retrying with the backoff between
    /// attempts, until both layers report connected or the attempt budget
    /// is spent.
    ///
    /// Returns `true` when this call dialled the broker and the session is
    /// now up, even if the state reads `Ready` on both sides of the call.
    pub fn poll_blocking(
        &mut self,
        link: &mut impl LinkPort,
        broker: &mut impl BrokerPort,
        delay: &mut impl DelayNs,
    ) -> bool {
        let pause = u32::try_from(self.backoff_ms).unwrap_or(u32::MAX);
        let mut attempts = 0;

        while !link.is_connected() && attempts < self.polling_max_attempts {
            self.state = SupervisorState::LinkReconnecting;
            info!("Supervisor: connecting link (attempt {})", attempts + 1);
            if let Err(e) = link.connect() {
                warn!("Supervisor: {}", e);
            }
            delay.delay_ms(pause);
            attempts += 1;
        }
        if !link.is_connected() {
            if self.state != SupervisorState::Disconnected {
                warn!("Supervisor: link still down after {} attempts", attempts);
            }
            self.state = SupervisorState::Disconnected;
            return false;
        }

        let mut dialled = false;
        while !broker.is_connected() && attempts < self.polling_max_attempts {
            self.state = SupervisorState::BrokerReconnecting;
            dialled = true;
            info!("Supervisor: connecting broker (attempt {})", attempts + 1);
            if let Err(e) = broker.connect() {
                warn!("Supervisor: {}", e);
            }
            delay.delay_ms(pause);
            attempts += 1;
        }

        if broker.is_connected() {
            self.state = SupervisorState::Ready;
            dialled
        } else {
            self.state = SupervisorState::LinkUp;
            false
        }
    }

    // ── Connect requests ──────────────────────────────────────

    fn request_link(&mut self, now: u64, link: &mut impl LinkPort) {
        self.link_retry_at = None;
        match link.connect() {
            Ok(()) => {
                info!("Supervisor: connecting link");
                self.state = SupervisorState::LinkReconnecting;
                self.link_attempt_deadline = Some(now + self.link_attempt_timeout_ms);
            }
            Err(e) => {
                warn!("Supervisor: {}", e);
                self.state = SupervisorState::Disconnected;
                self.link_retry_at = Some(now + self.backoff_ms);
            }
        }
    }

    fn request_broker(&mut self, now: u64, broker: &mut impl BrokerPort) {
        self.broker_retry_at = None;
        match broker.connect() {
            Ok(()) => {
                info!("Supervisor: connecting broker");
                self.state = SupervisorState::BrokerReconnecting;
            }
            Err(e) => {
                warn!("Supervisor: {}", e);
                self.state = SupervisorState::LinkUp;
                self.broker_retry_at = Some(now + self.backoff_ms);
            }
        }
    }
}
