//! WiFi station-mode adapter.
//!
//! Implements [`LinkPort`], the hexagonal boundary for network
//! association.  `connect()` only starts an attempt; the outcome is pushed
//! into the [`EventQueue`] as [`NetEvent::LinkUp`] (address assigned) or
//! [`NetEvent::LinkDown`] (association lost or refused).
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver via
//!   `esp_idf_svc::wifi`, with system event loop subscriptions feeding the
//!   queue.
//! - **all other targets**: an in-memory simulation that associates
//!   immediately and can be told to drop the link.
//!
//! Retry timing is not handled here; the reconnection supervisor owns it.

use log::{info, warn};

use crate::app::ports::LinkPort;
use crate::config::NetworkConfig;
use crate::error::LinkError;
use crate::events::{EventQueue, NetEvent};

#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    eventloop::{EspSubscription, EspSystemEventLoop, System},
    hal::modem::Modem,
    netif::IpEvent,
    nvs::EspDefaultNvsPartition,
    wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi, WifiEvent},
};

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), LinkError> {
    if ssid.is_empty() {
        return Err(LinkError::NoCredentials);
    }
    if ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(LinkError::InvalidCredentials);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), LinkError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(LinkError::InvalidCredentials);
    }
    Ok(())
}

/// Credentials check shared by both targets.
pub fn validate_credentials(network: &NetworkConfig) -> Result<(), LinkError> {
    validate_ssid(&network.ssid)?;
    validate_password(&network.password)
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    #[cfg_attr(target_os = "espidf", allow(dead_code))]
    events: &'static EventQueue,
    ssid: heapless::String<32>,
    credentials: Result<(), LinkError>,
    attempts: u32,
    #[cfg(target_os = "espidf")]
    wifi: EspWifi<'static>,
    #[cfg(target_os = "espidf")]
    _subscriptions: [EspSubscription<'static, System>; 2],
    /// Simulation: station associated.
    #[cfg(not(target_os = "espidf"))]
    sim_up: bool,
    /// Simulation: refuse association attempts.
    #[cfg(not(target_os = "espidf"))]
    sim_refuse: bool,
}

impl WifiAdapter {
    fn ssid_buf(network: &NetworkConfig) -> heapless::String<32> {
        let mut s = heapless::String::new();
        // Oversized SSIDs are caught by validation; the log name is best-effort.
        let _ = s.push_str(&network.ssid);
        s
    }

    /// Attempts made since boot.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
        network: &NetworkConfig,
        events: &'static EventQueue,
    ) -> crate::error::Result<Self> {
        use crate::error::Error;

        let credentials = validate_credentials(network);
        let mut wifi =
            EspWifi::new(modem, sysloop.clone(), Some(nvs)).map_err(|_| Error::Init("wifi driver"))?;

        if credentials.is_ok() {
            let auth_method = if network.password.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPAWPA2Personal
            };
            wifi.set_configuration(&Configuration::Client(ClientConfiguration {
                ssid: network
                    .ssid
                    .as_str()
                    .try_into()
                    .map_err(|_| Error::Init("wifi ssid"))?,
                password: network
                    .password
                    .as_str()
                    .try_into()
                    .map_err(|_| Error::Init("wifi password"))?,
                auth_method,
                ..Default::default()
            }))
            .map_err(|_| Error::Init("wifi configuration"))?;
        }
        wifi.start().map_err(|_| Error::Init("wifi start"))?;

        let on_wifi = sysloop
            .subscribe::<WifiEvent, _>(move |event| {
                if let WifiEvent::StaDisconnected { .. } = event {
                    events.push(NetEvent::LinkDown);
                }
            })
            .map_err(|_| Error::Init("wifi event subscription"))?;
        let on_ip = sysloop
            .subscribe::<IpEvent, _>(move |event| {
                if let IpEvent::DhcpIpAssigned { .. } = event {
                    events.push(NetEvent::LinkUp);
                }
            })
            .map_err(|_| Error::Init("ip event subscription"))?;

        info!("WiFi: station started (SSID='{}')", network.ssid);
        Ok(Self {
            events,
            ssid: Self::ssid_buf(network),
            credentials,
            attempts: 0,
            wifi,
            _subscriptions: [on_wifi, on_ip],
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(network: &NetworkConfig, events: &'static EventQueue) -> Self {
        Self {
            events,
            ssid: Self::ssid_buf(network),
            credentials: validate_credentials(network),
            attempts: 0,
            sim_up: false,
            sim_refuse: false,
        }
    }

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), LinkError> {
        self.wifi.connect().map_err(|e| {
            warn!("WiFi: connect request failed ({})", e);
            LinkError::ConnectFailed
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), LinkError> {
        if self.sim_refuse {
            warn!("WiFi(sim): association refused (attempt {})", self.attempts);
            self.events.push(NetEvent::LinkDown);
            return Ok(());
        }
        self.sim_up = true;
        info!("WiFi(sim): associated with '{}' (attempt {})", self.ssid, self.attempts);
        self.events.push(NetEvent::LinkUp);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.wifi.is_up().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim_up
    }

    // ── Simulation controls ───────────────────────────────────

    /// Simulation: drop the association as the radio would on signal loss.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_drop(&mut self) {
        if self.sim_up {
            self.sim_up = false;
            self.events.push(NetEvent::LinkDown);
        }
    }

    /// Simulation: make subsequent attempts fail.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_refuse(&mut self, refuse: bool) {
        self.sim_refuse = refuse;
    }
}

// ───────────────────────────────────────────────────────────────
// LinkPort
// ───────────────────────────────────────────────────────────────

impl LinkPort for WifiAdapter {
    fn connect(&mut self) -> Result<(), LinkError> {
        self.credentials?;
        self.attempts += 1;
        info!("WiFi: connecting to '{}'", self.ssid);
        self.platform_connect()
    }

    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
