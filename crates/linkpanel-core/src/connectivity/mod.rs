//! Connectivity lifecycle: station link, setup portal and the state machine
//! that arbitrates between them.

mod manager;

pub use manager::{ConnectionAttempt, ConnectivityManager, ConnectivitySettings, PortalSession};

use core::net::Ipv4Addr;

use heapless::String;

use crate::config::{Credentials, SSID_MAX_LEN};

/// User-visible connectivity state. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectivityState {
    Connecting,
    Connected,
    Portal,
    Error,
}

impl ConnectivityState {
    /// Text shown inside the status pill
    pub const fn label(self) -> &'static str {
        match self {
            ConnectivityState::Connecting => "CONNECTING",
            ConnectivityState::Connected => "CONNECTED",
            ConnectivityState::Portal => "SETUP PORTAL",
            ConnectivityState::Error => "ERROR",
        }
    }
}

/// Low-level status as reported by the radio driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkStatus {
    Idle,
    NoSsidAvailable,
    ScanCompleted,
    Connected,
    /// Association or authentication was rejected
    ConnectFailed,
    ConnectionLost,
    Disconnected,
    Unknown,
}

impl LinkStatus {
    pub const fn label(self) -> &'static str {
        match self {
            LinkStatus::Idle => "IDLE",
            LinkStatus::NoSsidAvailable => "NO SSID",
            LinkStatus::ScanCompleted => "SCAN DONE",
            LinkStatus::Connected => "CONNECTED",
            LinkStatus::ConnectFailed => "AUTH FAIL",
            LinkStatus::ConnectionLost => "LOST",
            LinkStatus::Disconnected => "DISCONNECTED",
            LinkStatus::Unknown => "UNKNOWN",
        }
    }
}

/// Station-mode radio.
///
/// `begin_connect` must return immediately; progress is observed by polling
/// [`StationLink::status`] from the control loop.
pub trait StationLink {
    /// Start joining a network. `None` means "use whatever the driver has
    /// stored".
    fn begin_connect(&mut self, credentials: Option<&Credentials>);

    /// Name the station registers under (DHCP/mDNS). Applied before every
    /// connection attempt.
    fn set_hostname(&mut self, name: &str);

    fn status(&self) -> LinkStatus;

    /// Signal strength in dBm; only meaningful while connected
    fn rssi(&self) -> i32;

    fn ssid(&self) -> String<SSID_MAX_LEN>;

    fn local_address(&self) -> Option<Ipv4Addr>;

    fn set_power_save(&mut self, enabled: bool);
}

/// Fallback access point with a captive web server for entering credentials.
pub trait SetupPortal {
    /// Bring up the AP and web server without blocking.
    fn start(&mut self, ap_name: &str, password: Option<&str>);

    /// Serve pending HTTP/DNS requests. Called once per control loop tick.
    fn process(&mut self);

    fn stop(&mut self);

    /// Wipe stored network credentials
    fn erase_credentials(&mut self);
}
