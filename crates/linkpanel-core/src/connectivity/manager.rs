use embassy_time::{Duration, Instant};
use heapless::String;
use log::{debug, info, warn};

use super::{ConnectivityState, LinkStatus, SetupPortal, StationLink};
use crate::config::{Config, Credentials, SSID_MAX_LEN};

/// How long a connection attempt may take before the portal is opened
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// How long the portal stays up without being provisioned
pub const PORTAL_TIMEOUT: Duration = Duration::from_secs(180);

/// Automatic reconnects allowed before escalating to the portal
pub const MAX_AUTO_RECONNECTS: u8 = 3;

/// A connection that survives this long refills the reconnect budget
pub const STABLE_LINK: Duration = Duration::from_secs(60);

const DEFAULT_AP_NAME: &str = "Core2-Setup";

const DEFAULT_HOSTNAME: &str = "core2-ha";

/// Shown as the connection target when the driver's stored network is used
pub const SAVED_NETWORK_LABEL: &str = "(saved)";

const PORTAL_TIMEOUT_MESSAGE: &str = "Portal timeout";

#[derive(Debug, Clone)]
pub struct ConnectivitySettings {
    pub connect_timeout: Duration,
    pub portal_timeout: Duration,
    pub hostname: String<32>,
    pub ap_name: String<SSID_MAX_LEN>,
    pub ap_password: Option<String<63>>,
    /// Build-time credentials, tried before the driver's stored ones
    pub provisioned: Option<Credentials>,
    pub max_auto_reconnects: u8,
    pub stable_link: Duration,
}

impl Default for ConnectivitySettings {
    fn default() -> Self {
        Self {
            connect_timeout: CONNECT_TIMEOUT,
            portal_timeout: PORTAL_TIMEOUT,
            hostname: String::try_from(DEFAULT_HOSTNAME).unwrap_or_default(),
            ap_name: String::try_from(DEFAULT_AP_NAME).unwrap_or_default(),
            ap_password: None,
            provisioned: None,
            max_auto_reconnects: MAX_AUTO_RECONNECTS,
            stable_link: STABLE_LINK,
        }
    }
}

impl ConnectivitySettings {
    pub fn from_config(config: &Config<'_>) -> Self {
        let mut settings = Self::default();
        match String::try_from(config.internet.hostname) {
            Ok(name) if !name.is_empty() => settings.hostname = name,
            _ => warn!(
                "Invalid hostname {:?}, using {}",
                config.internet.hostname, DEFAULT_HOSTNAME
            ),
        }
        match String::try_from(config.portal.ap_name) {
            Ok(name) if !name.is_empty() => settings.ap_name = name,
            _ => warn!(
                "Invalid portal AP name {:?}, using {}",
                config.portal.ap_name, DEFAULT_AP_NAME
            ),
        }
        settings.ap_password = config
            .portal_password()
            .and_then(|password| String::try_from(password).ok());
        settings.provisioned = config.provisioned_credentials();
        settings
    }
}

/// One in-flight attempt to join a network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionAttempt {
    pub uses_provisioned_credentials: bool,
    /// SSID being joined, or "(saved)" when the driver picks
    pub target_label: String<SSID_MAX_LEN>,
    pub deadline: Instant,
}

/// The running setup portal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortalSession {
    pub deadline: Instant,
}

#[derive(Debug, Clone)]
enum Phase {
    Connecting(ConnectionAttempt),
    Connected { since: Instant },
    Portal(PortalSession),
    Error(String<48>),
}

/// Owns the station link and setup portal and decides which of them is in
/// charge.
///
/// The manager is polled from the control loop. Nothing here blocks, so a
/// slow network never freezes the screen.
pub struct ConnectivityManager<L, P> {
    link: L,
    portal: P,
    settings: ConnectivitySettings,
    phase: Phase,
    last_status: Option<LinkStatus>,
    reconnects_left: u8,
}

impl<L, P> ConnectivityManager<L, P>
where
    L: StationLink,
    P: SetupPortal,
{
    /// Create the manager and immediately start the first connection attempt
    pub fn new(link: L, portal: P, settings: ConnectivitySettings, now: Instant) -> Self {
        let reconnects_left = settings.max_auto_reconnects;
        let mut manager = Self {
            link,
            portal,
            settings,
            phase: Phase::Error(String::new()),
            last_status: None,
            reconnects_left,
        };
        manager.begin_attempt(now);
        manager
    }

    /// (Re)start a connection attempt. Cancels a running portal.
    pub fn start_connecting(&mut self, now: Instant) {
        self.reconnects_left = self.settings.max_auto_reconnects;
        self.begin_attempt(now);
    }

    /// Open the setup portal, optionally wiping stored credentials first.
    ///
    /// Wiping also drops the provisioned credentials for the rest of the
    /// session so a forgotten network is not silently rejoined.
    pub fn start_portal(&mut self, now: Instant, reset_credentials: bool) {
        self.reconnects_left = self.settings.max_auto_reconnects;
        if reset_credentials {
            warn!("Erasing stored WiFi credentials");
            self.portal.erase_credentials();
            self.settings.provisioned = None;
        }
        self.enter_portal(now);
    }

    /// Advance the state machine. Returns true when the screen needs a full
    /// repaint.
    pub fn tick(&mut self, now: Instant) -> bool {
        let status = self.link.status();
        let status_changed = self.last_status != Some(status);
        if status_changed {
            debug!("Link status {:?} -> {:?}", self.last_status, status);
        }
        self.last_status = Some(status);

        if status == LinkStatus::Connected {
            if matches!(self.phase, Phase::Connected { .. }) {
                return status_changed;
            }
            if matches!(self.phase, Phase::Portal(_)) {
                self.portal.stop();
            }
            self.link.set_power_save(true);
            info!("Connected to {}", self.link.ssid());
            self.phase = Phase::Connected { since: now };
            return true;
        }

        match &self.phase {
            Phase::Portal(session) => {
                self.portal.process();
                if now > session.deadline {
                    warn!("Setup portal timed out");
                    self.portal.stop();
                    self.phase = Phase::Error(
                        String::try_from(PORTAL_TIMEOUT_MESSAGE).unwrap_or_default(),
                    );
                    return true;
                }
            }
            Phase::Connecting(attempt) => {
                if status == LinkStatus::ConnectFailed {
                    warn!("Authentication failed for {}", attempt.target_label);
                    self.enter_portal(now);
                    return true;
                }
                if now > attempt.deadline {
                    warn!("Connection to {} timed out", attempt.target_label);
                    self.enter_portal(now);
                    return true;
                }
            }
            Phase::Connected { since } => {
                if now.saturating_duration_since(*since) >= self.settings.stable_link {
                    self.reconnects_left = self.settings.max_auto_reconnects;
                }
                if self.reconnects_left == 0 {
                    warn!("Link dropped again ({}), opening setup portal", status.label());
                    self.enter_portal(now);
                } else {
                    self.reconnects_left -= 1;
                    info!(
                        "Link dropped ({}), reconnecting ({} retries left)",
                        status.label(),
                        self.reconnects_left
                    );
                    self.begin_attempt(now);
                }
                return true;
            }
            Phase::Error(_) => {}
        }

        status_changed
    }

    pub fn state(&self) -> ConnectivityState {
        match self.phase {
            Phase::Connecting(_) => ConnectivityState::Connecting,
            Phase::Connected { .. } => ConnectivityState::Connected,
            Phase::Portal(_) => ConnectivityState::Portal,
            Phase::Error(_) => ConnectivityState::Error,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.phase, Phase::Connected { .. })
    }

    /// Error text while in the Error state
    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            Phase::Error(message) => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn attempt(&self) -> Option<&ConnectionAttempt> {
        match &self.phase {
            Phase::Connecting(attempt) => Some(attempt),
            _ => None,
        }
    }

    pub fn portal_session(&self) -> Option<&PortalSession> {
        match &self.phase {
            Phase::Portal(session) => Some(session),
            _ => None,
        }
    }

    /// Most recent status observed by [`Self::tick`]
    pub fn link_status(&self) -> LinkStatus {
        self.last_status.unwrap_or(LinkStatus::Unknown)
    }

    pub fn reconnects_left(&self) -> u8 {
        self.reconnects_left
    }

    pub fn settings(&self) -> &ConnectivitySettings {
        &self.settings
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn portal(&self) -> &P {
        &self.portal
    }

    pub fn portal_mut(&mut self) -> &mut P {
        &mut self.portal
    }

    fn begin_attempt(&mut self, now: Instant) {
        if matches!(self.phase, Phase::Portal(_)) {
            self.portal.stop();
        }

        let provisioned = self.settings.provisioned.as_ref();
        let target_label = match provisioned {
            Some(credentials) => credentials.ssid.clone(),
            None => String::try_from(SAVED_NETWORK_LABEL).unwrap_or_default(),
        };
        info!("Connecting to {}", target_label);

        self.link.set_power_save(false);
        self.link.set_hostname(self.settings.hostname.as_str());
        self.link.begin_connect(provisioned);
        self.phase = Phase::Connecting(ConnectionAttempt {
            uses_provisioned_credentials: provisioned.is_some(),
            target_label,
            deadline: now + self.settings.connect_timeout,
        });
    }

    fn enter_portal(&mut self, now: Instant) {
        if matches!(self.phase, Phase::Portal(_)) {
            self.portal.stop();
        }

        info!("Starting setup portal {}", self.settings.ap_name);
        self.link.set_power_save(false);
        self.portal.start(
            self.settings.ap_name.as_str(),
            self.settings.ap_password.as_deref(),
        );
        self.phase = Phase::Portal(PortalSession {
            deadline: now + self.settings.portal_timeout,
        });
    }
}
