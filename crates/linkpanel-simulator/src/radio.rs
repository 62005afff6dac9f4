//! Simulated WiFi radio shared by the station link and the setup portal.
//!
//! There is exactly one reachable network, [`SIM_SSID`]. Joins resolve after
//! [`JOIN_DELAY`] so the Connecting screen is visible for a moment. Portal
//! submissions are persisted with postcard next to the binary, like the
//! credential store on the device.

use std::cell::RefCell;
use std::fs;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use heapless::String;
use log::{debug, info, warn};

use linkpanel_core::LinkStatus;
use linkpanel_core::config::{Credentials, SSID_MAX_LEN};
use linkpanel_core::connectivity::{SetupPortal, StationLink};

/// Name of the only network in range
pub const SIM_SSID: &str = "HomeNet";

/// Passphrase the simulated access point accepts
pub const SIM_PASSWORD: &str = "linkpanel";

/// Time from `begin_connect` until the join succeeds or fails
const JOIN_DELAY: Duration = Duration::from_millis(1500);

const SIM_ADDRESS: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 42);

struct PendingJoin {
    ssid: String<SSID_MAX_LEN>,
    outcome: LinkStatus,
    resolves_at: Instant,
}

pub struct Radio {
    status: LinkStatus,
    pending: Option<PendingJoin>,
    joined: String<SSID_MAX_LEN>,
    stored: Option<Credentials>,
    store_path: PathBuf,
    portal_running: bool,
    powered_at: Instant,
}

pub type SharedRadio = Rc<RefCell<Radio>>;

impl Radio {
    /// Create the radio, loading credentials saved by an earlier run.
    pub fn shared(store_path: PathBuf) -> SharedRadio {
        let stored = match fs::read(&store_path) {
            Ok(bytes) => match Credentials::from_bytes(&bytes) {
                Ok(credentials) => {
                    info!("Loaded stored credentials for {}", credentials.ssid);
                    Some(credentials)
                }
                Err(e) => {
                    warn!("Ignoring {}: {}", store_path.display(), e);
                    None
                }
            },
            Err(_) => None,
        };

        Rc::new(RefCell::new(Self {
            status: LinkStatus::Idle,
            pending: None,
            joined: String::new(),
            stored,
            store_path,
            portal_running: false,
            powered_at: Instant::now(),
        }))
    }

    fn join(&mut self, credentials: Option<&Credentials>) {
        let credentials = credentials.or(self.stored.as_ref()).cloned();
        self.joined.clear();
        self.status = LinkStatus::Disconnected;

        let Some(credentials) = credentials else {
            // Nothing to join; the attempt times out into the portal
            debug!("Radio: no credentials, staying idle");
            self.status = LinkStatus::Idle;
            self.pending = None;
            return;
        };

        let outcome = if credentials.ssid.as_str() != SIM_SSID {
            LinkStatus::NoSsidAvailable
        } else if credentials.password.as_str() != SIM_PASSWORD {
            LinkStatus::ConnectFailed
        } else {
            LinkStatus::Connected
        };
        debug!("Radio: joining {} -> {:?}", credentials.ssid, outcome);

        self.pending = Some(PendingJoin {
            ssid: credentials.ssid,
            outcome,
            resolves_at: Instant::now() + JOIN_DELAY,
        });
    }

    fn poll(&mut self) {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|join| Instant::now() >= join.resolves_at);
        if !due {
            return;
        }
        if let Some(join) = self.pending.take() {
            self.status = join.outcome;
            if join.outcome == LinkStatus::Connected {
                self.joined = join.ssid;
            }
        }
    }

    /// Force the link up on the simulated network.
    pub fn force_up(&mut self) {
        self.pending = None;
        self.joined.clear();
        // SIM_SSID always fits
        let _ = self.joined.push_str(SIM_SSID);
        self.status = LinkStatus::Connected;
    }

    /// Force a status change such as a dropped link or a rejected key.
    pub fn force_status(&mut self, status: LinkStatus) {
        self.pending = None;
        if status != LinkStatus::Connected {
            self.joined.clear();
        }
        self.status = status;
    }

    fn store(&mut self, credentials: &Credentials) {
        match credentials.to_bytes() {
            Ok(bytes) => {
                if let Err(e) = fs::write(&self.store_path, bytes) {
                    warn!("Failed to save {}: {}", self.store_path.display(), e);
                }
            }
            Err(e) => warn!("Failed to encode credentials: {}", e),
        }
        self.stored = Some(credentials.clone());
    }

    fn erase(&mut self) {
        self.stored = None;
        match fs::remove_file(&self.store_path) {
            Ok(()) => info!("Erased {}", self.store_path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to erase {}: {}", self.store_path.display(), e),
        }
    }
}

/// Station side of the radio
pub struct SimLink(SharedRadio);

impl SimLink {
    pub fn new(radio: SharedRadio) -> Self {
        Self(radio)
    }
}

impl StationLink for SimLink {
    fn begin_connect(&mut self, credentials: Option<&Credentials>) {
        self.0.borrow_mut().join(credentials);
    }

    fn set_hostname(&mut self, name: &str) {
        debug!("Radio: hostname {}", name);
    }

    fn status(&self) -> LinkStatus {
        let mut radio = self.0.borrow_mut();
        radio.poll();
        radio.status
    }

    fn rssi(&self) -> i32 {
        // Wander a little so patched redraws are visible
        let wobble = (self.0.borrow().powered_at.elapsed().as_secs() % 5) as i32;
        -61 + wobble
    }

    fn ssid(&self) -> String<SSID_MAX_LEN> {
        self.0.borrow().joined.clone()
    }

    fn local_address(&self) -> Option<Ipv4Addr> {
        (self.status() == LinkStatus::Connected).then_some(SIM_ADDRESS)
    }

    fn set_power_save(&mut self, enabled: bool) {
        debug!("Radio: power save {}", if enabled { "on" } else { "off" });
    }
}

/// Access point side of the radio
pub struct SimPortal(SharedRadio);

impl SimPortal {
    pub fn new(radio: SharedRadio) -> Self {
        Self(radio)
    }

    /// Stand-in for the portal's web form: save the credentials and join.
    ///
    /// Returns `false` when the portal is not running.
    pub fn submit(&mut self, credentials: Credentials) -> bool {
        let mut radio = self.0.borrow_mut();
        if !radio.portal_running {
            return false;
        }
        info!("Portal: credentials submitted for {}", credentials.ssid);
        radio.store(&credentials);
        radio.join(Some(&credentials));
        true
    }
}

impl SetupPortal for SimPortal {
    fn start(&mut self, ap_name: &str, password: Option<&str>) {
        info!(
            "Portal: AP {} up ({})",
            ap_name,
            if password.is_some() { "WPA2" } else { "open" }
        );
        self.0.borrow_mut().portal_running = true;
    }

    fn process(&mut self) {}

    fn stop(&mut self) {
        let mut radio = self.0.borrow_mut();
        if radio.portal_running {
            info!("Portal: AP down");
            radio.portal_running = false;
        }
    }

    fn erase_credentials(&mut self) {
        self.0.borrow_mut().erase();
    }
}
