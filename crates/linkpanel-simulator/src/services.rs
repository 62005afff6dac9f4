//! Simulated forecast service, battery gauge and backlight.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::time::Duration;

use embassy_time::Instant;
use log::{debug, info};

use linkpanel_core::power::{Backlight, BatteryGauge};
use linkpanel_core::telemetry::{Clock, HttpFetch, HttpResponse, TransportError};

/// Time the fake server takes to answer
const RESPONSE_LATENCY: Duration = Duration::from_millis(800);

/// How the fake forecast server answers the next request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ServerMode {
    Ok = 0,
    Unavailable = 1,
    Unreachable = 2,
    Garbage = 3,
}

impl ServerMode {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ServerMode::Unavailable,
            2 => ServerMode::Unreachable,
            3 => ServerMode::Garbage,
            _ => ServerMode::Ok,
        }
    }

    fn next(self) -> Self {
        Self::from_u8((self as u8 + 1) % 4)
    }
}

/// Canned Open-Meteo endpoint. Cloned into every fetch thread; all clones
/// share the mode switch.
#[derive(Clone, Default)]
pub struct ForecastServer {
    mode: Arc<AtomicU8>,
    requests: Arc<AtomicU32>,
}

impl ForecastServer {
    /// Switch to the next failure mode and return it.
    pub fn cycle_mode(&self) -> ServerMode {
        let next = ServerMode::from_u8(self.mode.load(Ordering::Relaxed)).next();
        self.mode.store(next as u8, Ordering::Relaxed);
        next
    }

    fn body(request: u32) -> Vec<u8> {
        // Drift the readings so every refresh changes the ticker
        let current = 8.6 + (request % 6) as f32 * 0.7;
        let code = [61, 3, 2, 80, 0, 45][(request % 6) as usize];
        format!(
            concat!(
                r#"{{"latitude":55.68,"longitude":12.57,"#,
                r#""current":{{"time":"2024-11-05T14:00","temperature_2m":{:.1},"weather_code":{}}},"#,
                r#""daily":{{"time":["2024-11-05"],"temperature_2m_max":[11.2],"#,
                r#""temperature_2m_min":[5.1],"weather_code":[3]}}}}"#
            ),
            current, code
        )
        .into_bytes()
    }
}

impl HttpFetch for ForecastServer {
    async fn get(&mut self, url: &str) -> Result<HttpResponse, TransportError> {
        debug!("GET {}", url);
        // The job runs on its own thread, so blocking here is harmless
        std::thread::sleep(RESPONSE_LATENCY);

        let request = self.requests.fetch_add(1, Ordering::Relaxed);
        match ServerMode::from_u8(self.mode.load(Ordering::Relaxed)) {
            ServerMode::Ok => Ok(HttpResponse {
                status: 200,
                body: Self::body(request),
            }),
            ServerMode::Unavailable => Ok(HttpResponse {
                status: 503,
                body: b"Service Unavailable".to_vec(),
            }),
            ServerMode::Unreachable => Err(TransportError::Tls),
            ServerMode::Garbage => Ok(HttpResponse {
                status: 200,
                body: b"<html>captive portal</html>".to_vec(),
            }),
        }
    }
}

/// Host monotonic clock
pub struct HostClock;

impl Clock for HostClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Battery level and charger state adjustable from the keyboard
#[derive(Clone)]
pub struct SimBattery {
    percent: Rc<Cell<u8>>,
    charging: Rc<Cell<bool>>,
}

impl SimBattery {
    pub fn new(percent: u8) -> Self {
        Self {
            percent: Rc::new(Cell::new(percent.min(100))),
            charging: Rc::new(Cell::new(false)),
        }
    }

    pub fn adjust(&self, delta: i8) {
        let level = (self.percent.get() as i16 + delta as i16).clamp(0, 100) as u8;
        self.percent.set(level);
        info!("Battery {}% (shown at next sample)", level);
    }

    pub fn toggle_charging(&self) {
        self.charging.set(!self.charging.get());
        info!("Charger {}", if self.charging.get() { "plugged" } else { "unplugged" });
    }
}

impl BatteryGauge for SimBattery {
    fn percent(&mut self) -> u8 {
        self.percent.get()
    }

    fn is_charging(&mut self) -> bool {
        self.charging.get()
    }
}

/// Backlight that only reports level changes
#[derive(Default)]
pub struct SimBacklight;

impl Backlight for SimBacklight {
    fn set_brightness(&mut self, level: u8) {
        info!("Backlight -> {}", level);
    }
}
