//! Desktop simulator for the linkpanel connectivity appliance.
//!
//! Runs the real `linkpanel-core` control loop against a simulated radio,
//! setup portal, battery and forecast server, and shows the 320x240 panel in
//! an SDL2 window via `embedded-graphics-simulator`.
//!
//! # Key bindings
//!
//! | Key         | Action                                       |
//! |-------------|----------------------------------------------|
//! | Left/Right  | Swipe to next / previous view                |
//! | F1 F2 F3    | Hardware buttons A (portal), B (next), C (prev) |
//! | S           | Submit valid credentials through the portal  |
//! | U           | Force the link up                            |
//! | L           | Drop the link                                |
//! | E           | Reject the key (auth failure)                |
//! | H           | Cycle forecast server: ok/503/TLS/garbage    |
//! | + / -       | Battery level up / down                      |
//! | G           | Toggle charger                               |
//! | Q / Esc     | Quit                                         |
//!
//! Mouse presses, drags and releases are forwarded as touch events. An
//! optional first argument names a JSON config file (`linkpanel.json` is
//! tried by default); otherwise `LINKPANEL_*` variables from `.env` are baked
//! in at build time.

mod radio;
mod services;

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use embassy_futures::block_on;
use embassy_time::Instant;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{
    OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window, sdl2::Keycode,
};
use log::{error, info, warn};
use static_cell::StaticCell;

use linkpanel_core::config::{InternetConfig, PortalConfig, WeatherConfig};
use linkpanel_core::framebuffer::FrameBuffer;
use linkpanel_core::input::{HardwareButton, InputEvent};
use linkpanel_core::telemetry::{FetchTicket, run_fetch_job};
use linkpanel_core::ui::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX, TouchEvent, TouchPoint};
use linkpanel_core::{App, Config, Credentials, LinkStatus, Peripherals, TelemetryCell};

use radio::{Radio, SIM_PASSWORD, SIM_SSID, SharedRadio, SimLink, SimPortal};
use services::{ForecastServer, HostClock, SimBacklight, SimBattery};

// ---------------------------------------------------------------------------
// Display constants
// ---------------------------------------------------------------------------

/// Pixel scale factor for the simulator window.
const WINDOW_SCALE: u32 = 2;

/// Target frame duration (~30 FPS).
const FRAME_DURATION: Duration = Duration::from_millis(33);

/// Runtime config picked up when no path is given.
const CONFIG_FILE: &str = "linkpanel.json";

/// Where portal submissions are persisted between runs.
const CREDENTIALS_FILE: &str = "linkpanel-credentials.bin";

/// Battery step per key press, in percent.
const BATTERY_STEP: i8 = 10;

static TELEMETRY: StaticCell<TelemetryCell> = StaticCell::new();

type SimApp = App<'static, SimLink, SimPortal, SimBacklight, SimBattery>;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Config from the JSON file named on the command line (or `linkpanel.json`
/// in the working directory), else from the build environment.
fn load_config() -> Config<'static> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| Path::new(CONFIG_FILE).exists().then(|| CONFIG_FILE.to_string()));

    if let Some(path) = path {
        match std::fs::read_to_string(&path) {
            Ok(json) => {
                // Lives for the whole run; Config borrows from it
                let json: &'static str = Box::leak(json.into_boxed_str());
                match Config::parse(json) {
                    Ok(config) => {
                        info!("Loaded config from {}", path);
                        return config;
                    }
                    Err(e) => warn!("{}: {}; using build defaults", path, e),
                }
            }
            Err(e) => warn!("Cannot read {}: {}; using build defaults", path, e),
        }
    }

    Config {
        internet: InternetConfig {
            ssid: option_env!("LINKPANEL_WIFI_SSID").unwrap_or(""),
            password: option_env!("LINKPANEL_WIFI_PASSWORD").unwrap_or(""),
            ..Default::default()
        },
        portal: PortalConfig {
            ap_password: option_env!("LINKPANEL_PORTAL_PASSWORD").unwrap_or(""),
            ..Default::default()
        },
        weather: WeatherConfig {
            label: option_env!("LINKPANEL_WEATHER_LABEL").unwrap_or("DK"),
            ..Default::default()
        },
    }
}

// ---------------------------------------------------------------------------
// Background forecast job
// ---------------------------------------------------------------------------

/// Run one fetch on its own thread. If the thread cannot be spawned the
/// ticket is dropped with it, which releases the mailbox.
fn spawn_fetch(
    ticket: FetchTicket<'static>,
    server: &ForecastServer,
    weather: WeatherConfig<'static>,
) {
    let mut server = server.clone();
    let spawned = thread::Builder::new()
        .name("forecast".into())
        .spawn(move || {
            block_on(run_fetch_job(ticket, &mut server, &HostClock, &weather));
        });

    if let Err(e) = spawned {
        error!("Failed to start forecast job: {}", e);
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

fn touch_point(point: Point) -> TouchPoint {
    TouchPoint::new(
        point.x.clamp(0, DISPLAY_WIDTH_PX as i32 - 1) as u16,
        point.y.clamp(0, DISPLAY_HEIGHT_PX as i32 - 1) as u16,
    )
}

/// Press/release pair across the content area, `leftwards` like a finger
/// moving right to left.
fn swipe(app: &mut SimApp, leftwards: bool, now: Instant) {
    let (from, to) = if leftwards { (260, 60) } else { (60, 260) };
    let y = 120;
    app.handle_input(
        InputEvent::Touch(TouchEvent::Press(TouchPoint::new(from, y))),
        now,
    );
    app.handle_input(
        InputEvent::Touch(TouchEvent::Release(TouchPoint::new(to, y))),
        now,
    );
}

/// Simulator-side handles the keyboard reaches into
struct Controls {
    radio: SharedRadio,
    server: ForecastServer,
    battery: SimBattery,
}

impl Controls {
    /// Handle a key press. Returns `false` when the simulator should quit.
    fn handle_key(&self, keycode: Keycode, app: &mut SimApp, now: Instant) -> bool {
        let button = |button| InputEvent::Button(button);

        match keycode {
            Keycode::Q | Keycode::Escape => return false,
            Keycode::Left => swipe(app, true, now),
            Keycode::Right => swipe(app, false, now),
            Keycode::F1 => app.handle_input(button(HardwareButton::A), now),
            Keycode::F2 => app.handle_input(button(HardwareButton::B), now),
            Keycode::F3 => app.handle_input(button(HardwareButton::C), now),
            Keycode::S => match Credentials::new(SIM_SSID, SIM_PASSWORD) {
                Ok(credentials) => {
                    if !app.connectivity_mut().portal_mut().submit(credentials) {
                        info!("Portal is not running; press F1 first");
                    }
                }
                Err(e) => error!("Invalid simulator credentials: {}", e),
            },
            Keycode::U => self.radio.borrow_mut().force_up(),
            Keycode::L => self
                .radio
                .borrow_mut()
                .force_status(LinkStatus::ConnectionLost),
            Keycode::E => self
                .radio
                .borrow_mut()
                .force_status(LinkStatus::ConnectFailed),
            Keycode::H => info!("Forecast server now answers {:?}", self.server.cycle_mode()),
            Keycode::Plus | Keycode::KpPlus | Keycode::Equals => {
                self.battery.adjust(BATTERY_STEP)
            }
            Keycode::Minus | Keycode::KpMinus => self.battery.adjust(-BATTERY_STEP),
            Keycode::G => self.battery.toggle_charging(),
            _ => {}
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    info!("Starting linkpanel simulator");
    info!(
        "Display: {}×{} (scale {}×)",
        DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX, WINDOW_SCALE
    );
    info!("Keys: ←/→=Swipe  F1-F3=Buttons  S=Submit  U/L/E=Link  H=Server  +/-/G=Battery  Q=Quit");

    let config = load_config();
    let telemetry: &'static TelemetryCell = TELEMETRY.init(TelemetryCell::new());

    let controls = Controls {
        radio: Radio::shared(PathBuf::from(CREDENTIALS_FILE)),
        server: ForecastServer::default(),
        battery: SimBattery::new(76),
    };

    let peripherals = Peripherals {
        link: SimLink::new(controls.radio.clone()),
        portal: SimPortal::new(controls.radio.clone()),
        backlight: SimBacklight,
        battery: controls.battery.clone(),
    };
    let mut app: SimApp = App::new(
        &config,
        env!("CARGO_PKG_VERSION"),
        peripherals,
        telemetry,
        Instant::now(),
    );

    // SDL2 display and window
    let mut display =
        SimulatorDisplay::<Rgb565>::new(Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX));
    let mut framebuffer = FrameBuffer::new();

    let output_settings = OutputSettingsBuilder::new().scale(WINDOW_SCALE).build();
    let mut window = Window::new("Linkpanel Simulator", &output_settings);

    // The SDL window is lazily initialized on the first `update()` call.
    // We must call `update()` once before `events()` or it will panic.
    let _ = display.clear(Rgb565::BLACK);
    window.update(&display);

    let mut finger_down = false;

    // -----------------------------------------------------------------------
    // Main loop
    // -----------------------------------------------------------------------
    'running: loop {
        let frame_start = std::time::Instant::now();
        let now = Instant::now();

        // --- SDL events ---------------------------------------------------
        for event in window.events() {
            match event {
                SimulatorEvent::Quit => break 'running,

                SimulatorEvent::KeyDown { keycode, repeat, .. } => {
                    if repeat {
                        continue;
                    }
                    if !controls.handle_key(keycode, &mut app, now) {
                        break 'running;
                    }
                }

                SimulatorEvent::MouseButtonDown { point, .. } => {
                    finger_down = true;
                    let touch = TouchEvent::Press(touch_point(point));
                    app.handle_input(InputEvent::Touch(touch), now);
                }

                SimulatorEvent::MouseMove { point } if finger_down => {
                    let touch = TouchEvent::Drag(touch_point(point));
                    app.handle_input(InputEvent::Touch(touch), now);
                }

                SimulatorEvent::MouseButtonUp { point, .. } => {
                    finger_down = false;
                    let touch = TouchEvent::Release(touch_point(point));
                    app.handle_input(InputEvent::Touch(touch), now);
                }

                _ => {}
            }
        }

        // --- Control loop -------------------------------------------------
        match app.tick(&mut framebuffer, now) {
            Ok(Some(ticket)) => spawn_fetch(ticket, &controls.server, *app.weather()),
            Ok(None) => {}
            Err(e) => match e {},
        }

        // --- Present --------------------------------------------------------
        if let Err(e) = framebuffer.flush(&mut display) {
            match e {}
        }
        window.update(&display);

        // --- Frame pacing -------------------------------------------------
        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            thread::sleep(FRAME_DURATION - elapsed);
        }
    }

    info!("Simulator exiting");
}
