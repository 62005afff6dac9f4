//! Application context
//!
//! [`App`] owns every component of the control loop. The loop feeds it input
//! events and calls [`App::tick`] periodically; the only state shared with
//! anything else is the [`TelemetryCell`] borrowed from the caller.

use embassy_time::Instant;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use heapless::String;
use log::info;

use crate::config::{Config, WeatherConfig};
use crate::connectivity::{ConnectivityManager, ConnectivitySettings, SetupPortal, StationLink};
use crate::input::{Command, InputDispatcher, InputEvent};
use crate::power::{Backlight, BacklightController, BatteryGauge, BatteryMonitor, DimmingPolicy};
use crate::render::{DeviceInfo, RenderEngine, RenderReport, ScreenModel};
use crate::telemetry::{FetchTicket, TelemetryCell, truncated};
use crate::ui::{ColorPalette, Layout, View};

/// Hardware the application drives
pub struct Peripherals<L, P, B, G> {
    pub link: L,
    pub portal: P,
    pub backlight: B,
    pub battery: G,
}

pub struct App<'a, L, P, B, G> {
    connectivity: ConnectivityManager<L, P>,
    telemetry: &'a TelemetryCell,
    weather: WeatherConfig<'a>,
    render: RenderEngine,
    input: InputDispatcher,
    backlight: BacklightController<B>,
    battery: BatteryMonitor<G>,
    view: View,
    last_report: Option<RenderReport>,
}

impl<'a, L, P, B, G> App<'a, L, P, B, G>
where
    L: StationLink,
    P: SetupPortal,
    B: Backlight,
    G: BatteryGauge,
{
    /// Build the application and start the first connection attempt.
    pub fn new(
        config: &Config<'a>,
        build: &str,
        peripherals: Peripherals<L, P, B, G>,
        telemetry: &'a TelemetryCell,
        now: Instant,
    ) -> Self {
        let layout = Layout::new();
        let Peripherals {
            link,
            portal,
            backlight,
            battery,
        } = peripherals;

        Self {
            connectivity: ConnectivityManager::new(
                link,
                portal,
                ConnectivitySettings::from_config(config),
                now,
            ),
            telemetry,
            weather: config.weather,
            render: RenderEngine::new(
                ColorPalette::default(),
                layout,
                DeviceInfo::from_config(config, build),
            ),
            input: InputDispatcher::new(layout, now),
            backlight: BacklightController::new(backlight, DimmingPolicy::default()),
            battery: BatteryMonitor::new(battery),
            view: View::default(),
            last_report: None,
        }
    }

    /// Apply one input event.
    pub fn handle_input(&mut self, event: InputEvent, now: Instant) {
        let Some(command) = self.input.dispatch(event, self.view, now) else {
            return;
        };

        match command {
            Command::Navigate(view) => {
                if view != self.view {
                    info!("View {:?} -> {:?}", self.view, view);
                    self.view = view;
                }
            }
            Command::OpenPortal => self.connectivity.start_portal(now, false),
            Command::Retry => self.connectivity.start_connecting(now),
            Command::Forget => self.connectivity.start_portal(now, true),
        }
        self.render.mark_dirty();
    }

    /// Run one iteration of the control loop.
    ///
    /// Returns a ticket when a forecast fetch should be started; the caller
    /// hands it to [`crate::telemetry::run_fetch_job`] on its own executor.
    pub fn tick<D>(
        &mut self,
        display: &mut D,
        now: Instant,
    ) -> Result<Option<FetchTicket<'a>>, D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        if self.connectivity.tick(now) {
            self.render.mark_dirty();
        }

        let model = self.screen_model(now);
        self.last_report = Some(self.render.render(display, &model, now)?);

        let ticket = self.telemetry.try_arm(now, self.connectivity.is_connected());

        self.backlight.apply(self.input.idle_for(now));
        Ok(ticket)
    }

    /// Desired screen contents right now
    pub fn screen_model(&mut self, now: Instant) -> ScreenModel {
        let telemetry = self.telemetry.read();
        let battery = self.battery.sample(now);
        let connectivity = &self.connectivity;
        let link = connectivity.link();
        let connected = connectivity.is_connected();

        ScreenModel {
            view: self.view,
            state: connectivity.state(),
            link_status: connectivity.link_status(),
            target: connectivity
                .attempt()
                .map(|attempt| attempt.target_label.clone())
                .unwrap_or_default(),
            ssid: if connected { link.ssid() } else { String::new() },
            address: if connected { link.local_address() } else { None },
            rssi: if connected { link.rssi() } else { 0 },
            error: truncated(connectivity.error().unwrap_or_default()),
            battery,
            ticker_text: telemetry.text,
            ticker_generation: telemetry.generation,
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn weather(&self) -> &WeatherConfig<'a> {
        &self.weather
    }

    pub fn connectivity(&self) -> &ConnectivityManager<L, P> {
        &self.connectivity
    }

    pub fn connectivity_mut(&mut self) -> &mut ConnectivityManager<L, P> {
        &mut self.connectivity
    }

    pub fn render_engine(&self) -> &RenderEngine {
        &self.render
    }

    pub fn backlight(&self) -> &BacklightController<B> {
        &self.backlight
    }

    /// Outcome of the most recent render pass
    pub fn last_report(&self) -> Option<RenderReport> {
        self.last_report
    }
}
