//! Hardware-independent core library for linkpanel
//!
//! This crate contains the platform-agnostic control logic of the linkpanel
//! appliance: the connectivity lifecycle state machine, the telemetry mailbox
//! shared with the background forecast job, the incremental render engine,
//! input dispatch, and the backlight/battery policy.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets and desktop hosts (for the simulator and tests). Every
//! piece of hardware is reached through a narrow trait; see
//! [`connectivity::StationLink`], [`connectivity::SetupPortal`],
//! [`telemetry::HttpFetch`], [`power::BatteryGauge`] and [`power::Backlight`].

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod app;
pub mod config;
pub mod connectivity;
pub mod framebuffer;
pub mod input;
pub mod power;
pub mod render;
pub mod telemetry;
pub mod ui;

pub use app::{App, Peripherals};
pub use config::{Config, Credentials};
pub use connectivity::{ConnectivityManager, ConnectivityState, LinkStatus};
pub use render::RenderEngine;
pub use telemetry::TelemetryCell;
