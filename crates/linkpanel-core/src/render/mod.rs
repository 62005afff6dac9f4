//! Incremental render engine
//!
//! Every tick the engine compares what the application wants on screen (a
//! [`ScreenModel`]) against what it last drew (a [`RenderSnapshot`]) and
//! redraws as little as possible: the whole screen after a view or state
//! change, single text lines when a value changes, and only the footer strip
//! for the scrolling ticker and battery.

mod engine;
pub mod painter;
pub mod pages;
pub mod ticker;

pub use engine::{FooterPass, RenderEngine, RenderPass, RenderReport};
pub use painter::{Painter, Tone};
pub use pages::{FieldSlot, Page, PageWrapper};

use core::fmt::Write;
use core::net::Ipv4Addr;

use heapless::String;

use crate::config::{Config, SSID_MAX_LEN};
use crate::connectivity::{ConnectivityState, LinkStatus};
use crate::power::BatteryReading;
use crate::telemetry::{TelemetryText, truncated};
use crate::ui::View;

pub const ERROR_TEXT_CAPACITY: usize = 48;

/// Address the setup portal serves its page on
pub const PORTAL_URL: &str = "http://192.168.4.1";

/// Everything the screen can show, sampled once per tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenModel {
    pub view: View,
    pub state: ConnectivityState,
    pub link_status: LinkStatus,
    /// Network being joined while connecting
    pub target: String<SSID_MAX_LEN>,
    pub ssid: String<SSID_MAX_LEN>,
    pub address: Option<Ipv4Addr>,
    pub rssi: i32,
    pub error: String<ERROR_TEXT_CAPACITY>,
    pub battery: BatteryReading,
    pub ticker_text: TelemetryText,
    pub ticker_generation: u32,
}

impl Default for ScreenModel {
    fn default() -> Self {
        Self {
            view: View::default(),
            state: ConnectivityState::Connecting,
            link_status: LinkStatus::Idle,
            target: String::new(),
            ssid: String::new(),
            address: None,
            rssi: 0,
            error: String::new(),
            battery: BatteryReading {
                percent: 0,
                charging: false,
            },
            ticker_text: TelemetryText::new(),
            ticker_generation: 0,
        }
    }
}

/// What was last drawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSnapshot {
    pub model: ScreenModel,
    pub scroll_offset: u32,
}

/// Values that can be patched in place without repainting the view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    LinkStatus,
    Target,
    Ssid,
    Address,
    Rssi,
    Error,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::LinkStatus,
        Field::Target,
        Field::Ssid,
        Field::Address,
        Field::Rssi,
        Field::Error,
    ];

    pub fn differs(self, drawn: &ScreenModel, wanted: &ScreenModel) -> bool {
        match self {
            Field::LinkStatus => drawn.link_status != wanted.link_status,
            Field::Target => drawn.target != wanted.target,
            Field::Ssid => drawn.ssid != wanted.ssid,
            Field::Address => drawn.address != wanted.address,
            Field::Rssi => drawn.rssi != wanted.rssi,
            Field::Error => drawn.error != wanted.error,
        }
    }

    pub fn copy(self, from: &ScreenModel, to: &mut ScreenModel) {
        match self {
            Field::LinkStatus => to.link_status = from.link_status,
            Field::Target => to.target = from.target.clone(),
            Field::Ssid => to.ssid = from.ssid.clone(),
            Field::Address => to.address = from.address,
            Field::Rssi => to.rssi = from.rssi,
            Field::Error => to.error = from.error.clone(),
        }
    }

    /// Text shown for this field
    pub fn value_text(self, model: &ScreenModel) -> String<64> {
        let mut out = String::new();
        // Every value fits in 64 bytes
        let _ = match self {
            Field::LinkStatus => out.write_str(model.link_status.label()),
            Field::Target => out.write_str(&model.target),
            Field::Ssid => out.write_str(&model.ssid),
            Field::Address => match model.address {
                Some(address) => write!(out, "{}", address),
                None => out.write_str("--"),
            },
            Field::Rssi => write!(out, "{} dBm", model.rssi),
            Field::Error => out.write_str(&model.error),
        };
        out
    }
}

/// Fixed facts about the device shown on the pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub product: String<32>,
    pub hostname: String<32>,
    pub ap_name: String<SSID_MAX_LEN>,
    pub portal_secured: bool,
    pub build: String<32>,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self::from_config(&Config::default(), "")
    }
}

impl DeviceInfo {
    pub fn from_config(config: &Config<'_>, build: &str) -> Self {
        Self {
            product: truncated("Core2 Home Automation"),
            hostname: truncated(config.internet.hostname),
            ap_name: truncated(config.portal.ap_name),
            portal_secured: config.portal_password().is_some(),
            build: truncated(build),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_values() {
        let model = ScreenModel {
            ssid: String::try_from("HomeNet").unwrap(),
            address: Some(Ipv4Addr::new(192, 168, 1, 42)),
            rssi: -58,
            link_status: LinkStatus::ConnectFailed,
            ..Default::default()
        };
        assert_eq!(Field::Ssid.value_text(&model).as_str(), "HomeNet");
        assert_eq!(Field::Address.value_text(&model).as_str(), "192.168.1.42");
        assert_eq!(Field::Rssi.value_text(&model).as_str(), "-58 dBm");
        assert_eq!(Field::LinkStatus.value_text(&model).as_str(), "AUTH FAIL");
        assert_eq!(
            Field::Address.value_text(&ScreenModel::default()).as_str(),
            "--"
        );
    }

    #[test]
    fn test_copy_makes_fields_equal() {
        let drawn = ScreenModel::default();
        let wanted = ScreenModel {
            rssi: -70,
            error: String::try_from("Portal timeout").unwrap(),
            ..Default::default()
        };
        let mut snapshot = drawn.clone();
        for field in Field::ALL {
            if field.differs(&snapshot, &wanted) {
                field.copy(&wanted, &mut snapshot);
            }
        }
        assert_eq!(snapshot, wanted);
    }
}
