//! Fixed screen geometry
//!
//! The appliance has a single 320x240 panel, so every rectangle is computed
//! once at compile time. The render engine draws into these rectangles and
//! the input dispatcher hit-tests against the same values.

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use super::core::{TouchPoint, View};

pub const DISPLAY_WIDTH_PX: u32 = 320;
pub const DISPLAY_HEIGHT_PX: u32 = 240;

/// Height of the tab bar across the top of the screen
pub const TOP_BAR_HEIGHT_PX: u32 = 34;

/// Height of the footer strip (ticker + battery)
pub const FOOTER_HEIGHT_PX: u32 = 24;

/// Horizontal margin of page content
pub const CONTENT_MARGIN_PX: i32 = 12;

/// First content row below the tab bar
pub const CONTENT_TOP_PX: i32 = TOP_BAR_HEIGHT_PX as i32 + 14;

/// Spacing between information rows
pub const INFO_ROW_HEIGHT_PX: i32 = 24;

/// Height cleared when a single text line is patched
pub const LINE_CLEAR_HEIGHT_PX: u32 = 18;

/// X position of row labels ("SSID", "IP", ...)
pub const INFO_LABEL_X_PX: i32 = CONTENT_MARGIN_PX;

/// X position of row values
pub const INFO_VALUE_X_PX: i32 = 108;

/// Width available to a row value
pub const INFO_VALUE_WIDTH_PX: u32 =
    DISPLAY_WIDTH_PX - INFO_VALUE_X_PX as u32 - CONTENT_MARGIN_PX as u32;

/// Status pill height on the Status view
pub const STATUS_PILL_HEIGHT_PX: u32 = 28;

/// Status pill height on the WiFi view
pub const WIFI_PILL_HEIGHT_PX: u32 = 24;

/// Vertical space taken by the WiFi view title
pub const WIFI_TITLE_HEIGHT_PX: i32 = 34;

const TAB_WIDTH_PX: u32 = DISPLAY_WIDTH_PX / 3;

const BUTTON_GAP_PX: u32 = 8;
const BUTTON_WIDTH_PX: u32 = (DISPLAY_WIDTH_PX - 24 - BUTTON_GAP_PX * 2) / 3;
const BUTTON_HEIGHT_PX: u32 = 34;
const BUTTON_TOP_PX: i32 =
    (DISPLAY_HEIGHT_PX - FOOTER_HEIGHT_PX - BUTTON_HEIGHT_PX - 8) as i32;

/// Battery glyph body size; the nub adds 3px on the right
pub const BATTERY_WIDTH_PX: u32 = 28;
pub const BATTERY_HEIGHT_PX: u32 = 12;
pub const BATTERY_NUB_WIDTH_PX: u32 = 3;
pub const BATTERY_NUB_HEIGHT_PX: u32 = 6;

const FOOTER_PADDING_PX: i32 = 8;

/// Named touch targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitRegion {
    Tab(View),
    PortalButton,
    RetryButton,
    ForgetButton,
}

/// Every rectangle the UI draws into or hit-tests against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub screen: Rectangle,
    pub tab_status: Rectangle,
    pub tab_wifi: Rectangle,
    pub tab_about: Rectangle,
    pub portal_button: Rectangle,
    pub retry_button: Rectangle,
    pub forget_button: Rectangle,
    pub footer: Rectangle,
    pub battery: Point,
    pub ticker: Rectangle,
}

impl Default for Layout {
    fn default() -> Self {
        Self::new()
    }
}

impl Layout {
    pub const fn new() -> Self {
        let footer_top = (DISPLAY_HEIGHT_PX - FOOTER_HEIGHT_PX) as i32;
        let battery_x = DISPLAY_WIDTH_PX as i32
            - FOOTER_PADDING_PX
            - BATTERY_WIDTH_PX as i32
            - BATTERY_NUB_WIDTH_PX as i32;
        let ticker_width = (battery_x - FOOTER_PADDING_PX - 8) as u32;

        Self {
            screen: Rectangle::new(
                Point::zero(),
                Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX),
            ),
            tab_status: Rectangle::new(
                Point::new(0, 0),
                Size::new(TAB_WIDTH_PX, TOP_BAR_HEIGHT_PX),
            ),
            tab_wifi: Rectangle::new(
                Point::new(TAB_WIDTH_PX as i32, 0),
                Size::new(TAB_WIDTH_PX, TOP_BAR_HEIGHT_PX),
            ),
            tab_about: Rectangle::new(
                Point::new(TAB_WIDTH_PX as i32 * 2, 0),
                Size::new(DISPLAY_WIDTH_PX - TAB_WIDTH_PX * 2, TOP_BAR_HEIGHT_PX),
            ),
            portal_button: Rectangle::new(
                Point::new(CONTENT_MARGIN_PX, BUTTON_TOP_PX),
                Size::new(BUTTON_WIDTH_PX, BUTTON_HEIGHT_PX),
            ),
            retry_button: Rectangle::new(
                Point::new(
                    CONTENT_MARGIN_PX + (BUTTON_WIDTH_PX + BUTTON_GAP_PX) as i32,
                    BUTTON_TOP_PX,
                ),
                Size::new(BUTTON_WIDTH_PX, BUTTON_HEIGHT_PX),
            ),
            forget_button: Rectangle::new(
                Point::new(
                    CONTENT_MARGIN_PX + (BUTTON_WIDTH_PX + BUTTON_GAP_PX) as i32 * 2,
                    BUTTON_TOP_PX,
                ),
                Size::new(BUTTON_WIDTH_PX, BUTTON_HEIGHT_PX),
            ),
            footer: Rectangle::new(
                Point::new(0, footer_top),
                Size::new(DISPLAY_WIDTH_PX, FOOTER_HEIGHT_PX),
            ),
            battery: Point::new(
                battery_x,
                footer_top + (FOOTER_HEIGHT_PX - BATTERY_HEIGHT_PX) as i32 / 2,
            ),
            ticker: Rectangle::new(
                Point::new(FOOTER_PADDING_PX, footer_top + 1),
                Size::new(ticker_width, FOOTER_HEIGHT_PX - 1),
            ),
        }
    }

    /// Tab rectangle for a view
    pub const fn tab(&self, view: View) -> Rectangle {
        match view {
            View::Status => self.tab_status,
            View::WiFi => self.tab_wifi,
            View::About => self.tab_about,
        }
    }

    /// Find the touch target under a point, if any.
    ///
    /// Action buttons are reported regardless of the active view; the
    /// dispatcher decides whether they are live.
    pub fn hit_test(&self, point: TouchPoint) -> Option<HitRegion> {
        let p = point.to_point();
        let regions = [
            (self.tab_status, HitRegion::Tab(View::Status)),
            (self.tab_wifi, HitRegion::Tab(View::WiFi)),
            (self.tab_about, HitRegion::Tab(View::About)),
            (self.portal_button, HitRegion::PortalButton),
            (self.retry_button, HitRegion::RetryButton),
            (self.forget_button, HitRegion::ForgetButton),
        ];
        regions
            .iter()
            .find(|(rect, _)| rect.contains(p))
            .map(|(_, region)| *region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tabs_cover_full_width() {
        let layout = Layout::new();
        let total = layout.tab_status.size.width
            + layout.tab_wifi.size.width
            + layout.tab_about.size.width;
        assert_eq!(total, DISPLAY_WIDTH_PX);
    }

    #[test]
    fn test_hit_test_regions() {
        let layout = Layout::new();
        assert_eq!(
            layout.hit_test(TouchPoint::new(10, 10)),
            Some(HitRegion::Tab(View::Status))
        );
        assert_eq!(
            layout.hit_test(TouchPoint::new(160, 10)),
            Some(HitRegion::Tab(View::WiFi))
        );
        assert_eq!(
            layout.hit_test(TouchPoint::new(319, 33)),
            Some(HitRegion::Tab(View::About))
        );
        assert_eq!(layout.hit_test(TouchPoint::new(160, 34)), None);

        let retry = layout.retry_button.center();
        assert_eq!(
            layout.hit_test(TouchPoint::new(retry.x as u16, retry.y as u16)),
            Some(HitRegion::RetryButton)
        );
    }

    #[test]
    fn test_ticker_leaves_room_for_battery() {
        let layout = Layout::new();
        let ticker_right = layout.ticker.top_left.x + layout.ticker.size.width as i32;
        assert!(ticker_right < layout.battery.x);
        assert_eq!(layout.ticker.size.width, 265);
    }
}
