//! The three pages and how each one lays out the screen model.
//!
//! A [`Page`] draws its whole content area and also reports where each
//! patchable [`Field`] lives, so the engine can update a single line without
//! knowing anything about the page layout.

use core::fmt::Write;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use heapless::String;

use super::painter::{Painter, Tone};
use super::{DeviceInfo, Field, PORTAL_URL, ScreenModel};
use crate::connectivity::ConnectivityState;
use crate::ui::layout::{
    CONTENT_MARGIN_PX, CONTENT_TOP_PX, DISPLAY_WIDTH_PX, INFO_ROW_HEIGHT_PX,
    STATUS_PILL_HEIGHT_PX, WIFI_PILL_HEIGHT_PX, WIFI_TITLE_HEIGHT_PX,
};
use crate::ui::{Layout, View};

/// Width of a full content line between the margins
const LINE_WIDTH_PX: u32 = DISPLAY_WIDTH_PX - 2 * CONTENT_MARGIN_PX as u32;

/// Gap between a pill and the first row below it
const PILL_GAP_PX: i32 = 12;

/// Line spacing for stacked body text
const TEXT_LINE_PX: i32 = 18;

/// Where a patchable value is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSlot {
    pub origin: Point,
    /// Width cleared before redrawing
    pub width: u32,
    /// Static text drawn in front of the value
    pub prefix: &'static str,
    pub tone: Tone,
}

impl FieldSlot {
    fn value(origin: Point, width: u32) -> Self {
        Self {
            origin,
            width,
            prefix: "",
            tone: Tone::Text,
        }
    }

    fn line(y: i32, prefix: &'static str, tone: Tone) -> Self {
        Self {
            origin: Point::new(CONTENT_MARGIN_PX, y),
            width: LINE_WIDTH_PX,
            prefix,
            tone,
        }
    }
}

/// Trait every page implements.
///
/// Pages are stateless views over the [`ScreenModel`]; all change tracking
/// lives in the render engine.
pub trait Page {
    /// Draw the content area. The caller has already cleared it.
    fn draw_page<D: DrawTarget<Color = Rgb565>>(
        &self,
        display: &mut D,
        painter: &Painter,
        layout: &Layout,
        model: &ScreenModel,
    ) -> Result<(), D::Error>;

    /// Location of `field` for the given model, or `None` when this page
    /// does not show it in that state.
    fn field_slot(&self, field: Field, model: &ScreenModel) -> Option<FieldSlot>;

    /// Draw one field at its slot, if the page shows it
    fn draw_field<D: DrawTarget<Color = Rgb565>>(
        &self,
        display: &mut D,
        painter: &Painter,
        field: Field,
        model: &ScreenModel,
    ) -> Result<bool, D::Error> {
        let Some(slot) = self.field_slot(field, model) else {
            return Ok(false);
        };
        let mut line: String<96> = String::new();
        let _ = write!(line, "{}{}", slot.prefix, field.value_text(model));
        painter.text(display, &line, slot.origin, slot.tone)?;
        Ok(true)
    }
}

/// Status: connection pill, hostname and whatever the current state needs.
pub struct StatusPage<'a> {
    info: &'a DeviceInfo,
}

impl StatusPage<'_> {
    const PILL_TOP: i32 = CONTENT_TOP_PX;
    const ROWS_TOP: i32 = Self::PILL_TOP + STATUS_PILL_HEIGHT_PX as i32 + PILL_GAP_PX;

    const fn row(index: i32) -> i32 {
        Self::ROWS_TOP + index * INFO_ROW_HEIGHT_PX
    }

    pub fn pill_area() -> Rectangle {
        Rectangle::new(
            Point::new(CONTENT_MARGIN_PX, Self::PILL_TOP),
            Size::new(LINE_WIDTH_PX, STATUS_PILL_HEIGHT_PX),
        )
    }
}

impl Page for StatusPage<'_> {
    fn draw_page<D: DrawTarget<Color = Rgb565>>(
        &self,
        display: &mut D,
        painter: &Painter,
        _layout: &Layout,
        model: &ScreenModel,
    ) -> Result<(), D::Error> {
        painter.pill(display, Self::pill_area(), model.state)?;
        painter.info_row(display, Self::row(0), "Host", &self.info.hostname)?;

        match model.state {
            ConnectivityState::Connected => {
                painter.info_row(display, Self::row(1), "SSID", "")?;
                painter.info_row(display, Self::row(2), "IP", "")?;
                painter.info_row(display, Self::row(3), "RSSI", "")?;
            }
            ConnectivityState::Portal => {
                let mut join: String<48> = String::new();
                let _ = write!(join, "1) Join {}", self.info.ap_name);
                let mut open: String<48> = String::new();
                let _ = write!(open, "2) Open {}", PORTAL_URL);

                let x = CONTENT_MARGIN_PX;
                painter.text(display, "Setup:", Point::new(x, Self::row(1)), Tone::Muted)?;
                painter.text(display, &join, Point::new(x, Self::row(2)), Tone::Text)?;
                painter.text(display, &open, Point::new(x, Self::row(3)), Tone::Text)?;
            }
            ConnectivityState::Error => {
                painter.text(
                    display,
                    "Error:",
                    Point::new(CONTENT_MARGIN_PX, Self::row(1)),
                    Tone::Muted,
                )?;
            }
            ConnectivityState::Connecting => {
                painter.text(
                    display,
                    "Tip: WiFi tab (or BtnA) for setup portal.",
                    Point::new(CONTENT_MARGIN_PX, Self::row(3)),
                    Tone::Muted,
                )?;
            }
        }

        for field in Field::ALL {
            self.draw_field(display, painter, field, model)?;
        }
        Ok(())
    }

    fn field_slot(&self, field: Field, model: &ScreenModel) -> Option<FieldSlot> {
        let value = |row| {
            let (origin, width) = Painter::info_value_slot(Self::row(row));
            Some(FieldSlot::value(origin, width))
        };
        match (model.state, field) {
            (ConnectivityState::Connected, Field::Ssid) => value(1),
            (ConnectivityState::Connected, Field::Address) => value(2),
            (ConnectivityState::Connected, Field::Rssi) => value(3),
            (ConnectivityState::Connecting, Field::Target) => {
                Some(FieldSlot::line(Self::row(1), "Connecting: ", Tone::Muted))
            }
            (ConnectivityState::Connecting, Field::LinkStatus) => {
                Some(FieldSlot::line(Self::row(2), "State: ", Tone::Muted))
            }
            (ConnectivityState::Error, Field::Error) => {
                Some(FieldSlot::line(Self::row(2), "", Tone::Text))
            }
            _ => None,
        }
    }
}

/// WiFi: details plus the Portal/Retry/Forget controls.
pub struct WiFiPage<'a> {
    info: &'a DeviceInfo,
}

impl WiFiPage<'_> {
    const TITLE_TOP: i32 = CONTENT_TOP_PX;
    const PILL_TOP: i32 = Self::TITLE_TOP + WIFI_TITLE_HEIGHT_PX;
    const ROWS_TOP: i32 = Self::PILL_TOP + WIFI_PILL_HEIGHT_PX as i32 + PILL_GAP_PX;

    const fn row(index: i32) -> i32 {
        Self::ROWS_TOP + index * INFO_ROW_HEIGHT_PX
    }

    pub fn pill_area() -> Rectangle {
        Rectangle::new(
            Point::new(CONTENT_MARGIN_PX, Self::PILL_TOP),
            Size::new(LINE_WIDTH_PX, WIFI_PILL_HEIGHT_PX),
        )
    }
}

impl Page for WiFiPage<'_> {
    fn draw_page<D: DrawTarget<Color = Rgb565>>(
        &self,
        display: &mut D,
        painter: &Painter,
        layout: &Layout,
        model: &ScreenModel,
    ) -> Result<(), D::Error> {
        painter.large_text(display, "Wi-Fi", Point::new(CONTENT_MARGIN_PX, Self::TITLE_TOP))?;
        painter.pill(display, Self::pill_area(), model.state)?;

        let x = CONTENT_MARGIN_PX;
        let y = Self::ROWS_TOP;
        match model.state {
            ConnectivityState::Connected => {
                painter.info_row(display, Self::row(0), "SSID", "")?;
                painter.info_row(display, Self::row(1), "IP", "")?;
            }
            ConnectivityState::Connecting => {
                painter.info_row(display, Self::row(0), "Try", "")?;
                painter.info_row(display, Self::row(1), "State", "")?;
            }
            ConnectivityState::Portal => {
                let mut join: String<64> = String::new();
                let _ = write!(join, "Join AP: {}", self.info.ap_name);
                if self.info.portal_secured {
                    let _ = join.push_str(" (password set)");
                }
                let mut open: String<48> = String::new();
                let _ = write!(open, "Open {}", PORTAL_URL);

                painter.text(display, "Setup portal is running.", Point::new(x, y), Tone::Muted)?;
                painter.text(display, &join, Point::new(x, y + TEXT_LINE_PX), Tone::Muted)?;
                painter.text(display, &open, Point::new(x, y + TEXT_LINE_PX * 2), Tone::Text)?;
            }
            ConnectivityState::Error => {
                painter.text(display, "WiFi error", Point::new(x, y), Tone::Muted)?;
            }
        }

        for field in Field::ALL {
            self.draw_field(display, painter, field, model)?;
        }

        let palette = &painter.palette;
        painter.button(display, layout.portal_button, palette.accent, "Portal")?;
        painter.button(display, layout.retry_button, palette.good, "Retry")?;
        painter.button(display, layout.forget_button, palette.bad, "Forget")
    }

    fn field_slot(&self, field: Field, model: &ScreenModel) -> Option<FieldSlot> {
        let value = |row| {
            let (origin, width) = Painter::info_value_slot(Self::row(row));
            Some(FieldSlot::value(origin, width))
        };
        match (model.state, field) {
            (ConnectivityState::Connected, Field::Ssid) => value(0),
            (ConnectivityState::Connected, Field::Address) => value(1),
            (ConnectivityState::Connecting, Field::Target) => value(0),
            (ConnectivityState::Connecting, Field::LinkStatus) => value(1),
            (ConnectivityState::Error, Field::Error) => Some(FieldSlot::line(
                Self::ROWS_TOP + TEXT_LINE_PX,
                "",
                Tone::Text,
            )),
            _ => None,
        }
    }
}

/// About: product name, portal instructions and build.
pub struct AboutPage<'a> {
    info: &'a DeviceInfo,
}

impl Page for AboutPage<'_> {
    fn draw_page<D: DrawTarget<Color = Rgb565>>(
        &self,
        display: &mut D,
        painter: &Painter,
        _layout: &Layout,
        _model: &ScreenModel,
    ) -> Result<(), D::Error> {
        let x = CONTENT_MARGIN_PX;
        let mut y = CONTENT_TOP_PX;

        painter.large_text(display, &self.info.product, Point::new(x, y))?;
        y += 40;

        let mut ap: String<48> = String::new();
        let _ = write!(ap, "AP: {}", self.info.ap_name);
        let mut url: String<48> = String::new();
        let _ = write!(url, "URL: {}", PORTAL_URL);
        let mut build: String<48> = String::new();
        let _ = write!(build, "Build: {}", self.info.build);

        painter.text(display, "Wi-Fi setup portal", Point::new(x, y), Tone::Muted)?;
        y += 20;
        painter.text(display, &ap, Point::new(x, y), Tone::Muted)?;
        y += 20;
        painter.text(display, &url, Point::new(x, y), Tone::Muted)?;
        y += 30;
        painter.text(display, "Tip: press BtnA for portal.", Point::new(x, y), Tone::Muted)?;
        y += 20;
        painter.text(display, &build, Point::new(x, y), Tone::Muted)
    }

    fn field_slot(&self, _field: Field, _model: &ScreenModel) -> Option<FieldSlot> {
        None
    }
}

/// Enum dispatch over the concrete pages, avoiding `dyn` and generic
/// methods on trait objects.
pub enum PageWrapper<'a> {
    Status(StatusPage<'a>),
    WiFi(WiFiPage<'a>),
    About(AboutPage<'a>),
}

impl<'a> PageWrapper<'a> {
    pub fn for_view(view: View, info: &'a DeviceInfo) -> Self {
        match view {
            View::Status => PageWrapper::Status(StatusPage { info }),
            View::WiFi => PageWrapper::WiFi(WiFiPage { info }),
            View::About => PageWrapper::About(AboutPage { info }),
        }
    }
}

impl Page for PageWrapper<'_> {
    fn draw_page<D: DrawTarget<Color = Rgb565>>(
        &self,
        display: &mut D,
        painter: &Painter,
        layout: &Layout,
        model: &ScreenModel,
    ) -> Result<(), D::Error> {
        match self {
            PageWrapper::Status(page) => page.draw_page(display, painter, layout, model),
            PageWrapper::WiFi(page) => page.draw_page(display, painter, layout, model),
            PageWrapper::About(page) => page.draw_page(display, painter, layout, model),
        }
    }

    fn field_slot(&self, field: Field, model: &ScreenModel) -> Option<FieldSlot> {
        match self {
            PageWrapper::Status(page) => page.field_slot(field, model),
            PageWrapper::WiFi(page) => page.field_slot(field, model),
            PageWrapper::About(page) => page.field_slot(field, model),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected_model() -> ScreenModel {
        ScreenModel {
            state: ConnectivityState::Connected,
            ..Default::default()
        }
    }

    #[test]
    fn test_status_slots_follow_state() {
        let info = DeviceInfo::default();
        let page = PageWrapper::for_view(View::Status, &info);

        let connected = connected_model();
        assert!(page.field_slot(Field::Rssi, &connected).is_some());
        assert!(page.field_slot(Field::Target, &connected).is_none());

        let connecting = ScreenModel::default();
        let slot = page.field_slot(Field::Target, &connecting).unwrap();
        assert_eq!(slot.prefix, "Connecting: ");
        assert!(page.field_slot(Field::Rssi, &connecting).is_none());
    }

    #[test]
    fn test_wifi_page_has_no_rssi_and_about_has_no_fields() {
        let info = DeviceInfo::default();
        let model = connected_model();
        let wifi = PageWrapper::for_view(View::WiFi, &info);
        assert!(wifi.field_slot(Field::Ssid, &model).is_some());
        assert!(wifi.field_slot(Field::Rssi, &model).is_none());

        let about = PageWrapper::for_view(View::About, &info);
        for field in Field::ALL {
            assert!(about.field_slot(field, &model).is_none());
        }
    }

    #[test]
    fn test_slots_stay_inside_content_area() {
        let info = DeviceInfo::default();
        let layout = Layout::new();
        let states = [
            ConnectivityState::Connecting,
            ConnectivityState::Connected,
            ConnectivityState::Portal,
            ConnectivityState::Error,
        ];
        for view in View::ALL {
            let page = PageWrapper::for_view(view, &info);
            let bottom = if view == View::WiFi {
                layout.portal_button.top_left.y
            } else {
                layout.footer.top_left.y
            };
            for state in states {
                let model = ScreenModel {
                    state,
                    ..Default::default()
                };
                for field in Field::ALL {
                    if let Some(slot) = page.field_slot(field, &model) {
                        assert!(slot.origin.y >= layout.tab_status.size.height as i32);
                        assert!(slot.origin.y + 18 <= bottom);
                    }
                }
            }
        }
    }
}
