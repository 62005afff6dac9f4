use embassy_time::{Duration, Instant};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::{debug, trace};

use super::pages::{Page, PageWrapper};
use super::painter::{Painter, Tone};
use super::ticker::{self, TickerPlacement};
use super::{DeviceInfo, Field, RenderSnapshot, ScreenModel};
use crate::ui::{ColorPalette, Layout, View};

/// Cadence of the field-by-field comparison
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Cadence of the footer (ticker scroll and battery)
pub const FOOTER_INTERVAL: Duration = Duration::from_millis(250);

/// What happened to the area above the footer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPass {
    Idle,
    Full,
    /// Number of fields redrawn in place
    Patched(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FooterPass {
    Idle,
    Ticker,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderReport {
    pub body: RenderPass,
    pub footer: FooterPass,
}

/// Owns the dirty flag and the snapshot of what is on screen.
pub struct RenderEngine {
    painter: Painter,
    layout: Layout,
    info: DeviceInfo,
    snapshot: Option<RenderSnapshot>,
    dirty: bool,
    next_refresh: Instant,
    next_footer_tick: Instant,
}

impl RenderEngine {
    pub fn new(palette: ColorPalette, layout: Layout, info: DeviceInfo) -> Self {
        Self {
            painter: Painter::new(palette),
            layout,
            info,
            snapshot: None,
            dirty: true,
            next_refresh: Instant::from_ticks(0),
            next_footer_tick: Instant::from_ticks(0),
        }
    }

    /// Request a full repaint on the next pass
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn snapshot(&self) -> Option<&RenderSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Bring the screen in line with `model`, drawing as little as possible.
    pub fn render<D>(
        &mut self,
        display: &mut D,
        model: &ScreenModel,
        now: Instant,
    ) -> Result<RenderReport, D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let body = if self.dirty || self.snapshot.is_none() {
            self.repaint_full(display, model, now)?;
            RenderPass::Full
        } else if now >= self.next_refresh {
            self.next_refresh = now + REFRESH_INTERVAL;
            match self.patch(display, model)? {
                Some(count) => RenderPass::Patched(count),
                None => {
                    self.repaint_full(display, model, now)?;
                    RenderPass::Full
                }
            }
        } else {
            RenderPass::Idle
        };

        let footer = if body == RenderPass::Full {
            FooterPass::Idle
        } else {
            self.footer_tick(display, model, now)?
        };

        Ok(RenderReport { body, footer })
    }

    /// Redraw everything and overwrite the snapshot.
    pub fn repaint_full<D>(
        &mut self,
        display: &mut D,
        model: &ScreenModel,
        now: Instant,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        debug!("Full repaint ({:?}, {:?})", model.view, model.state);

        display.clear(self.painter.palette.background)?;
        for view in View::ALL {
            self.painter
                .tab(display, self.layout.tab(view), view.title(), view == model.view)?;
        }

        let page = PageWrapper::for_view(model.view, &self.info);
        page.draw_page(display, &self.painter, &self.layout, model)?;

        // Keep scrolling where it was unless the text itself changed
        let text_width = Painter::text_width(&model.ticker_text);
        let scroll_offset = match &self.snapshot {
            Some(drawn)
                if drawn.model.ticker_generation == model.ticker_generation
                    && text_width > self.layout.ticker.size.width =>
            {
                drawn.scroll_offset
            }
            _ => 0,
        };
        draw_footer(display, &self.painter, &self.layout, model, scroll_offset)?;

        self.snapshot = Some(RenderSnapshot {
            model: model.clone(),
            scroll_offset,
        });
        self.dirty = false;
        self.next_refresh = now + REFRESH_INTERVAL;
        self.next_footer_tick = now + FOOTER_INTERVAL;
        Ok(())
    }

    /// Redraw only the fields of the active page that changed.
    ///
    /// Returns `None` when the page or state on screen no longer matches the
    /// model, in which case nothing was drawn and a full repaint is needed.
    fn patch<D>(&mut self, display: &mut D, model: &ScreenModel) -> Result<Option<usize>, D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let Some(snapshot) = self.snapshot.as_mut() else {
            return Ok(None);
        };
        if snapshot.model.view != model.view || snapshot.model.state != model.state {
            debug!("Layout changed under patch, escalating to full repaint");
            return Ok(None);
        }

        let page = PageWrapper::for_view(model.view, &self.info);
        let mut patched = 0;
        for field in Field::ALL {
            if !field.differs(&snapshot.model, model) {
                continue;
            }
            if let Some(slot) = page.field_slot(field, model) {
                trace!("Patching {:?}", field);
                self.painter.clear_line(display, slot.origin, slot.width)?;
                page.draw_field(display, &self.painter, field, model)?;
                patched += 1;
            }
            field.copy(model, &mut snapshot.model);
        }
        Ok(Some(patched))
    }

    fn footer_tick<D>(
        &mut self,
        display: &mut D,
        model: &ScreenModel,
        now: Instant,
    ) -> Result<FooterPass, D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        if now < self.next_footer_tick {
            return Ok(FooterPass::Idle);
        }
        self.next_footer_tick = now + FOOTER_INTERVAL;

        let Some(snapshot) = self.snapshot.as_mut() else {
            return Ok(FooterPass::Idle);
        };

        let new_text = snapshot.model.ticker_generation != model.ticker_generation;
        let text_width = Painter::text_width(&model.ticker_text);
        let area_width = self.layout.ticker.size.width;

        let (pass, offset) = if snapshot.model.battery != model.battery {
            let offset = if new_text { 0 } else { snapshot.scroll_offset };
            draw_footer(display, &self.painter, &self.layout, model, offset)?;
            (FooterPass::Full, offset)
        } else if new_text {
            draw_ticker(display, &self.painter, &self.layout, &model.ticker_text, 0)?;
            (FooterPass::Ticker, 0)
        } else {
            let offset = ticker::advance(text_width, area_width, snapshot.scroll_offset);
            if offset == snapshot.scroll_offset {
                return Ok(FooterPass::Idle);
            }
            draw_ticker(display, &self.painter, &self.layout, &model.ticker_text, offset)?;
            (FooterPass::Ticker, offset)
        };

        snapshot.model.battery = model.battery;
        snapshot.model.ticker_text = model.ticker_text.clone();
        snapshot.model.ticker_generation = model.ticker_generation;
        snapshot.scroll_offset = offset;
        Ok(pass)
    }
}

fn draw_footer<D>(
    display: &mut D,
    painter: &Painter,
    layout: &Layout,
    model: &ScreenModel,
    offset: u32,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let footer = layout.footer;
    display.fill_solid(&footer, painter.palette.panel)?;
    display.fill_solid(
        &Rectangle::new(footer.top_left, Size::new(footer.size.width, 1)),
        painter.palette.muted,
    )?;
    painter.battery(display, layout.battery, model.battery)?;
    draw_ticker(display, painter, layout, &model.ticker_text, offset)
}

fn draw_ticker<D>(
    display: &mut D,
    painter: &Painter,
    layout: &Layout,
    text: &str,
    offset: u32,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let area = layout.ticker;
    display.fill_solid(&area, painter.palette.panel)?;

    let mut clipped = display.clipped(&area);
    let x = area.top_left.x;
    let y = area.top_left.y + (area.size.height as i32 - TEXT_HEIGHT_PX) / 2;
    match ticker::placement(Painter::text_width(text), area.size.width, offset) {
        TickerPlacement::Fixed => painter.text(&mut clipped, text, Point::new(x, y), Tone::Text),
        TickerPlacement::Scrolling { first_x, second_x } => {
            painter.text(&mut clipped, text, Point::new(x + first_x, y), Tone::Text)?;
            painter.text(&mut clipped, text, Point::new(x + second_x, y), Tone::Text)
        }
    }
}

/// Glyph cell height of the body font
const TEXT_HEIGHT_PX: i32 = 13;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::{ConnectivityState, LinkStatus};
    use crate::framebuffer::FrameBuffer;
    use crate::power::BatteryReading;
    use crate::render::pages::StatusPage;
    use crate::telemetry::TelemetryText;
    use core::net::Ipv4Addr;
    use heapless::String;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    fn engine() -> RenderEngine {
        RenderEngine::new(ColorPalette::default(), Layout::new(), DeviceInfo::default())
    }

    fn connected() -> ScreenModel {
        ScreenModel {
            view: View::Status,
            state: ConnectivityState::Connected,
            link_status: LinkStatus::Connected,
            ssid: String::try_from("HomeNet").unwrap(),
            address: Some(Ipv4Addr::new(192, 168, 1, 42)),
            rssi: -58,
            battery: BatteryReading {
                percent: 80,
                charging: false,
            },
            ticker_text: TelemetryText::try_from("Weather: (waiting for WiFi)").unwrap(),
            ..Default::default()
        }
    }

    fn contains(outer: &Rectangle, inner: &Rectangle) -> bool {
        inner.size == Size::zero()
            || (outer.contains(inner.top_left)
                && inner.bottom_right().is_some_and(|corner| outer.contains(corner)))
    }

    fn same_pixels(a: &FrameBuffer, b: &FrameBuffer, area: &Rectangle) -> bool {
        area.points().all(|p| a.pixel(p) == b.pixel(p))
    }

    /// Render `model` and leave the engine and buffer past the first full pass
    fn settled(model: &ScreenModel) -> (RenderEngine, FrameBuffer) {
        let mut engine = engine();
        let mut fb = FrameBuffer::new();
        let report = engine.render(&mut fb, model, at(0)).unwrap();
        assert_eq!(report.body, RenderPass::Full);
        fb.take_written();
        (engine, fb)
    }

    #[test]
    fn test_first_pass_is_full_and_snapshots_model() {
        let mut engine = engine();
        let mut fb = FrameBuffer::new();
        let model = connected();
        assert!(engine.is_dirty());

        let report = engine.render(&mut fb, &model, at(0)).unwrap();
        assert_eq!(report.body, RenderPass::Full);
        assert!(!engine.is_dirty());
        assert_eq!(engine.snapshot().unwrap().model, model);
        assert_eq!(fb.take_written(), Some(Layout::new().screen));
    }

    #[test]
    fn test_connected_status_view_contents() {
        let model = connected();
        let (_engine, fb) = settled(&model);
        let palette = ColorPalette::default();

        let pill = StatusPage::pill_area();
        assert!(fb.count_color(&pill, palette.good) > pill.size.width as usize * 10);

        // Compare the SSID/IP/RSSI values against a reference drawing
        let painter = Painter::new(palette);
        let mut reference = FrameBuffer::new();
        reference.clear(palette.background).unwrap();
        let rows = [(112, "HomeNet"), (136, "192.168.1.42"), (160, "-58 dBm")];
        for (y, value) in rows {
            painter.text(&mut reference, value, Point::new(108, y), Tone::Text).unwrap();
        }
        for (y, _) in rows {
            let area = Rectangle::new(Point::new(108, y), Size::new(200, 18));
            assert!(same_pixels(&fb, &reference, &area), "row at y={}", y);
        }
    }

    #[test]
    fn test_unchanged_model_draws_nothing() {
        let model = connected();
        let (mut engine, mut fb) = settled(&model);

        let report = engine.render(&mut fb, &model, at(1000)).unwrap();
        assert_eq!(report.body, RenderPass::Patched(0));
        assert_eq!(report.footer, FooterPass::Idle);
        assert_eq!(fb.take_written(), None);
    }

    #[test]
    fn test_patch_waits_for_cadence() {
        let mut model = connected();
        let (mut engine, mut fb) = settled(&model);
        model.rssi = -61;

        let report = engine.render(&mut fb, &model, at(500)).unwrap();
        assert_eq!(report.body, RenderPass::Idle);
        assert_eq!(engine.snapshot().unwrap().model.rssi, -58);
    }

    #[test]
    fn test_rssi_change_redraws_only_its_row() {
        let mut model = connected();
        let (mut engine, mut fb) = settled(&model);
        model.rssi = -61;

        let report = engine.render(&mut fb, &model, at(1000)).unwrap();
        assert_eq!(report.body, RenderPass::Patched(1));

        let row = Rectangle::new(Point::new(108, 160), Size::new(200, 18));
        let written = fb.take_written().unwrap();
        assert!(contains(&row, &written), "wrote {:?}", written);
        assert_eq!(engine.snapshot().unwrap().model, model);
    }

    #[test]
    fn test_hidden_field_is_copied_without_drawing() {
        let mut model = connected();
        model.view = View::WiFi;
        let (mut engine, mut fb) = settled(&model);
        model.rssi = -75;

        let report = engine.render(&mut fb, &model, at(1000)).unwrap();
        assert_eq!(report.body, RenderPass::Patched(0));
        assert_eq!(fb.take_written(), None);
        assert_eq!(engine.snapshot().unwrap().model.rssi, -75);
    }

    #[test]
    fn test_view_mismatch_escalates_to_full() {
        let mut model = connected();
        let (mut engine, mut fb) = settled(&model);
        model.view = View::About;

        let report = engine.render(&mut fb, &model, at(1000)).unwrap();
        assert_eq!(report.body, RenderPass::Full);
        assert_eq!(engine.snapshot().unwrap().model.view, View::About);
    }

    #[test]
    fn test_dirty_flag_forces_immediate_full_repaint() {
        let mut model = connected();
        let (mut engine, mut fb) = settled(&model);
        model.state = ConnectivityState::Connecting;
        engine.mark_dirty();

        let report = engine.render(&mut fb, &model, at(10)).unwrap();
        assert_eq!(report.body, RenderPass::Full);
        assert!(!engine.is_dirty());
        assert_eq!(fb.take_written(), Some(Layout::new().screen));
    }

    #[test]
    fn test_active_tab_is_highlighted() {
        let mut model = connected();
        model.view = View::WiFi;
        let (engine, fb) = settled(&model);
        let palette = ColorPalette::default();
        let layout = engine.layout();

        let probe = |rect: Rectangle| rect.top_left + Point::new(2, 2);
        assert_eq!(fb.pixel(probe(layout.tab_wifi)), Some(palette.accent));
        assert_eq!(fb.pixel(probe(layout.tab_status)), Some(palette.panel));
        assert_eq!(fb.pixel(probe(layout.tab_about)), Some(palette.panel));
    }

    #[test]
    fn test_new_generation_redraws_ticker_only() {
        let mut model = connected();
        let (mut engine, mut fb) = settled(&model);
        model.ticker_text = TelemetryText::try_from("DK: 9°C Rain | Today 5–11°C Cloudy").unwrap();
        model.ticker_generation = 1;

        let report = engine.render(&mut fb, &model, at(250)).unwrap();
        assert_eq!(report.body, RenderPass::Idle);
        assert_eq!(report.footer, FooterPass::Ticker);
        let written = fb.take_written().unwrap();
        assert!(contains(&engine.layout().ticker, &written));
        assert_eq!(engine.snapshot().unwrap().model.ticker_generation, 1);
        assert_eq!(engine.snapshot().unwrap().scroll_offset, 0);
    }

    #[test]
    fn test_battery_change_redraws_footer() {
        let mut model = connected();
        let (mut engine, mut fb) = settled(&model);
        model.battery.charging = true;

        let report = engine.render(&mut fb, &model, at(250)).unwrap();
        assert_eq!(report.footer, FooterPass::Full);
        assert_eq!(fb.take_written(), Some(engine.layout().footer));
    }

    #[test]
    fn test_long_text_scrolls_inside_ticker_area() {
        let mut model = connected();
        model.ticker_text =
            TelemetryText::try_from("DK: 9°C Rain | Today 5–11°C Cloudy | Tomorrow 7–13°C Mostly clear")
                .unwrap();
        let (mut engine, mut fb) = settled(&model);
        assert!(Painter::text_width(&model.ticker_text) > engine.layout().ticker.size.width);

        for tick in 1..=3u64 {
            let report = engine.render(&mut fb, &model, at(tick * 250)).unwrap();
            assert_eq!(report.footer, FooterPass::Ticker);
            assert_eq!(engine.snapshot().unwrap().scroll_offset, tick as u32 * 2);
            let written = fb.take_written().unwrap();
            assert!(contains(&engine.layout().ticker, &written));
        }
    }

    #[test]
    fn test_short_text_never_scrolls() {
        let model = connected();
        let (mut engine, mut fb) = settled(&model);
        for tick in 1..=3u64 {
            let report = engine.render(&mut fb, &model, at(tick * 250)).unwrap();
            assert_eq!(report.footer, FooterPass::Idle);
        }
        assert_eq!(engine.snapshot().unwrap().scroll_offset, 0);
        assert_eq!(fb.take_written(), None);
    }
}
