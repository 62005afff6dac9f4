//! Drawing primitives shared by every page and the footer

use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::mono_font::iso_8859_1::{FONT_7X13, FONT_10X20};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{
    Line, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle, RoundedRectangle,
};
use embedded_graphics::text::renderer::TextRenderer;
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyle, TextStyleBuilder};

use crate::connectivity::ConnectivityState;
use crate::power::BatteryReading;
use crate::ui::ColorPalette;
use crate::ui::layout::{
    BATTERY_HEIGHT_PX, BATTERY_NUB_HEIGHT_PX, BATTERY_NUB_WIDTH_PX, BATTERY_WIDTH_PX,
    INFO_LABEL_X_PX, INFO_VALUE_WIDTH_PX, INFO_VALUE_X_PX, LINE_CLEAR_HEIGHT_PX,
};

const PILL_RADIUS_PX: u32 = 12;
const BUTTON_RADIUS_PX: u32 = 10;

/// Text color role, resolved against the palette at draw time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Text,
    Muted,
}

#[derive(Debug, Clone, Copy)]
pub struct Painter {
    pub palette: ColorPalette,
}

impl Painter {
    pub fn new(palette: ColorPalette) -> Self {
        Self { palette }
    }

    pub fn tone(&self, tone: Tone) -> Rgb565 {
        match tone {
            Tone::Text => self.palette.text,
            Tone::Muted => self.palette.muted,
        }
    }

    fn body_style(color: Rgb565) -> MonoTextStyle<'static, Rgb565> {
        MonoTextStyle::new(&FONT_7X13, color)
    }

    fn centered() -> TextStyle {
        TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Middle)
            .build()
    }

    /// Pixel width of `text` in the body font
    pub fn text_width(text: &str) -> u32 {
        Self::body_style(Rgb565::WHITE)
            .measure_string(text, Point::zero(), Baseline::Top)
            .bounding_box
            .size
            .width
    }

    /// Body text with its top-left corner at `origin`
    pub fn text<D>(
        &self,
        display: &mut D,
        text: &str,
        origin: Point,
        tone: Tone,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        Text::with_baseline(text, origin, Self::body_style(self.tone(tone)), Baseline::Top)
            .draw(display)?;
        Ok(())
    }

    /// Title text with its top-left corner at `origin`
    pub fn large_text<D>(&self, display: &mut D, text: &str, origin: Point) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let style = MonoTextStyle::new(&FONT_10X20, self.palette.text);
        Text::with_baseline(text, origin, style, Baseline::Top).draw(display)?;
        Ok(())
    }

    fn centered_text<D>(
        &self,
        display: &mut D,
        text: &str,
        center: Point,
        color: Rgb565,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        Text::with_text_style(text, center, Self::body_style(color), Self::centered())
            .draw(display)?;
        Ok(())
    }

    /// Blank one text line before it is redrawn
    pub fn clear_line<D>(&self, display: &mut D, origin: Point, width: u32) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        display.fill_solid(
            &Rectangle::new(origin, Size::new(width, LINE_CLEAR_HEIGHT_PX)),
            self.palette.background,
        )
    }

    /// Muted label on the left, value on the right
    pub fn info_row<D>(
        &self,
        display: &mut D,
        y: i32,
        label: &str,
        value: &str,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        self.text(display, label, Point::new(INFO_LABEL_X_PX, y), Tone::Muted)?;
        self.text(display, value, Point::new(INFO_VALUE_X_PX, y), Tone::Text)
    }

    /// Origin and width of the value half of an info row
    pub fn info_value_slot(y: i32) -> (Point, u32) {
        (Point::new(INFO_VALUE_X_PX, y), INFO_VALUE_WIDTH_PX)
    }

    pub fn tab<D>(
        &self,
        display: &mut D,
        area: Rectangle,
        label: &str,
        active: bool,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let (fill, text) = if active {
            (self.palette.accent, self.palette.background)
        } else {
            (self.palette.panel, self.palette.muted)
        };
        display.fill_solid(&area, fill)?;
        self.centered_text(display, label, area.center(), text)
    }

    /// Rounded status badge filled with the state color
    pub fn pill<D>(
        &self,
        display: &mut D,
        area: Rectangle,
        state: ConnectivityState,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        // Corners of the old pill would otherwise survive a color change
        display.fill_solid(&area, self.palette.background)?;
        RoundedRectangle::with_equal_corners(area, Size::new(PILL_RADIUS_PX, PILL_RADIUS_PX))
            .into_styled(PrimitiveStyle::with_fill(self.palette.state_color(state)))
            .draw(display)?;
        self.centered_text(display, state.label(), area.center(), self.palette.background)
    }

    pub fn button<D>(
        &self,
        display: &mut D,
        area: Rectangle,
        color: Rgb565,
        label: &str,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let style = PrimitiveStyleBuilder::new()
            .fill_color(color)
            .stroke_color(color)
            .stroke_width(1)
            .build();
        RoundedRectangle::with_equal_corners(area, Size::new(BUTTON_RADIUS_PX, BUTTON_RADIUS_PX))
            .into_styled(style)
            .draw(display)?;
        self.centered_text(display, label, area.center(), self.palette.background)
    }

    /// Battery outline with a proportional fill and a bolt while charging
    pub fn battery<D>(
        &self,
        display: &mut D,
        origin: Point,
        reading: BatteryReading,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let body = Rectangle::new(origin, Size::new(BATTERY_WIDTH_PX, BATTERY_HEIGHT_PX));
        body.into_styled(
            PrimitiveStyleBuilder::new()
                .fill_color(self.palette.panel)
                .stroke_color(self.palette.muted)
                .stroke_width(1)
                .build(),
        )
        .draw(display)?;

        let nub = Rectangle::new(
            origin
                + Point::new(
                    BATTERY_WIDTH_PX as i32,
                    ((BATTERY_HEIGHT_PX - BATTERY_NUB_HEIGHT_PX) / 2) as i32,
                ),
            Size::new(BATTERY_NUB_WIDTH_PX, BATTERY_NUB_HEIGHT_PX),
        );
        display.fill_solid(&nub, self.palette.muted)?;

        let inner_width = BATTERY_WIDTH_PX - 4;
        let filled = inner_width * reading.percent.min(100) as u32 / 100;
        if filled > 0 {
            display.fill_solid(
                &Rectangle::new(
                    origin + Point::new(2, 2),
                    Size::new(filled, BATTERY_HEIGHT_PX - 4),
                ),
                self.palette.battery_color(reading.percent),
            )?;
        }

        if reading.charging {
            let bolt = PrimitiveStyle::with_stroke(self.palette.text, 1);
            let top = origin + Point::new(14, 2);
            let mid_left = origin + Point::new(11, 7);
            let mid_right = origin + Point::new(14, 7);
            let bottom = origin + Point::new(11, 12);
            Line::new(top, mid_left).into_styled(bolt).draw(display)?;
            Line::new(mid_left, mid_right).into_styled(bolt).draw(display)?;
            Line::new(mid_right, bottom).into_styled(bolt).draw(display)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::FrameBuffer;

    #[test]
    fn test_text_width_uses_fixed_advance() {
        assert_eq!(Painter::text_width(""), 0);
        assert_eq!(Painter::text_width("HomeNet"), 7 * 7);
        // Latin-1 glyphs are a single cell wide
        assert_eq!(Painter::text_width("9°C"), 3 * 7);
    }

    #[test]
    fn test_battery_fill_matches_level() {
        let painter = Painter::new(ColorPalette::default());
        let origin = Point::new(100, 100);
        let inner = Rectangle::new(origin + Point::new(2, 2), Size::new(24, 8));

        let mut fb = FrameBuffer::new();
        painter
            .battery(&mut fb, origin, BatteryReading { percent: 50, charging: false })
            .unwrap();
        assert_eq!(fb.count_color(&inner, painter.palette.good), 12 * 8);

        let mut fb = FrameBuffer::new();
        painter
            .battery(&mut fb, origin, BatteryReading { percent: 10, charging: false })
            .unwrap();
        assert_eq!(fb.count_color(&inner, painter.palette.bad), 2 * 8);
    }

    #[test]
    fn test_charging_draws_bolt() {
        let painter = Painter::new(ColorPalette::default());
        let origin = Point::new(0, 0);
        let body = Rectangle::new(origin, Size::new(BATTERY_WIDTH_PX, BATTERY_HEIGHT_PX));

        let mut fb = FrameBuffer::new();
        painter
            .battery(&mut fb, origin, BatteryReading { percent: 0, charging: true })
            .unwrap();
        assert!(fb.count_color(&body, painter.palette.text) > 0);
    }
}
