//! RAM framebuffer with change tracking.
//!
//! The render engine can draw straight into a panel driver, but drawing into
//! this buffer first lets the caller push only the changed rectangle to the
//! panel. The buffer also records the bounding box of every write, which is
//! what the render tests use to check how much of the screen a pass touched.

use alloc::vec;
use alloc::vec::Vec;
use core::convert::Infallible;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::trace;

use crate::ui::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};

const WIDTH: usize = DISPLAY_WIDTH_PX as usize;
const HEIGHT: usize = DISPLAY_HEIGHT_PX as usize;

/// Inclusive pixel bounding box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Bounds {
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
}

impl Bounds {
    fn point(x: usize, y: usize) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn include(this: &mut Option<Self>, x: usize, y: usize) {
        match this {
            Some(b) => {
                b.min_x = b.min_x.min(x);
                b.min_y = b.min_y.min(y);
                b.max_x = b.max_x.max(x);
                b.max_y = b.max_y.max(y);
            }
            None => *this = Some(Self::point(x, y)),
        }
    }

    fn width(&self) -> usize {
        self.max_x - self.min_x + 1
    }

    fn height(&self) -> usize {
        self.max_y - self.min_y + 1
    }

    fn to_rectangle(self) -> Rectangle {
        Rectangle::new(
            Point::new(self.min_x as i32, self.min_y as i32),
            Size::new(self.width() as u32, self.height() as u32),
        )
    }
}

/// 320x240 RGB565 buffer implementing `DrawTarget`.
pub struct FrameBuffer {
    pixels: Vec<Rgb565>,
    /// Pixels whose color changed since the last flush
    changed: Option<Bounds>,
    /// Pixels written (changed or not) since the last `take_written`
    written: Option<Bounds>,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            pixels: vec![Rgb565::BLACK; WIDTH * HEIGHT],
            changed: None,
            written: None,
        }
    }

    #[inline]
    fn put(&mut self, x: usize, y: usize, color: Rgb565) {
        Bounds::include(&mut self.written, x, y);
        let idx = y * WIDTH + x;
        if self.pixels[idx] != color {
            self.pixels[idx] = color;
            Bounds::include(&mut self.changed, x, y);
        }
    }

    /// Color at a point, `None` when off screen
    pub fn pixel(&self, point: Point) -> Option<Rgb565> {
        let (x, y) = (point.x, point.y);
        if x < 0 || y < 0 || x as usize >= WIDTH || y as usize >= HEIGHT {
            return None;
        }
        Some(self.pixels[y as usize * WIDTH + x as usize])
    }

    /// Number of pixels inside `area` with the given color
    pub fn count_color(&self, area: &Rectangle, color: Rgb565) -> usize {
        area.points()
            .filter(|p| self.pixel(*p) == Some(color))
            .count()
    }

    /// Bounding box of every write since the previous call, then reset.
    pub fn take_written(&mut self) -> Option<Rectangle> {
        self.written.take().map(Bounds::to_rectangle)
    }

    /// Bounding box of the pixels waiting to be flushed
    pub fn pending(&self) -> Option<Rectangle> {
        self.changed.map(Bounds::to_rectangle)
    }

    /// Send the changed region to `display` and reset the change tracking.
    ///
    /// A single `fill_contiguous` call covers the bounding box, which is one
    /// bus transaction on SPI panels. No-op when nothing changed.
    pub fn flush<D>(&mut self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let Some(bounds) = self.changed.take() else {
            return Ok(());
        };
        let area = bounds.to_rectangle();
        trace!("Flushing {:?}", area);

        let pixels = &self.pixels;
        let width = bounds.width();
        let colors = (bounds.min_y..=bounds.max_y).flat_map(move |y| {
            let start = y * WIDTH + bounds.min_x;
            pixels[start..start + width].iter().copied()
        });
        display.fill_contiguous(&area, colors)
    }

    /// Clip a rectangle to the screen as half-open pixel ranges
    fn clip(area: &Rectangle) -> (core::ops::Range<usize>, core::ops::Range<usize>) {
        let clamp = |v: i32, max: usize| (v.max(0) as usize).min(max);
        let x0 = clamp(area.top_left.x, WIDTH);
        let y0 = clamp(area.top_left.y, HEIGHT);
        let x1 = clamp(area.top_left.x.saturating_add(area.size.width as i32), WIDTH);
        let y1 = clamp(area.top_left.y.saturating_add(area.size.height as i32), HEIGHT);
        (x0..x1, y0..y1)
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0
                && point.y >= 0
                && (point.x as usize) < WIDTH
                && (point.y as usize) < HEIGHT
            {
                self.put(point.x as usize, point.y as usize, color);
            }
        }
        Ok(())
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        // Colors are laid out row-major over the unclipped area
        for (point, color) in area.points().zip(colors) {
            if point.x >= 0
                && point.y >= 0
                && (point.x as usize) < WIDTH
                && (point.y as usize) < HEIGHT
            {
                self.put(point.x as usize, point.y as usize, color);
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let (xs, ys) = Self::clip(area);
        for y in ys {
            for x in xs.clone() {
                self.put(x, y, color);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill_solid(&Rectangle::new(Point::zero(), self.size()), color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

    #[test]
    fn test_written_tracks_bounding_box() {
        let mut fb = FrameBuffer::new();
        Rectangle::new(Point::new(10, 20), Size::new(5, 4))
            .into_styled(PrimitiveStyle::with_fill(Rgb565::RED))
            .draw(&mut fb)
            .unwrap();
        assert_eq!(
            fb.take_written(),
            Some(Rectangle::new(Point::new(10, 20), Size::new(5, 4)))
        );
        assert_eq!(fb.take_written(), None);
    }

    #[test]
    fn test_rewriting_same_color_is_written_but_not_changed() {
        let mut fb = FrameBuffer::new();
        let area = Rectangle::new(Point::new(0, 0), Size::new(3, 3));
        fb.fill_solid(&area, Rgb565::BLACK).unwrap();
        assert_eq!(fb.take_written(), Some(area));
        assert_eq!(fb.pending(), None);
    }

    #[test]
    fn test_off_screen_pixels_are_ignored() {
        let mut fb = FrameBuffer::new();
        let area = Rectangle::new(Point::new(-5, 235), Size::new(10, 10));
        fb.fill_solid(&area, Rgb565::GREEN).unwrap();
        assert_eq!(
            fb.take_written(),
            Some(Rectangle::new(Point::new(0, 235), Size::new(5, 5)))
        );
        assert_eq!(fb.pixel(Point::new(4, 239)), Some(Rgb565::GREEN));
        assert_eq!(fb.pixel(Point::new(-1, 0)), None);
    }

    #[test]
    fn test_flush_sends_changed_region_once() {
        let mut fb = FrameBuffer::new();
        fb.fill_solid(&Rectangle::new(Point::new(2, 2), Size::new(2, 2)), Rgb565::BLUE)
            .unwrap();

        let mut mirror = FrameBuffer::new();
        fb.flush(&mut mirror).unwrap();
        assert_eq!(mirror.pixel(Point::new(3, 3)), Some(Rgb565::BLUE));
        assert_eq!(fb.pending(), None);

        mirror.take_written();
        fb.flush(&mut mirror).unwrap();
        assert_eq!(mirror.take_written(), None);
    }
}
