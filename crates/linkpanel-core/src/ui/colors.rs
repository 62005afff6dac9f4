//! Color definitions for the linkpanel screen
//!
//! All colors are RGB565. To convert from 8-bit RGB: R>>3, G>>2, B>>3

use embedded_graphics::pixelcolor::Rgb565;

use crate::connectivity::ConnectivityState;

// ============================================================================
// Base Colors
// ============================================================================

/// Screen background - near black with a blue tint
pub const COLOR_BACKGROUND: Rgb565 = Rgb565::new(10 >> 3, 10 >> 2, 16 >> 3);

/// Panel fill for the tab bar, footer and inactive controls
pub const COLOR_PANEL: Rgb565 = Rgb565::new(18 >> 3, 18 >> 2, 28 >> 3);

/// Primary text
pub const COLOR_TEXT: Rgb565 = Rgb565::new(240 >> 3, 240 >> 2, 245 >> 3);

/// Labels and secondary text
pub const COLOR_MUTED: Rgb565 = Rgb565::new(150 >> 3, 155 >> 2, 170 >> 3);

// ============================================================================
// Status Colors
// ============================================================================

/// Accent teal - active tab, portal state
pub const COLOR_ACCENT: Rgb565 = Rgb565::new(0, 190 >> 2, 210 >> 3);

/// Healthy green
pub const COLOR_GOOD: Rgb565 = Rgb565::new(40 >> 3, 200 >> 2, 120 >> 3);

/// Amber for transitional states
pub const COLOR_WARN: Rgb565 = Rgb565::new(250 >> 3, 180 >> 2, 50 >> 3);

/// Red for failures
pub const COLOR_BAD: Rgb565 = Rgb565::new(250 >> 3, 80 >> 2, 80 >> 3);

// ============================================================================
// Color Palette
// ============================================================================

/// The palette every draw routine reads from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorPalette {
    pub background: Rgb565,
    pub panel: Rgb565,
    pub text: Rgb565,
    pub muted: Rgb565,
    pub accent: Rgb565,
    pub good: Rgb565,
    pub warn: Rgb565,
    pub bad: Rgb565,
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self {
            background: COLOR_BACKGROUND,
            panel: COLOR_PANEL,
            text: COLOR_TEXT,
            muted: COLOR_MUTED,
            accent: COLOR_ACCENT,
            good: COLOR_GOOD,
            warn: COLOR_WARN,
            bad: COLOR_BAD,
        }
    }
}

impl ColorPalette {
    /// Status pill fill for a connectivity state
    pub const fn state_color(&self, state: ConnectivityState) -> Rgb565 {
        match state {
            ConnectivityState::Connecting => self.warn,
            ConnectivityState::Connected => self.good,
            ConnectivityState::Portal => self.accent,
            ConnectivityState::Error => self.bad,
        }
    }

    /// Battery fill color by charge level
    pub const fn battery_color(&self, percent: u8) -> Rgb565 {
        if percent <= 15 {
            self.bad
        } else if percent <= 35 {
            self.warn
        } else {
            self.good
        }
    }
}
