//! Shared UI vocabulary: views, touch events, colors and the fixed screen
//! layout used by both the render engine and the input dispatcher.

pub mod colors;
pub mod core;
pub mod layout;

pub use colors::ColorPalette;
pub use self::core::{TouchEvent, TouchPoint, View};
pub use layout::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX, HitRegion, Layout};
