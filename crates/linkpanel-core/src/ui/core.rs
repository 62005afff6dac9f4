// src/ui/core.rs
//! Core UI types for the linkpanel screen

use embedded_graphics::prelude::*;

/// Represents a 2D touch point on the display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchPoint {
    pub x: u16,
    pub y: u16,
}

impl TouchPoint {
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    pub fn to_point(&self) -> Point {
        Point::new(self.x as i32, self.y as i32)
    }
}

/// Raw touch events reported by the touch controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchEvent {
    /// Finger went down at a point
    Press(TouchPoint),
    /// Finger moved while down
    Drag(TouchPoint),
    /// Finger lifted at a point
    Release(TouchPoint),
}

/// The three top-level screens, in navigation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum View {
    #[default]
    Status,
    WiFi,
    About,
}

impl View {
    /// Next view in the cyclic order Status → WiFi → About → Status
    pub const fn next(self) -> Self {
        match self {
            View::Status => View::WiFi,
            View::WiFi => View::About,
            View::About => View::Status,
        }
    }

    /// Previous view in the cyclic order
    pub const fn previous(self) -> Self {
        match self {
            View::Status => View::About,
            View::About => View::WiFi,
            View::WiFi => View::Status,
        }
    }

    /// Tab label
    pub const fn title(self) -> &'static str {
        match self {
            View::Status => "Status",
            View::WiFi => "WiFi",
            View::About => "About",
        }
    }

    pub const ALL: [View; 3] = [View::Status, View::WiFi, View::About];
}
