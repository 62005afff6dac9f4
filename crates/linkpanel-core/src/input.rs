//! Touch and button dispatch
//!
//! Turns raw touch samples and hardware button presses into [`Command`]s.
//! Taps fire on the press edge; swipes are recognized when the finger lifts.

use embassy_time::{Duration, Instant};
use log::debug;

use crate::ui::{HitRegion, Layout, TouchEvent, TouchPoint, View};

/// Minimum horizontal travel for a swipe
pub const SWIPE_MIN_DISTANCE_PX: i32 = 90;

/// tan(35°) as a fraction of 1000. A swipe may deviate from horizontal by at
/// most 35 degrees.
const SWIPE_MAX_SLOPE_PER_MILLE: i32 = 700;

/// The three buttons below the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareButton {
    A,
    B,
    C,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Touch(TouchEvent),
    Button(HardwareButton),
}

/// What the application should do in response to input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Navigate(View),
    /// Open the setup portal keeping stored credentials
    OpenPortal,
    Retry,
    /// Erase credentials and open the setup portal
    Forget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Swipe {
    Left,
    Right,
}

fn classify_swipe(start: TouchPoint, end: TouchPoint) -> Option<Swipe> {
    let dx = end.x as i32 - start.x as i32;
    let dy = end.y as i32 - start.y as i32;
    if dx.abs() < SWIPE_MIN_DISTANCE_PX {
        return None;
    }
    if dy.abs() * 1000 > dx.abs() * SWIPE_MAX_SLOPE_PER_MILLE {
        return None;
    }
    Some(if dx < 0 { Swipe::Left } else { Swipe::Right })
}

pub struct InputDispatcher {
    layout: Layout,
    press_origin: Option<TouchPoint>,
    last_interaction: Instant,
}

impl InputDispatcher {
    pub fn new(layout: Layout, now: Instant) -> Self {
        Self {
            layout,
            press_origin: None,
            last_interaction: now,
        }
    }

    /// Interpret one input event while `view` is on screen.
    ///
    /// Every recognized command refreshes the interaction clock.
    pub fn dispatch(&mut self, event: InputEvent, view: View, now: Instant) -> Option<Command> {
        let command = match event {
            InputEvent::Button(button) => Some(match button {
                HardwareButton::A => Command::OpenPortal,
                HardwareButton::B => Command::Navigate(view.next()),
                HardwareButton::C => Command::Navigate(view.previous()),
            }),
            InputEvent::Touch(TouchEvent::Press(point)) => {
                self.press_origin = Some(point);
                self.tap(point, view)
            }
            InputEvent::Touch(TouchEvent::Drag(_)) => None,
            InputEvent::Touch(TouchEvent::Release(point)) => self
                .press_origin
                .take()
                .and_then(|origin| classify_swipe(origin, point))
                .map(|swipe| match swipe {
                    Swipe::Left => Command::Navigate(view.next()),
                    Swipe::Right => Command::Navigate(view.previous()),
                }),
        };

        if let Some(command) = command {
            debug!("Input {:?} -> {:?}", event, command);
            self.last_interaction = now;
        }
        command
    }

    fn tap(&self, point: TouchPoint, view: View) -> Option<Command> {
        match self.layout.hit_test(point)? {
            HitRegion::Tab(target) => Some(Command::Navigate(target)),
            // Connectivity controls only exist on the WiFi view
            _ if view != View::WiFi => None,
            HitRegion::PortalButton => Some(Command::OpenPortal),
            HitRegion::RetryButton => Some(Command::Retry),
            HitRegion::ForgetButton => Some(Command::Forget),
        }
    }

    pub fn last_interaction(&self) -> Instant {
        self.last_interaction
    }

    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_interaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    fn press(x: u16, y: u16) -> InputEvent {
        InputEvent::Touch(TouchEvent::Press(TouchPoint::new(x, y)))
    }

    fn release(x: u16, y: u16) -> InputEvent {
        InputEvent::Touch(TouchEvent::Release(TouchPoint::new(x, y)))
    }

    fn center(rect: embedded_graphics::primitives::Rectangle) -> (u16, u16) {
        let c = rect.center();
        (c.x as u16, c.y as u16)
    }

    #[test]
    fn test_tab_press_navigates() {
        let layout = Layout::new();
        let mut input = InputDispatcher::new(layout, at(0));
        let (x, y) = center(layout.tab_about);
        assert_eq!(
            input.dispatch(press(x, y), View::Status, at(5)),
            Some(Command::Navigate(View::About))
        );
        assert_eq!(input.last_interaction(), at(5));
    }

    #[test]
    fn test_action_buttons_only_on_wifi_view() {
        let layout = Layout::new();
        let mut input = InputDispatcher::new(layout, at(0));
        let (x, y) = center(layout.forget_button);

        assert_eq!(input.dispatch(press(x, y), View::Status, at(10)), None);
        assert_eq!(input.last_interaction(), at(0));
        input.dispatch(release(x, y), View::Status, at(11));

        assert_eq!(
            input.dispatch(press(x, y), View::WiFi, at(20)),
            Some(Command::Forget)
        );
        let (x, y) = center(layout.portal_button);
        assert_eq!(
            input.dispatch(press(x, y), View::WiFi, at(30)),
            Some(Command::OpenPortal)
        );
        let (x, y) = center(layout.retry_button);
        assert_eq!(
            input.dispatch(press(x, y), View::WiFi, at(40)),
            Some(Command::Retry)
        );
    }

    #[test]
    fn test_swipes_cycle_views() {
        let mut input = InputDispatcher::new(Layout::new(), at(0));
        input.dispatch(press(250, 120), View::Status, at(1));
        input.dispatch(
            InputEvent::Touch(TouchEvent::Drag(TouchPoint::new(200, 125))),
            View::Status,
            at(2),
        );
        assert_eq!(
            input.dispatch(release(100, 130), View::Status, at(3)),
            Some(Command::Navigate(View::WiFi))
        );

        input.dispatch(press(50, 120), View::Status, at(4));
        assert_eq!(
            input.dispatch(release(200, 100), View::Status, at(5)),
            Some(Command::Navigate(View::About))
        );
    }

    #[test]
    fn test_short_or_steep_drags_are_not_swipes() {
        let mut input = InputDispatcher::new(Layout::new(), at(0));
        input.dispatch(press(200, 120), View::Status, at(1));
        assert_eq!(input.dispatch(release(120, 120), View::Status, at(2)), None);

        // 100px across, 80px down: about 39 degrees
        input.dispatch(press(200, 60), View::Status, at(3));
        assert_eq!(input.dispatch(release(100, 140), View::Status, at(4)), None);
        assert_eq!(input.last_interaction(), at(0));

        // Release without a press
        assert_eq!(input.dispatch(release(10, 120), View::Status, at(5)), None);
    }

    #[test]
    fn test_hardware_buttons() {
        let mut input = InputDispatcher::new(Layout::new(), at(0));
        let a = InputEvent::Button(HardwareButton::A);
        let b = InputEvent::Button(HardwareButton::B);
        let c = InputEvent::Button(HardwareButton::C);
        assert_eq!(input.dispatch(a, View::About, at(1)), Some(Command::OpenPortal));
        assert_eq!(
            input.dispatch(b, View::About, at(2)),
            Some(Command::Navigate(View::Status))
        );
        assert_eq!(
            input.dispatch(c, View::Status, at(3)),
            Some(Command::Navigate(View::About))
        );
        assert_eq!(input.idle_for(at(1003)), Duration::from_millis(1000));
    }
}
