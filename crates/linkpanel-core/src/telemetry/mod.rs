//! Telemetry mailbox shared between the control loop and the background
//! forecast job.
//!
//! The cell is a single slot guarded by a critical-section mutex. Both sides
//! only copy values in or out while holding the lock; network and parsing
//! work always happens outside of it.

pub mod forecast;
pub mod job;

pub use forecast::{FetchError, Forecast};
pub use job::{Clock, HttpFetch, HttpResponse, TransportError, run_fetch_job};

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Duration, Instant};
use heapless::String;
use log::debug;

/// Capacity of the footer text in bytes
pub const TELEMETRY_TEXT_CAPACITY: usize = 160;

/// Cooldown between the end of one fetch and the start of the next
pub const FETCH_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Footer text before the first fetch has completed
pub const PLACEHOLDER_TEXT: &str = "Weather: (waiting for WiFi)";

pub type TelemetryText = String<TELEMETRY_TEXT_CAPACITY>;

/// Copy of the cell contents taken under the lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetrySnapshot {
    pub text: TelemetryText,
    pub has_data: bool,
    /// Incremented on every publish
    pub generation: u32,
    pub next_fetch_due: Instant,
    pub running: bool,
}

#[derive(Debug)]
struct TelemetryState {
    text: TelemetryText,
    has_data: bool,
    next_fetch_due: Instant,
    running: bool,
    generation: u32,
}

pub struct TelemetryCell {
    state: Mutex<CriticalSectionRawMutex, RefCell<TelemetryState>>,
}

impl Default for TelemetryCell {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryCell {
    pub fn new() -> Self {
        Self::with_text(PLACEHOLDER_TEXT)
    }

    pub fn with_text(placeholder: &str) -> Self {
        Self {
            state: Mutex::new(RefCell::new(TelemetryState {
                text: truncated(placeholder),
                has_data: false,
                next_fetch_due: Instant::from_ticks(0),
                running: false,
                generation: 0,
            })),
        }
    }

    pub fn read(&self) -> TelemetrySnapshot {
        self.state.lock(|state| {
            let state = state.borrow();
            TelemetrySnapshot {
                text: state.text.clone(),
                has_data: state.has_data,
                generation: state.generation,
                next_fetch_due: state.next_fetch_due,
                running: state.running,
            }
        })
    }

    /// Claim the right to run one fetch.
    ///
    /// Succeeds only when the link is up, no job holds a ticket and the
    /// cooldown has elapsed. The check and the claim happen in the same
    /// critical section, so two callers can never both get a ticket.
    pub fn try_arm(&self, now: Instant, link_connected: bool) -> Option<FetchTicket<'_>> {
        if !link_connected {
            return None;
        }
        let armed = self.state.lock(|state| {
            let mut state = state.borrow_mut();
            if state.running || now < state.next_fetch_due {
                return false;
            }
            state.running = true;
            true
        });
        if armed {
            debug!("Forecast fetch armed");
            Some(FetchTicket {
                cell: self,
                published: false,
            })
        } else {
            None
        }
    }

    fn publish(&self, text: &str, now: Instant) {
        let text: TelemetryText = truncated(text);
        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            state.text = text;
            state.has_data = true;
            state.generation = state.generation.wrapping_add(1);
            state.next_fetch_due = now + FETCH_INTERVAL;
            state.running = false;
        });
    }

    fn release(&self) {
        self.state.lock(|state| state.borrow_mut().running = false);
    }
}

/// Exclusive permission to publish one fetch result.
///
/// Dropping a ticket without publishing frees the cell for the next arm
/// without touching the cooldown.
#[must_use]
pub struct FetchTicket<'a> {
    cell: &'a TelemetryCell,
    published: bool,
}

impl FetchTicket<'_> {
    /// Store the result, bump the generation and start the cooldown.
    pub fn publish(mut self, text: &str, now: Instant) {
        self.cell.publish(text, now);
        self.published = true;
    }
}

impl Drop for FetchTicket<'_> {
    fn drop(&mut self) {
        if !self.published {
            debug!("Forecast ticket dropped without result");
            self.cell.release();
        }
    }
}

/// Copy as much of `text` as fits, never splitting a character.
pub fn truncated<const N: usize>(text: &str) -> String<N> {
    let mut out = String::new();
    for c in text.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
