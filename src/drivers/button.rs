//! Interrupt-flagged, poll-debounced push buttons.
//!
//! ## Hardware
//!
//! Five active-low momentary switches with pull-ups. Each GPIO fires on
//! both edges; the interrupt callback only raises the line's [`EdgeFlag`].
//! [`ButtonDriver::poll`], called from the main loop once per tick, runs
//! the debounce and turns a settled press into one [`ButtonEvent`].
//!
//! ## Debounce rule
//!
//! | Pending | Since last transition | Level    | Stable record | Result                |
//! |---------|-----------------------|----------|---------------|-----------------------|
//! | no      | —                     | —        | —             | nothing               |
//! | yes     | ≤ window              | —        | —             | wait (flag kept)      |
//! | yes     | > window              | pressed  | released      | event, record pressed |
//! | yes     | > window              | released | pressed       | record released       |
//! | yes     | > window              | other    | —             | flag cleared only     |
//!
//! Holding a button therefore yields exactly one event per depression.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::digital::{Error as _, InputPin};
use log::warn;

/// Logical button events delivered to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    Up,
    Down,
    Left,
    Right,
    Feed,
}

/// Per-line pending flag. Set from interrupt context, cleared by the poll.
#[derive(Debug, Default)]
pub struct EdgeFlag(AtomicBool);

impl EdgeFlag {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Interrupt handler body: lock-free store, nothing else.
    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

pub struct ButtonDriver<P> {
    event: ButtonEvent,
    gpio: u8,
    pin: P,
    edge: Arc<EdgeFlag>,
    debounce_ms: u32,
    last_transition_ms: u32,
    /// Last stable level; buttons idle released (pulled high).
    released: bool,
}

impl<P: InputPin> ButtonDriver<P> {
    pub fn new(event: ButtonEvent, gpio: u8, pin: P, debounce_ms: u32) -> Self {
        Self {
            event,
            gpio,
            pin,
            edge: Arc::new(EdgeFlag::new()),
            debounce_ms,
            last_transition_ms: 0,
            released: true,
        }
    }

    /// Like [`new`](Self::new) but shares an edge flag already registered
    /// with the interrupt source.
    pub fn with_edge_flag(
        event: ButtonEvent,
        gpio: u8,
        pin: P,
        debounce_ms: u32,
        edge: Arc<EdgeFlag>,
    ) -> Self {
        Self {
            edge,
            ..Self::new(event, gpio, pin, debounce_ms)
        }
    }

    /// Handle for the interrupt callback.
    pub fn edge_flag(&self) -> Arc<EdgeFlag> {
        Arc::clone(&self.edge)
    }

    /// Call from the main loop at each tick.
    /// `now_ms` is the current monotonic time in milliseconds.
    pub fn poll(&mut self, now_ms: u32) -> Option<ButtonEvent> {
        if !self.edge.is_raised() {
            return None;
        }
        if now_ms.wrapping_sub(self.last_transition_ms) <= self.debounce_ms {
            return None;
        }

        self.edge.take();
        let pressed = match self.pin.is_low() {
            Ok(low) => low,
            Err(e) => {
                warn!("Button GPIO{} read failed: {:?}", self.gpio, e.kind());
                self.edge.raise();
                return None;
            }
        };
        self.last_transition_ms = now_ms;

        if pressed && self.released {
            self.released = false;
            Some(self.event)
        } else {
            if !pressed && !self.released {
                self.released = true;
            }
            None
        }
    }
}

/// The feeder's five buttons, polled together in a fixed order.
pub struct ButtonPanel<P> {
    buttons: [ButtonDriver<P>; 5],
}

impl<P: InputPin> ButtonPanel<P> {
    /// Order: up, down, left, right, feed.
    pub fn new(buttons: [ButtonDriver<P>; 5]) -> Self {
        Self { buttons }
    }

    /// Poll every button; events come back in panel order.
    pub fn poll(&mut self, now_ms: u32) -> heapless::Vec<ButtonEvent, 5> {
        let mut events = heapless::Vec::new();
        for button in &mut self.buttons {
            if let Some(event) = button.poll(now_ms) {
                // Capacity equals the button count.
                let _ = events.push(event);
            }
        }
        events
    }
}
