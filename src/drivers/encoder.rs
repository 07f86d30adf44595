//! Two-channel quadrature encoder decoder.
//!
//! Each edge on channel A or B moves a shared signed counter by one tick.
//! Direction comes from the level of the *other* channel at that edge:
//!
//! | Edge on | Condition | Tick |
//! |---------|-----------|------|
//! | A       | B != A    | +1   |
//! | A       | B == A    | −1   |
//! | B       | A == B    | +1   |
//! | B       | A != B    | −1   |
//!
//! The edge handlers run in interrupt context and are the only writers of
//! the counter; the motor controller is the only reader and resetter.
//! Every field is atomic so neither side can observe a torn value or lose
//! an update, and the handlers never allocate or block.
//!
//! ## Ordering limit
//!
//! The "other channel" level is the one its handler last stored, not a
//! fresh pin read. When A and B edges are handled on different threads
//! (rppal runs one callback thread per pin), two edges closer together
//! than the scheduling jitter can be applied in the opposite order. Each
//! then sees the stale level of the other channel and both count the wrong
//! way, so the position is off by two ticks for that pair. The wheel speeds
//! this feeder runs at keep edges far enough apart for this not to occur.

use core::sync::atomic::{AtomicBool, AtomicI32, Ordering};

#[derive(Debug, Default)]
pub struct QuadratureDecoder {
    position: AtomicI32,
    level_a: AtomicBool,
    level_b: AtomicBool,
}

impl QuadratureDecoder {
    pub const fn new() -> Self {
        Self {
            position: AtomicI32::new(0),
            level_a: AtomicBool::new(false),
            level_b: AtomicBool::new(false),
        }
    }

    /// Record both channel levels as sampled at registration time, before
    /// the first edge fires.
    pub fn seed_levels(&self, a: bool, b: bool) {
        self.level_a.store(a, Ordering::Release);
        self.level_b.store(b, Ordering::Release);
    }

    /// Edge handler for channel A. `a` is the level A moved to.
    pub fn on_edge_a(&self, a: bool) {
        self.level_a.store(a, Ordering::Release);
        let b = self.level_b.load(Ordering::Acquire);
        let step = if b != a { 1 } else { -1 };
        self.position.fetch_add(step, Ordering::AcqRel);
    }

    /// Edge handler for channel B. `b` is the level B moved to.
    pub fn on_edge_b(&self, b: bool) {
        self.level_b.store(b, Ordering::Release);
        let a = self.level_a.load(Ordering::Acquire);
        let step = if a == b { 1 } else { -1 };
        self.position.fetch_add(step, Ordering::AcqRel);
    }

    /// Ticks accumulated since the last reset.
    pub fn position(&self) -> i32 {
        self.position.load(Ordering::Acquire)
    }

    /// Zero the counter, returning the value it held.
    ///
    /// A single `swap`, so an edge racing the reset is either counted
    /// before it (and returned here) or after it (and kept).
    pub fn reset(&self) -> i32 {
        self.position.swap(0, Ordering::AcqRel)
    }
}
