//! Debounced edge detection.
//!
//! Converts a noisy, frequently-sampled line level into a clean sequence of
//! rising/falling edge events. A transition is accepted only when the level
//! differs from the last accepted level AND enough quiet time has passed
//! since the last accepted change; everything else is treated as contact
//! bounce or electrical noise and discarded.
//!
//! Pure logic, no hardware dependencies. The caller samples the line and
//! feeds `(timestamp, level)` pairs at its own cadence.

/// Polarity of an accepted transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeKind {
    /// Line went low → high.
    Rising,
    /// Line went high → low.
    Falling,
}

/// An accepted transition with the timestamp at which it was observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EdgeEvent {
    pub kind: EdgeKind,
    /// Monotonic timestamp of the sample that carried the transition, ms.
    pub at_ms: i64,
}

/// Debounce filter over a sampled boolean line.
///
/// Accepted edges strictly alternate polarity: two rising edges can never be
/// emitted without an intervening falling edge, because acceptance flips the
/// stored level and a same-level sample is never a transition.
///
/// # Example
///
/// ```
/// use rust_pulse_link::debounce::{EdgeDetector, EdgeKind};
///
/// let mut edges = EdgeDetector::new(10);
/// assert_eq!(edges.poll(100, true).map(|e| e.kind), Some(EdgeKind::Rising));
/// // Bounce 3 ms later: suppressed.
/// assert_eq!(edges.poll(103, false), None);
/// ```
pub struct EdgeDetector {
    debounce_ms: i64,
    last_level: bool,
    last_change_ms: i64,
}

impl EdgeDetector {
    /// Create a detector that assumes the line starts low.
    ///
    /// `last_change_ms` starts at 0, so transitions inside the debounce
    /// window of time zero are ignored, matching a detector armed at boot.
    pub const fn new(debounce_ms: u32) -> Self {
        Self {
            debounce_ms: debounce_ms as i64,
            last_level: false,
            last_change_ms: 0,
        }
    }

    /// Create a detector seeded with the level read from the line at startup.
    pub const fn with_initial_level(debounce_ms: u32, level: bool) -> Self {
        Self {
            debounce_ms: debounce_ms as i64,
            last_level: level,
            last_change_ms: 0,
        }
    }

    /// Feed one sample. Returns the accepted edge, if any.
    ///
    /// A sample matching the stored level is no change. A differing sample
    /// within `debounce_ms` of the last accepted change is bounce. Both are
    /// discarded without touching state.
    #[inline]
    pub fn poll(&mut self, now_ms: i64, level: bool) -> Option<EdgeEvent> {
        if level == self.last_level {
            return None;
        }
        if now_ms - self.last_change_ms <= self.debounce_ms {
            return None;
        }

        self.last_level = level;
        self.last_change_ms = now_ms;

        Some(EdgeEvent {
            kind: if level { EdgeKind::Rising } else { EdgeKind::Falling },
            at_ms: now_ms,
        })
    }

    /// Level of the most recently accepted transition.
    #[inline]
    pub const fn level(&self) -> bool {
        self.last_level
    }
}
