//! Timing table for the pulse link.
//!
//! Both sides of the link derive every duration from a single unit length:
//!
//! ```text
//! short pulse    1 unit high     binary 0
//! long pulse     3 units high    binary 1
//! letter gap     3 units low
//! word gap       7 units low
//! element gap    1 unit low      after every pulse
//! ```
//!
//! The receiver does not see units, only measured high-pulse durations.
//! [`LinkConfig::classify`] maps a duration onto a symbol through two
//! tolerance windows. The windows are configuration, not constants: widening
//! them tolerates sloppier timing, narrowing them rejects more noise.

use crate::symbol::Symbol;

/// Inclusive duration range `[min_ms, max_ms]` for one pulse class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PulseWindow {
    pub min_ms: i64,
    pub max_ms: i64,
}

impl PulseWindow {
    /// Create a window from explicit bounds.
    pub const fn new(min_ms: i64, max_ms: i64) -> Self {
        Self { min_ms, max_ms }
    }

    /// Create a tolerance band of `±tolerance_ms` around a nominal duration.
    pub const fn around(nominal_ms: i64, tolerance_ms: i64) -> Self {
        Self {
            min_ms: nominal_ms - tolerance_ms,
            max_ms: nominal_ms + tolerance_ms,
        }
    }

    /// Check if a measured duration falls inside the window (bounds inclusive).
    #[inline]
    pub const fn contains(&self, duration_ms: i64) -> bool {
        self.min_ms <= duration_ms && duration_ms <= self.max_ms
    }

    /// Check if two windows share any duration.
    pub const fn overlaps(&self, other: &PulseWindow) -> bool {
        self.min_ms <= other.max_ms && other.min_ms <= self.max_ms
    }
}

/// Configuration error from [`LinkConfig::validate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Unit length is zero; every duration would collapse to nothing.
    ZeroUnit,
    /// Short and long windows share a duration; classification would be ambiguous.
    OverlappingWindows,
    /// Debounce interval reaches into the short window; valid pulses would be eaten.
    DebounceTooLong,
    /// Poll interval is not at least 10x shorter than the shortest valid pulse.
    PollTooCoarse,
}

impl ConfigError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::ZeroUnit => "unit length is zero",
            Self::OverlappingWindows => "pulse windows overlap",
            Self::DebounceTooLong => "debounce longer than shortest valid pulse",
            Self::PollTooCoarse => "poll interval too coarse for shortest valid pulse",
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

/// Shared timing parameters for one side of the link.
///
/// The sender and receiver never negotiate timing over the wire; both sides
/// must be constructed with the same unit length out of band.
///
/// # Example
///
/// ```
/// use rust_pulse_link::timing::LinkConfig;
/// use rust_pulse_link::symbol::Symbol;
///
/// let config = LinkConfig::for_unit(100);
/// assert_eq!(config.classify(300), Symbol::Long);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct LinkConfig {
    /// Unit length in milliseconds. Scales every pulse and gap.
    pub unit_ms: u32,

    /// Minimum quiet time between accepted line transitions.
    pub debounce_ms: u32,

    /// Receiver sampling cadence.
    pub poll_interval_ms: u32,

    /// Accepted durations for a short pulse.
    pub short_window: PulseWindow,

    /// Accepted durations for a long pulse.
    pub long_window: PulseWindow,
}

impl Default for LinkConfig {
    /// Reference timing: 50 ms unit, 10 ms debounce, 1 ms poll, windows
    /// banded around 100 ms / 300 ms nominal pulses.
    ///
    /// Note the windows assume a peer keying 100 ms short pulses; a link
    /// where both sides share one unit length should use [`LinkConfig::for_unit`].
    fn default() -> Self {
        Self {
            unit_ms: 50,
            debounce_ms: 10,
            poll_interval_ms: 1,
            short_window: PulseWindow::new(50, 150),
            long_window: PulseWindow::new(250, 350),
        }
    }
}

impl LinkConfig {
    /// Create a self-consistent config for the given unit length.
    ///
    /// Windows are derived as `±unit/2` bands around the nominal 1-unit and
    /// 3-unit pulses, so the two windows never touch.
    pub fn for_unit(unit_ms: u32) -> Self {
        let unit = unit_ms as i64;
        Self {
            unit_ms,
            short_window: PulseWindow::around(unit, unit / 2),
            long_window: PulseWindow::around(3 * unit, unit / 2),
            ..Default::default()
        }
    }

    /// Check the invariants classification and sampling depend on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.unit_ms == 0 {
            return Err(ConfigError::ZeroUnit);
        }
        if self.short_window.overlaps(&self.long_window) {
            return Err(ConfigError::OverlappingWindows);
        }
        let shortest = self.short_window.min_ms.min(self.long_window.min_ms);
        if self.debounce_ms as i64 >= shortest {
            return Err(ConfigError::DebounceTooLong);
        }
        if self.poll_interval_ms as i64 * 10 > shortest {
            return Err(ConfigError::PollTooCoarse);
        }
        Ok(())
    }

    /// Classify a measured high-pulse duration.
    ///
    /// Pure: the same duration always maps to the same symbol. Durations
    /// outside both windows classify as [`Symbol::Invalid`]; there is no
    /// error path.
    #[inline]
    pub fn classify(&self, duration_ms: i64) -> Symbol {
        if self.short_window.contains(duration_ms) {
            Symbol::Short
        } else if self.long_window.contains(duration_ms) {
            Symbol::Long
        } else {
            Symbol::Invalid(duration_ms)
        }
    }

    /// Short pulse high time (1 unit).
    #[inline]
    pub const fn short_pulse_ms(&self) -> u32 {
        self.unit_ms
    }

    /// Long pulse high time (3 units).
    #[inline]
    pub const fn long_pulse_ms(&self) -> u32 {
        self.unit_ms * 3
    }

    /// Letter gap low time (3 units).
    #[inline]
    pub const fn letter_gap_ms(&self) -> u32 {
        self.unit_ms * 3
    }

    /// Word gap low time (7 units).
    #[inline]
    pub const fn word_gap_ms(&self) -> u32 {
        self.unit_ms * 7
    }

    /// Mandatory low time after every pulse (1 unit).
    #[inline]
    pub const fn element_gap_ms(&self) -> u32 {
        self.unit_ms
    }
}
