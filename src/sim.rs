//! Host-side simulation of the link's collaborators.
//!
//! Everything here implements the same capability traits the hardware
//! does, so the encoder and decoder run unmodified against virtual time
//! and virtual lines:
//!
//! - [`SimClock`] + [`VirtualDelay`]: a manually-advanced monotonic clock;
//!   a "blocking" delay simply moves it forward
//! - [`RecordingLine`] + [`Timeline`]: an output pin that records every
//!   transition with its virtual timestamp, replayable sample by sample
//! - [`SharedLine`]: a single-writer/single-reader level register for
//!   running both sides live in one process
//! - [`WallClock`] + [`HostDelay`]: real time, for the `linksim` binary

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use crate::hal::{Clock, LevelIndicator};

/// Manually-advanced monotonic clock. Clones share the same instant.
///
/// Nanosecond resolution internally so virtual delays never lose time to
/// rounding.
#[derive(Clone, Default)]
pub struct SimClock {
    now_ns: Arc<AtomicI64>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in milliseconds.
    pub fn millis(&self) -> i64 {
        self.now_ns.load(Ordering::Acquire) / 1_000_000
    }

    /// Move time forward.
    pub fn advance_ms(&self, ms: i64) {
        self.advance_ns(ms * 1_000_000);
    }

    pub fn advance_ns(&self, ns: i64) {
        self.now_ns.fetch_add(ns, Ordering::AcqRel);
    }
}

impl Clock for SimClock {
    fn now_ms(&mut self) -> i64 {
        self.millis()
    }
}

/// Delay provider that advances a [`SimClock`] instead of sleeping.
#[derive(Clone)]
pub struct VirtualDelay {
    clock: SimClock,
}

impl VirtualDelay {
    pub fn new(clock: SimClock) -> Self {
        Self { clock }
    }
}

impl DelayNs for VirtualDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.clock.advance_ns(ns as i64);
    }
}

/// One recorded level change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub at_ms: i64,
    pub level: bool,
}

/// Output pin that records its transitions against a [`SimClock`].
///
/// Clones share the same record; keep one to inspect the [`Timeline`]
/// after the encoder is done with the other.
#[derive(Clone)]
pub struct RecordingLine {
    clock: SimClock,
    state: Arc<Mutex<RecordState>>,
}

struct RecordState {
    level: bool,
    transitions: Vec<Transition>,
}

impl RecordingLine {
    pub fn new(clock: SimClock) -> Self {
        Self {
            clock,
            state: Arc::new(Mutex::new(RecordState {
                level: false,
                transitions: Vec::new(),
            })),
        }
    }

    fn set_level(&mut self, level: bool) {
        let mut state = self.state.lock().unwrap();
        if state.level != level {
            state.level = level;
            state.transitions.push(Transition {
                at_ms: self.clock.millis(),
                level,
            });
        }
    }

    /// Snapshot of everything recorded so far.
    pub fn timeline(&self) -> Timeline {
        Timeline {
            transitions: self.state.lock().unwrap().transitions.clone(),
        }
    }
}

impl ErrorType for RecordingLine {
    type Error = Infallible;
}

impl OutputPin for RecordingLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set_level(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set_level(true);
        Ok(())
    }
}

/// A recorded pulse train, replayable at any sampling cadence.
#[derive(Clone, Debug)]
pub struct Timeline {
    transitions: Vec<Transition>,
}

impl Timeline {
    /// Line level at virtual time `t_ms` (low before the first transition).
    pub fn level_at(&self, t_ms: i64) -> bool {
        self.transitions
            .iter()
            .take_while(|tr| tr.at_ms <= t_ms)
            .last()
            .map(|tr| tr.level)
            .unwrap_or(false)
    }

    /// Timestamp of the last transition, 0 if none.
    pub fn end_ms(&self) -> i64 {
        self.transitions.last().map(|tr| tr.at_ms).unwrap_or(0)
    }

    /// Number of high pulses (rising transitions).
    pub fn pulse_count(&self) -> usize {
        self.transitions.iter().filter(|tr| tr.level).count()
    }

    /// Rise/fall timestamp pairs of every completed high pulse.
    pub fn high_pulses(&self) -> Vec<(i64, i64)> {
        let mut pulses = Vec::new();
        let mut rise = None;
        for tr in &self.transitions {
            match (tr.level, rise) {
                (true, _) => rise = Some(tr.at_ms),
                (false, Some(start)) => {
                    pulses.push((start, tr.at_ms));
                    rise = None;
                }
                (false, None) => {}
            }
        }
        pulses
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }
}

/// Single-writer/single-reader level register shared between the two sides.
///
/// The writer's store is immediately visible to the reader's next sample;
/// there is no buffering and no queue of pending levels.
#[derive(Clone, Default)]
pub struct SharedLine {
    level: Arc<AtomicBool>,
}

impl SharedLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The write end, for the encoder.
    pub fn driver(&self) -> LineDriver {
        LineDriver {
            level: Arc::clone(&self.level),
        }
    }

    /// The read end, for the decoder.
    pub fn probe(&self) -> LineProbe {
        LineProbe {
            level: Arc::clone(&self.level),
        }
    }
}

/// Write end of a [`SharedLine`].
#[derive(Clone)]
pub struct LineDriver {
    level: Arc<AtomicBool>,
}

impl ErrorType for LineDriver {
    type Error = Infallible;
}

impl OutputPin for LineDriver {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.level.store(false, Ordering::Release);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.level.store(true, Ordering::Release);
        Ok(())
    }
}

/// Read end of a [`SharedLine`].
#[derive(Clone)]
pub struct LineProbe {
    level: Arc<AtomicBool>,
}

impl ErrorType for LineProbe {
    type Error = Infallible;
}

impl InputPin for LineProbe {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level.load(Ordering::Acquire))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|h| !h)
    }
}

/// Indicator that remembers every state it was driven to.
#[derive(Default)]
pub struct RecordingIndicator {
    pub states: Vec<bool>,
}

impl RecordingIndicator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LevelIndicator for RecordingIndicator {
    fn set_active(&mut self, active: bool) {
        self.states.push(active);
    }
}

/// Real monotonic clock for host runs.
pub struct WallClock {
    start: std::time::Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for WallClock {
    fn now_ms(&mut self) -> i64 {
        self.start.elapsed().as_millis() as i64
    }
}

/// Real blocking delay for host runs.
#[derive(Clone, Copy, Default)]
pub struct HostDelay;

impl DelayNs for HostDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(ns as u64));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sim_clock_advances() {
        let clock = SimClock::new();
        assert_eq!(clock.millis(), 0);
        clock.advance_ms(150);
        assert_eq!(clock.millis(), 150);

        let shared = clock.clone();
        shared.advance_ms(50);
        assert_eq!(clock.millis(), 200);
    }

    #[test]
    fn test_virtual_delay_moves_clock() {
        let clock = SimClock::new();
        let mut delay = VirtualDelay::new(clock.clone());
        delay.delay_ms(300);
        assert_eq!(clock.millis(), 300);
        delay.delay_us(1_500);
        delay.delay_us(500);
        assert_eq!(clock.millis(), 302);
    }

    #[test]
    fn test_recording_line_timeline() {
        let clock = SimClock::new();
        let mut line = RecordingLine::new(clock.clone());

        clock.advance_ms(100);
        line.set_high().unwrap();
        clock.advance_ms(50);
        line.set_low().unwrap();

        let timeline = line.timeline();
        assert_eq!(timeline.pulse_count(), 1);
        assert_eq!(timeline.high_pulses(), vec![(100, 150)]);
        assert!(!timeline.level_at(99));
        assert!(timeline.level_at(100));
        assert!(timeline.level_at(149));
        assert!(!timeline.level_at(150));
    }

    #[test]
    fn test_recording_line_ignores_redundant_writes() {
        let clock = SimClock::new();
        let mut line = RecordingLine::new(clock.clone());
        line.set_low().unwrap();
        line.set_high().unwrap();
        line.set_high().unwrap();
        assert_eq!(line.timeline().transitions().len(), 1);
    }

    #[test]
    fn test_shared_line_register() {
        let line = SharedLine::new();
        let mut driver = line.driver();
        let mut probe = line.probe();

        assert!(!probe.is_high().unwrap());
        driver.set_high().unwrap();
        assert!(probe.is_high().unwrap());
        driver.set_low().unwrap();
        assert!(probe.is_low().unwrap());
    }
}
