//! Pulse decoder finite state machine.
//!
//! Pure logic, no hardware dependencies. Consumes sampled line levels,
//! produces classified symbols. Fully testable on host.
//!
//! # States
//!
//! - **Idle**: waiting for a rising edge; no pulse start recorded
//! - **Measuring**: rising-edge timestamp held, waiting for the falling edge
//!
//! On the falling edge the high-pulse duration is classified through the
//! configured windows and reported. There is no terminal state; the decoder
//! runs for the life of the link.

use crate::debounce::{EdgeDetector, EdgeKind};
use crate::symbol::Symbol;
use crate::timing::LinkConfig;

/// What one sample produced: an accepted edge, and on falling edges the
/// classified symbol of the pulse that just ended.
///
/// The caller mirrors `edge` to its level indicator (rising → active,
/// falling → inactive) and forwards `symbol` when it is a decodable pulse.
/// A falling edge with `symbol: None` means no pulse start was on record;
/// nothing was measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Activity {
    pub edge: EdgeKind,
    pub symbol: Option<Symbol>,
}

/// Decoder for one receive line.
///
/// Owns the debounce stage and the pulse measurement state. Exactly one
/// pulse can be in flight: the sender's mandatory element gap keeps pulses
/// separated well beyond the debounce interval, so there is never a second
/// rising edge before the falling edge of the pulse before it.
///
/// # Example
///
/// ```
/// use rust_pulse_link::decoder::PulseDecoder;
/// use rust_pulse_link::symbol::Symbol;
/// use rust_pulse_link::timing::LinkConfig;
///
/// let mut decoder = PulseDecoder::new(LinkConfig::for_unit(100));
/// decoder.poll(1_000, true);
/// let activity = decoder.poll(1_300, false).unwrap();
/// assert_eq!(activity.symbol, Some(Symbol::Long));
/// ```
pub struct PulseDecoder {
    config: LinkConfig,
    edges: EdgeDetector,
    pulse_start_ms: Option<i64>,
}

impl PulseDecoder {
    /// Create a decoder with the line assumed low at startup.
    pub fn new(config: LinkConfig) -> Self {
        debug_assert!(config.validate().is_ok());
        Self {
            config,
            edges: EdgeDetector::new(config.debounce_ms),
            pulse_start_ms: None,
        }
    }

    /// Create a decoder seeded with the level read from the line at startup.
    pub fn with_initial_level(config: LinkConfig, level: bool) -> Self {
        debug_assert!(config.validate().is_ok());
        Self {
            config,
            edges: EdgeDetector::with_initial_level(config.debounce_ms, level),
            pulse_start_ms: None,
        }
    }

    /// Feed one sample of the line.
    ///
    /// Returns `None` for the vast majority of samples (no accepted edge).
    /// An accepted rising edge records the pulse start. An accepted falling
    /// edge measures `now - start`, classifies it, and clears the start;
    /// if no start was recorded the fall is reported without a symbol.
    #[inline]
    pub fn poll(&mut self, now_ms: i64, level: bool) -> Option<Activity> {
        let edge = self.edges.poll(now_ms, level)?;

        let symbol = match edge.kind {
            EdgeKind::Rising => {
                self.pulse_start_ms = Some(edge.at_ms);
                None
            }
            EdgeKind::Falling => self
                .pulse_start_ms
                .take()
                .map(|start| self.config.classify(edge.at_ms - start)),
        };

        Some(Activity {
            edge: edge.kind,
            symbol,
        })
    }

    /// Check if the decoder is between pulses (no start recorded).
    #[inline]
    pub const fn is_idle(&self) -> bool {
        self.pulse_start_ms.is_none()
    }

    /// The active configuration.
    pub const fn config(&self) -> &LinkConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder() -> PulseDecoder {
        PulseDecoder::new(LinkConfig::for_unit(100))
    }

    #[test]
    fn test_short_pulse_decodes() {
        let mut dec = decoder();

        let rise = dec.poll(1_000, true).unwrap();
        assert_eq!(rise.edge, EdgeKind::Rising);
        assert_eq!(rise.symbol, None);
        assert!(!dec.is_idle());

        let fall = dec.poll(1_100, false).unwrap();
        assert_eq!(fall.edge, EdgeKind::Falling);
        assert_eq!(fall.symbol, Some(Symbol::Short));
    }

    #[test]
    fn test_long_pulse_decodes() {
        let mut dec = decoder();
        dec.poll(1_000, true);
        let fall = dec.poll(1_300, false).unwrap();
        assert_eq!(fall.symbol, Some(Symbol::Long));
    }

    #[test]
    fn test_out_of_band_pulse_is_invalid() {
        let mut dec = decoder();
        dec.poll(1_000, true);
        let fall = dec.poll(1_200, false).unwrap();
        assert_eq!(fall.symbol, Some(Symbol::Invalid(200)));
    }

    #[test]
    fn test_idle_after_every_fall() {
        let mut dec = decoder();
        assert!(dec.is_idle());
        dec.poll(1_000, true);
        dec.poll(1_100, false);
        assert!(dec.is_idle());
        dec.poll(2_000, true);
        dec.poll(2_300, false);
        assert!(dec.is_idle());
    }

    #[test]
    fn test_fall_without_start_is_noop() {
        // Line already high when the decoder came up: the first accepted
        // edge is a fall with nothing on record.
        let mut dec = PulseDecoder::with_initial_level(LinkConfig::for_unit(100), true);
        let fall = dec.poll(1_000, false).unwrap();
        assert_eq!(fall.edge, EdgeKind::Falling);
        assert_eq!(fall.symbol, None);
        assert!(dec.is_idle());
    }

    #[test]
    fn test_bounce_does_not_end_pulse() {
        let mut dec = decoder();
        dec.poll(1_000, true);

        // Glitch 4 ms into the pulse: suppressed, still measuring.
        assert_eq!(dec.poll(1_004, false), None);
        assert!(!dec.is_idle());

        let fall = dec.poll(1_300, false).unwrap();
        assert_eq!(fall.symbol, Some(Symbol::Long));
    }

    #[test]
    fn test_samples_between_edges_are_silent() {
        let mut dec = decoder();
        dec.poll(1_000, true);
        for t in (1_001..1_300).step_by(1) {
            assert_eq!(dec.poll(t, true), None);
        }
    }
}
