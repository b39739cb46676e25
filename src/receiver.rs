//! Receive-side sampling loop.
//!
//! Wires the pulse decoder to its collaborators: the physical line, the
//! level indicator, the side-channel byte sink, a monotonic clock, and a
//! delay provider that paces sampling. The loop never blocks beyond the
//! fixed poll delay; the delay is a throttle, not a wait for any event.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;

use crate::debounce::EdgeKind;
use crate::decoder::PulseDecoder;
use crate::hal::{ByteSink, Clock, LevelIndicator};
use crate::logging::LogStream;
use crate::symbol::Symbol;
use crate::timing::LinkConfig;
use crate::{link_debug, link_info, link_warn};

/// Sampling loop for one receive line.
///
/// Each poll reads the line once, feeds the decoder, mirrors accepted edges
/// to the indicator, and forwards decoded pulses to the sink as single
/// bytes. Invalid pulse widths are dropped on the spot with a warn entry;
/// nothing reaches the sink for them.
pub struct ReceiverService<'a, P, I, S, C, D> {
    line: P,
    indicator: I,
    sink: S,
    clock: C,
    delay: D,
    decoder: PulseDecoder,
    poll_interval_ms: u32,
    log: &'a LogStream,
}

impl<'a, P, I, S, C, D> ReceiverService<'a, P, I, S, C, D>
where
    P: InputPin,
    I: LevelIndicator,
    S: ByteSink,
    C: Clock,
    D: DelayNs,
{
    pub fn new(
        config: LinkConfig,
        line: P,
        indicator: I,
        sink: S,
        clock: C,
        delay: D,
        log: &'a LogStream,
    ) -> Self {
        Self {
            line,
            indicator,
            sink,
            clock,
            delay,
            decoder: PulseDecoder::new(config),
            poll_interval_ms: config.poll_interval_ms,
            log,
        }
    }

    /// Take one sample of the line and act on whatever it produced.
    pub fn poll_once(&mut self) -> Result<(), P::Error> {
        let now = self.clock.now_ms();
        let level = self.line.is_high()?;

        let Some(activity) = self.decoder.poll(now, level) else {
            return Ok(());
        };

        match activity.edge {
            EdgeKind::Rising => self.indicator.set_active(true),
            EdgeKind::Falling => self.indicator.set_active(false),
        }

        match activity.symbol {
            Some(Symbol::Invalid(duration)) => {
                link_warn!(self.log, now, "dropped pulse of {} ms: no window", duration);
            }
            Some(symbol) => {
                if let Some(byte) = symbol.to_byte() {
                    self.sink.write_byte(byte);
                    link_debug!(self.log, now, "decoded '{}'", byte as char);
                }
            }
            None => {}
        }

        Ok(())
    }

    /// Sample forever at the configured cadence.
    ///
    /// Returns only if the line rejects a read.
    pub fn run(&mut self) -> Result<(), P::Error> {
        link_info!(
            self.log,
            self.clock.now_ms(),
            "receiver up, sampling every {} ms",
            self.poll_interval_ms
        );

        loop {
            self.poll_once()?;
            self.delay.delay_ms(self.poll_interval_ms);
        }
    }

    /// Decoder state, for diagnostics.
    pub fn decoder(&self) -> &PulseDecoder {
        &self.decoder
    }
}
