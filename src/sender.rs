//! Transmit-side service loop.
//!
//! Waits once for the host side channel to come up, then serves sequences:
//! read a line, trim it, key it onto the wire through the blocking encoder.
//! A failed sequence is reported and discarded; there is no retry and no
//! rollback of pulses already emitted.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::encoder::{PulseEncoder, SendError};
use crate::hal::{ByteSource, Clock, LineBuffer};
use crate::logging::LogStream;
use crate::timing::LinkConfig;
use crate::{link_info, link_warn};

/// Sequence intake and dispatch for one transmit line.
pub struct SenderService<'a, P, D, H, C> {
    encoder: PulseEncoder<P, D>,
    host: H,
    clock: C,
    line_buf: LineBuffer,
    log: &'a LogStream,
}

impl<'a, P, D, H, C> SenderService<'a, P, D, H, C>
where
    P: OutputPin,
    D: DelayNs,
    H: ByteSource,
    C: Clock,
{
    pub fn new(config: LinkConfig, line: P, delay: D, host: H, clock: C, log: &'a LogStream) -> Self {
        Self {
            encoder: PulseEncoder::new(line, delay, config),
            host,
            clock,
            line_buf: LineBuffer::new(),
            log,
        }
    }

    /// Block until the host reports the side channel is up.
    ///
    /// One-time gate, not a per-sequence precondition.
    pub fn wait_for_host(&mut self) {
        while !self.host.is_connected() {}
        link_info!(self.log, self.clock.now_ms(), "host connected");
    }

    /// Serve at most one pending sequence.
    ///
    /// Does nothing when no line is ready. An invalid character aborts the
    /// sequence with a warn entry and the remainder is discarded; only a
    /// line failure is returned to the caller.
    pub fn serve_once(&mut self) -> Result<(), P::Error> {
        if !self.host.poll_line(&mut self.line_buf) {
            return Ok(());
        }

        let sequence = self.line_buf.as_str().trim();
        if sequence.is_empty() {
            return Ok(());
        }

        link_info!(
            self.log,
            self.clock.now_ms(),
            "keying sequence: {}",
            sequence
        );

        match self.encoder.send_sequence(sequence) {
            Ok(()) => {
                link_info!(self.log, self.clock.now_ms(), "sequence complete");
            }
            Err(SendError::InvalidCharacter { index, ch }) => {
                link_warn!(
                    self.log,
                    self.clock.now_ms(),
                    "sequence aborted: invalid character '{}' at position {}",
                    ch,
                    index
                );
            }
            Err(SendError::Line(e)) => return Err(e),
        }

        Ok(())
    }

    /// Gate on the host once, then serve sequences forever.
    ///
    /// Returns only if the line rejects a level change.
    pub fn run(&mut self) -> Result<(), P::Error> {
        self.wait_for_host();
        loop {
            self.serve_once()?;
        }
    }
}
