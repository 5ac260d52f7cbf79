//! Summer device state
//!
//! Owns the accumulator and the session ledger and exposes the boundary
//! handlers a host calls:
//! - session open / close
//! - write (decode a value and add it)
//! - read (drain the ledger as text)
//! - control commands (add a raw value, query the total)

mod accumulator;
mod ledger;

pub use accumulator::Accumulator;
pub use ledger::{Append, SessionLedger, MAX_SESSIONS};

use crate::codec::{self, ParseError};

/// Control commands, the counterpart of a character device's ioctl table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Add a raw value to the running total
    Add(u64),
    /// Query the running total
    Get,
}

/// Accumulator plus ledger, owned by the hosting service
#[derive(Debug, Clone, Default)]
pub struct Device {
    accumulator: Accumulator,
    ledger: SessionLedger,
}

impl Device {
    pub fn new() -> Self {
        Self::default()
    }

    /// Device whose ledger holds at most `capacity` sessions
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            accumulator: Accumulator::new(),
            ledger: SessionLedger::with_capacity(capacity),
        }
    }

    pub fn on_session_open(&mut self) {
        self.accumulator.open_session();
        tracing::debug!("session opened");
    }

    /// Fold the session's total into the ledger
    pub fn on_session_close(&mut self) -> Append {
        let total = self.accumulator.close_session();
        let outcome = self.ledger.append_if_nonzero(total);
        match outcome {
            Append::Recorded(cumulative) => {
                tracing::debug!(total, cumulative, "session closed");
            }
            Append::ZeroTotal => tracing::debug!("session closed with zero total"),
            Append::Full => tracing::warn!(
                total,
                capacity = self.ledger.capacity(),
                "ledger full, session dropped"
            ),
        }
        outcome
    }

    /// Decode `raw` and add it to the running total.
    ///
    /// Returns the number of bytes consumed. A parse failure leaves the total
    /// untouched.
    pub fn on_write(&mut self, raw: &[u8]) -> Result<usize, ParseError> {
        match codec::decode_uint(raw) {
            Ok(value) => {
                self.accumulator.add(value);
                tracing::trace!(value, total = self.accumulator.value(), "write");
                Ok(codec::scanned_len(raw))
            }
            Err(err) => {
                tracing::debug!(error = %err, "write discarded");
                Err(err)
            }
        }
    }

    /// Drain the ledger into at most `capacity` bytes and reset the total
    pub fn on_read(&mut self, capacity: usize) -> Vec<u8> {
        let entries = self.ledger.drain();
        self.accumulator.open_session();
        let payload = codec::encode_ledger(&entries, capacity);
        tracing::debug!(
            entries = entries.len(),
            bytes = payload.len(),
            "ledger drained"
        );
        payload
    }

    /// Run a control command and return the running total afterwards
    pub fn on_control(&mut self, control: Control) -> u64 {
        if let Control::Add(value) = control {
            self.accumulator.add(value);
        }
        self.accumulator.value()
    }

    pub fn total(&self) -> u64 {
        self.accumulator.value()
    }

    pub fn ledger(&self) -> &SessionLedger {
        &self.ledger
    }
}
