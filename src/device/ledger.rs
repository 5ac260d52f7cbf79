//! Session Ledger - bounded history of cumulative session totals
//!
//! Entries are running sums: entry[i] = entry[i-1] + total of session i.
//! Once the ledger holds `capacity` entries further sessions are dropped
//! silently until the next drain.

/// Default number of sessions the ledger can hold
pub const MAX_SESSIONS: usize = 100;

/// What happened to a closed session's total
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Append {
    /// A new cumulative entry was recorded
    Recorded(u64),
    /// Session total was zero; nothing recorded
    ZeroTotal,
    /// Ledger at capacity; the session was dropped
    Full,
}

/// Bounded, ordered history of cumulative totals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLedger {
    entries: Vec<u64>,
    capacity: usize,
}

impl SessionLedger {
    pub fn new() -> Self {
        Self::with_capacity(MAX_SESSIONS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Fold a closed session's total into the ledger.
    ///
    /// Zero totals and appends past capacity are no-ops. The returned
    /// [`Append`] only reports which path was taken; neither no-op is an error.
    pub fn append_if_nonzero(&mut self, session_total: u64) -> Append {
        if session_total == 0 {
            return Append::ZeroTotal;
        }
        if self.is_full() {
            return Append::Full;
        }

        let cumulative = self.last().unwrap_or(0).saturating_add(session_total);
        self.entries.push(cumulative);
        Append::Recorded(cumulative)
    }

    /// Take every entry and leave the ledger empty
    pub fn drain(&mut self) -> Vec<u64> {
        std::mem::take(&mut self.entries)
    }

    pub fn entries(&self) -> &[u64] {
        &self.entries
    }

    pub fn last(&self) -> Option<u64> {
        self.entries.last().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for SessionLedger {
    fn default() -> Self {
        Self::new()
    }
}
