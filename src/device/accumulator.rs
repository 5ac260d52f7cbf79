//! Running total for the open session

/// Running total collected by the open session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accumulator {
    total: u64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh session (total back to 0)
    pub fn open_session(&mut self) {
        self.total = 0;
    }

    /// Add a contribution. Saturates at `u64::MAX` instead of wrapping.
    pub fn add(&mut self, delta: u64) {
        self.total = self.total.saturating_add(delta);
    }

    /// Total collected so far. Does not reset; folding into the ledger is the caller's job.
    pub fn close_session(&self) -> u64 {
        self.total
    }

    /// Current total
    pub fn value(&self) -> u64 {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_accumulator_is_zero() {
        assert_eq!(Accumulator::new().value(), 0);
    }

    #[test]
    fn test_close_returns_sum_of_adds() {
        let mut acc = Accumulator::new();
        acc.open_session();
        for delta in [452, 19, 0, 7] {
            acc.add(delta);
        }
        assert_eq!(acc.close_session(), 478);
        // close does not reset
        assert_eq!(acc.value(), 478);
    }

    #[test]
    fn test_open_session_resets() {
        let mut acc = Accumulator::new();
        acc.add(10);
        acc.open_session();
        assert_eq!(acc.value(), 0);
    }

    #[test]
    fn test_add_saturates() {
        let mut acc = Accumulator::new();
        acc.add(u64::MAX - 1);
        acc.add(5);
        assert_eq!(acc.value(), u64::MAX);
    }
}
