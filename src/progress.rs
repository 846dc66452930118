//! Progress reporting for long-running encrypt/decrypt calls.
//!
//! Progress is an explicit per-call sink rather than shared state, so two
//! operations running side by side never see each other's counters.

/// Receives completion percentages in `0..=100`
pub trait Progress {
    fn report(&mut self, percent: u8);
}

/// No-op sink
impl Progress for () {
    fn report(&mut self, _percent: u8) {}
}

impl<F: FnMut(u8)> Progress for F {
    fn report(&mut self, percent: u8) {
        self(percent)
    }
}

/// Percentage of `done` out of `total`, treating an empty job as complete
pub(crate) fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) * 100) / total) as u8
}
