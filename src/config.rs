//! Construction parameters.

/// Capacity substituted for a request of zero.
pub const MIN_CAPACITY: usize = 8;

/// Default number of spins a reserved slot may take before the escape valve engages.
pub const MAX_WAIT: usize = 100;

/// Slots held back by the admission check. A queue never reports more than
/// `capacity - HEADROOM` occupied slots.
///
/// One slot would be enough to tell full from empty; existing callers depend
/// on the `capacity - 2` ceiling, so it stays at two.
pub const HEADROOM: usize = 2;

/// Parameters for [`Queue::with_config`](crate::Queue::with_config).
///
/// ```
/// use lap_mpmc::{Config, Queue};
///
/// let q: Queue<u64> = Queue::with_config(Config::new(100).max_wait(1_000));
/// assert_eq!(q.capacity(), 128);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Requested capacity, rounded up to a power of two at construction.
    pub capacity: usize,
    /// Spins a reserved ticket waits on its slot before the escape valve is tried.
    pub max_wait: usize,
    /// Whether stuck producers/consumers may discard or inject items to make progress.
    pub escape_valve: bool,
}

impl Config {
    /// Defaults with the given requested capacity.
    pub fn new(capacity: usize) -> Self {
        Config { capacity, ..Config::default() }
    }

    /// Set the per-slot spin threshold.
    pub fn max_wait(mut self, max_wait: usize) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Enable or disable the escape valve.
    pub fn escape_valve(mut self, enabled: bool) -> Self {
        self.escape_valve = enabled;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config { capacity: MIN_CAPACITY, max_wait: MAX_WAIT, escape_valve: true }
    }
}

/// Round a requested capacity the way the queue does at construction.
///
/// Zero becomes [`MIN_CAPACITY`]; anything else becomes the smallest power of
/// two that is >= the request. Requests beyond the largest representable power
/// of two are clamped to it.
pub fn round_capacity(requested: usize) -> usize {
    if requested < 1 {
        return MIN_CAPACITY;
    }
    requested
        .checked_next_power_of_two()
        .unwrap_or(1 << (usize::BITS - 1))
}

/// Number of slots the admission check lets callers fill.
pub(crate) fn usable(capacity: usize) -> usize {
    capacity.saturating_sub(HEADROOM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_uses_minimum() {
        assert_eq!(round_capacity(0), MIN_CAPACITY);
    }

    #[test]
    fn rounds_up_to_power_of_two() {
        assert_eq!(round_capacity(1), 1);
        assert_eq!(round_capacity(2), 2);
        assert_eq!(round_capacity(3), 4);
        assert_eq!(round_capacity(8), 8);
        assert_eq!(round_capacity(9), 16);
        assert_eq!(round_capacity(1000), 1024);
    }

    #[test]
    fn clamps_past_largest_power() {
        let top = 1usize << (usize::BITS - 1);
        assert_eq!(round_capacity(top), top);
        assert_eq!(round_capacity(top + 1), top);
        assert_eq!(round_capacity(usize::MAX), top);
    }

    #[test]
    fn tiny_capacities_admit_nothing() {
        assert_eq!(usable(1), 0);
        assert_eq!(usable(2), 0);
        assert_eq!(usable(4), 2);
    }

    #[test]
    fn builder_overrides_defaults() {
        let cfg = Config::new(32).max_wait(7).escape_valve(false);
        assert_eq!(cfg, Config { capacity: 32, max_wait: 7, escape_valve: false });
        assert_eq!(Config::default().max_wait, MAX_WAIT);
    }
}
