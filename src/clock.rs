// Time and randomness sources for the simulated backend.
// Both are injected so tests can pin timestamps and random choices.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::config::DelayRange;

pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        ManualClock {
            now: AtomicI64::new(start_millis),
        }
    }

    pub fn set(&self, millis: i64) {
        self.now.store(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Shared pseudo-random source for delays and picks.
#[derive(Debug)]
pub struct Jitter {
    rng: Mutex<StdRng>,
}

impl Jitter {
    pub fn from_entropy() -> Self {
        Jitter {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Jitter {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// A duration drawn uniformly from the inclusive range.
    pub fn duration(&self, range: DelayRange) -> Duration {
        let (min, max) = (range.min(), range.max());
        if min == max {
            return min;
        }
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen_range(min..=max)
    }

    /// A uniform index into a collection of `len` items. `len` must be non-zero.
    pub fn index(&self, len: usize) -> usize {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen_range(0..len)
    }
}

impl Default for Jitter {
    fn default() -> Self {
        Jitter::from_entropy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now_millis(), 1_000);
        clock.advance(250);
        assert_eq!(clock.now_millis(), 1_250);
        clock.set(5);
        assert_eq!(clock.now_millis(), 5);
    }

    #[test]
    fn test_jitter_stays_in_bounds() {
        let jitter = Jitter::seeded(7);
        let range = DelayRange::new(150, 300);
        for _ in 0..200 {
            let d = jitter.duration(range);
            assert!(d >= Duration::from_millis(150) && d <= Duration::from_millis(300));
        }
        for _ in 0..200 {
            assert!(jitter.index(3) < 3);
        }
    }

    #[test]
    fn test_seeded_jitter_is_repeatable() {
        let a = Jitter::seeded(42);
        let b = Jitter::seeded(42);
        let range = DelayRange::new(0, 10_000);
        for _ in 0..20 {
            assert_eq!(a.duration(range), b.duration(range));
        }
    }

    #[test]
    fn test_zero_range() {
        let jitter = Jitter::seeded(1);
        assert_eq!(jitter.duration(DelayRange::zero()), Duration::ZERO);
    }
}
