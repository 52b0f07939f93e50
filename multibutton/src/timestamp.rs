use std::fmt::{Display, Formatter};
use std::time::Duration;

const MICROS_PER_SEC: u64 = 1_000_000;

/// A point in time, as read from a [`Clock`](crate::Clock).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Timestamp {
    pub secs: u64,
    /// Always below one million.
    pub micros: u32,
}

impl Timestamp {
    pub const fn new(secs: u64, micros: u32) -> Self {
        Self { secs, micros }
    }

    pub const fn from_micros(micros: u64) -> Self {
        Self {
            secs: micros / MICROS_PER_SEC,
            micros: (micros % MICROS_PER_SEC) as u32,
        }
    }

    /// Signed distance from `earlier` to `self`, in microseconds.
    ///
    /// Negative when `earlier` is actually later.
    pub fn diff_us(&self, earlier: Timestamp) -> i64 {
        (self.secs.wrapping_sub(earlier.secs) as i64)
            .wrapping_mul(MICROS_PER_SEC as i64)
            .wrapping_add(self.micros as i64 - earlier.micros as i64)
    }

    /// Whether at least `threshold_us` passed between `earlier` and `self`.
    pub fn elapsed_at_least(&self, earlier: Timestamp, threshold_us: u32) -> bool {
        self.diff_us(earlier) >= i64::from(threshold_us)
    }

    pub fn add_micros(&self, micros: u64) -> Self {
        let total = u64::from(self.micros) + micros;
        Self {
            secs: self.secs.wrapping_add(total / MICROS_PER_SEC),
            micros: (total % MICROS_PER_SEC) as u32,
        }
    }
}

impl From<Duration> for Timestamp {
    fn from(duration: Duration) -> Self {
        Self {
            secs: duration.as_secs(),
            micros: duration.subsec_micros(),
        }
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:06}s", self.secs, self.micros)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_borrows_across_seconds() {
        let earlier = Timestamp::new(10, 900_000);
        let later = Timestamp::new(11, 100_000);
        assert_eq!(later.diff_us(earlier), 200_000);
        assert_eq!(earlier.diff_us(later), -200_000);
    }

    #[test]
    fn backwards_clock_never_reaches_a_threshold() {
        let earlier = Timestamp::new(5, 0);
        let later = Timestamp::new(4, 0);
        assert!(!later.elapsed_at_least(earlier, 0));
        assert!(later.elapsed_at_least(later, 0));
    }

    #[test]
    fn add_micros_carries_into_seconds() {
        let t = Timestamp::new(1, 999_999).add_micros(2);
        assert_eq!(t, Timestamp::new(2, 1));
        assert_eq!(Timestamp::from_micros(3_000_004), Timestamp::new(3, 4));
    }

    #[test]
    fn converts_from_duration() {
        let t = Timestamp::from(Duration::from_micros(1_250_000));
        assert_eq!(t, Timestamp::new(1, 250_000));
        assert_eq!(t.to_string(), "1.250000s");
    }
}
