use std::thread;
use std::time::Duration;
use time::OffsetDateTime;
use multibutton::{ButtonError, ButtonResult, Clock, Timestamp};

/// A [`Clock`] backed by the system's UTC wall clock.
///
/// Readings are not monotonic: stepping the system clock shows up in them. A backwards
/// step only delays timing decisions, since every comparison is signed.
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        SystemClock
    }
}

impl Clock for SystemClock {
    fn now(&self) -> ButtonResult<Timestamp> {
        let since_epoch = OffsetDateTime::now_utc() - OffsetDateTime::UNIX_EPOCH;
        let since_epoch = Duration::try_from(since_epoch)
            .map_err(|_| ButtonError::Other("system time is before the epoch".to_string()))?;
        Ok(Timestamp::from(since_epoch))
    }

    fn delay_ms(&self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}
