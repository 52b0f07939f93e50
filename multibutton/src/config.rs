/// Timing parameters shared by every cell of a handle.
///
/// Values are taken as given; no consistency between fields is enforced.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// Consecutive disagreeing samples that must be *exceeded* before a level change is accepted.
    pub debounce_threshold: u32,
    /// Minimum time between an accepted edge and the next edge of the same phase.
    pub interval_us: u32,
    /// Hold time after which a press is reported as a short press.
    pub short_press_us: u32,
    /// Hold time after which a press is reported as a long press.
    pub long_press_us: u32,
    /// Largest release-to-press gap still counted as part of a multi-click.
    pub multi_click_gap_us: u32,
    /// Time after the last edge at which an unfinished gesture is abandoned.
    pub idle_timeout_us: u32,
    /// How often the pattern decoder sweeps the matrix.
    pub scan_period_us: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            debounce_threshold: 2,
            interval_us: 5_000,
            short_press_us: 1_000_000,
            long_press_us: 3_000_000,
            multi_click_gap_us: 200_000,
            idle_timeout_us: 1_000_000,
            scan_period_us: 200_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_short_press_below_long_press() {
        let config = Config::default();
        assert!(config.short_press_us < config.long_press_us);
        assert!(config.multi_click_gap_us <= config.idle_timeout_us);
        assert_eq!(config.scan_period_us, 200_000);
    }
}
