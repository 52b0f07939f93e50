//! Per-cell debounce and edge tracking.
//!
//! Every matrix position owns a [`CellState`]. Raw samples are debounced into a stable
//! level, and each accepted level change is appended to the cell's edge history, which
//! the decoder later classifies into gestures.

use crate::{ButtonError, ButtonResult, ButtonStatus, Timestamp};

/// Most edges a cell can remember.
pub const HISTORY_CAPACITY: usize = 16;
/// History length at which the history is dropped before the next edge is appended.
const HISTORY_RESET_LEN: usize = HISTORY_CAPACITY - 1;

/// A confirmed level transition.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Edge {
    /// High to low.
    Press,
    /// Low to high.
    Release,
}

impl Edge {
    pub fn status(self) -> ButtonStatus {
        match self {
            Edge::Press => ButtonStatus::Press,
            Edge::Release => ButtonStatus::Release,
        }
    }
}

/// One entry of a cell's edge history.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct EdgeRecord {
    pub at: Timestamp,
    /// Microseconds until the following edge. Only filled in by the decoder.
    pub gap_to_next_us: i64,
}

/// Debounce and gesture state of a single button.
///
/// Even history indices hold presses, odd ones releases.
#[derive(Copy, Clone, Debug)]
pub struct CellState {
    level: bool,
    debounce_count: u32,
    last_edge_time: Timestamp,
    history: [EdgeRecord; HISTORY_CAPACITY],
    history_len: usize,
    short_triggered: bool,
    long_triggered: bool,
}

impl Default for CellState {
    fn default() -> Self {
        CellState::released(Timestamp::default())
    }
}

impl CellState {
    /// A cell at rest (high level) with an empty history.
    pub fn released(now: Timestamp) -> Self {
        CellState {
            level: true,
            debounce_count: 0,
            last_edge_time: now,
            history: [EdgeRecord::default(); HISTORY_CAPACITY],
            history_len: 0,
            short_triggered: false,
            long_triggered: false,
        }
    }

    /// The debounced line level; `true` is high, i.e. released.
    pub fn level(&self) -> bool {
        self.level
    }

    pub fn is_pressed(&self) -> bool {
        !self.level
    }

    pub fn debounce_count(&self) -> u32 {
        self.debounce_count
    }

    pub fn last_edge_time(&self) -> Timestamp {
        self.last_edge_time
    }

    pub fn history(&self) -> &[EdgeRecord] {
        &self.history[..self.history_len]
    }

    pub fn history_len(&self) -> usize {
        self.history_len
    }

    pub fn short_triggered(&self) -> bool {
        self.short_triggered
    }

    pub fn long_triggered(&self) -> bool {
        self.long_triggered
    }

    /// The edge that keeps the history alternating.
    pub fn expected_edge(&self) -> Edge {
        if self.history_len % 2 == 0 {
            Edge::Press
        } else {
            Edge::Release
        }
    }

    /// Feeds one raw sample into the debouncer.
    ///
    /// A level change is accepted once more than `threshold` consecutive samples disagree
    /// with the stable level; any agreeing sample starts the count over.
    pub fn debounce(&mut self, raw_level: bool, threshold: u32) -> Option<Edge> {
        if raw_level == self.level {
            self.debounce_count = 0;
            return None;
        }

        self.debounce_count += 1;
        if self.debounce_count <= threshold {
            return None;
        }

        self.level = raw_level;
        self.debounce_count = 0;
        Some(if raw_level { Edge::Release } else { Edge::Press })
    }

    /// Applies the same-phase rate limit to an accepted edge that happened at `now`.
    ///
    /// An edge that passes is reported to the host before it is appended.
    /// - [`ButtonError::RateLimited`] if the edge came less than `interval_us` after the
    ///   previous one while it was the expected edge. The cell has been reset to `now`.
    pub fn check_interval(&mut self, edge: Edge, now: Timestamp, interval_us: u32) -> ButtonResult<()> {
        if edge == self.expected_edge()
            && !now.elapsed_at_least(self.last_edge_time, interval_us)
        {
            self.reset(Some(now));
            return Err(ButtonError::RateLimited);
        }
        Ok(())
    }

    /// Appends an edge that already passed [`check_interval`](Self::check_interval).
    ///
    /// A history of 15 or more edges is dropped first.
    /// - [`ButtonError::SequenceViolation`] if the edge is not the expected one. The cell
    ///   has been reset to `now` and nothing was recorded.
    pub fn append_edge(&mut self, edge: Edge, now: Timestamp) -> ButtonResult<()> {
        if self.history_len >= HISTORY_RESET_LEN {
            self.reset(Some(now));
        }

        if edge != self.expected_edge() {
            self.reset(Some(now));
            return Err(ButtonError::SequenceViolation);
        }

        self.history[self.history_len] = EdgeRecord { at: now, gap_to_next_us: 0 };
        self.history_len += 1;
        self.last_edge_time = now;
        Ok(())
    }

    /// Runs [`check_interval`](Self::check_interval) and [`append_edge`](Self::append_edge).
    pub fn record_edge(&mut self, edge: Edge, now: Timestamp, interval_us: u32) -> ButtonResult<()> {
        self.check_interval(edge, now, interval_us)?;
        self.append_edge(edge, now)
    }

    /// Forgets the current gesture. The level and debounce state are kept.
    ///
    /// `last_edge_time` stays as it was when `now` is `None`.
    pub fn reset(&mut self, now: Option<Timestamp>) {
        self.history_len = 0;
        self.short_triggered = false;
        self.long_triggered = false;
        if let Some(now) = now {
            self.last_edge_time = now;
        }
    }

    pub(crate) fn history_mut(&mut self) -> &mut [EdgeRecord] {
        &mut self.history[..self.history_len]
    }

    pub(crate) fn mark_short_triggered(&mut self) {
        self.short_triggered = true;
    }

    pub(crate) fn mark_long_triggered(&mut self) {
        self.long_triggered = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at_ms(ms: u64) -> Timestamp {
        Timestamp::from_micros(ms * 1000)
    }

    #[test]
    fn change_needs_more_than_threshold_samples() {
        let mut cell = CellState::released(at_ms(0));
        assert_eq!(cell.debounce(false, 2), None);
        assert_eq!(cell.debounce(false, 2), None);
        assert_eq!(cell.debounce(false, 2), Some(Edge::Press));
        assert!(cell.is_pressed());
        assert_eq!(cell.debounce_count(), 0);

        assert_eq!(cell.debounce(true, 0), Some(Edge::Release));
        assert!(!cell.is_pressed());
    }

    #[test]
    fn agreeing_sample_restarts_debounce() {
        let mut cell = CellState::released(at_ms(0));
        cell.debounce(false, 2);
        cell.debounce(false, 2);
        assert_eq!(cell.debounce(true, 2), None);
        assert_eq!(cell.debounce_count(), 0);
        assert_eq!(cell.debounce(false, 2), None);
        assert!(cell.level());
    }

    #[test]
    fn records_alternating_edges() {
        let mut cell = CellState::released(at_ms(0));
        cell.record_edge(Edge::Press, at_ms(10), 5_000).unwrap();
        cell.record_edge(Edge::Release, at_ms(50), 5_000).unwrap();

        assert_eq!(cell.history_len(), 2);
        assert_eq!(cell.history()[0].at, at_ms(10));
        assert_eq!(cell.history()[1].at, at_ms(50));
        assert_eq!(cell.last_edge_time(), at_ms(50));
    }

    #[test]
    fn fast_retrigger_resets_cell() {
        let mut cell = CellState::released(at_ms(0));
        cell.record_edge(Edge::Press, at_ms(10), 5_000).unwrap();
        cell.record_edge(Edge::Release, at_ms(20), 5_000).unwrap();

        let result = cell.record_edge(Edge::Press, at_ms(22), 5_000);
        assert_eq!(result, Err(ButtonError::RateLimited));
        assert_eq!(cell.history_len(), 0);
        assert_eq!(cell.last_edge_time(), at_ms(22));
    }

    #[test]
    fn out_of_phase_edge_resets_cell() {
        let mut cell = CellState::released(at_ms(0));
        let result = cell.record_edge(Edge::Release, at_ms(100), 5_000);
        assert_eq!(result, Err(ButtonError::SequenceViolation));
        assert_eq!(cell.history_len(), 0);

        cell.record_edge(Edge::Press, at_ms(200), 5_000).unwrap();
        let result = cell.record_edge(Edge::Press, at_ms(300), 5_000);
        assert_eq!(result, Err(ButtonError::SequenceViolation));
        assert_eq!(cell.history_len(), 0);
        assert_eq!(cell.last_edge_time(), at_ms(300));
    }

    #[test]
    fn release_on_full_history_passes_interval_then_breaks_phase() {
        let mut cell = CellState::released(at_ms(0));
        for i in 0..15u64 {
            let edge = if i % 2 == 0 { Edge::Press } else { Edge::Release };
            cell.record_edge(edge, at_ms(10 * (i + 1)), 5_000).unwrap();
        }
        assert_eq!(cell.history_len(), 15);

        // The release is in time, so it gets reported, but lands on an emptied history.
        assert_eq!(cell.check_interval(Edge::Release, at_ms(200), 5_000), Ok(()));
        assert_eq!(cell.history_len(), 15);
        assert_eq!(
            cell.append_edge(Edge::Release, at_ms(200)),
            Err(ButtonError::SequenceViolation)
        );
        assert_eq!(cell.history_len(), 0);
        assert_eq!(cell.last_edge_time(), at_ms(200));
    }

    #[test]
    fn opposite_edge_is_never_rate_limited() {
        let mut cell = CellState::released(at_ms(0));
        cell.record_edge(Edge::Press, at_ms(10), 5_000).unwrap();
        assert_eq!(cell.check_interval(Edge::Press, at_ms(11), 5_000), Ok(()));
        assert_eq!(cell.history_len(), 1);
    }

    #[test]
    fn reset_keeps_level() {
        let mut cell = CellState::released(at_ms(0));
        cell.debounce(false, 0);
        cell.record_edge(Edge::Press, at_ms(10), 0).unwrap();
        cell.mark_long_triggered();

        cell.reset(None);
        assert!(cell.is_pressed());
        assert!(!cell.long_triggered());
        assert_eq!(cell.last_edge_time(), at_ms(10));
    }

    proptest! {
        #[test]
        fn short_glitches_never_change_level(
            threshold in 0u32..8,
            glitch in 0u32..8,
        ) {
            let glitch = glitch.min(threshold);
            let mut cell = CellState::released(at_ms(0));
            for _ in 0..glitch {
                prop_assert_eq!(cell.debounce(false, threshold), None);
            }
            prop_assert_eq!(cell.debounce(true, threshold), None);
            prop_assert!(cell.level());
            prop_assert_eq!(cell.debounce_count(), 0);
        }

        #[test]
        fn history_stays_bounded_and_alternating(
            samples in prop::collection::vec((any::<bool>(), 0u64..40), 1..400),
        ) {
            let mut cell = CellState::released(at_ms(0));
            let mut now = at_ms(0);
            for (raw, step_ms) in samples {
                now = now.add_micros(step_ms * 1000);
                if let Some(edge) = cell.debounce(raw, 1) {
                    if cell.record_edge(edge, now, 5_000).is_ok() {
                        let index = cell.history_len() - 1;
                        prop_assert_eq!(edge == Edge::Press, index % 2 == 0);
                    }
                }
                prop_assert!(cell.history_len() < HISTORY_CAPACITY);
            }
        }
    }
}
