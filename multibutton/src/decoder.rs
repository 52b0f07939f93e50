//! Classification of a cell's edge history into gestures.

use log::debug;
use crate::cell::CellState;
use crate::{ButtonError, ButtonEvent, ButtonStatus, Config, Timestamp};

/// What the caller has to do with the cell after a decoder pass.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Step {
    /// The gesture is still in progress.
    Keep,
    /// The gesture is complete; reset the cell.
    Reset,
    /// The gesture is unusable; reset the cell and report the error.
    Abandon(ButtonError),
}

/// Inspects the history of `cell` at `now`, passing any decoded events to `emit`.
///
/// Press/release boundaries measure hold time, so only release-to-press gaps count
/// towards multi-click spacing.
pub(crate) fn decode(
    cell: &mut CellState,
    now: Timestamp,
    config: &Config,
    emit: &mut impl FnMut(ButtonEvent),
) -> Step {
    match cell.history_len() {
        0 => Step::Keep,
        1 => {
            let held_since = cell.history()[0].at;

            if now.elapsed_at_least(held_since, config.short_press_us) && !cell.short_triggered() {
                emit(ButtonEvent::new(ButtonStatus::ShortPressStart, 0));
                cell.mark_short_triggered();
            }
            if now.elapsed_at_least(held_since, config.long_press_us) {
                if cell.long_triggered() {
                    emit(ButtonEvent::new(ButtonStatus::LongPressHold, 0));
                } else {
                    emit(ButtonEvent::new(ButtonStatus::LongPressStart, 0));
                    cell.mark_long_triggered();
                }
            }
            Step::Keep
        }
        2 => {
            let released_at = cell.history()[1].at;

            if cell.long_triggered() {
                emit(ButtonEvent::new(ButtonStatus::LongPressEnd, 0));
                Step::Reset
            } else if cell.short_triggered() {
                emit(ButtonEvent::new(ButtonStatus::ShortPressEnd, 0));
                Step::Reset
            } else if now.elapsed_at_least(released_at, config.multi_click_gap_us) {
                emit(ButtonEvent::new(ButtonStatus::SingleClick, 1));
                Step::Reset
            } else {
                Step::Keep
            }
        }
        len if len % 2 == 0 => {
            if !now.elapsed_at_least(cell.last_edge_time(), config.multi_click_gap_us) {
                return Step::Keep;
            }

            let status = match len {
                4 => ButtonStatus::DoubleClick,
                6 => ButtonStatus::TripleClick,
                _ => ButtonStatus::RepeatClick,
            };
            if !clicks_are_close(cell, now, config.multi_click_gap_us) {
                debug!("{} rejected: clicks too far apart", status);
                return Step::Abandon(ButtonError::SequenceViolation);
            }

            emit(ButtonEvent::new(status, (len / 2) as u16));
            Step::Reset
        }
        _ => {
            if now.elapsed_at_least(cell.last_edge_time(), config.idle_timeout_us) {
                debug!("reset checking after {} edges", cell.history_len());
                Step::Abandon(ButtonError::IdleTimeout)
            } else {
                Step::Keep
            }
        }
    }
}

/// Fills in the gaps between the recorded edges and checks every release-to-press gap.
///
/// The last record gets the time from its edge to `now`.
fn clicks_are_close(cell: &mut CellState, now: Timestamp, max_gap_us: u32) -> bool {
    let history = cell.history_mut();
    let last = history.len() - 1;

    for i in 0..last {
        history[i].gap_to_next_us = history[i + 1].at.diff_us(history[i].at);
    }
    history[last].gap_to_next_us = now.diff_us(history[last].at);

    history[..last]
        .iter()
        .skip(1)
        .step_by(2)
        .all(|record| record.gap_to_next_us < i64::from(max_gap_us))
}
