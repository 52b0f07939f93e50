//! Capabilities the engine needs from its host.
//!
//! A [`MultiButton`](crate::MultiButton) owns one of each, injected through its builder.
//! Diagnostics go through the `log` facade, so hosts install a logger instead of
//! supplying a print function.

use std::fmt::Debug;
use crate::{ButtonEvent, ButtonResult, Timestamp};

/// Row drivers and column sensors of a button matrix.
///
/// The matrix is active-low: the scanned row is driven low, and a pressed button pulls
/// its column bit low.
pub trait MatrixIo: Debug {
    /// Prepares the lines. Called once by [`MultiButton::init`](crate::MultiButton::init).
    fn init(&mut self) -> ButtonResult<()>;

    /// Releases the lines. Called once by [`MultiButton::deinit`](crate::MultiButton::deinit).
    fn deinit(&mut self) -> ButtonResult<()>;

    /// Drives the row line at `row` to `level` (`true` is high).
    fn write_row(&mut self, row: u16, level: bool) -> ButtonResult<()>;

    /// Reads the column lines, bit `n` being column `n`.
    fn read_row(&mut self) -> ButtonResult<u32>;
}

/// A monotonic time source that can also block for a while.
pub trait Clock: Debug {
    fn now(&self) -> ButtonResult<Timestamp>;

    fn delay_ms(&self, ms: u32);
}

/// Receives decoded events.
pub trait EventSink {
    fn on_event(&mut self, row: u16, col: u16, event: ButtonEvent);
}

impl<F> EventSink for F
where
    F: FnMut(u16, u16, ButtonEvent),
{
    fn on_event(&mut self, row: u16, col: u16, event: ButtonEvent) {
        self(row, col, event)
    }
}
