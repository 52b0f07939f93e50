//! Shared setup for driving a handle through simulated hardware.

#![allow(dead_code)]

use multibutton::sim::{EventLog, SimClock, SimMatrix, SimMatrixHandle};
use multibutton::{MultiButton, Timestamp};

/// Time added after every `process` call, on top of the per-row settle delay.
pub const TICK_MS: u64 = 4;

pub struct Rig {
    pub buttons: MultiButton<'static>,
    pub matrix: SimMatrixHandle,
    pub clock: SimClock,
    pub log: EventLog,
}

impl Rig {
    /// Creates an initialized handle over a simulated `rows` by `cols` matrix.
    pub fn new(rows: u8, cols: u8) -> Self {
        let mut rig = Self::uninitialized(rows, cols);
        rig.buttons.init(rows, cols).expect("init failed");
        rig
    }

    pub fn uninitialized(rows: u8, cols: u8) -> Self {
        let (matrix, handle) = SimMatrix::new(rows as usize, cols as usize);
        let clock = SimClock::starting_at(Timestamp::new(1_000, 0));
        let log = EventLog::new();
        let buttons = MultiButton::builder()
            .matrix(matrix)
            .clock(clock.clone())
            .event_sink(log.clone())
            .build()
            .expect("build failed");
        Rig { buttons, matrix: handle, clock, log }
    }

    /// Keeps calling `process` for at least `ms` milliseconds of virtual time.
    pub fn run_ms(&mut self, ms: u64) {
        let end = self.clock.time().add_micros(ms * 1000);
        while self.clock.time() < end {
            self.buttons.process().expect("process failed");
            self.clock.advance_ms(TICK_MS);
        }
    }

    /// Presses the button for `hold_ms`, then leaves it released for `gap_ms`.
    pub fn click(&mut self, row: usize, col: usize, hold_ms: u64, gap_ms: u64) {
        self.matrix.press(row, col);
        self.run_ms(hold_ms);
        self.matrix.release(row, col);
        self.run_ms(gap_ms);
    }
}
