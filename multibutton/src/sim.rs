//! Simulated collaborators for tests and hardware-free development.
//!
//! Each simulated device is shared with a control side, so a test can press buttons,
//! move time and inspect delivered events while a [`MultiButton`](crate::MultiButton)
//! owns the device itself.

use std::cell::{Cell, RefCell};
use std::fmt::{Debug, Formatter};
use std::rc::Rc;
use crate::{
    ButtonError, ButtonEvent, ButtonResult, ButtonStatus, Clock, EventSink, MatrixIo, Timestamp,
};

#[derive(Debug)]
struct MatrixState {
    rows: usize,
    cols: usize,
    pressed: Vec<bool>,
    row_levels: Vec<bool>,
    initialized: bool,
    init_calls: u32,
    deinit_calls: u32,
    fail_reads: bool,
    fail_writes: bool,
}

/// A button matrix living in memory.
///
/// Reading returns an active-low column mask: a column bit is low when a pressed button
/// connects it to a row that is currently driven low.
pub struct SimMatrix {
    state: Rc<RefCell<MatrixState>>,
}

/// Control side of a [`SimMatrix`].
#[derive(Clone)]
pub struct SimMatrixHandle {
    state: Rc<RefCell<MatrixState>>,
}

impl SimMatrix {
    /// Creates a `rows` by `cols` matrix with every button released and every row high.
    pub fn new(rows: usize, cols: usize) -> (Self, SimMatrixHandle) {
        let state = Rc::new(RefCell::new(MatrixState {
            rows,
            cols,
            pressed: vec![false; rows * cols],
            row_levels: vec![true; rows],
            initialized: false,
            init_calls: 0,
            deinit_calls: 0,
            fail_reads: false,
            fail_writes: false,
        }));
        let handle = SimMatrixHandle { state: state.clone() };
        (SimMatrix { state }, handle)
    }
}

impl Debug for SimMatrix {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        write!(f, "SimMatrix({}x{})", state.rows, state.cols)
    }
}

impl MatrixIo for SimMatrix {
    fn init(&mut self) -> ButtonResult<()> {
        let mut state = self.state.borrow_mut();
        state.initialized = true;
        state.init_calls += 1;
        Ok(())
    }

    fn deinit(&mut self) -> ButtonResult<()> {
        let mut state = self.state.borrow_mut();
        state.initialized = false;
        state.deinit_calls += 1;
        Ok(())
    }

    fn write_row(&mut self, row: u16, level: bool) -> ButtonResult<()> {
        let mut state = self.state.borrow_mut();
        if state.fail_writes {
            return Err(ButtonError::Io(std::io::ErrorKind::BrokenPipe));
        }
        let row = row as usize;
        if row >= state.rows {
            return Err(ButtonError::Other(format!("no row {}", row)));
        }
        state.row_levels[row] = level;
        Ok(())
    }

    fn read_row(&mut self) -> ButtonResult<u32> {
        let state = self.state.borrow();
        if state.fail_reads {
            return Err(ButtonError::Io(std::io::ErrorKind::BrokenPipe));
        }

        let mut columns = u32::MAX;
        for row in (0..state.rows).filter(|&row| !state.row_levels[row]) {
            for col in 0..state.cols {
                if state.pressed[row * state.cols + col] {
                    columns &= !(1 << col);
                }
            }
        }
        Ok(columns)
    }
}

impl SimMatrixHandle {
    pub fn press(&self, row: usize, col: usize) {
        self.set_pressed(row, col, true);
    }

    pub fn release(&self, row: usize, col: usize) {
        self.set_pressed(row, col, false);
    }

    pub fn set_pressed(&self, row: usize, col: usize, pressed: bool) {
        let mut state = self.state.borrow_mut();
        let cols = state.cols;
        state.pressed[row * cols + col] = pressed;
    }

    /// Gets the level each row line is currently driven to.
    pub fn row_levels(&self) -> Vec<bool> {
        self.state.borrow().row_levels.clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.state.borrow().initialized
    }

    /// Gets how many times `init` and `deinit` were called.
    pub fn lifecycle_calls(&self) -> (u32, u32) {
        let state = self.state.borrow();
        (state.init_calls, state.deinit_calls)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.state.borrow_mut().fail_reads = fail;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.state.borrow_mut().fail_writes = fail;
    }
}

/// A virtual clock. Clones share the same time.
///
/// [`Clock::delay_ms`] advances the time instead of blocking.
#[derive(Clone, Default)]
pub struct SimClock {
    now: Rc<Cell<Timestamp>>,
    failing: Rc<Cell<bool>>,
}

impl SimClock {
    pub fn starting_at(start: Timestamp) -> Self {
        SimClock {
            now: Rc::new(Cell::new(start)),
            failing: Rc::new(Cell::new(false)),
        }
    }

    pub fn time(&self) -> Timestamp {
        self.now.get()
    }

    pub fn set(&self, now: Timestamp) {
        self.now.set(now);
    }

    pub fn advance_us(&self, us: u64) {
        self.now.set(self.now.get().add_micros(us));
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance_us(ms * 1000);
    }

    /// Makes every following [`Clock::now`] call fail, or succeed again.
    pub fn fail(&self, fail: bool) {
        self.failing.set(fail);
    }
}

impl Debug for SimClock {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimClock({})", self.now.get())
    }
}

impl Clock for SimClock {
    fn now(&self) -> ButtonResult<Timestamp> {
        if self.failing.get() {
            Err(ButtonError::Io(std::io::ErrorKind::Other))
        } else {
            Ok(self.now.get())
        }
    }

    fn delay_ms(&self, ms: u32) {
        self.advance_ms(u64::from(ms));
    }
}

/// An [`EventSink`] that records everything it receives. Clones share the record.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<(u16, u16, ButtonEvent)>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(u16, u16, ButtonEvent)> {
        self.events.borrow().clone()
    }

    /// Gets the recorded statuses, in order.
    pub fn statuses(&self) -> Vec<ButtonStatus> {
        self.events.borrow().iter().map(|(_, _, event)| event.status).collect()
    }

    /// Gets only the decoded gestures, leaving out presses and releases.
    pub fn gestures(&self) -> Vec<ButtonEvent> {
        self.events
            .borrow()
            .iter()
            .map(|&(_, _, event)| event)
            .filter(|event| event.status.is_gesture())
            .collect()
    }

    pub fn count(&self, status: ButtonStatus) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|(_, _, event)| event.status == status)
            .count()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl EventSink for EventLog {
    fn on_event(&mut self, row: u16, col: u16, event: ButtonEvent) {
        self.events.borrow_mut().push((row, col, event));
    }
}
