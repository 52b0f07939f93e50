//! The matrix handle and its scan loop.

use std::fmt::{Debug, Formatter};
use log::{debug, warn};
use crate::cell::CellState;
use crate::decoder::{self, Step};
use crate::{
    ButtonError, ButtonEvent, ButtonResult, Clock, Config, EventSink, MatrixIo, Timestamp,
    MAX_CELLS, MAX_LINES,
};

/// Decoder state for a whole button matrix.
///
/// Built with [`MultiButton::builder`], then brought up with [`init`](MultiButton::init).
/// The host calls [`process`](MultiButton::process) periodically, at least as often as
/// the scan period; nothing runs in the background.
pub struct MultiButton<'a> {
    matrix: Box<dyn MatrixIo + 'a>,
    clock: Box<dyn Clock + 'a>,
    sink: Box<dyn EventSink + 'a>,
    cells: [CellState; MAX_CELLS],
    rows: u8,
    cols: u8,
    config: Config,
    last_scan_time: Timestamp,
    initialized: bool,
}

impl Debug for MultiButton<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MultiButton({}x{}, {:?}, {:?})",
            self.rows, self.cols, self.matrix, self.clock
        )
    }
}

/// Collects the capabilities a [`MultiButton`] needs.
#[derive(Default)]
pub struct MultiButtonBuilder<'a> {
    matrix: Option<Box<dyn MatrixIo + 'a>>,
    clock: Option<Box<dyn Clock + 'a>>,
    sink: Option<Box<dyn EventSink + 'a>>,
}

impl<'a> MultiButtonBuilder<'a> {
    pub fn matrix(mut self, matrix: impl MatrixIo + 'a) -> Self {
        self.matrix = Some(Box::new(matrix));
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'a) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    pub fn event_sink(mut self, sink: impl EventSink + 'a) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Creates the (not yet initialized) handle.
    ///
    /// # Errors
    /// - `ButtonError::MissingCapability` naming the first capability that was not supplied.
    pub fn build(self) -> ButtonResult<MultiButton<'a>> {
        let matrix = self.matrix.ok_or(ButtonError::MissingCapability("matrix"))?;
        let clock = self.clock.ok_or(ButtonError::MissingCapability("clock"))?;
        let sink = self.sink.ok_or(ButtonError::MissingCapability("event sink"))?;

        Ok(MultiButton {
            matrix,
            clock,
            sink,
            cells: [CellState::default(); MAX_CELLS],
            rows: 0,
            cols: 0,
            config: Config::default(),
            last_scan_time: Timestamp::default(),
            initialized: false,
        })
    }
}

/// Generates a getter and a setter for a [`Config`] field.
macro_rules! config_accessors {
    ($($(#[$doc:meta])* $field:ident / $setter:ident;)*) => {
        $(
            $(#[$doc])*
            ///
            /// # Errors
            /// - `ButtonError::NotInitialized` if the handle is not initialized.
            pub fn $field(&self) -> ButtonResult<u32> {
                self.ensure_initialized()?;
                Ok(self.config.$field)
            }

            #[doc = concat!("Sets [`Config::", stringify!($field), "`].")]
            ///
            /// # Errors
            /// - `ButtonError::NotInitialized` if the handle is not initialized.
            pub fn $setter(&mut self, value: u32) -> ButtonResult<()> {
                self.ensure_initialized()?;
                self.config.$field = value;
                Ok(())
            }
        )*
    };
}

impl<'a> MultiButton<'a> {
    pub fn builder() -> MultiButtonBuilder<'a> {
        MultiButtonBuilder::default()
    }

    /// Sets up a `rows` by `cols` matrix with the default [`Config`] and initializes the matrix lines.
    ///
    /// # Errors
    /// - `ButtonError::AlreadyInitialized` if `init` already succeeded.
    /// - `ButtonError::InvalidDimensions` if either dimension is 0 or above 32, or the
    ///   matrix has more than 128 cells.
    /// - Any error from the clock or from [`MatrixIo::init`].
    pub fn init(&mut self, rows: u8, cols: u8) -> ButtonResult<()> {
        if self.initialized {
            return Err(ButtonError::AlreadyInitialized);
        }
        if rows == 0 || cols == 0 {
            warn!("Matrix needs at least one row and column, got {}x{}.", rows, cols);
            return Err(ButtonError::InvalidDimensions { rows, cols });
        }
        if rows > MAX_LINES || cols > MAX_LINES {
            warn!("Matrix is limited to {} rows and columns, got {}x{}.", MAX_LINES, rows, cols);
            return Err(ButtonError::InvalidDimensions { rows, cols });
        }
        if rows as usize * cols as usize > MAX_CELLS {
            warn!("Matrix is limited to {} cells, got {}x{}.", MAX_CELLS, rows, cols);
            return Err(ButtonError::InvalidDimensions { rows, cols });
        }

        let now = self.read_clock()?;
        self.rows = rows;
        self.cols = cols;
        self.last_scan_time = now;
        self.config = Config::default();
        self.cells = [CellState::released(now); MAX_CELLS];

        self.matrix.init().inspect_err(|e| warn!("Matrix init failed: {}", e))?;

        self.initialized = true;
        debug!("{:?} initialized.", self);
        Ok(())
    }

    /// Releases the matrix lines. The handle can be initialized again afterwards.
    ///
    /// # Errors
    /// - `ButtonError::NotInitialized` if the handle is not initialized.
    /// - Any error from [`MatrixIo::deinit`], in which case the handle stays initialized.
    pub fn deinit(&mut self) -> ButtonResult<()> {
        self.ensure_initialized()?;
        self.matrix.deinit().inspect_err(|e| warn!("Matrix deinit failed: {}", e))?;
        self.initialized = false;
        debug!("{:?} deinitialized.", self);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn cols(&self) -> u8 {
        self.cols
    }

    /// Gets the state of the cell at `row`, `col`, if it is inside the matrix.
    pub fn cell(&self, row: u8, col: u8) -> Option<&CellState> {
        if row < self.rows && col < self.cols {
            Some(&self.cells[self.index(row, col)])
        } else {
            None
        }
    }

    /// Scans every row once, debouncing all cells, and runs the pattern decoder when a
    /// scan period has passed since the last sweep.
    ///
    /// Per-cell problems (too fast edges, broken sequences, timeouts) reset the cell and
    /// are only logged.
    ///
    /// # Errors
    /// - `ButtonError::NotInitialized` if the handle is not initialized.
    /// - Any clock or matrix error. The rest of the scan is skipped.
    pub fn process(&mut self) -> ButtonResult<()> {
        self.ensure_initialized()?;

        let now = self.read_clock()?;
        let since_sweep = now.diff_us(self.last_scan_time);
        let period = i64::from(self.config.scan_period_us);
        if since_sweep > period {
            self.last_scan_time = now;
        }
        let sweep = since_sweep >= period;

        for row in 0..self.rows {
            self.select_row(row)?;
            let columns = self
                .matrix
                .read_row()
                .inspect_err(|e| warn!("Matrix read row failed: {}", e))?;

            for col in 0..self.cols {
                let raw_level = (columns >> col) & 1 != 0;
                self.observe(row, col, raw_level)?;
                if sweep {
                    self.decode(row, col, now);
                }
            }
        }

        Ok(())
    }

    /// Gets a copy of the whole configuration.
    ///
    /// # Errors
    /// - `ButtonError::NotInitialized` if the handle is not initialized.
    pub fn config(&self) -> ButtonResult<Config> {
        self.ensure_initialized()?;
        Ok(self.config)
    }

    /// Replaces the whole configuration.
    ///
    /// # Errors
    /// - `ButtonError::NotInitialized` if the handle is not initialized.
    pub fn set_config(&mut self, config: Config) -> ButtonResult<()> {
        self.ensure_initialized()?;
        self.config = config;
        Ok(())
    }

    config_accessors! {
        /// Gets the number of disagreeing samples that must be exceeded to accept a level change.
        debounce_threshold / set_debounce_threshold;
        /// Gets the minimum time between same-phase edges, in microseconds.
        interval_us / set_interval_us;
        /// Gets the hold time for a short press, in microseconds.
        short_press_us / set_short_press_us;
        /// Gets the hold time for a long press, in microseconds.
        long_press_us / set_long_press_us;
        /// Gets the largest gap between clicks of a multi-click, in microseconds.
        multi_click_gap_us / set_multi_click_gap_us;
        /// Gets the time after which an unfinished gesture is dropped, in microseconds.
        idle_timeout_us / set_idle_timeout_us;
        /// Gets the pattern decoder period, in microseconds.
        scan_period_us / set_scan_period_us;
    }

    fn ensure_initialized(&self) -> ButtonResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(ButtonError::NotInitialized)
        }
    }

    fn index(&self, row: u8, col: u8) -> usize {
        row as usize * self.cols as usize + col as usize
    }

    fn read_clock(&self) -> ButtonResult<Timestamp> {
        self.clock
            .now()
            .inspect_err(|e| warn!("Timestamp read failed: {}", e))
    }

    /// Drives `row` low and every other row high, then waits for the lines to settle.
    fn select_row(&mut self, row: u8) -> ButtonResult<()> {
        for other in 0..self.rows {
            self.matrix
                .write_row(u16::from(other), other != row)
                .inspect_err(|e| warn!("Matrix write row failed: {}", e))?;
        }
        self.clock.delay_ms(1);
        Ok(())
    }

    /// Runs the edge detector for one raw sample.
    fn observe(&mut self, row: u8, col: u8, raw_level: bool) -> ButtonResult<()> {
        let index = self.index(row, col);
        let Some(edge) = self.cells[index].debounce(raw_level, self.config.debounce_threshold) else {
            return Ok(());
        };

        let now = self.read_clock()?;
        if let Err(e) = self.cells[index].check_interval(edge, now, self.config.interval_us) {
            debug!("Button ({}, {}) {:?} dropped: {}", row, col, edge, e);
            return Ok(());
        }

        self.sink
            .on_event(u16::from(row), u16::from(col), ButtonEvent::new(edge.status(), 0));

        if let Err(e) = self.cells[index].append_edge(edge, now) {
            debug!("Button ({}, {}) {:?} not recorded: {}", row, col, edge, e);
        }
        Ok(())
    }

    /// Runs the pattern decoder for one cell.
    fn decode(&mut self, row: u8, col: u8, now: Timestamp) {
        let index = self.index(row, col);
        if self.cells[index].history_len() == 0 {
            return;
        }

        let sink = &mut self.sink;
        let step = decoder::decode(&mut self.cells[index], now, &self.config, &mut |event| {
            debug!("Button ({}, {}) {}.", row, col, event);
            sink.on_event(u16::from(row), u16::from(col), event)
        });

        match step {
            Step::Keep => {}
            Step::Reset => self.reset_cell(index),
            Step::Abandon(e) => {
                debug!("Button ({}, {}) gesture dropped: {}", row, col, e);
                self.reset_cell(index);
            }
        }
    }

    /// Resets a cell, stamping it with a fresh clock reading when one is available.
    fn reset_cell(&mut self, index: usize) {
        let now = self.read_clock().ok();
        self.cells[index].reset(now);
    }
}
