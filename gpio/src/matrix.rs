//! Button matrix on a GPIO character device, using the gpiod library.

use std::collections::HashSet;
use std::fmt::{Debug, Formatter};
use std::path::Path;
use log::debug;
use multibutton::{ButtonResult, MatrixIo, MAX_LINES};
use crate::{GpioError, GpioResult};

/// A [`MatrixIo`] whose rows and columns are lines of one GPIO chip.
///
/// Rows are requested as outputs and columns as inputs with pull-ups, so a released
/// button reads high.
pub struct GpiodMatrix {
    chip: gpiod::Chip,
    row_lines: Vec<u32>,
    col_lines: Vec<u32>,
    rows: Vec<gpiod::Lines<gpiod::Output>>,
    cols: Vec<gpiod::Lines<gpiod::Input>>,
}

impl GpiodMatrix {
    /// Opens the chip at `chip_path` and checks the line numbers. No line is requested yet.
    ///
    /// # Errors
    /// - `GpioError::NoLines` or `GpioError::TooManyLines` for empty or oversized line lists.
    /// - `GpioError::AlreadyInUse` if a line appears twice.
    /// - `GpioError::OutOfRange` if the chip does not have a line.
    pub fn open(
        chip_path: &Path,
        row_lines: &[u32],
        col_lines: &[u32],
    ) -> GpioResult<Self> {
        let chip = gpiod::Chip::new(chip_path)?;
        validate_lines(row_lines, col_lines, chip.num_lines() as u32)?;

        Ok(GpiodMatrix {
            chip,
            row_lines: row_lines.to_vec(),
            col_lines: col_lines.to_vec(),
            rows: Vec::new(),
            cols: Vec::new(),
        })
    }

    pub fn row_count(&self) -> usize {
        self.row_lines.len()
    }

    pub fn col_count(&self) -> usize {
        self.col_lines.len()
    }

    fn request_rows(&self) -> GpioResult<Vec<gpiod::Lines<gpiod::Output>>> {
        self.row_lines
            .iter()
            .map(|&line| -> GpioResult<gpiod::Lines<gpiod::Output>> {
                let output = self.chip.request_lines(
                    gpiod::Options::output([line]).consumer(env!("CARGO_PKG_NAME")),
                )?;
                output.set_values([true])?;
                Ok(output)
            })
            .collect()
    }

    fn request_cols(&self) -> GpioResult<Vec<gpiod::Lines<gpiod::Input>>> {
        self.col_lines
            .iter()
            .map(|&line| -> GpioResult<gpiod::Lines<gpiod::Input>> {
                let input = self.chip.request_lines(
                    gpiod::Options::input([line])
                        .consumer(env!("CARGO_PKG_NAME"))
                        .bias(gpiod::Bias::PullUp),
                )?;
                Ok(input)
            })
            .collect()
    }
}

impl Debug for GpiodMatrix {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "GpiodMatrix({}, rows {:?}, cols {:?})",
            self.chip.name(),
            self.row_lines,
            self.col_lines
        )
    }
}

impl MatrixIo for GpiodMatrix {
    fn init(&mut self) -> ButtonResult<()> {
        let rows = self.request_rows()?;
        let cols = self.request_cols()?;
        self.rows = rows;
        self.cols = cols;
        debug!("{:?} lines requested.", self);
        Ok(())
    }

    fn deinit(&mut self) -> ButtonResult<()> {
        self.rows.clear();
        self.cols.clear();
        debug!("{:?} lines released.", self);
        Ok(())
    }

    fn write_row(&mut self, row: u16, level: bool) -> ButtonResult<()> {
        let output = self.rows.get(row as usize).ok_or(GpioError::NotRequested)?;
        output.set_values([level])?;
        Ok(())
    }

    fn read_row(&mut self) -> ButtonResult<u32> {
        if self.cols.is_empty() {
            return Err(GpioError::NotRequested.into());
        }

        let mut columns = 0u32;
        for (bit, input) in self.cols.iter().enumerate() {
            let [value] = input.get_values([false])?;
            if value {
                columns |= 1 << bit;
            }
        }
        Ok(columns)
    }
}

/// Checks that the row and column lines are usable together on a chip with `count` lines.
fn validate_lines(row_lines: &[u32], col_lines: &[u32], count: u32) -> GpioResult<()> {
    for lines in [row_lines, col_lines] {
        if lines.is_empty() {
            return Err(GpioError::NoLines);
        }
        if lines.len() > MAX_LINES as usize {
            return Err(GpioError::TooManyLines(lines.len()));
        }
    }

    let mut seen = HashSet::new();
    for &line in row_lines.iter().chain(col_lines) {
        if line >= count {
            return Err(GpioError::OutOfRange { line, count });
        }
        if !seen.insert(line) {
            return Err(GpioError::AlreadyInUse(line));
        }
    }
    Ok(())
}
