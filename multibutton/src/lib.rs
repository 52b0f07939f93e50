//! Decoding engine for scanned button matrices.
//!
//! Raw column samples go through a per-cell debounce/edge detector, and a periodic
//! pattern decoder turns each cell's edge history into clicks and presses.
//! Hardware, time and event delivery are reached only through the traits in
//! [`interface`].

pub mod cell;
pub mod config;
mod decoder;
pub mod event;
pub mod handle;
pub mod info;
pub mod interface;
pub mod sim;
pub mod timestamp;

use thiserror::Error;

pub use cell::{CellState, Edge, EdgeRecord};
pub use config::Config;
pub use event::{ButtonEvent, ButtonStatus, StatusSet};
pub use handle::{MultiButton, MultiButtonBuilder};
pub use info::{info, ButtonInfo};
pub use interface::{Clock, EventSink, MatrixIo};
pub use timestamp::Timestamp;

/// Most cells a single handle can track.
pub const MAX_CELLS: usize = 128;
/// Most rows, and most columns, a matrix can have.
pub const MAX_LINES: u8 = 32;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum ButtonError {
    #[error("handle is not initialized")]
    NotInitialized,
    #[error("handle is already initialized")]
    AlreadyInitialized,
    #[error("invalid matrix dimensions {rows}x{cols}")]
    InvalidDimensions { rows: u8, cols: u8 },
    #[error("missing capability: {0}")]
    MissingCapability(&'static str),
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
    #[error("edge arrived faster than the configured interval")]
    RateLimited,
    #[error("edge sequence is out of phase")]
    SequenceViolation,
    #[error("gesture abandoned after idle timeout")]
    IdleTimeout,
    #[error("error: {0}")]
    Other(String),
}

impl ButtonError {
    /// Whether the error only concerns a single cell, which has already been reset.
    ///
    /// Recoverable errors never abort a scan.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ButtonError::RateLimited | ButtonError::SequenceViolation | ButtonError::IdleTimeout
        )
    }
}

impl From<std::io::Error> for ButtonError {
    fn from(err: std::io::Error) -> Self {
        ButtonError::Io(err.kind())
    }
}

pub type ButtonResult<T> = Result<T, ButtonError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_cell_errors_are_recoverable() {
        assert!(ButtonError::RateLimited.is_recoverable());
        assert!(ButtonError::SequenceViolation.is_recoverable());
        assert!(ButtonError::IdleTimeout.is_recoverable());
        assert!(!ButtonError::NotInitialized.is_recoverable());
        assert!(!ButtonError::Io(std::io::ErrorKind::TimedOut).is_recoverable());
    }

    #[test]
    fn io_errors_keep_their_kind() {
        let err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        assert_eq!(ButtonError::from(err), ButtonError::Io(std::io::ErrorKind::BrokenPipe));
    }
}
