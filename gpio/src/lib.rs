//! Linux host collaborators for the `multibutton` engine.
//!
//! [`GpiodMatrix`] wires a button matrix to a GPIO character device, and
//! [`SystemClock`] reads the wall clock.

pub mod clock;
pub mod matrix;

use thiserror::Error;
use multibutton::ButtonError;

pub use clock::SystemClock;
pub use matrix::GpiodMatrix;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum GpioError {
    #[error("line {0} is used more than once")]
    AlreadyInUse(u32),
    #[error("line {line} is out of range, the chip has {count} lines")]
    OutOfRange { line: u32, count: u32 },
    #[error("too many lines: {0}, at most 32 are supported")]
    TooManyLines(usize),
    #[error("no lines given")]
    NoLines,
    #[error("lines are not requested")]
    NotRequested,
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
}

impl From<std::io::Error> for GpioError {
    fn from(err: std::io::Error) -> Self {
        GpioError::Io(err.kind())
    }
}

impl From<GpioError> for ButtonError {
    fn from(err: GpioError) -> Self {
        match err {
            GpioError::Io(kind) => ButtonError::Io(kind),
            other => ButtonError::Other(other.to_string()),
        }
    }
}

pub type GpioResult<T> = Result<T, GpioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpio_errors_map_onto_button_errors() {
        let io = GpioError::from(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert_eq!(ButtonError::from(io), ButtonError::Io(std::io::ErrorKind::PermissionDenied));
        assert_eq!(
            ButtonError::from(GpioError::AlreadyInUse(17)),
            ButtonError::Other("line 17 is used more than once".to_string())
        );
    }
}
