//! Our error types for the DPM86xx PSUs.

use thiserror::Error;

use crate::function::Function;

pub type Result<T, I> = core::result::Result<T, Error<I>>;

/// Custom error type for DPM86xx PSU communications.
#[derive(Error, Debug)]
pub enum Error<I: embedded_io::Error> {
    #[error("Serial communication error")]
    SerialError(I),
    /// No line terminator was received before the response deadline.
    #[error("Communication timeout")]
    Timeout,
    /// The response did not fit in the receive buffer.
    #[error("Response exceeds receive buffer")]
    BufferOverflow,
    /// The response could not be parsed, or answered a different request.
    #[error("Response frame mismatch")]
    FrameMismatch,
    /// The function can't be used in the requested direction, e.g. reading a setpoint.
    #[error("Function {0:?} not supported for this operation")]
    InvalidFunction(Function),
}

impl<I: embedded_io::Error> Error<I> {
    /// Numeric status code for this error. See [`Status`].
    pub fn status(&self) -> Status {
        match self {
            Error::SerialError(_) => Status::Serial,
            Error::Timeout => Status::Timeout,
            Error::BufferOverflow => Status::BufferOverflow,
            Error::FrameMismatch | Error::InvalidFunction(_) => Status::FrameMismatch,
        }
    }

    /// Whether a fresh exchange might succeed where this one failed.
    pub(crate) fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Timeout | Error::BufferOverflow | Error::FrameMismatch
        )
    }
}

/// Status codes as reported on the wire-level API of the PSU driver.
///
/// Zero means success, failures are small negative numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Status {
    /// Serial channel failure, outside of the protocol itself.
    Serial = -4,
    /// The response frame is not the expected one or could not be parsed.
    FrameMismatch = -3,
    /// Number of received bytes exceeds the capacity of the receive buffer.
    BufferOverflow = -2,
    /// Timeout while waiting for the response line.
    Timeout = -1,
    /// All OK.
    Ok = 0,
}

impl Status {
    pub const fn code(self) -> i32 {
        self as i32
    }
}

impl<T, I: embedded_io::Error> From<&Result<T, I>> for Status {
    fn from(value: &Result<T, I>) -> Self {
        match value {
            Ok(_) => Status::Ok,
            Err(err) => err.status(),
        }
    }
}
