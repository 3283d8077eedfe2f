//! Our error types for the VME bridge and the modules behind it.

use std::time::Duration;

use strum_macros::{EnumIter, FromRepr};
use thiserror::Error;
use tracing::warn;

pub type Result<T> = core::result::Result<T, Error>;

/// Everything that can go wrong when talking to the bridge.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("VME bus error")]
    Bus,
    #[error("Communication error with the bridge")]
    Communication,
    #[error("Unspecified bridge error")]
    Generic,
    #[error("Invalid parameter passed to the bridge")]
    InvalidParameter,
    #[error("Bus cycle timed out")]
    Timeout,
    #[error("Unrecognised bridge result code {0}")]
    Unknown(i32),
    /// A parameter was rejected before any bus cycle was issued.
    #[error("{what} {value} out of range, allowed {min} to {max}")]
    OutOfRange {
        what: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    /// Another operation held the bus for longer than the guard timeout.
    #[error("Bus access guard not acquired within {0:?}")]
    LockTimeout(Duration),
    /// A register held a value that does not map onto the expected type.
    #[error("Raw {what} value {raw:#x} does not match any known variant")]
    Decode { what: &'static str, raw: u64 },
    /// A physical value was NaN or infinite.
    #[error("{0} must be a finite number")]
    NotFinite(&'static str),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Build a range error for an integral parameter.
    pub(crate) fn out_of_range(
        what: &'static str,
        value: impl Into<i64>,
        min: impl Into<i64>,
        max: impl Into<i64>,
    ) -> Self {
        Error::OutOfRange {
            what,
            value: value.into(),
            min: min.into(),
            max: max.into(),
        }
    }

    /// Return an [`Error::OutOfRange`] unless `min <= value <= max`.
    pub(crate) fn check_range<T>(what: &'static str, value: T, min: T, max: T) -> Result<()>
    where
        T: PartialOrd + Into<i64>,
    {
        if value < min || value > max {
            Err(Self::out_of_range(what, value, min, max))
        } else {
            Ok(())
        }
    }
}

/// Result codes returned by every bus cycle provider call.
#[derive(Debug, EnumIter, FromRepr, PartialEq, Eq, Clone, Copy)]
#[repr(i32)]
pub enum ErrorCode {
    /// 0: Operation completed.
    Success = 0,
    /// -1: VME bus error during the cycle.
    BusError = -1,
    /// -2: Link to the bridge failed.
    CommunicationError = -2,
    /// -3: Unspecified failure.
    GenericError = -3,
    /// -4: The driver rejected an argument.
    InvalidParameterError = -4,
    /// -5: The cycle did not complete in time.
    TimeoutError = -5,
}

impl From<ErrorCode> for i32 {
    fn from(value: ErrorCode) -> Self {
        value as i32
    }
}

/// Translate a provider result code, failing on anything but success.
///
/// Codes outside the documented set are reported as [`Error::Unknown`].
pub fn check(code: i32) -> Result<()> {
    match ErrorCode::from_repr(code) {
        Some(ErrorCode::Success) => Ok(()),
        Some(ErrorCode::BusError) => Err(Error::Bus),
        Some(ErrorCode::CommunicationError) => Err(Error::Communication),
        Some(ErrorCode::GenericError) => Err(Error::Generic),
        Some(ErrorCode::InvalidParameterError) => Err(Error::InvalidParameter),
        Some(ErrorCode::TimeoutError) => Err(Error::Timeout),
        None => {
            warn!(code, "Unrecognised bridge result code");
            Err(Error::Unknown(code))
        }
    }
}
