//! Error taxonomy shared by the catalog, the propagator and the converters

use thiserror::Error;

use crate::catalog::SatKey;
use crate::sgp4::Sgp4Status;
use crate::tle::EphemerisType;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A live key already exists for this satellite.
    #[error("satellite {satellite_id} is already loaded")]
    DuplicateKey { satellite_id: u32 },

    #[error("key {key} is not loaded")]
    BadKey { key: SatKey },

    /// Element values rejected before initialization.
    #[error("invalid element {field}: {value}")]
    BadElement { field: &'static str, value: f64 },

    #[error("propagator initialization failed: {status}")]
    Initialization { status: Sgp4Status },

    #[error("degenerate orbit: {reason}")]
    DegenerateOrbit { reason: &'static str },

    #[error("propagation failed {minutes} min from epoch: {status}")]
    Propagation { status: Sgp4Status, minutes: f64 },

    /// Identifier or designator outside documented bounds.
    #[error("{field} out of bounds: {value}")]
    Validation { field: &'static str, value: String },

    #[error("ephemeris type {model} is not supported by the analytic propagator")]
    UnsupportedModel { model: EphemerisType },

    #[error("states must be appended in chronological order (last {last}, got {attempted})")]
    OutOfOrder { last: f64, attempted: f64 },

    #[error("malformed TLE line {line}, field {field}: {reason}")]
    TleFormat {
        line: u8,
        field: &'static str,
        reason: String,
    },

    #[error("catalog i/o failed")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable machine-readable fault code.
    pub fn code(&self) -> &'static str {
        match self {
            Error::DuplicateKey { .. } => "duplicate_key",
            Error::BadKey { .. } => "bad_key",
            Error::BadElement { .. } => "bad_element",
            Error::Initialization { .. } => "initialization",
            Error::DegenerateOrbit { .. } => "degenerate_orbit",
            Error::Propagation { .. } => "propagation",
            Error::Validation { .. } => "validation",
            Error::UnsupportedModel { .. } => "unsupported_model",
            Error::OutOfOrder { .. } => "out_of_order",
            Error::TleFormat { .. } => "tle_format",
            Error::Io(_) => "io",
        }
    }

    /// Numeric propagator status for initialization and propagation faults.
    pub fn status_code(&self) -> Option<i32> {
        match self {
            Error::Initialization { status } | Error::Propagation { status, .. } => {
                Some(status.code())
            }
            _ => None,
        }
    }

    pub(crate) fn validation(field: &'static str, value: impl ToString) -> Self {
        Error::Validation {
            field,
            value: value.to_string(),
        }
    }

    pub(crate) fn tle(line: u8, field: &'static str, reason: impl Into<String>) -> Self {
        Error::TleFormat {
            line,
            field,
            reason: reason.into(),
        }
    }
}
