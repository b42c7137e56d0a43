//! Status codes and typed failures for the native tensor runtime binding.

use std::fmt;

use thiserror::Error;

use crate::dtype::DType;
use crate::shape::Shape;

/// Result alias used across the binding.
pub type P10Result<T> = Result<T, P10Error>;

/// Status code reported by every fallible native call.
///
/// The discriminants mirror the native `P10ErrorEnum`; `from_raw` is the only
/// place raw statuses are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Ok,
    Unknown,
    Assertion,
    InvalidArgument,
    InvalidOperation,
    OutOfMemory,
    OutOfRange,
    NotImplemented,
    Os,
    Io,
}

impl ErrorCode {
    /// Reconstructs a status from its raw ABI value.
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(ErrorCode::Ok),
            1 => Some(ErrorCode::Unknown),
            2 => Some(ErrorCode::Assertion),
            3 => Some(ErrorCode::InvalidArgument),
            4 => Some(ErrorCode::InvalidOperation),
            5 => Some(ErrorCode::OutOfMemory),
            6 => Some(ErrorCode::OutOfRange),
            7 => Some(ErrorCode::NotImplemented),
            8 => Some(ErrorCode::Os),
            9 => Some(ErrorCode::Io),
            _ => None,
        }
    }

    /// Produces the raw value used when crossing the C ABI.
    pub fn as_raw(self) -> i32 {
        match self {
            ErrorCode::Ok => 0,
            ErrorCode::Unknown => 1,
            ErrorCode::Assertion => 2,
            ErrorCode::InvalidArgument => 3,
            ErrorCode::InvalidOperation => 4,
            ErrorCode::OutOfMemory => 5,
            ErrorCode::OutOfRange => 6,
            ErrorCode::NotImplemented => 7,
            ErrorCode::Os => 8,
            ErrorCode::Io => 9,
        }
    }

    /// Reports whether the status denotes success.
    pub fn is_ok(self) -> bool {
        matches!(self, ErrorCode::Ok)
    }

    /// Returns the fixed human-readable message for the status.
    pub fn default_message(self) -> &'static str {
        match self {
            ErrorCode::Ok => "Success",
            ErrorCode::Unknown => "Unknown error",
            ErrorCode::Assertion => "Assertion failed",
            ErrorCode::InvalidArgument => "Invalid argument",
            ErrorCode::InvalidOperation => "Invalid operation",
            ErrorCode::OutOfMemory => "Out of memory",
            ErrorCode::OutOfRange => "Out of range",
            ErrorCode::NotImplemented => "Not implemented",
            ErrorCode::Os => "Operating system error",
            ErrorCode::Io => "Input/output error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_message())
    }
}

/// Errors surfaced by the binding.
///
/// `Native` carries failures reported by the library itself; the remaining
/// variants are raised on this side of the boundary, before or after the call.
#[derive(Debug, Error)]
pub enum P10Error {
    #[error("native call failed with {code:?}: {message}")]
    Native { code: ErrorCode, message: String },
    #[error("tensor was already disposed")]
    Disposed,
    #[error("data length {actual} does not match shape {shape} ({expected} elements)")]
    LengthMismatch {
        shape: Shape,
        expected: usize,
        actual: usize,
    },
    #[error("byte length {actual} does not match shape {shape} ({expected} bytes)")]
    ByteLengthMismatch {
        shape: Shape,
        expected: usize,
        actual: usize,
    },
    #[error("buffer byte length overflow for shape {shape}")]
    ByteLenOverflow { shape: Shape },
    #[error("dimension {dim} does not fit the int64 wire encoding")]
    DimensionOverflow { dim: usize },
    #[error("library reported dimension {dim} outside the addressable range")]
    InvalidDimension { dim: i64 },
    #[error("library reported unknown dtype code {code}")]
    UnknownDType { code: i32 },
    #[error("unknown dtype string: {name}")]
    UnknownDTypeName { name: String },
    #[error("requested {expected} data from a {actual} tensor")]
    DTypeMismatch { expected: DType, actual: DType },
    #[error("library reported success but returned a null pointer")]
    NullHandle,
    #[error("failed to load ptensor library")]
    LibraryLoad(#[source] libloading::Error),
    #[error("unable to locate the ptensor library (set PTENSOR_LIB_PATH to the library file)")]
    LibraryNotFound,
    #[error("failed to resolve symbol {symbol}")]
    MissingSymbol {
        symbol: String,
        #[source]
        source: libloading::Error,
    },
    #[error("ptensor library unavailable: {message}")]
    Unavailable { message: String },
}

/// Translates a raw status into `Ok(())` or a `Native` error.
///
/// `detail` is consulted only on failure; it should read the library's last
/// error message. A detailed message takes precedence over the status's fixed
/// default. Raw values outside the known status set map to
/// [`ErrorCode::Unknown`] with a message naming the value.
pub fn check_status<F>(status: i32, detail: F) -> P10Result<()>
where
    F: FnOnce() -> Option<String>,
{
    match ErrorCode::from_raw(status) {
        Some(ErrorCode::Ok) => Ok(()),
        Some(code) => Err(P10Error::Native {
            code,
            message: detail().unwrap_or_else(|| code.default_message().to_string()),
        }),
        None => Err(P10Error::Native {
            code: ErrorCode::Unknown,
            message: match detail() {
                Some(message) => format!("{message} (unrecognized status code {status})"),
                None => format!("unrecognized status code {status}"),
            },
        }),
    }
}
