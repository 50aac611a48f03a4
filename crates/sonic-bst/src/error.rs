//! BST error types and status handling.
//!
//! Driver status codes and the error type every [`crate::BstApi`] call
//! returns.

use std::fmt;
use thiserror::Error;

use crate::types::HwUnit;

/// Driver status codes matching the switch SDK return values.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BstStatus {
    None = 0,
    Internal = -1,
    Memory = -2,
    Unit = -3,
    Param = -4,
    Empty = -5,
    Full = -6,
    NotFound = -7,
    Exists = -8,
    Timeout = -9,
    Busy = -10,
    Fail = -11,
    Disabled = -12,
    BadId = -13,
    Resource = -14,
    Config = -15,
    Unavail = -16,
    Init = -17,
    Port = -18,
}

impl BstStatus {
    /// Returns the raw return code.
    pub fn as_raw(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for BstStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BstStatus::None => "E_NONE",
            BstStatus::Internal => "E_INTERNAL",
            BstStatus::Memory => "E_MEMORY",
            BstStatus::Unit => "E_UNIT",
            BstStatus::Param => "E_PARAM",
            BstStatus::Empty => "E_EMPTY",
            BstStatus::Full => "E_FULL",
            BstStatus::NotFound => "E_NOT_FOUND",
            BstStatus::Exists => "E_EXISTS",
            BstStatus::Timeout => "E_TIMEOUT",
            BstStatus::Busy => "E_BUSY",
            BstStatus::Fail => "E_FAIL",
            BstStatus::Disabled => "E_DISABLED",
            BstStatus::BadId => "E_BADID",
            BstStatus::Resource => "E_RESOURCE",
            BstStatus::Config => "E_CONFIG",
            BstStatus::Unavail => "E_UNAVAIL",
            BstStatus::Init => "E_INIT",
            BstStatus::Port => "E_PORT",
        };
        write!(f, "{} ({})", s, self.as_raw())
    }
}

/// Error type for BST operations.
#[derive(Debug, Clone, Error)]
pub enum BstError {
    /// Driver returned an error status.
    #[error("driver call failed: {status}")]
    Status { status: BstStatus },

    /// Hardware unit is not attached or out of range.
    #[error("invalid hardware unit: {unit}")]
    InvalidUnit { unit: HwUnit },

    /// Port number does not map to a logical port on this unit.
    #[error("invalid port {port} on {unit}")]
    InvalidPort { unit: HwUnit, port: i32 },

    /// Invalid parameter passed to the driver.
    #[error("invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// The driver does not implement the requested operation.
    #[error("operation not available: {operation}")]
    Unavailable { operation: String },
}

impl BstError {
    /// Creates an error from a driver status code.
    pub fn from_status(status: BstStatus) -> Self {
        match status {
            BstStatus::Param | BstStatus::BadId => BstError::InvalidParameter {
                message: format!("driver returned {}", status),
            },
            BstStatus::Unavail => BstError::Unavailable {
                operation: "unknown".to_string(),
            },
            _ => BstError::Status { status },
        }
    }

    /// Creates an invalid parameter error with a message.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        BstError::InvalidParameter {
            message: message.into(),
        }
    }

    /// Returns the underlying driver status if this is a Status error.
    pub fn status(&self) -> Option<BstStatus> {
        match self {
            BstError::Status { status } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for BST operations.
pub type BstResult<T> = Result<T, BstError>;
