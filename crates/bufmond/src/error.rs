//! Error types for bufmond

use sonic_bst::BstError;
use thiserror::Error;

/// Result type for bufmond operations
pub type BufmonResult<T> = Result<T, BufmonError>;

/// Buffer monitoring errors
#[derive(Error, Debug)]
pub enum BufmonError {
    /// A parameter the counter's realm needs is absent or not an integer
    #[error("counter '{counter}' is missing parameter '{param}'")]
    MissingParameter {
        counter: String,
        param: &'static str,
    },

    /// A parameter does not map to a valid sub-resource index
    #[error("counter '{counter}': {param}={value} does not address a sub-resource")]
    InvalidIndex {
        counter: String,
        param: &'static str,
        value: i32,
    },

    /// Threshold does not fit the hardware profile
    #[error("counter '{counter}': threshold {threshold} exceeds the profile range")]
    InvalidThreshold { counter: String, threshold: u64 },

    /// Counter name matches no realm
    #[error("no realm matches counter '{0}'")]
    UnknownRealm(String),

    /// Hardware access failed
    #[error("{operation} failed ({context}): {source}")]
    Hardware {
        operation: &'static str,
        context: String,
        #[source]
        source: BstError,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BufmonError {
    /// Creates a hardware error with the operation and address context.
    pub fn hardware(operation: &'static str, context: impl Into<String>, source: BstError) -> Self {
        Self::Hardware {
            operation,
            context: context.into(),
            source,
        }
    }

    /// Returns true for malformed or partially specified counter input,
    /// which is a no-op rather than a failure.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            BufmonError::MissingParameter { .. }
                | BufmonError::InvalidIndex { .. }
                | BufmonError::InvalidThreshold { .. }
                | BufmonError::UnknownRealm(_)
        )
    }
}
