//! Error types for pepperpot operations.
//!
//! Errors fall into two disjoint kinds:
//!
//! - **Operational** errors happen during normal operation (out of memory
//!   under high load, can't spawn more threads). Callers may catch them and
//!   retry, shed load, or hand the work to another server.
//! - **Usage** errors mean the calling code or its stored data is wrong.
//!   There is nothing to recover apart from fixing the code, so these should
//!   be loud.
//!
//! A wrong password is never an error: [`crate::Boiler::verify`] returns
//! `Ok(false)` for it.

use thiserror::Error;

/// Result type alias for pepperpot operations.
pub type Result<T> = std::result::Result<T, PepperError>;

/// The two error superclasses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transient resource failure; safe to retry.
    Operational,
    /// Programming or data error; not meant to be swallowed.
    Usage,
}

/// Core error type for pepperpot operations.
#[derive(Debug, Error)]
pub enum PepperError {
    /// The primitive could not complete because of a resource limit
    /// (memory allocation failure, thread failure, no OS randomness).
    #[error("{0}")]
    Operational(String),

    /// A password or other input could not be used as given
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid construction parameters, or parameters the primitive rejected.
    ///
    /// The message is the primitive's text verbatim.
    #[error("{0}")]
    Parameter(String),

    /// The same keyid appears more than once in a key ring
    #[error("Duplicate keyid: {0}")]
    DuplicateKeyId(String),

    /// The encoded password is oversized or does not match the record grammar
    #[error("Malformed encoded password: {0}")]
    MalformedEncoding(String),

    /// A cost parameter of an encoded password is above what we will process
    #[error("{parameter} exceeds threshold of what we will process ({value} > {limit})")]
    ThresholdExceeded {
        parameter: &'static str,
        value: u32,
        limit: u64,
    },

    /// The encoded password was boiled with a secret we don't hold.
    ///
    /// Kept apart from a wrong password so key-lifecycle mistakes can be
    /// alerted on separately.
    #[error("Missing key: {0}")]
    MissingKey(String),
}

impl PepperError {
    /// Which superclass this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PepperError::Operational(_) => ErrorKind::Operational,
            PepperError::InvalidInput(_)
            | PepperError::Parameter(_)
            | PepperError::DuplicateKeyId(_)
            | PepperError::MalformedEncoding(_)
            | PepperError::ThresholdExceeded { .. }
            | PepperError::MissingKey(_) => ErrorKind::Usage,
        }
    }

    /// True for errors a caller may reasonably retry.
    pub fn is_operational(&self) -> bool {
        self.kind() == ErrorKind::Operational
    }
}
