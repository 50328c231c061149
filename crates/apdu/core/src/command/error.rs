//! Error types specific to APDU commands

use thiserror::Error;

/// Error for APDU command processing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Invalid command length
    #[error("Invalid command length: {0}")]
    InvalidLength(usize),

    /// Data too long for a short-form APDU
    #[error("Data too long: {0} bytes (max {1})")]
    DataTooLong(usize, usize),

    /// Data field content rejected by a command builder
    #[error("Invalid command data: {0}")]
    InvalidData(&'static str),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(&'static str),
}

impl CommandError {
    /// Create a parse error with a message
    pub const fn parse(message: &'static str) -> Self {
        Self::Parse(message)
    }

    /// Create a data too long error
    pub const fn data_too_long(actual: usize, max: usize) -> Self {
        Self::DataTooLong(actual, max)
    }
}
