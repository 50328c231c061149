//! Error types specific to APDU responses

use thiserror::Error;

use super::minor::MinorError;
use super::status::StatusWord;

/// A card command that finished with a non-success status word
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Card returned {status} ({message}), minor {minor}")]
pub struct StatusError {
    /// Status word that caused the error
    pub status: StatusWord,
    /// Minor code derived from the status word
    pub minor: MinorError,
    /// Human readable status description
    pub message: &'static str,
}

impl StatusError {
    /// Create a new status error
    pub const fn new(sw1: u8, sw2: u8) -> Self {
        Self::from_status(StatusWord::new(sw1, sw2))
    }

    /// Create a status error from a status word
    pub const fn from_status(status: StatusWord) -> Self {
        Self {
            status,
            minor: MinorError::from_status(status),
            message: status.description(),
        }
    }

    /// Get the status word
    pub const fn status_word(&self) -> StatusWord {
        self.status
    }

    /// Remaining attempts if the card reported `63 Cx`
    pub const fn retry_counter(&self) -> Option<u8> {
        self.status.retry_counter()
    }
}

/// Error for APDU response processing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponseError {
    /// Incomplete response (less than 2 bytes)
    #[error("Incomplete response: {0} bytes")]
    Incomplete(usize),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(&'static str),

    /// Status error
    #[error(transparent)]
    Status(#[from] StatusError),
}

impl ResponseError {
    /// Create a new status error
    pub const fn status(sw1: u8, sw2: u8) -> Self {
        Self::Status(StatusError::new(sw1, sw2))
    }

    /// Create a parse error with a message
    pub const fn parse(message: &'static str) -> Self {
        Self::Parse(message)
    }

    /// Check if this error has the given status word
    pub const fn has_status(&self, sw: u16) -> bool {
        if let Self::Status(status_error) = self {
            status_error.status_word().to_u16() == sw
        } else {
            false
        }
    }
}
