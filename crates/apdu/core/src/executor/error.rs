//! Error types specific to APDU execution

use thiserror::Error;

use crate::processor::error::ProcessorError;
use crate::response::error::{ResponseError, StatusError};
use crate::response::status::StatusWord;
use crate::transport::error::TransportError;

/// Error type for execution operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// Transport error
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Response parsing error
    #[error(transparent)]
    Response(#[from] ResponseError),

    /// The card finished the command with a non-success status word
    #[error(transparent)]
    Status(#[from] StatusError),

    /// Processor error
    #[error(transparent)]
    Processor(#[from] ProcessorError),
}

impl ExecutionError {
    /// Get the status word if this is a status error
    pub const fn status_word(&self) -> Option<StatusWord> {
        match self {
            Self::Status(e) => Some(e.status_word()),
            _ => None,
        }
    }

    /// Check if this error has the given status word
    pub fn has_status_code(&self, sw: u16) -> bool {
        self.status_word().is_some_and(|status| status.to_u16() == sw)
    }

    /// The transport failure behind this error, if any
    pub const fn transport_error(&self) -> Option<&TransportError> {
        match self {
            Self::Transport(e) | Self::Processor(ProcessorError::Transport(e)) => Some(e),
            _ => None,
        }
    }
}
