//! Core error type for all APDU operations
//!
//! Every module has its own error enum; this type gathers them for callers
//! that do not care which layer failed.

use crate::command::error::CommandError;
use crate::executor::error::ExecutionError;
use crate::processor::error::ProcessorError;
use crate::response::error::{ResponseError, StatusError};
use crate::tlv::TlvError;
use crate::transport::error::TransportError;

/// Core error type that encompasses all possible errors in the crate
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Command encoding error
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Response parsing error
    #[error(transparent)]
    Response(#[from] ResponseError),

    /// Card status error
    #[error(transparent)]
    Status(#[from] StatusError),

    /// Transport error
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Processor error
    #[error(transparent)]
    Processor(#[from] ProcessorError),

    /// Execution error
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// TLV codec error
    #[error(transparent)]
    Tlv(#[from] TlvError),
}

/// Result type for APDU operations
pub type Result<T> = std::result::Result<T, Error>;
