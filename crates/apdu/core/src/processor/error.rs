//! Error types for command processors

use thiserror::Error;

use crate::command::error::CommandError;
use crate::response::error::ResponseError;
use crate::transport::error::TransportError;

/// Error type for command processors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessorError {
    /// Underlying transport error
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Command could not be encoded
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Invalid response
    #[error(transparent)]
    Response(#[from] ResponseError),

    /// The card kept answering 61xx beyond the configured number of rounds
    #[error("Chain limit exceeded after {0} GET RESPONSE rounds")]
    ChainLimitExceeded(usize),
}
