use ecard_apdu_core::processor::error::ProcessorError;
use ecard_apdu_core::{
    CommandError, ExecutionError, MinorError, StatusError, TlvError, TransportError,
};

use crate::legacy::TemplateError;

/// Result type for signature generation
pub type Result<T, E = SignError> = std::result::Result<T, E>;

/// The capability descriptor cannot be turned into a valid card dialogue
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// Token name outside the supported set
    #[error("Unknown signature generation command: {0}")]
    UnknownCommand(String),

    /// MSE_KEY without a PSO_CDS or INT_AUTH to pick the template from
    #[error("MSE_KEY requires PSO_CDS or INT_AUTH in the same sequence")]
    UnsupportedCombination,

    /// Nothing in the sequence talks to the card
    #[error("Signature generation sequence contains no card command")]
    NoCardCommand,

    /// Key reference needed but empty
    #[error("Crypto marker has no key reference")]
    MissingKeyReference,

    /// A legacy command template could not be evaluated
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// A legacy API call was answered with an error result
    #[error("API call {call} failed: {minor}")]
    ApiCallFailed {
        /// Name of the call
        call: String,
        /// Reported minor code
        minor: String,
    },

    /// The card output does not fit the requested output format
    #[error("Malformed signature for output format {0}")]
    MalformedSignature(&'static str),

    /// A command could not be framed
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Error type for signature generation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignError {
    /// Descriptor or command framing problem
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A card command returned a non-success status word
    #[error(transparent)]
    Card(StatusError),

    /// The transport failed
    #[error(transparent)]
    Transport(TransportError),

    /// Any other failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SignError {
    /// eCard-API minor code of a card failure
    pub const fn minor(&self) -> Option<MinorError> {
        match self {
            Self::Card(status) => Some(status.minor),
            _ => None,
        }
    }
}

impl From<ExecutionError> for SignError {
    fn from(error: ExecutionError) -> Self {
        match error {
            ExecutionError::Status(status) => Self::Card(status),
            ExecutionError::Transport(e) | ExecutionError::Processor(ProcessorError::Transport(e)) => {
                Self::Transport(e)
            }
            ExecutionError::Processor(ProcessorError::Command(e)) => {
                Self::Protocol(ProtocolError::Command(e))
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<TransportError> for SignError {
    fn from(error: TransportError) -> Self {
        Self::Transport(error)
    }
}

impl From<TemplateError> for SignError {
    fn from(error: TemplateError) -> Self {
        Self::Protocol(error.into())
    }
}

impl From<TlvError> for SignError {
    fn from(error: TlvError) -> Self {
        Self::Internal(error.to_string())
    }
}

impl From<der::Error> for SignError {
    fn from(error: der::Error) -> Self {
        Self::Internal(error.to_string())
    }
}
