//! Executor for APDU command execution
//!
//! This module provides the executor that combines a card transport with a
//! command processor to handle APDU command execution.

pub mod error;

use bytes::Bytes;
use tracing::{Level, debug, event, instrument};

use crate::command::Command;
use crate::processor::{CommandProcessor, GetResponseProcessor};
use crate::response::{ApduResponse, Response};
use crate::transport::CardTransport;
pub use error::ExecutionError;

/// Card executor implementation combining a transport with a command processor
#[derive(Debug)]
pub struct CardExecutor<T: CardTransport> {
    /// The transport used for communication
    transport: T,
    /// Processor that turns one command into one logical response
    processor: Box<dyn CommandProcessor>,
    /// The last response received
    last_response: Option<Response>,
}

impl<T: CardTransport> CardExecutor<T> {
    /// Create a new card executor with GET RESPONSE chaining enabled
    pub fn new(transport: T) -> Self {
        Self::with_processor(transport, Box::new(GetResponseProcessor::default()))
    }

    /// Create a new card executor with a specific processor
    pub fn with_processor(transport: T, processor: Box<dyn CommandProcessor>) -> Self {
        Self {
            transport,
            processor,
            last_response: None,
        }
    }

    /// Get a reference to the underlying transport
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a mutable reference to the underlying transport
    pub const fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Take ownership of the transport and return it
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Get the last response received
    pub const fn last_response(&self) -> Option<&Response> {
        self.last_response.as_ref()
    }

    /// Transmit a command and return the (possibly chained) response
    ///
    /// Non-success trailers are returned as part of the response.
    #[instrument(level = "trace", skip_all, fields(ins = command.ins))]
    pub fn transmit(&mut self, command: &Command) -> Result<Response, ExecutionError> {
        let response = self
            .processor
            .process_command(command, &mut self.transport)?;

        let status = response.status();
        event!(
            Level::TRACE,
            status = %status,
            description = status.description(),
            "Command completed"
        );

        self.last_response = Some(response.clone());
        Ok(response)
    }

    /// Transmit a command and return its payload, failing on a non-success trailer
    pub fn transmit_checked(&mut self, command: &Command) -> Result<Bytes, ExecutionError> {
        let response = self.transmit(command)?;
        response.into_payload_result().map_err(|e| {
            debug!(status = %e.status, minor = %e.minor, "Card rejected command");
            ExecutionError::Status(e)
        })
    }

    /// Reset the executor, including the transport
    pub fn reset(&mut self) -> Result<(), ExecutionError> {
        self.transport.reset()?;
        self.last_response = None;
        Ok(())
    }
}
