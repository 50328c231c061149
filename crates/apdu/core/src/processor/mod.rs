//! Command processors for APDU transformations
//!
//! A processor sits between an executor and a transport. It encodes the
//! command, talks to the transport as often as the protocol needs and
//! returns a single logical [`Response`].

pub mod error;

use std::fmt;

use bytes::BytesMut;
use tracing::{debug, trace};

use crate::command::{ApduCommand, Command};
use crate::response::Response;
use crate::response::utils;
use crate::transport::CardTransport;
use error::ProcessorError;

/// Default number of GET RESPONSE rounds before a card is considered misbehaving
pub const DEFAULT_MAX_CHAINS: usize = 255;

/// Trait for command processors which send commands through a transport
pub trait CommandProcessor: fmt::Debug {
    /// Process a command through this processor
    fn process_command(
        &mut self,
        command: &Command,
        transport: &mut dyn CardTransport,
    ) -> Result<Response, ProcessorError> {
        trace!(
            command = ?command,
            processor = std::any::type_name::<Self>(),
            "Processing command"
        );

        let result = command
            .validate()
            .map_err(ProcessorError::from)
            .and_then(|()| self.do_process_command(command, transport));

        match &result {
            Ok(response) => {
                trace!(response = ?response, "Processed response");
            }
            Err(e) => {
                debug!(error = ?e, "Error during command processing");
            }
        }

        result
    }

    /// Internal implementation of process_command
    fn do_process_command(
        &mut self,
        command: &Command,
        transport: &mut dyn CardTransport,
    ) -> Result<Response, ProcessorError>;
}

/// Identity processor that sends a command once and parses the reply
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityProcessor;

impl CommandProcessor for IdentityProcessor {
    fn do_process_command(
        &mut self,
        command: &Command,
        transport: &mut dyn CardTransport,
    ) -> Result<Response, ProcessorError> {
        let response_bytes = transport.transmit_raw(&command.to_bytes())?;
        Ok(Response::from_bytes(&response_bytes)?)
    }
}

/// GET RESPONSE processor that handles automatic response chaining
///
/// While the card answers `61 xx` it issues `00 C0 00 00 xx` and appends the
/// returned data. The final trailer is whatever the last reply carried.
#[derive(Debug, Clone, Copy)]
pub struct GetResponseProcessor {
    /// Maximum number of response chains to follow
    max_chains: usize,
}

impl GetResponseProcessor {
    /// Create a new GET RESPONSE processor with the given maximum chain count
    pub const fn new(max_chains: usize) -> Self {
        Self { max_chains }
    }

    /// Maximum number of GET RESPONSE rounds
    pub const fn max_chains(&self) -> usize {
        self.max_chains
    }
}

impl Default for GetResponseProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHAINS)
    }
}

impl CommandProcessor for GetResponseProcessor {
    fn do_process_command(
        &mut self,
        command: &Command,
        transport: &mut dyn CardTransport,
    ) -> Result<Response, ProcessorError> {
        let response_bytes = transport.transmit_raw(&command.to_bytes())?;
        let ((mut sw1, mut sw2), payload) = utils::extract_response_parts(&response_bytes)?;

        let mut buffer = BytesMut::from(payload);
        let mut chains = 0;

        while sw1 == 0x61 {
            if chains >= self.max_chains {
                return Err(ProcessorError::ChainLimitExceeded(chains));
            }
            chains += 1;

            trace!(
                remaining = sw2,
                chain_count = chains,
                "Sending GET RESPONSE command"
            );

            let response_bytes = transport.transmit_raw(&Command::get_response(sw2).to_bytes())?;
            let ((next_sw1, next_sw2), next_payload) =
                utils::extract_response_parts(&response_bytes)?;

            buffer.extend_from_slice(next_payload);
            sw1 = next_sw1;
            sw2 = next_sw2;
        }

        if chains > 0 {
            trace!(
                total_data_len = buffer.len(),
                final_sw = format!("{:02X}{:02X}", sw1, sw2),
                "Completed response chaining"
            );
        }

        Ok(Response::new(buffer.freeze(), (sw1, sw2)))
    }
}
