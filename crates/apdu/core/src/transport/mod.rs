//! Transport traits for APDU communication with cards
//!
//! A transport moves raw bytes to and from a card. Everything above it
//! (chaining, status interpretation) lives in processors and executors.

pub mod error;

use std::fmt;

use bytes::Bytes;
pub use error::TransportError;
use tracing::{debug, trace};

/// Trait for basic card transports
///
/// A transport is responsible for sending and receiving raw APDU bytes.
/// It has no knowledge of command structure or protocol details.
pub trait CardTransport: fmt::Debug {
    /// Send raw APDU bytes to card and return response bytes
    ///
    /// This method should handle the low-level communication with the card
    /// but should not interpret the contents or handle protocol-specific
    /// operations like GET RESPONSE.
    fn transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        trace!(command = %hex::encode(command), "Transmitting raw command");
        let result = self.do_transmit_raw(command);
        match &result {
            Ok(response) => {
                trace!(response = %hex::encode(response), "Received raw response");
            }
            Err(e) => {
                debug!(error = ?e, "Transport error during transmission");
            }
        }
        result
    }

    /// Internal implementation of transmit_raw
    /// This is the method that concrete implementations should override
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError>;

    /// Check if the transport is connected to a physical card
    fn is_connected(&self) -> bool;

    /// Reset the transport connection
    fn reset(&mut self) -> Result<(), TransportError>;
}

impl<T: CardTransport + ?Sized> CardTransport for &mut T {
    fn transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        (**self).transmit_raw(command)
    }

    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        (**self).do_transmit_raw(command)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        (**self).reset()
    }
}

/// Scripted transport replaying canned responses and recording commands
#[cfg(any(test, feature = "mock"))]
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    /// Responses returned in order, one per transmitted command
    pub responses: Vec<Bytes>,
    /// Commands that were sent
    pub commands: Vec<Bytes>,
    /// Whether the transport is connected
    pub connected: bool,
}

#[cfg(any(test, feature = "mock"))]
impl MockTransport {
    /// Create a new mock transport with the given responses
    pub fn new(responses: Vec<Bytes>) -> Self {
        Self {
            responses,
            commands: Vec::new(),
            connected: true,
        }
    }

    /// Create a mock transport from response slices
    pub fn scripted(responses: &[&[u8]]) -> Self {
        Self::new(responses.iter().map(|r| Bytes::copy_from_slice(r)).collect())
    }

    /// Create a new mock transport that answers a single command with success (90 00)
    pub fn with_success() -> Self {
        Self::new(vec![Bytes::from_static(&[0x90, 0x00])])
    }
}

#[cfg(any(test, feature = "mock"))]
impl CardTransport for MockTransport {
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        if !self.connected {
            return Err(TransportError::Connection);
        }

        self.commands.push(Bytes::copy_from_slice(command));

        if self.responses.is_empty() {
            return Err(TransportError::Transmission);
        }
        Ok(self.responses.remove(0))
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        self.connected = true;
        self.commands.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_transport_replays_in_order() {
        let mut transport = MockTransport::scripted(&[&[0x61, 0x02], &[0x90, 0x00]]);
        assert_eq!(transport.transmit_raw(&[0x00]).unwrap().as_ref(), &[0x61, 0x02]);
        assert_eq!(transport.transmit_raw(&[0x01]).unwrap().as_ref(), &[0x90, 0x00]);
        assert_eq!(
            transport.transmit_raw(&[0x02]),
            Err(TransportError::Transmission)
        );
        assert_eq!(transport.commands.len(), 3);
    }

    #[test]
    fn test_disconnected_transport_fails() {
        let mut transport = MockTransport::with_success();
        transport.connected = false;
        assert_eq!(
            transport.transmit_raw(&[0x00, 0xA4, 0x04, 0x00]),
            Err(TransportError::Connection)
        );
        assert!(transport.commands.is_empty());
    }
}
