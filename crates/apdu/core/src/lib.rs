//! Core traits and types for APDU (Application Protocol Data Unit) operations
//!
//! This crate provides the command/response layer used by the eCard
//! middleware to talk to ISO/IEC 7816-4 smart cards.
//!
//! ## Overview
//!
//! - [`Command`] framing in short form (`CLA INS P1 P2 [Lc Data] [Le]`)
//! - [`Response`] parsing, [`StatusWord`] interpretation and the mapping of
//!   error trailers to eCard-API [`MinorError`] codes
//! - the [`CardTransport`] seam towards whatever moves bytes to the card
//! - automatic `61xx` GET RESPONSE chaining in [`GetResponseProcessor`]
//! - a BER-TLV codec in [`tlv`]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

// Re-export bytes for convenience
pub use bytes::{Bytes, BytesMut};

pub mod command;
pub mod executor;
pub mod processor;
pub mod response;
pub mod tlv;
pub mod transport;

mod error;
pub use error::{Error, Result};

pub use command::{ApduCommand, Command, CommandError};
pub use executor::{CardExecutor, ExecutionError};
pub use processor::error::ProcessorError;
pub use processor::{CommandProcessor, GetResponseProcessor, IdentityProcessor};
pub use response::error::{ResponseError, StatusError};
pub use response::minor::MinorError;
pub use response::status::StatusWord;
pub use response::{ApduResponse, Response, utils};
pub use tlv::{TlvError, TlvObject};
#[cfg(any(test, feature = "mock"))]
pub use transport::MockTransport;
pub use transport::{CardTransport, TransportError};

/// Prelude module containing commonly used traits and types
pub mod prelude {
    pub use crate::{
        ApduCommand, ApduResponse, Bytes, BytesMut, CardExecutor, CardTransport, Command,
        CommandProcessor, Error, MinorError, Response, Result, StatusError, StatusWord,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reexports() {
        let cmd = Command::new(0x00, 0xA4, 0x04, 0x00);
        assert_eq!(cmd.class(), 0x00);
        assert_eq!(cmd.instruction(), 0xA4);
        assert_eq!(cmd.p1(), 0x04);
        assert_eq!(cmd.p2(), 0x00);

        let resp = Response::success(Bytes::from_static(&[0x01, 0x02, 0x03]));
        assert!(resp.is_success());
        assert_eq!(resp.payload().as_ref(), &[0x01, 0x02, 0x03]);
        assert_eq!(resp.status(), StatusWord::new(0x90, 0x00));
    }

    #[test]
    fn test_errors_compose() {
        let error: Error = StatusError::new(0x69, 0x82).into();
        assert!(error.to_string().contains("6982"));

        let error: Error = TransportError::Timeout.into();
        assert_eq!(error.to_string(), "Operation timed out");
    }
}
