//! APDU response definitions and traits
//!
//! This module provides types and traits for working with APDU responses
//! according to ISO/IEC 7816-4: `Data || SW1 SW2`.

pub mod error;
pub mod minor;
pub mod status;
pub mod utils;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use error::{ResponseError, StatusError};
use status::StatusWord;

/// Trait for APDU responses
pub trait ApduResponse: Sized {
    /// Get the response payload data, empty if the card returned none
    fn payload(&self) -> &Bytes;

    /// Get the status word
    fn status(&self) -> StatusWord;

    /// Check if the response indicates success
    fn is_success(&self) -> bool {
        self.status().is_success()
    }

    /// Create from raw APDU response data
    fn from_bytes(data: &[u8]) -> Result<Self, ResponseError>;
}

/// Basic APDU response structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Response payload data
    payload: Bytes,
    /// Status word
    status: StatusWord,
}

impl Response {
    /// Create a new response with payload and status
    pub fn new(payload: impl Into<Bytes>, status: impl Into<StatusWord>) -> Self {
        Self {
            payload: payload.into(),
            status: status.into(),
        }
    }

    /// Create a success response
    pub const fn success(payload: Bytes) -> Self {
        Self {
            payload,
            status: status::common::SUCCESS,
        }
    }

    /// Create an error response from a status word
    pub fn error(status: impl Into<StatusWord>) -> Self {
        Self {
            payload: Bytes::new(),
            status: status.into(),
        }
    }

    /// Parse response from raw bytes (including status word)
    pub fn from_bytes(data: &[u8]) -> Result<Self, ResponseError> {
        let (status, payload) = utils::extract_status_and_payload(data)?;

        trace!(
            sw1 = format_args!("{:#04x}", status.sw1),
            sw2 = format_args!("{:#04x}", status.sw2),
            payload_len = payload.len(),
            "Parsed APDU response"
        );

        Ok(Self {
            payload: Bytes::copy_from_slice(payload),
            status,
        })
    }

    /// Get the status word as a tuple (SW1, SW2)
    pub const fn status_tuple(&self) -> (u8, u8) {
        (self.status.sw1, self.status.sw2)
    }

    /// Consume the response, returning the payload on success or the typed card error
    pub fn into_payload_result(self) -> Result<Bytes, StatusError> {
        if self.is_success() {
            Ok(self.payload)
        } else {
            Err(StatusError::from_status(self.status))
        }
    }
}

impl ApduResponse for Response {
    fn payload(&self) -> &Bytes {
        &self.payload
    }

    fn status(&self) -> StatusWord {
        self.status
    }

    fn from_bytes(data: &[u8]) -> Result<Self, ResponseError> {
        Self::from_bytes(data)
    }
}

impl TryFrom<&[u8]> for Response {
    type Error = ResponseError;

    fn try_from(data: &[u8]) -> Result<Self, ResponseError> {
        Self::from_bytes(data)
    }
}

impl TryFrom<Bytes> for Response {
    type Error = ResponseError;

    fn try_from(data: Bytes) -> Result<Self, ResponseError> {
        Self::from_bytes(&data)
    }
}

impl From<Response> for Bytes {
    fn from(response: Response) -> Self {
        let mut buf = BytesMut::with_capacity(response.payload.len() + 2);
        buf.put_slice(&response.payload);
        buf.put_u8(response.status.sw1);
        buf.put_u8(response.status.sw2);
        buf.freeze()
    }
}
