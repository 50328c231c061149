mod marker;
mod token;

use std::fmt;

use derive_more::{Deref, From};
use serde::{Deserialize, Serialize};

pub use marker::{CryptoMarker, HashGenerationInfo, LegacyStep};
pub use token::SignatureToken;

/// Byte string serialized as hex in capability descriptors
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Deref, From)]
#[serde(transparent)]
pub struct HexBytes(#[serde(with = "hex::serde")] Vec<u8>);

impl HexBytes {
    /// Wrap raw bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Consume into the raw bytes
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl From<&[u8]> for HexBytes {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl fmt::Debug for HexBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(&self.0))
    }
}

impl fmt::Display for HexBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Scope of the DID whose key is used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DidScope {
    /// Key belongs to the selected card application
    Local,
    /// Key is visible card-wide
    #[default]
    Global,
}

/// Identifies the card, slot and application a call is addressed to
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionHandle {
    /// Slot handle assigned by the interface device layer
    pub slot_handle: HexBytes,
    /// Identifier of the connected card application
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_application: Option<HexBytes>,
    /// Context handle of the interface device layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_handle: Option<HexBytes>,
}

impl ConnectionHandle {
    /// Handle for a slot without application or context information
    pub fn for_slot(slot_handle: impl Into<HexBytes>) -> Self {
        Self {
            slot_handle: slot_handle.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_bytes_serde() {
        let bytes = HexBytes::new(vec![0x01, 0xAB]);
        assert_eq!(serde_json::to_string(&bytes).unwrap(), "\"01ab\"");
        let parsed: HexBytes = serde_json::from_str("\"01AB\"").unwrap();
        assert_eq!(parsed, bytes);
        assert_eq!(bytes.to_string(), "01AB");
    }

    #[test]
    fn test_connection_handle_serde() {
        let handle: ConnectionHandle =
            serde_json::from_str(r#"{"slotHandle":"0102","cardApplication":"E80704007F00070302"}"#)
                .unwrap();
        assert_eq!(handle.slot_handle.as_slice(), &[0x01, 0x02]);
        assert!(handle.card_application.is_some());
        assert!(handle.context_handle.is_none());
    }
}
