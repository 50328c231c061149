use serde::{Deserialize, Serialize};

use crate::types::{ConnectionHandle, HexBytes};

/// eCard-API call embedded in a legacy signature generation description
///
/// Only some calls carry a connection or slot handle. The sequencer fills
/// them in through [`ApiCall::apply_connection_handle`] and
/// [`ApiCall::apply_slot_handle`], which leave other variants untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all_fields = "camelCase")]
pub enum ApiCall {
    /// Start an exclusive card transaction
    BeginTransaction {
        /// Slot the transaction is opened on
        #[serde(default, skip_serializing_if = "Option::is_none")]
        slot_handle: Option<HexBytes>,
    },
    /// End a card transaction
    EndTransaction {
        /// Slot the transaction was opened on
        #[serde(default, skip_serializing_if = "Option::is_none")]
        slot_handle: Option<HexBytes>,
    },
    /// Send raw command APDUs through the interface device layer
    Transmit {
        /// Target slot
        #[serde(default, skip_serializing_if = "Option::is_none")]
        slot_handle: Option<HexBytes>,
        /// Commands to send
        #[serde(default)]
        input_apdus: Vec<HexBytes>,
    },
    /// Authenticate a DID of the connected card application
    DidAuthenticate {
        /// Connection the DID belongs to
        #[serde(default, skip_serializing_if = "Option::is_none")]
        connection_handle: Option<ConnectionHandle>,
        /// Name of the DID
        did_name: String,
    },
    /// A call this crate does not model, forwarded as-is
    Opaque {
        /// API function name
        name: String,
        /// Request body
        #[serde(default)]
        payload: serde_json::Value,
    },
}

impl ApiCall {
    /// Name of the API function
    pub fn name(&self) -> &str {
        match self {
            Self::BeginTransaction { .. } => "BeginTransaction",
            Self::EndTransaction { .. } => "EndTransaction",
            Self::Transmit { .. } => "Transmit",
            Self::DidAuthenticate { .. } => "DIDAuthenticate",
            Self::Opaque { name, .. } => name,
        }
    }

    /// Whether the call carries a connection handle
    pub const fn accepts_connection_handle(&self) -> bool {
        matches!(self, Self::DidAuthenticate { .. })
    }

    /// Whether the call carries a slot handle
    pub const fn accepts_slot_handle(&self) -> bool {
        matches!(
            self,
            Self::BeginTransaction { .. } | Self::EndTransaction { .. } | Self::Transmit { .. }
        )
    }

    /// Set the connection handle if the call has one, returning whether it was set
    pub fn apply_connection_handle(&mut self, handle: &ConnectionHandle) -> bool {
        match self {
            Self::DidAuthenticate {
                connection_handle, ..
            } => {
                *connection_handle = Some(handle.clone());
                true
            }
            _ => false,
        }
    }

    /// Set the slot handle if the call has one, returning whether it was set
    pub fn apply_slot_handle(&mut self, handle: &HexBytes) -> bool {
        match self {
            Self::BeginTransaction { slot_handle }
            | Self::EndTransaction { slot_handle }
            | Self::Transmit { slot_handle, .. } => {
                *slot_handle = Some(handle.clone());
                true
            }
            _ => false,
        }
    }
}

/// Answer of the dispatcher to an [`ApiCall`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    /// Minor result URI, absent on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_minor: Option<String>,
    /// Response body
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl ApiResponse {
    /// Successful response without body
    pub fn ok() -> Self {
        Self::default()
    }

    /// Error response with the given minor result
    pub fn error(minor: impl Into<String>) -> Self {
        Self {
            result_minor: Some(minor.into()),
            ..Default::default()
        }
    }

    /// Whether the call succeeded
    pub const fn is_ok(&self) -> bool {
        self.result_minor.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_handle_injection() {
        let slot = HexBytes::new(vec![0x01]);

        let mut call = ApiCall::BeginTransaction { slot_handle: None };
        assert!(call.accepts_slot_handle());
        assert!(!call.accepts_connection_handle());
        assert!(call.apply_slot_handle(&slot));
        assert_eq!(
            call,
            ApiCall::BeginTransaction {
                slot_handle: Some(slot.clone())
            }
        );

        let mut call = ApiCall::DidAuthenticate {
            connection_handle: None,
            did_name: "PIN.CH".into(),
        };
        assert!(!call.apply_slot_handle(&slot));
        assert!(call.apply_connection_handle(&ConnectionHandle::for_slot(slot.clone())));
    }

    #[test]
    fn test_opaque_call_is_left_alone() {
        let mut call: ApiCall = serde_json::from_str(
            r#"{"call":"Opaque","name":"CardApplicationPath","payload":{"x":1}}"#,
        )
        .unwrap();
        let before = call.clone();
        assert!(!call.apply_slot_handle(&HexBytes::new(vec![0x02])));
        assert!(!call.apply_connection_handle(&ConnectionHandle::default()));
        assert_eq!(call, before);
        assert_eq!(call.name(), "CardApplicationPath");
    }

    #[test]
    fn test_deserialize_camel_case_fields() {
        let call: ApiCall =
            serde_json::from_str(r#"{"call":"Transmit","slotHandle":"AB","inputApdus":["0084000008"]}"#)
                .unwrap();
        match call {
            ApiCall::Transmit {
                slot_handle,
                input_apdus,
            } => {
                assert_eq!(slot_handle.unwrap().as_slice(), &[0xAB]);
                assert_eq!(input_apdus.len(), 1);
            }
            other => panic!("unexpected call {other:?}"),
        }
    }
}
