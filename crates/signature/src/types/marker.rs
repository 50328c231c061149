use serde::{Deserialize, Serialize};

use super::HexBytes;
use crate::legacy::{ApiCall, CommandTemplate};

/// Where the hash of the message is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashGenerationInfo {
    /// The caller hashes, the card only signs
    NotOnCard,
    /// The card hashes the whole message
    CompletelyOnCard,
    /// The caller hashes all but the last round, the card finishes
    LastRoundOnCard,
}

/// One step of a legacy signature generation description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LegacyStep {
    /// A card command built from a template
    Command(CommandTemplate),
    /// A call forwarded to the dispatcher
    ApiCall(ApiCall),
}

/// Signing capability of a card application key, as declared by its capability descriptor
///
/// Either `signature_generation` or `legacy_signature_generation` describes
/// how to drive the card; the declarative token list wins if both are present.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoMarker {
    /// Reference of the private key on the card
    pub key_reference: HexBytes,
    /// Card specific algorithm identifier
    #[serde(default)]
    pub algorithm_identifier: HexBytes,
    /// Card specific hash algorithm reference
    #[serde(default)]
    pub hash_algorithm_reference: HexBytes,
    /// Hash generation policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_generation: Option<HashGenerationInfo>,
    /// Declarative signature generation tokens, kept verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_generation: Option<Vec<String>>,
    /// Legacy signature generation steps
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub legacy_signature_generation: Vec<LegacyStep>,
    /// Output format applied after a legacy signature generation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_output_format: Option<String>,
}

impl CryptoMarker {
    /// Marker with a key reference and a declarative token sequence
    pub fn with_tokens<I, S>(key_reference: impl Into<HexBytes>, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key_reference: key_reference.into(),
            signature_generation: Some(tokens.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    /// Marker with a key reference and legacy steps
    pub fn with_legacy_steps(
        key_reference: impl Into<HexBytes>,
        steps: Vec<LegacyStep>,
        output_format: Option<String>,
    ) -> Self {
        Self {
            key_reference: key_reference.into(),
            legacy_signature_generation: steps,
            legacy_output_format: output_format,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_token_marker() {
        let marker: CryptoMarker = serde_json::from_str(
            r#"{
                "keyReference": "01",
                "algorithmIdentifier": "54",
                "hashGeneration": "LastRoundOnCard",
                "signatureGeneration": ["MSE_KEY", "PSO_CDS"]
            }"#,
        )
        .unwrap();

        assert_eq!(marker.key_reference.as_slice(), &[0x01]);
        assert_eq!(marker.algorithm_identifier.as_slice(), &[0x54]);
        assert!(marker.hash_algorithm_reference.is_empty());
        assert_eq!(
            marker.hash_generation,
            Some(HashGenerationInfo::LastRoundOnCard)
        );
        assert_eq!(
            marker.signature_generation.as_deref(),
            Some(&["MSE_KEY".to_string(), "PSO_CDS".to_string()][..])
        );
    }

    #[test]
    fn test_deserialize_legacy_marker() {
        let marker: CryptoMarker = serde_json::from_str(
            r#"{
                "keyReference": "02",
                "legacySignatureGeneration": [
                    {"apiCall": {"call": "BeginTransaction"}},
                    {"command": "002A9E9A {len:hashToSign} {hashToSign} 00"}
                ],
                "legacyOutputFormat": "rawRS"
            }"#,
        )
        .unwrap();

        assert!(marker.signature_generation.is_none());
        assert_eq!(marker.legacy_signature_generation.len(), 2);
        assert!(matches!(
            marker.legacy_signature_generation[0],
            LegacyStep::ApiCall(ApiCall::BeginTransaction { .. })
        ));
        assert_eq!(marker.legacy_output_format.as_deref(), Some("rawRS"));
    }
}
