//! Signature generation driven by a [`CryptoMarker`]

use bytes::{BufMut, Bytes, BytesMut};
use ecard_apdu_core::tlv;
use ecard_apdu_core::{CardExecutor, CardTransport, Command, GetResponseProcessor};
use tracing::debug;

use crate::commands::{internal_authenticate, mse, pso};
use crate::config::SequencerConfig;
use crate::constants::{LOCAL_KEY_REFERENCE, crt, pso as pso_mode, tags};
use crate::dispatcher::{Dispatcher, SlotTransport};
use crate::error::{ProtocolError, Result};
use crate::legacy::{TemplateContext, apply_output_format};
use crate::types::{
    ConnectionHandle, CryptoMarker, DidScope, HashGenerationInfo, LegacyStep, SignatureToken,
};

/// Everything needed for one signing call
#[derive(Debug, Clone, Copy)]
pub struct SignRequest<'a> {
    /// Message or hash to sign
    pub message: &'a [u8],
    /// Scope of the signing DID
    pub scope: DidScope,
    /// Card and slot to sign with
    pub connection_handle: &'a ConnectionHandle,
    /// Capability descriptor of the key
    pub marker: &'a CryptoMarker,
}

/// Drives the card through the command sequence a [`CryptoMarker`] describes
#[derive(Debug, Clone, Default)]
pub struct SignatureSequencer {
    config: SequencerConfig,
}

impl SignatureSequencer {
    /// Create a sequencer with the given settings
    pub const fn new(config: SequencerConfig) -> Self {
        Self { config }
    }

    /// Current settings
    pub const fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// Compute a signature over `request.message`
    ///
    /// The declarative token list is used when present, the legacy steps otherwise.
    /// Any failing card command aborts the sequence.
    pub fn sign<D: Dispatcher + ?Sized>(
        &self,
        dispatcher: &mut D,
        request: &SignRequest<'_>,
    ) -> Result<Bytes> {
        let key_reference = scoped_key_reference(&request.marker.key_reference, request.scope);
        let transport = SlotTransport::new(dispatcher, &request.connection_handle.slot_handle);
        let mut executor = CardExecutor::with_processor(
            transport,
            Box::new(GetResponseProcessor::new(self.config.max_chains)),
        );

        match &request.marker.signature_generation {
            Some(tokens) => {
                debug!(?tokens, scope = ?request.scope, "Signing with token sequence");
                self.run_tokens(&mut executor, tokens, &key_reference, request)
            }
            None => {
                debug!(
                    steps = request.marker.legacy_signature_generation.len(),
                    scope = ?request.scope,
                    "Signing with legacy steps"
                );
                self.run_legacy(&mut executor, &key_reference, request)
            }
        }
    }

    fn run_tokens<T: CardTransport>(
        &self,
        executor: &mut CardExecutor<T>,
        tokens: &[String],
        key_reference: &[u8],
        request: &SignRequest<'_>,
    ) -> Result<Bytes> {
        if tokens.is_empty() {
            return Err(ProtocolError::NoCardCommand.into());
        }

        let mut output = Bytes::new();
        for name in tokens {
            let token: SignatureToken = name.parse()?;
            let command = self.token_command(token, tokens, key_reference, request)?;
            debug!(%token, "Executing signature generation step");
            output = executor.transmit_checked(&command)?;
        }
        Ok(output)
    }

    fn token_command(
        &self,
        token: SignatureToken,
        tokens: &[String],
        key_reference: &[u8],
        request: &SignRequest<'_>,
    ) -> Result<Command> {
        let marker = request.marker;
        let command = match token {
            SignatureToken::MseKey => {
                mse::set(mse_key_template(tokens)?, key_tlv(key_reference)?)
            }
            SignatureToken::PsoCds => pso::compute_digital_signature(
                Bytes::copy_from_slice(request.message),
                self.config.block_size,
            ),
            SignatureToken::IntAuth => internal_authenticate(
                Bytes::copy_from_slice(request.message),
                self.config.block_size,
            ),
            SignatureToken::MseRestore => mse::restore(crt::DST),
            SignatureToken::MseHash => mse::set(
                crt::HT,
                algorithm_tlv(&marker.hash_algorithm_reference)?,
            ),
            SignatureToken::PsoHash => pso::hash(
                hash_mode(marker.hash_generation),
                Bytes::copy_from_slice(request.message),
            ),
            SignatureToken::MseDs => {
                mse::set(crt::DST, algorithm_tlv(&marker.algorithm_identifier)?)
            }
            SignatureToken::MseKeyDs => mse::set(
                crt::DST,
                key_and_algorithm(key_reference, &marker.algorithm_identifier)?,
            ),
            SignatureToken::MseIntAuth => mse::set(crt::AT, key_tlv(key_reference)?),
            SignatureToken::MseKeyIntAuth => mse::set(
                crt::AT,
                key_and_algorithm(key_reference, &marker.algorithm_identifier)?,
            ),
        };
        Ok(command)
    }

    fn run_legacy<D: Dispatcher + ?Sized>(
        &self,
        executor: &mut CardExecutor<SlotTransport<'_, D>>,
        key_reference: &[u8],
        request: &SignRequest<'_>,
    ) -> Result<Bytes> {
        let marker = request.marker;
        let steps = &marker.legacy_signature_generation;
        if !steps.iter().any(|step| matches!(step, LegacyStep::Command(_))) {
            return Err(ProtocolError::NoCardCommand.into());
        }

        let context = TemplateContext {
            hash_to_sign: request.message,
            key_reference,
            algorithm_identifier: &marker.algorithm_identifier,
            hash_algorithm_reference: &marker.hash_algorithm_reference,
        };

        let mut output = Bytes::new();
        for step in steps {
            match step {
                LegacyStep::Command(template) => {
                    let command = template.evaluate(&context)?;
                    output = executor.transmit_checked(&command)?;
                }
                LegacyStep::ApiCall(call) => {
                    let mut call = call.clone();
                    let handle = request.connection_handle;
                    if call.accepts_connection_handle() {
                        call.apply_connection_handle(handle);
                    } else if call.accepts_slot_handle() {
                        call.apply_slot_handle(&handle.slot_handle);
                    } else {
                        debug!(call = call.name(), "Call takes no handle, sending as-is");
                    }

                    let name = call.name().to_string();
                    let response = executor.transport_mut().dispatcher_mut().deliver(call)?;
                    if let Some(minor) = response.result_minor {
                        return Err(ProtocolError::ApiCallFailed { call: name, minor }.into());
                    }
                }
            }
        }

        apply_output_format(marker.legacy_output_format.as_deref(), output)
    }
}

/// Copy of the key reference with the local bit set for [`DidScope::Local`]
pub fn scoped_key_reference(key_reference: &[u8], scope: DidScope) -> Vec<u8> {
    let mut key = key_reference.to_vec();
    if let (DidScope::Local, Some(first)) = (scope, key.first_mut()) {
        *first |= LOCAL_KEY_REFERENCE;
    }
    key
}

fn mse_key_template(tokens: &[String]) -> Result<u8> {
    let has = |name: &str| tokens.iter().any(|t| t == name);
    if has("PSO_CDS") {
        Ok(crt::DST)
    } else if has("INT_AUTH") {
        Ok(crt::AT)
    } else {
        Err(ProtocolError::UnsupportedCombination.into())
    }
}

const fn hash_mode(policy: Option<HashGenerationInfo>) -> u8 {
    match policy {
        Some(HashGenerationInfo::LastRoundOnCard | HashGenerationInfo::NotOnCard) => {
            pso_mode::SET_HASH_OR_PART
        }
        _ => pso_mode::HASH_MESSAGE,
    }
}

fn data_object(tag: u8, value: &[u8]) -> Result<Bytes> {
    Ok(tlv::encode(&tlv::tag(&[tag])?, value)?)
}

fn key_tlv(key_reference: &[u8]) -> Result<Bytes> {
    if key_reference.is_empty() {
        return Err(ProtocolError::MissingKeyReference.into());
    }
    data_object(tags::PRIVATE_KEY_REFERENCE, key_reference)
}

fn algorithm_tlv(reference: &[u8]) -> Result<Bytes> {
    data_object(tags::ALGORITHM_REFERENCE, reference)
}

fn key_and_algorithm(key_reference: &[u8], algorithm: &[u8]) -> Result<Bytes> {
    let mut data = BytesMut::new();
    data.put(key_tlv(key_reference)?);
    data.put(algorithm_tlv(algorithm)?);
    Ok(data.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::mock::MockDispatcher;
    use crate::error::SignError;
    use crate::legacy::{ApiCall, ApiResponse, CommandTemplate};
    use crate::types::HexBytes;
    use ecard_apdu_core::MinorError;
    use hex_literal::hex;

    const MESSAGE: [u8; 3] = hex!("C0FFEE");

    fn sign(
        dispatcher: &mut MockDispatcher,
        marker: &CryptoMarker,
        scope: DidScope,
    ) -> Result<Bytes> {
        let handle = ConnectionHandle::for_slot(vec![0x5A]);
        SignatureSequencer::default().sign(
            dispatcher,
            &SignRequest {
                message: &MESSAGE,
                scope,
                connection_handle: &handle,
                marker,
            },
        )
    }

    #[test]
    fn test_mse_key_then_cds_with_local_key() {
        let marker = CryptoMarker::with_tokens(vec![0x01], ["MSE_KEY", "PSO_CDS"]);
        let mut dispatcher = MockDispatcher::scripted(&[&hex!("9000"), &hex!("AABBCC9000")]);

        let signature = sign(&mut dispatcher, &marker, DidScope::Local).unwrap();

        assert_eq!(signature.as_ref(), &hex!("AABBCC"));
        assert_eq!(
            dispatcher.commands(),
            vec![&hex!("002241B603840181")[..], &hex!("002A9E9A03C0FFEE00")[..]]
        );
        assert!(dispatcher.slot_handles.iter().all(|slot| slot == &[0x5A]));
        // marker stays untouched
        assert_eq!(marker.key_reference.as_slice(), &[0x01]);
    }

    #[test]
    fn test_scoped_key_reference() {
        for key in 0u8..=255 {
            assert_eq!(scoped_key_reference(&[key, 0x02], DidScope::Local), vec![key | 0x80, 0x02]);
            assert_eq!(scoped_key_reference(&[key], DidScope::Global), vec![key]);
        }
        assert!(scoped_key_reference(&[], DidScope::Local).is_empty());
    }

    #[test]
    fn test_mse_key_selects_authentication_template() {
        let marker = CryptoMarker::with_tokens(vec![0x03], ["MSE_KEY", "INT_AUTH"]);
        let mut dispatcher = MockDispatcher::scripted(&[&hex!("9000"), &hex!("01029000")]);

        let signature = sign(&mut dispatcher, &marker, DidScope::Global).unwrap();

        assert_eq!(signature.as_ref(), &hex!("0102"));
        assert_eq!(
            dispatcher.commands(),
            vec![&hex!("002241A403840103")[..], &hex!("0088000003C0FFEE00")[..]]
        );
    }

    #[test]
    fn test_mse_key_without_operation_is_rejected() {
        let marker = CryptoMarker::with_tokens(vec![0x01], ["MSE_KEY", "MSE_RESTORE"]);
        let mut dispatcher = MockDispatcher::scripted(&[]);

        assert_eq!(
            sign(&mut dispatcher, &marker, DidScope::Global),
            Err(SignError::Protocol(ProtocolError::UnsupportedCombination))
        );
        assert!(dispatcher.commands().is_empty());
    }

    #[test]
    fn test_unknown_token_stops_before_its_command() {
        let marker = CryptoMarker::with_tokens(vec![0x01], ["MSE_KEY", "PSO_DECIPHER", "PSO_CDS"]);
        let mut dispatcher = MockDispatcher::scripted(&[&hex!("9000"), &hex!("9000")]);

        assert_eq!(
            sign(&mut dispatcher, &marker, DidScope::Global),
            Err(SignError::Protocol(ProtocolError::UnknownCommand(
                "PSO_DECIPHER".into()
            )))
        );
        assert_eq!(dispatcher.commands().len(), 1);
    }

    #[test]
    fn test_pso_hash_mode_follows_policy() {
        let cases = [
            (Some(HashGenerationInfo::LastRoundOnCard), 0xA0),
            (Some(HashGenerationInfo::NotOnCard), 0xA0),
            (Some(HashGenerationInfo::CompletelyOnCard), 0x80),
            (None, 0x80),
        ];
        for (policy, p2) in cases {
            let marker = CryptoMarker {
                hash_generation: policy,
                ..CryptoMarker::with_tokens(vec![0x01], ["PSO_HASH"])
            };
            let mut dispatcher = MockDispatcher::scripted(&[&hex!("9000")]);
            sign(&mut dispatcher, &marker, DidScope::Global).unwrap();
            assert_eq!(dispatcher.commands()[0][..4], [0x00, 0x2A, 0x90, p2]);
        }
    }

    #[test]
    fn test_security_environment_variants() {
        let marker = CryptoMarker {
            algorithm_identifier: HexBytes::new(vec![0x54]),
            hash_algorithm_reference: HexBytes::new(vec![0x10]),
            ..CryptoMarker::with_tokens(
                vec![0x01],
                ["MSE_KEY_DS", "MSE_DS", "MSE_HASH", "MSE_INT_AUTH", "MSE_KEY_INT_AUTH"],
            )
        };
        let mut dispatcher = MockDispatcher::scripted(&[&hex!("9000")[..]; 5]);

        sign(&mut dispatcher, &marker, DidScope::Global).unwrap();

        assert_eq!(
            dispatcher.commands(),
            vec![
                &hex!("002241B606840101800154")[..],
                &hex!("002241B603800154")[..],
                &hex!("002241AA03800110")[..],
                &hex!("002241A403840101")[..],
                &hex!("002241A406840101800154")[..],
            ]
        );
    }

    #[test]
    fn test_signature_is_chained() {
        let marker = CryptoMarker::with_tokens(vec![0x01], ["PSO_CDS"]);
        let mut dispatcher =
            MockDispatcher::scripted(&[&hex!("01026102"), &hex!("03049000")]);

        let signature = sign(&mut dispatcher, &marker, DidScope::Global).unwrap();

        assert_eq!(signature.as_ref(), &hex!("01020304"));
        assert_eq!(dispatcher.commands()[1], &hex!("00C0000002"));
    }

    #[test]
    fn test_card_error_carries_minor_code() {
        let marker = CryptoMarker::with_tokens(vec![0x01], ["MSE_KEY", "PSO_CDS"]);
        let mut dispatcher = MockDispatcher::scripted(&[&hex!("9000"), &hex!("6982")]);

        let error = sign(&mut dispatcher, &marker, DidScope::Global).unwrap_err();
        assert_eq!(error.minor(), Some(MinorError::SecurityConditionNotSatisfied));
    }

    #[test]
    fn test_failed_intermediate_step_aborts() {
        let marker = CryptoMarker::with_tokens(vec![0x01], ["MSE_KEY", "PSO_CDS"]);
        let mut dispatcher = MockDispatcher::scripted(&[&hex!("6A88"), &hex!("AABB9000")]);

        let error = sign(&mut dispatcher, &marker, DidScope::Global).unwrap_err();
        assert_eq!(error.minor(), Some(MinorError::NamedEntityNotFound));
        assert_eq!(dispatcher.commands().len(), 1);
    }

    #[test]
    fn test_empty_token_list() {
        let marker = CryptoMarker::with_tokens(vec![0x01], Vec::<String>::new());
        let mut dispatcher = MockDispatcher::scripted(&[]);
        assert_eq!(
            sign(&mut dispatcher, &marker, DidScope::Global),
            Err(SignError::Protocol(ProtocolError::NoCardCommand))
        );
    }

    #[test]
    fn test_missing_key_reference() {
        let marker = CryptoMarker::with_tokens(Vec::new(), ["MSE_KEY", "PSO_CDS"]);
        let mut dispatcher = MockDispatcher::scripted(&[]);
        assert_eq!(
            sign(&mut dispatcher, &marker, DidScope::Local),
            Err(SignError::Protocol(ProtocolError::MissingKeyReference))
        );
    }

    #[test]
    fn test_legacy_steps_with_raw_rs_output() {
        let marker = CryptoMarker::with_legacy_steps(
            vec![0x02],
            vec![
                LegacyStep::ApiCall(ApiCall::BeginTransaction { slot_handle: None }),
                LegacyStep::Command(CommandTemplate::new("002241B6 03 {tlv:84:keyReference}")),
                LegacyStep::Command(CommandTemplate::new(
                    "002A9E9A {len:hashToSign} {hashToSign} 00",
                )),
                LegacyStep::ApiCall(ApiCall::DidAuthenticate {
                    connection_handle: None,
                    did_name: "PIN.CH".into(),
                }),
                LegacyStep::ApiCall(ApiCall::Opaque {
                    name: "Notify".into(),
                    payload: serde_json::Value::Null,
                }),
            ],
            Some("rawRS".into()),
        );
        let mut raw = [0u8; 66];
        raw[31] = 0x01;
        raw[63] = 0x01;
        raw[64] = 0x90;
        let mut dispatcher = MockDispatcher::scripted(&[&hex!("9000"), &raw]);

        let signature = sign(&mut dispatcher, &marker, DidScope::Local).unwrap();

        assert_eq!(signature.as_ref(), &hex!("3006020101020101"));
        assert_eq!(dispatcher.commands()[0], &hex!("002241B603840182"));
        assert_eq!(
            dispatcher.calls,
            vec![
                ApiCall::BeginTransaction {
                    slot_handle: Some(HexBytes::new(vec![0x5A]))
                },
                ApiCall::DidAuthenticate {
                    connection_handle: Some(ConnectionHandle::for_slot(vec![0x5A])),
                    did_name: "PIN.CH".into(),
                },
                ApiCall::Opaque {
                    name: "Notify".into(),
                    payload: serde_json::Value::Null,
                },
            ]
        );
    }

    #[test]
    fn test_legacy_without_card_command() {
        let marker = CryptoMarker::with_legacy_steps(
            vec![0x02],
            vec![LegacyStep::ApiCall(ApiCall::BeginTransaction { slot_handle: None })],
            None,
        );
        let mut dispatcher = MockDispatcher::scripted(&[]);
        assert_eq!(
            sign(&mut dispatcher, &marker, DidScope::Global),
            Err(SignError::Protocol(ProtocolError::NoCardCommand))
        );
        assert!(dispatcher.calls.is_empty());
    }

    #[test]
    fn test_failed_api_call_aborts() {
        let marker = CryptoMarker::with_legacy_steps(
            vec![0x02],
            vec![
                LegacyStep::ApiCall(ApiCall::BeginTransaction { slot_handle: None }),
                LegacyStep::Command(CommandTemplate::new("002A9E9A {len:hashToSign} {hashToSign} 00")),
            ],
            None,
        );
        let mut dispatcher = MockDispatcher::scripted(&[&hex!("9000")]);
        dispatcher
            .api_responses
            .push_back(ApiResponse::error("ifdl#invalidSlotHandle"));

        assert!(matches!(
            sign(&mut dispatcher, &marker, DidScope::Global),
            Err(SignError::Protocol(ProtocolError::ApiCallFailed { .. }))
        ));
        assert!(dispatcher.commands().is_empty());
    }
}
