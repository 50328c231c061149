use std::path::Path;

use bytes::{BufMut, Bytes, BytesMut};
use ecard_apdu_core::TransportError;
use ecard_signature::constants::{ins, pso};
use ecard_signature::{
    ApiCall, ApiResponse, ConnectionHandle, CryptoMarker, DidScope, Dispatcher, SequencerConfig,
    SignRequest, SignatureSequencer,
};
use tracing::debug;

use super::HexArg;

/// Prints every exchange and answers like a card that accepts everything
///
/// Signing commands return the configured signature, all others an empty `9000`.
#[derive(Debug, Default)]
struct DryRunDispatcher {
    signature: Vec<u8>,
    exchanges: usize,
}

impl DryRunDispatcher {
    fn is_signing_command(command: &[u8]) -> bool {
        match command {
            [_, ins::PERFORM_SECURITY_OPERATION, pso::CDS_P1, pso::CDS_P2, ..] => true,
            [_, ins::INTERNAL_AUTHENTICATE, ..] => true,
            _ => false,
        }
    }
}

impl Dispatcher for DryRunDispatcher {
    fn transmit(&mut self, command: &[u8], slot_handle: &[u8]) -> Result<Bytes, TransportError> {
        self.exchanges += 1;
        println!("[{}] > {}", hex::encode_upper(slot_handle), hex::encode_upper(command));

        let mut response = BytesMut::new();
        if Self::is_signing_command(command) {
            response.put_slice(&self.signature);
        }
        response.put_slice(&[0x90, 0x00]);
        println!("[{}] < {}", hex::encode_upper(slot_handle), hex::encode_upper(&response));
        Ok(response.freeze())
    }

    fn deliver(&mut self, call: ApiCall) -> Result<ApiResponse, TransportError> {
        debug!(call = ?call, "Delivering API call");
        println!("API call {}", call.name());
        Ok(ApiResponse::ok())
    }
}

#[derive(Debug)]
pub(crate) struct SignArgs<'a> {
    pub(crate) marker: &'a Path,
    pub(crate) message: &'a HexArg,
    pub(crate) slot: &'a HexArg,
    pub(crate) local: bool,
    pub(crate) card_signature: &'a HexArg,
}

/// Run a CryptoMarker against a simulated card and print the result
pub(crate) fn sign_command(args: SignArgs<'_>, config: SequencerConfig) -> eyre::Result<()> {
    let marker: CryptoMarker = serde_json::from_slice(&std::fs::read(args.marker)?)?;
    let handle = ConnectionHandle::for_slot(args.slot.0.clone());
    let scope = if args.local { DidScope::Local } else { DidScope::Global };

    let mut dispatcher = DryRunDispatcher {
        signature: args.card_signature.0.clone(),
        ..Default::default()
    };
    let signature = SignatureSequencer::new(config).sign(
        &mut dispatcher,
        &SignRequest {
            message: &args.message.0,
            scope,
            connection_handle: &handle,
            marker: &marker,
        },
    )?;

    println!("{} card exchanges", dispatcher.exchanges);
    println!("Signature {}", hex::encode_upper(signature));
    Ok(())
}
