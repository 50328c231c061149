//! Signature generation on eCard smart cards
//!
//! A [`CryptoMarker`] describes how a card application computes signatures,
//! either as a list of symbolic [`SignatureToken`]s (`MSE_KEY`, `PSO_CDS`, ...)
//! or as legacy command templates interleaved with API calls. The
//! [`SignatureSequencer`] turns that description into ISO/IEC 7816-8
//! commands and sends them through a [`Dispatcher`].
//!
//! ```no_run
//! # use ecard_signature::*;
//! # fn demo(dispatcher: &mut impl Dispatcher) -> Result<(), SignError> {
//! let marker = CryptoMarker::with_tokens(vec![0x01], ["MSE_KEY", "PSO_CDS"]);
//! let handle = ConnectionHandle::for_slot(vec![0x01]);
//! let signature = SignatureSequencer::default().sign(
//!     dispatcher,
//!     &SignRequest {
//!         message: &[0u8; 32],
//!         scope: DidScope::Local,
//!         connection_handle: &handle,
//!         marker: &marker,
//!     },
//! )?;
//! # let _ = signature;
//! # Ok(())
//! # }
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]

pub mod commands;
pub mod constants;
pub mod legacy;

mod config;
mod dispatcher;
mod error;
mod sequencer;
mod types;

pub use config::SequencerConfig;
pub use dispatcher::{Dispatcher, SlotTransport};
pub use error::{ProtocolError, Result, SignError};
pub use legacy::{ApiCall, ApiResponse, CommandTemplate, TemplateError};
pub use sequencer::{SignRequest, SignatureSequencer, scoped_key_reference};
pub use types::{
    ConnectionHandle, CryptoMarker, DidScope, HashGenerationInfo, HexBytes, LegacyStep,
    SignatureToken,
};
