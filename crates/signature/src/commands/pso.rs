//! PERFORM SECURITY OPERATION

use bytes::Bytes;
use ecard_apdu_core::Command;
use ecard_apdu_core::command::ExpectedLength;

use crate::constants::{cla, ins, pso};

/// PSO: COMPUTE DIGITAL SIGNATURE over `data`, expecting `le` bytes
pub fn compute_digital_signature(data: impl Into<Bytes>, le: ExpectedLength) -> Command {
    Command::new_with_data_and_le(
        cla::ISO7816,
        ins::PERFORM_SECURITY_OPERATION,
        pso::CDS_P1,
        pso::CDS_P2,
        data,
        le,
    )
}

/// PSO: HASH with the given P2 mode
pub fn hash(mode: u8, data: impl Into<Bytes>) -> Command {
    Command::new_with_data(
        cla::ISO7816,
        ins::PERFORM_SECURITY_OPERATION,
        pso::HASH_P1,
        mode,
        data,
    )
}
