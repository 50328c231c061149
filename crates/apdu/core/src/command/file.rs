//! ISO/IEC 7816-4 file management commands

use bytes::{Bytes, BytesMut};

use super::{Command, CommandError};
use crate::tlv::{self, TlvObject};

/// INS of ERASE BINARY with an offset in P1-P2
pub const ERASE_BINARY: u8 = 0x0E;
/// INS of ERASE BINARY with offset data objects
pub const ERASE_BINARY_ODD: u8 = 0x0F;
/// INS of ERASE RECORD(S)
pub const ERASE_RECORD: u8 = 0x0C;
/// INS of CREATE FILE
pub const CREATE_FILE: u8 = 0xE0;

/// Tag of an offset data object
const OFFSET_TAG: u8 = 0x54;

/// Which records ERASE RECORD(S) removes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EraseMode {
    /// Only the record numbered in P1
    Single = 0x04,
    /// From the record numbered in P1 up to the last
    UpToLast = 0x05,
}

/// Short EF identifier in the upper five bits of P2
const fn short_ef_p2(short_ef: u8, low: u8) -> u8 {
    ((short_ef & 0x1F) << 3) | (low & 0x07)
}

impl Command {
    /// ERASE BINARY, `p1`/`p2` address the EF, `data` carries the end offset
    pub fn erase_binary(p1: u8, p2: u8, data: impl Into<Bytes>) -> Self {
        Self::new(0x00, ERASE_BINARY, p1, p2).with_data(data)
    }

    /// ERASE BINARY with up to two offset data objects (tag `54`)
    pub fn erase_binary_with_offsets(
        p1: u8,
        p2: u8,
        offsets: &[TlvObject],
    ) -> Result<Self, CommandError> {
        if offsets.len() > 2 {
            return Err(CommandError::InvalidData("at most two offset data objects"));
        }
        let offset_tag = tlv::tag(&[OFFSET_TAG])
            .map_err(|_| CommandError::InvalidData("offset tag"))?;

        let mut data = BytesMut::new();
        for offset in offsets {
            if offset.tag() != &offset_tag {
                return Err(CommandError::InvalidData("offset data object must use tag 54"));
            }
            let encoded = offset
                .to_bytes()
                .map_err(|_| CommandError::InvalidData("offset data object is not BER-TLV"))?;
            data.extend_from_slice(&encoded);
        }
        Ok(Self::new(0x00, ERASE_BINARY_ODD, p1, p2).with_data(data.freeze()))
    }

    /// ERASE RECORD(S) with a raw P2
    pub const fn erase_record(record: u8, p2: u8) -> Self {
        Self::new(0x00, ERASE_RECORD, record, p2)
    }

    /// ERASE RECORD(S) in the EF with short identifier `short_ef`
    pub const fn erase_record_in(record: u8, mode: EraseMode, short_ef: u8) -> Self {
        Self::erase_record(record, short_ef_p2(short_ef, mode as u8))
    }

    /// CREATE FILE with the file control parameters in `fcp`
    pub fn create_file(fcp: impl Into<Bytes>) -> Self {
        Self::new(0x00, CREATE_FILE, 0x00, 0x00).with_data(fcp)
    }

    /// CREATE FILE with a file descriptor byte and short EF identifier
    ///
    /// The low three bits of P2 take `proprietary`.
    pub fn create_file_with_short_ef(
        descriptor: u8,
        short_ef: u8,
        proprietary: u8,
        fcp: impl Into<Bytes>,
    ) -> Self {
        Self::new(0x00, CREATE_FILE, descriptor, short_ef_p2(short_ef, proprietary)).with_data(fcp)
    }
}
