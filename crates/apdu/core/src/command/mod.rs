//! APDU command definitions and traits
//!
//! This module provides types and traits for working with short-form APDU
//! commands according to ISO/IEC 7816-4: `CLA INS P1 P2 [Lc Data] [Le]`.

pub mod error;
pub mod file;

use bytes::{BufMut, Bytes, BytesMut};

pub use error::CommandError;
pub use file::EraseMode;

/// Expected length type for APDU commands
///
/// Only the short form is supported, so `0x00` encodes 256 bytes.
pub type ExpectedLength = u8;

/// Largest data field that fits a short-form `Lc`
pub const MAX_SHORT_DATA: usize = 255;

/// Core trait for APDU commands
pub trait ApduCommand {
    /// Command class (CLA)
    fn class(&self) -> u8;

    /// Instruction code (INS)
    fn instruction(&self) -> u8;

    /// First parameter (P1)
    fn p1(&self) -> u8;

    /// Second parameter (P2)
    fn p2(&self) -> u8;

    /// Command payload data (optional)
    fn data(&self) -> Option<&[u8]>;

    /// Expected response length (optional)
    fn expected_length(&self) -> Option<ExpectedLength>;

    /// Check that the command can be encoded in short form
    fn validate(&self) -> Result<(), CommandError> {
        match self.data() {
            Some(data) if data.len() > MAX_SHORT_DATA => {
                Err(CommandError::data_too_long(data.len(), MAX_SHORT_DATA))
            }
            _ => Ok(()),
        }
    }

    /// Convert to raw APDU bytes
    ///
    /// Callers are expected to have run [`ApduCommand::validate`]; oversized
    /// data would otherwise produce a truncated `Lc`.
    fn to_bytes(&self) -> Bytes {
        let mut buffer = BytesMut::with_capacity(self.command_length());

        // Header: CLA, INS, P1, P2
        buffer.put_u8(self.class());
        buffer.put_u8(self.instruction());
        buffer.put_u8(self.p1());
        buffer.put_u8(self.p2());

        // Lc and data, an empty data field is encoded as absent
        if let Some(data) = self.data().filter(|d| !d.is_empty()) {
            buffer.put_u8(data.len() as u8);
            buffer.put_slice(data);
        }

        if let Some(le) = self.expected_length() {
            buffer.put_u8(le);
        }

        buffer.freeze()
    }

    /// Calculate length of serialized command
    fn command_length(&self) -> usize {
        let mut length = 4;
        if let Some(data) = self.data().filter(|d| !d.is_empty()) {
            length += 1 + data.len();
        }
        if self.expected_length().is_some() {
            length += 1;
        }
        length
    }

    /// Convert to a generic Command
    fn to_command(&self) -> Command {
        Command {
            cla: self.class(),
            ins: self.instruction(),
            p1: self.p1(),
            p2: self.p2(),
            data: self.data().map(Bytes::copy_from_slice),
            le: self.expected_length(),
        }
    }
}

/// Generic APDU command structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command class byte
    pub cla: u8,
    /// Instruction byte
    pub ins: u8,
    /// Parameter 1
    pub p1: u8,
    /// Parameter 2
    pub p2: u8,
    /// Command data (optional)
    pub data: Option<Bytes>,
    /// Expected length (optional)
    pub le: Option<ExpectedLength>,
}

impl Command {
    /// Create a new command with just the header bytes
    pub const fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: None,
            le: None,
        }
    }

    /// Create a new command with expected response length (Le)
    pub const fn new_with_le(cla: u8, ins: u8, p1: u8, p2: u8, le: ExpectedLength) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: None,
            le: Some(le),
        }
    }

    /// Create a new command with data payload
    pub fn new_with_data<T: Into<Bytes>>(cla: u8, ins: u8, p1: u8, p2: u8, data: T) -> Self {
        Self::new(cla, ins, p1, p2).with_data(data)
    }

    /// Create a new command with both data and expected length
    pub fn new_with_data_and_le<T: Into<Bytes>>(
        cla: u8,
        ins: u8,
        p1: u8,
        p2: u8,
        data: T,
        le: ExpectedLength,
    ) -> Self {
        Self::new(cla, ins, p1, p2).with_data(data).with_le(le)
    }

    /// The GET RESPONSE command fetching `le` bytes of pending response data
    pub const fn get_response(le: ExpectedLength) -> Self {
        Self::new_with_le(0x00, 0xC0, 0x00, 0x00, le)
    }

    /// Set the data field
    pub fn with_data<T: Into<Bytes>>(mut self, data: T) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Set the expected length field
    pub const fn with_le(mut self, le: ExpectedLength) -> Self {
        self.le = Some(le);
        self
    }

    /// Parse a command from raw bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self, CommandError> {
        if data.len() < 4 {
            return Err(CommandError::InvalidLength(data.len()));
        }

        let mut command = Self::new(data[0], data[1], data[2], data[3]);

        if data.len() == 5 {
            // Case 2: only Le present
            command.le = Some(data[4]);
        } else if data.len() > 5 {
            let lc = data[4] as usize;
            if lc == 0 || data.len() < 5 + lc {
                return Err(CommandError::InvalidLength(data.len()));
            }
            command.data = Some(Bytes::copy_from_slice(&data[5..5 + lc]));

            match data.len() - (5 + lc) {
                0 => {}
                1 => command.le = Some(data[5 + lc]),
                _ => return Err(CommandError::InvalidLength(data.len())),
            }
        }

        Ok(command)
    }
}

impl ApduCommand for Command {
    fn class(&self) -> u8 {
        self.cla
    }

    fn instruction(&self) -> u8 {
        self.ins
    }

    fn p1(&self) -> u8 {
        self.p1
    }

    fn p2(&self) -> u8 {
        self.p2
    }

    fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    fn expected_length(&self) -> Option<ExpectedLength> {
        self.le
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_command_serialization() {
        let data = Bytes::copy_from_slice(&hex!("A00000015100"));
        let cmd = Command::new_with_data_and_le(0x00, 0xA4, 0x04, 0x00, data, 0);
        assert_eq!(cmd.to_bytes().as_ref(), hex!("00A4040006A0000001510000"));
    }

    #[test]
    fn test_command_length() {
        let cmd1 = Command::new(0x00, 0xB0, 0x00, 0x00);
        assert_eq!(cmd1.command_length(), 4);

        let cmd2 = Command::new_with_le(0x00, 0xB0, 0x00, 0x00, 0xFF);
        assert_eq!(cmd2.command_length(), 5);

        let data = Bytes::from_static(&[0x01, 0x02, 0x03]);
        let cmd3 = Command::new_with_data(0x00, 0xD6, 0x00, 0x00, data.clone());
        assert_eq!(cmd3.command_length(), 8);

        let cmd4 = Command::new_with_data_and_le(0x00, 0xD6, 0x00, 0x00, data, 0xFF);
        assert_eq!(cmd4.command_length(), 9);
        assert_eq!(cmd4.to_bytes().len(), 9);
    }

    #[test]
    fn test_get_response_command() {
        assert_eq!(Command::get_response(0x05).to_bytes().as_ref(), hex!("00C0000005"));
    }

    #[test]
    fn test_oversized_data_is_rejected() {
        let cmd = Command::new_with_data(0x00, 0x2A, 0x9E, 0x9A, vec![0u8; 256]);
        assert!(matches!(
            cmd.validate(),
            Err(CommandError::DataTooLong(256, MAX_SHORT_DATA))
        ));

        let cmd = Command::new_with_data(0x00, 0x2A, 0x9E, 0x9A, vec![0u8; 255]);
        assert!(cmd.validate().is_ok());
    }

    #[test]
    fn test_command_from_bytes() {
        let cmd = Command::from_bytes(&hex!("00A40400")).unwrap();
        assert_eq!((cmd.cla, cmd.ins, cmd.p1, cmd.p2), (0x00, 0xA4, 0x04, 0x00));
        assert!(cmd.data.is_none());
        assert!(cmd.le.is_none());

        let cmd = Command::from_bytes(&hex!("00A4040003010203")).unwrap();
        assert_eq!(cmd.data.as_deref(), Some(&[0x01, 0x02, 0x03][..]));
        assert!(cmd.le.is_none());

        let cmd = Command::from_bytes(&hex!("00A4040003010203FF")).unwrap();
        assert_eq!(cmd.data.as_deref(), Some(&[0x01, 0x02, 0x03][..]));
        assert_eq!(cmd.le, Some(0xFF));

        let cmd = Command::from_bytes(&hex!("00B00000FF")).unwrap();
        assert!(cmd.data.is_none());
        assert_eq!(cmd.le, Some(0xFF));

        assert!(Command::from_bytes(&hex!("00A404")).is_err());
        assert!(Command::from_bytes(&hex!("00A404000501")).is_err());
        assert!(Command::from_bytes(&hex!("00A40400010203")).is_err());
    }
}
