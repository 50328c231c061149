mod apdu;
mod pin;
mod sign;
mod tlv;
mod verify;

pub(crate) use apdu::{frame_command, parse_command, status_command};
pub(crate) use pin::{PinArgs, pin_command};
pub(crate) use sign::{SignArgs, sign_command};
pub(crate) use tlv::{tlv_decode_command, tlv_encode_command};
pub(crate) use verify::verify_command;

use std::str::FromStr;

/// Hex encoded bytes on the command line, whitespace allowed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct HexArg(pub(crate) Vec<u8>);

impl FromStr for HexArg {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        hex::decode(compact).map(Self)
    }
}

/// A single hex byte such as `A4`
pub(crate) fn parse_byte(s: &str) -> Result<u8, std::num::ParseIntError> {
    u8::from_str_radix(s.trim_start_matches("0x"), 16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_arg() {
        assert_eq!("00 a4 04 00".parse::<HexArg>().unwrap(), HexArg(vec![0x00, 0xA4, 0x04, 0x00]));
        assert!("0".parse::<HexArg>().is_err());
        assert_eq!(parse_byte("0xA4").unwrap(), 0xA4);
        assert_eq!(parse_byte("9e").unwrap(), 0x9E);
    }
}
