use bytes::Bytes;
use ecard_apdu_core::Command;
use ecard_apdu_core::command::ExpectedLength;

use crate::constants::{cla, ins};

/// INTERNAL AUTHENTICATE with the previously selected authentication template
pub fn internal_authenticate(data: impl Into<Bytes>, le: ExpectedLength) -> Command {
    Command::new_with_data_and_le(
        cla::ISO7816,
        ins::INTERNAL_AUTHENTICATE,
        0x00,
        0x00,
        data,
        le,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecard_apdu_core::ApduCommand;
    use hex_literal::hex;

    #[test]
    fn test_internal_authenticate() {
        let command = internal_authenticate(hex!("C0FFEE").to_vec(), 0x00);
        assert_eq!(command.to_bytes().as_ref(), &hex!("0088000003C0FFEE00"));
    }
}
