//! MANAGE SECURITY ENVIRONMENT

use bytes::Bytes;
use ecard_apdu_core::Command;

use crate::constants::{cla, ins, mse};

/// MSE SET for computation with the given control reference template and data objects
pub fn set(template: u8, data: impl Into<Bytes>) -> Command {
    Command::new_with_data(
        cla::ISO7816,
        ins::MANAGE_SECURITY_ENVIRONMENT,
        mse::SET_COMPUTATION,
        template,
        data,
    )
}

/// MSE RESTORE of the given template
pub const fn restore(template: u8) -> Command {
    Command::new(
        cla::ISO7816,
        ins::MANAGE_SECURITY_ENVIRONMENT,
        mse::RESTORE,
        template,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::crt;
    use ecard_apdu_core::ApduCommand;
    use hex_literal::hex;

    #[test]
    fn test_set_dst() {
        let command = set(crt::DST, hex!("840181").to_vec());
        assert_eq!(command.to_bytes().as_ref(), &hex!("002241B603840181"));
    }

    #[test]
    fn test_restore() {
        assert_eq!(restore(crt::DST).to_bytes().as_ref(), &hex!("0022F3B6"));
    }
}
