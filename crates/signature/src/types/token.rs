use std::str::FromStr;

use derive_more::Display;

use crate::error::ProtocolError;

/// Symbolic command of a declarative signature generation sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum SignatureToken {
    /// MSE SET with the key reference, template chosen from the rest of the sequence
    #[display("MSE_KEY")]
    MseKey,
    /// PSO: COMPUTE DIGITAL SIGNATURE
    #[display("PSO_CDS")]
    PsoCds,
    /// INTERNAL AUTHENTICATE
    #[display("INT_AUTH")]
    IntAuth,
    /// MSE RESTORE of the digital signature template
    #[display("MSE_RESTORE")]
    MseRestore,
    /// MSE SET of the hash template with the hash algorithm reference
    #[display("MSE_HASH")]
    MseHash,
    /// PSO: HASH
    #[display("PSO_HASH")]
    PsoHash,
    /// MSE SET DST with the algorithm reference
    #[display("MSE_DS")]
    MseDs,
    /// MSE SET DST with key and algorithm reference
    #[display("MSE_KEY_DS")]
    MseKeyDs,
    /// MSE SET AT with the key reference
    #[display("MSE_INT_AUTH")]
    MseIntAuth,
    /// MSE SET AT with key and algorithm reference
    #[display("MSE_KEY_INT_AUTH")]
    MseKeyIntAuth,
}

impl FromStr for SignatureToken {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "MSE_KEY" => Self::MseKey,
            "PSO_CDS" => Self::PsoCds,
            "INT_AUTH" => Self::IntAuth,
            "MSE_RESTORE" => Self::MseRestore,
            "MSE_HASH" => Self::MseHash,
            "PSO_HASH" => Self::PsoHash,
            "MSE_DS" => Self::MseDs,
            "MSE_KEY_DS" => Self::MseKeyDs,
            "MSE_INT_AUTH" => Self::MseIntAuth,
            "MSE_KEY_INT_AUTH" => Self::MseKeyIntAuth,
            other => return Err(ProtocolError::UnknownCommand(other.to_string())),
        })
    }
}
