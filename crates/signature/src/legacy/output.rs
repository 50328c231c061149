use bytes::Bytes;
use der::Encode;
use der::asn1::UintRef;
use tracing::warn;

use crate::constants::OUTPUT_FORMAT_RAW_RS;
use crate::error::{ProtocolError, SignError};

/// `ECDSA-Sig-Value` of RFC 3279
#[derive(Debug, der::Sequence)]
struct EcdsaSignature<'a> {
    r: UintRef<'a>,
    s: UintRef<'a>,
}

/// Re-encode a plain `r || s` signature as a DER `SEQUENCE { INTEGER r, INTEGER s }`
pub fn encode_raw_rs(signature: &[u8]) -> Result<Bytes, SignError> {
    if signature.is_empty() || signature.len() % 2 != 0 {
        return Err(ProtocolError::MalformedSignature(OUTPUT_FORMAT_RAW_RS).into());
    }
    let (r, s) = signature.split_at(signature.len() / 2);
    let der = EcdsaSignature {
        r: UintRef::new(r)?,
        s: UintRef::new(s)?,
    }
    .to_der()?;
    Ok(Bytes::from(der))
}

/// Apply a legacy output format to the card output
pub fn apply_output_format(format: Option<&str>, signature: Bytes) -> Result<Bytes, SignError> {
    match format {
        None => Ok(signature),
        Some(OUTPUT_FORMAT_RAW_RS) => encode_raw_rs(&signature),
        Some(other) => {
            warn!(format = other, "Unsupported legacy output format, returning signature as-is");
            Ok(signature)
        }
    }
}
