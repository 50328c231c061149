//! BER-TLV encoding and decoding
//!
//! Thin layer over [`iso7816_tlv::ber`] that works on raw value bytes. A
//! constructed tag carries the concatenated encodings of its children as its
//! value, so `decode(encode(tag, value))` yields the same pair for both
//! primitive and constructed objects.

use bytes::{Bytes, BytesMut};
use iso7816_tlv::ber::{Tlv, Value};
use thiserror::Error;
use tracing::trace;

pub use iso7816_tlv::ber::Tag;

/// Errors from the TLV codec
#[derive(Debug, Error)]
pub enum TlvError {
    /// The underlying BER parser rejected the input
    #[error("Malformed TLV: {0}")]
    Malformed(iso7816_tlv::TlvError),

    /// Input was empty where a TLV was expected
    #[error("Malformed TLV: empty input")]
    Empty,

    /// Bytes were left over after a single TLV
    #[error("Malformed TLV: {0} trailing bytes")]
    TrailingData(usize),
}

impl From<iso7816_tlv::TlvError> for TlvError {
    fn from(error: iso7816_tlv::TlvError) -> Self {
        Self::Malformed(error)
    }
}

/// A decoded TLV object: tag plus raw value bytes
#[derive(Debug, Clone, PartialEq)]
pub struct TlvObject {
    tag: Tag,
    value: Bytes,
}

impl TlvObject {
    /// Create an object from a tag and its value bytes
    pub fn new(tag: Tag, value: impl Into<Bytes>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }

    /// The tag
    pub const fn tag(&self) -> &Tag {
        &self.tag
    }

    /// The raw value bytes
    pub const fn value(&self) -> &Bytes {
        &self.value
    }

    /// Whether the tag has the constructed bit set
    pub fn is_constructed(&self) -> bool {
        self.tag.is_constructed()
    }

    /// Decode the children of a constructed object
    pub fn children(&self) -> Result<Vec<Self>, TlvError> {
        decode_all(&self.value)
    }

    /// Encode this object
    pub fn to_bytes(&self) -> Result<Bytes, TlvError> {
        encode(&self.tag, &self.value)
    }

    fn from_ber(tlv: &Tlv) -> Self {
        let value = match tlv.value() {
            Value::Primitive(bytes) => Bytes::copy_from_slice(bytes),
            Value::Constructed(children) => {
                let mut buffer = BytesMut::new();
                for child in children {
                    buffer.extend_from_slice(&child.to_vec());
                }
                buffer.freeze()
            }
        };
        Self::new(tlv.tag().clone(), value)
    }
}

/// Build a tag from its encoded bytes
pub fn tag(bytes: &[u8]) -> Result<Tag, TlvError> {
    Ok(Tag::try_from(bytes)?)
}

fn to_ber(tag: &Tag, value: &[u8]) -> Result<Tlv, TlvError> {
    let value = if tag.is_constructed() {
        let mut children = Vec::new();
        let mut remaining = value;
        while !remaining.is_empty() {
            let (child, rest) = Tlv::parse(remaining);
            children.push(child?);
            remaining = rest;
        }
        Value::Constructed(children)
    } else {
        Value::Primitive(value.to_vec())
    };
    Ok(Tlv::new(tag.clone(), value)?)
}

/// Encode a single TLV
///
/// For a constructed tag `value` must itself be a well-formed TLV sequence.
pub fn encode(tag: &Tag, value: &[u8]) -> Result<Bytes, TlvError> {
    let encoded = to_ber(tag, value)?.to_vec();
    trace!(tag = %hex::encode(tag.to_bytes()), len = value.len(), "Encoded TLV");
    Ok(Bytes::from(encoded))
}

/// Decode exactly one TLV, rejecting trailing data
pub fn decode(data: &[u8]) -> Result<TlvObject, TlvError> {
    if data.is_empty() {
        return Err(TlvError::Empty);
    }
    let (tlv, remaining) = Tlv::parse(data);
    let tlv = tlv?;
    if !remaining.is_empty() {
        return Err(TlvError::TrailingData(remaining.len()));
    }
    Ok(TlvObject::from_ber(&tlv))
}

/// Decode a concatenation of TLVs
pub fn decode_all(data: &[u8]) -> Result<Vec<TlvObject>, TlvError> {
    let mut objects = Vec::new();
    let mut remaining = data;
    while !remaining.is_empty() {
        let (tlv, rest) = Tlv::parse(remaining);
        objects.push(TlvObject::from_ber(&tlv?));
        remaining = rest;
    }
    Ok(objects)
}
