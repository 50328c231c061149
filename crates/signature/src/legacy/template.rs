//! Command templates of legacy signature generation descriptors
//!
//! A template is a hex string with placeholders:
//!
//! - `{name}` inserts the bytes of a context variable
//! - `{len:name}` inserts the length of a variable as one byte
//! - `{tlv:TAG:name}` inserts a variable wrapped in a BER-TLV with the hex tag `TAG`
//!
//! Whitespace between tokens is ignored.

use bytes::{BufMut, BytesMut};
use ecard_apdu_core::{Command, CommandError, tlv};
use serde::{Deserialize, Serialize};

/// Error raised while evaluating a command template
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// Placeholder names a variable the context does not provide
    #[error("Unknown template variable: {0}")]
    UnknownVariable(String),

    /// Literal part is not valid hex
    #[error("Invalid hex in template: {0:?}")]
    InvalidHex(String),

    /// `{` without `}` or the other way round
    #[error("Unbalanced brace in template")]
    UnbalancedBrace,

    /// Placeholder with an unknown form
    #[error("Invalid template directive: {0:?}")]
    InvalidDirective(String),

    /// Variable too long for a one-byte length
    #[error("Variable {0} is {1} bytes, too long for a length byte")]
    ValueTooLong(String, usize),

    /// TLV wrapping failed
    #[error("TLV encoding failed: {0}")]
    Tlv(String),

    /// The evaluated bytes are not a valid command
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Values a template may refer to
#[derive(Debug, Clone, Copy)]
pub struct TemplateContext<'a> {
    /// Message or hash to be signed
    pub hash_to_sign: &'a [u8],
    /// Key reference, after scope adjustment
    pub key_reference: &'a [u8],
    /// Algorithm identifier
    pub algorithm_identifier: &'a [u8],
    /// Hash algorithm reference
    pub hash_algorithm_reference: &'a [u8],
}

impl TemplateContext<'_> {
    fn lookup(&self, name: &str) -> Result<&[u8], TemplateError> {
        match name {
            "hashToSign" => Ok(self.hash_to_sign),
            "keyReference" => Ok(self.key_reference),
            "algorithmIdentifier" => Ok(self.algorithm_identifier),
            "hashAlgorithmReference" => Ok(self.hash_algorithm_reference),
            other => Err(TemplateError::UnknownVariable(other.to_string())),
        }
    }
}

/// A card command with placeholders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandTemplate(String);

impl CommandTemplate {
    /// Wrap a template string
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// The template source
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Evaluate the template into raw command bytes
    pub fn evaluate_bytes(&self, context: &TemplateContext<'_>) -> Result<BytesMut, TemplateError> {
        let mut out = BytesMut::new();
        let mut literal = String::new();
        let mut rest = self.0.as_str();

        while let Some(c) = rest.chars().next() {
            match c {
                '{' => {
                    flush_literal(&mut literal, &mut out)?;
                    let end = rest.find('}').ok_or(TemplateError::UnbalancedBrace)?;
                    let directive = &rest[1..end];
                    if directive.contains('{') {
                        return Err(TemplateError::UnbalancedBrace);
                    }
                    expand(directive, context, &mut out)?;
                    rest = &rest[end + 1..];
                    continue;
                }
                '}' => return Err(TemplateError::UnbalancedBrace),
                c if c.is_whitespace() => {}
                c => literal.push(c),
            }
            rest = &rest[c.len_utf8()..];
        }
        flush_literal(&mut literal, &mut out)?;

        Ok(out)
    }

    /// Evaluate the template into a command
    pub fn evaluate(&self, context: &TemplateContext<'_>) -> Result<Command, TemplateError> {
        let bytes = self.evaluate_bytes(context)?;
        Ok(Command::from_bytes(&bytes)?)
    }
}

impl From<&str> for CommandTemplate {
    fn from(template: &str) -> Self {
        Self::new(template)
    }
}

fn flush_literal(literal: &mut String, out: &mut BytesMut) -> Result<(), TemplateError> {
    if literal.is_empty() {
        return Ok(());
    }
    let bytes = hex::decode(&*literal).map_err(|_| TemplateError::InvalidHex(literal.clone()))?;
    out.put_slice(&bytes);
    literal.clear();
    Ok(())
}

fn expand(
    directive: &str,
    context: &TemplateContext<'_>,
    out: &mut BytesMut,
) -> Result<(), TemplateError> {
    let parts: Vec<&str> = directive.split(':').map(str::trim).collect();
    match parts.as_slice() {
        [name] => out.put_slice(context.lookup(name)?),
        ["len", name] => {
            let value = context.lookup(name)?;
            let len = u8::try_from(value.len())
                .map_err(|_| TemplateError::ValueTooLong((*name).to_string(), value.len()))?;
            out.put_u8(len);
        }
        ["tlv", tag, name] => {
            let tag_bytes =
                hex::decode(tag).map_err(|_| TemplateError::InvalidHex((*tag).to_string()))?;
            let tag = tlv::tag(&tag_bytes).map_err(|e| TemplateError::Tlv(e.to_string()))?;
            let encoded = tlv::encode(&tag, context.lookup(name)?)
                .map_err(|e| TemplateError::Tlv(e.to_string()))?;
            out.put_slice(&encoded);
        }
        _ => return Err(TemplateError::InvalidDirective(directive.to_string())),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecard_apdu_core::ApduCommand;
    use hex_literal::hex;

    const CONTEXT: TemplateContext<'static> = TemplateContext {
        hash_to_sign: &hex!("C0FFEE"),
        key_reference: &hex!("81"),
        algorithm_identifier: &hex!("54"),
        hash_algorithm_reference: &[],
    };

    #[test]
    fn test_literal_template() {
        let command = CommandTemplate::new("00 22 F3 B6").evaluate(&CONTEXT).unwrap();
        assert_eq!(command.to_bytes().as_ref(), &hex!("0022F3B6"));
    }

    #[test]
    fn test_substitution_and_length() {
        let command = CommandTemplate::new("002A9E9A {len:hashToSign} {hashToSign} 00")
            .evaluate(&CONTEXT)
            .unwrap();
        assert_eq!(command.to_bytes().as_ref(), &hex!("002A9E9A03C0FFEE00"));
    }

    #[test]
    fn test_tlv_wrapping() {
        let bytes = CommandTemplate::new("002241B6 06 {tlv:84:keyReference}{tlv:80:algorithmIdentifier}")
            .evaluate_bytes(&CONTEXT)
            .unwrap();
        assert_eq!(bytes.as_ref(), &hex!("002241B606840181800154"));
    }

    #[test]
    fn test_template_errors() {
        assert_eq!(
            CommandTemplate::new("00 {pin}").evaluate_bytes(&CONTEXT),
            Err(TemplateError::UnknownVariable("pin".into()))
        );
        assert_eq!(
            CommandTemplate::new("00 {hashToSign").evaluate_bytes(&CONTEXT),
            Err(TemplateError::UnbalancedBrace)
        );
        assert_eq!(
            CommandTemplate::new("00 }").evaluate_bytes(&CONTEXT),
            Err(TemplateError::UnbalancedBrace)
        );
        assert_eq!(
            CommandTemplate::new("0G").evaluate_bytes(&CONTEXT),
            Err(TemplateError::InvalidHex("0G".into()))
        );
        assert_eq!(
            CommandTemplate::new("{sha:hashToSign}").evaluate_bytes(&CONTEXT),
            Err(TemplateError::InvalidDirective("sha:hashToSign".into()))
        );
        assert_eq!(
            CommandTemplate::new("00").evaluate(&CONTEXT),
            Err(TemplateError::Command(CommandError::InvalidLength(1)))
        );
    }

    #[test]
    fn test_length_overflow() {
        let long = [0u8; 300];
        let context = TemplateContext {
            hash_to_sign: &long,
            ..CONTEXT
        };
        assert_eq!(
            CommandTemplate::new("{len:hashToSign}").evaluate_bytes(&context),
            Err(TemplateError::ValueTooLong("hashToSign".into(), 300))
        );
    }
}
