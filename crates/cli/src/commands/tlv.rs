use ecard_apdu_core::tlv::{self, TlvObject};

use super::HexArg;

pub(crate) fn tlv_decode_command(input: &HexArg) -> eyre::Result<()> {
    for object in tlv::decode_all(&input.0)? {
        for line in render(&object, 0)? {
            println!("{line}");
        }
    }
    Ok(())
}

pub(crate) fn tlv_encode_command(tag: &HexArg, value: &HexArg) -> eyre::Result<()> {
    let tag = tlv::tag(&tag.0)?;
    println!("{}", hex::encode_upper(tlv::encode(&tag, &value.0)?));
    Ok(())
}

/// One line per object, children indented below constructed tags
fn render(object: &TlvObject, depth: usize) -> eyre::Result<Vec<String>> {
    let indent = "  ".repeat(depth);
    let tag = hex::encode_upper(object.tag().to_bytes());
    let value = object.value();

    if !object.is_constructed() {
        return Ok(vec![format!(
            "{indent}{tag} [{}] {}",
            value.len(),
            hex::encode_upper(value)
        )]);
    }

    let mut lines = vec![format!("{indent}{tag} [{}]", value.len())];
    for child in object.children()? {
        lines.extend(render(&child, depth + 1)?);
    }
    Ok(lines)
}
