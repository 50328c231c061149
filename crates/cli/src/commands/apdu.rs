use ecard_apdu_core::{ApduCommand, Command, StatusWord};
use ecard_pace::EstablishOutcome;

use super::HexArg;

pub(crate) fn parse_command(input: &HexArg) -> eyre::Result<()> {
    let command = Command::from_bytes(&input.0)?;
    println!("CLA  {:02X}", command.class());
    println!("INS  {:02X}", command.instruction());
    println!("P1   {:02X}", command.p1());
    println!("P2   {:02X}", command.p2());
    if let Some(data) = command.data() {
        println!("Lc   {:02X}", data.len());
        println!("Data {}", hex::encode_upper(data));
    }
    if let Some(le) = command.expected_length() {
        println!("Le   {le:02X}");
    }
    Ok(())
}

pub(crate) fn frame_command(
    header: [u8; 4],
    data: Option<&HexArg>,
    le: Option<u8>,
) -> eyre::Result<()> {
    let [cla, ins, p1, p2] = header;
    let mut command = Command::new(cla, ins, p1, p2);
    if let Some(data) = data {
        command = command.with_data(data.0.clone());
    }
    if let Some(le) = le {
        command = command.with_le(le);
    }
    command.validate()?;
    println!("{}", hex::encode_upper(command.to_bytes()));
    Ok(())
}

pub(crate) fn status_command(status: &HexArg) -> eyre::Result<()> {
    let [sw1, sw2] = status.0[..] else {
        eyre::bail!("status word must be two bytes");
    };
    let status = StatusWord::new(sw1, sw2);

    println!("Status  {status}");
    println!("Meaning {}", status.description());
    if !status.is_success() {
        println!("Minor   {}", status.minor().uri());
    }
    if let Some(remaining) = status.retry_counter() {
        println!("Retries {remaining}");
    }
    println!("PACE    {}", EstablishOutcome::from_status(status));
    Ok(())
}
