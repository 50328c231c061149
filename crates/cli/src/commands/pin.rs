use std::collections::VecDeque;

use ecard_apdu_core::StatusWord;
use ecard_pace::{
    CaptureMode, ChannelResponse, Credentials, EacContext, EstablishOutcome, Exit, PaceChannel,
    PasswordKind, PinFlow, PinFlowConfig, PinUi, Prompt, PromptMessage, StepResult,
};

use super::HexArg;

/// PACE channel answering with pre-recorded status words
#[derive(Debug)]
struct ScriptedChannel {
    responses: VecDeque<StatusWord>,
}

impl ScriptedChannel {
    fn is_exhausted(&self) -> bool {
        self.responses.is_empty()
    }
}

impl PaceChannel for ScriptedChannel {
    fn establish_channel(
        &mut self,
        kind: PasswordKind,
        _secret: Option<&str>,
        _chat: Option<&[u8]>,
        _certificate_description: Option<&[u8]>,
    ) -> EstablishOutcome {
        let Some(status) = self.responses.pop_front() else {
            return EstablishOutcome::Other("no scripted response left".to_string());
        };
        let outcome = if status.is_success() {
            EstablishOutcome::Success(ChannelResponse::default())
        } else {
            EstablishOutcome::from_status(status)
        };
        println!("EstablishChannel({kind}) -> {status}: {outcome}");
        outcome
    }
}

#[derive(Debug)]
struct ConsoleUi {
    capture: CaptureMode,
}

impl PinUi for ConsoleUi {
    fn capture_mode(&self) -> CaptureMode {
        self.capture
    }

    fn update_remaining_attempts(&mut self, remaining: u8) {
        println!("Remaining PIN attempts: {remaining}");
    }

    fn require_can_entry(&mut self, capture: CaptureMode) {
        match capture {
            CaptureMode::OnDevice => println!("Please enter the CAN"),
            CaptureMode::PinPad => println!("Please enter the CAN on the reader"),
        }
    }

    fn show_error(&mut self, prompt: &Prompt) {
        if let Some(message) = &prompt.message {
            println!("{message}");
        }
    }
}

#[derive(Debug)]
pub(crate) struct PinArgs<'a> {
    pub(crate) remaining: u8,
    pub(crate) pin: Option<&'a str>,
    pub(crate) can: Option<&'a str>,
    pub(crate) pin_pad: bool,
    pub(crate) responses: &'a [HexArg],
}

/// Walk the PIN/CAN flow against scripted PACE results
pub(crate) fn pin_command(args: PinArgs<'_>, config: PinFlowConfig) -> eyre::Result<()> {
    let responses = args
        .responses
        .iter()
        .map(|sw| match sw.0[..] {
            [sw1, sw2] => Ok(StatusWord::new(sw1, sw2)),
            _ => Err(eyre::eyre!("status word must be two bytes: {}", hex::encode(&sw.0))),
        })
        .collect::<eyre::Result<VecDeque<_>>>()?;

    let capture = if args.pin_pad {
        CaptureMode::PinPad
    } else {
        CaptureMode::OnDevice
    };
    let mut flow = PinFlow::new(
        ScriptedChannel { responses },
        ConsoleUi { capture },
        EacContext::default(),
        args.remaining,
        config,
    )?;

    loop {
        let credentials = match (args.pin_pad, args.pin, args.can) {
            (true, _, _) => Credentials::pin_pad(),
            (false, pin, Some(can)) => Credentials::pin_and_can(pin.unwrap_or_default(), can),
            (false, pin, None) => Credentials::pin(pin.unwrap_or_default()),
        };

        match flow.step(credentials) {
            StepResult::Next(_) => {
                println!("PACE channel established with the PIN");
                break;
            }
            StepResult::Cancel(exit) => {
                let reason = match exit {
                    Exit::PasswordBlocked => "PIN blocked",
                    Exit::UserCancelled => "cancelled by the user",
                    Exit::CardRemoved => "card removed",
                    Exit::Established(_) => "established",
                };
                println!("Flow ended: {reason}");
                break;
            }
            StepResult::Repeat(prompt) => {
                println!(
                    "State {}, {} attempts left{}",
                    prompt.status,
                    prompt.remaining_attempts,
                    if prompt.can_required { ", CAN required" } else { "" }
                );
                // the same input would fail again
                if matches!(prompt.message, Some(PromptMessage::Input(_)))
                    || flow.channel().is_exhausted()
                {
                    break;
                }
            }
        }
    }
    Ok(())
}
