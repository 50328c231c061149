//! Driver running the PIN state machine against a PACE channel and a UI

use tracing::debug;

use crate::config::PinFlowConfig;
use crate::error::PinError;
use crate::machine::{Action, ChannelResponse, EstablishOutcome, Event, Exit, Prompt, transition};
use crate::state::{CaptureMode, Credentials, PasswordKind, PinSession, PinStatus};

/// Establishes PACE channels, usually an IFD `EstablishChannel` call
pub trait PaceChannel {
    /// Run PACE with the given password
    ///
    /// `secret` is `None` when the reader captures the password itself.
    /// CHAT and certificate description are only sent along with the PIN.
    fn establish_channel(
        &mut self,
        kind: PasswordKind,
        secret: Option<&str>,
        chat: Option<&[u8]>,
        certificate_description: Option<&[u8]>,
    ) -> EstablishOutcome;
}

/// Notifications towards whatever renders the PIN dialog
pub trait PinUi {
    /// How secrets are entered
    fn capture_mode(&self) -> CaptureMode;

    /// Show the number of remaining PIN attempts
    fn update_remaining_attempts(&mut self, remaining: u8);

    /// Add the CAN field, or the notice to enter the CAN on the reader
    fn require_can_entry(&mut self, capture: CaptureMode);

    /// Show the message of a repeated prompt
    fn show_error(&mut self, prompt: &Prompt);
}

/// Data of the running EAC authentication the PIN is bound to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EacContext {
    /// Certificate holder authorization template selected by the user
    pub chat: Vec<u8>,
    /// Certificate description of the service provider
    pub certificate_description: Vec<u8>,
}

/// Result of one [`PinFlow::step`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult {
    /// Channel established, go on with the next EAC step
    Next(ChannelResponse),
    /// Ask the user again
    Repeat(Prompt),
    /// The flow ended without a channel
    Cancel(Exit),
}

/// PIN entry flow of one EAC authentication
#[derive(Debug)]
pub struct PinFlow<C, U> {
    channel: C,
    ui: U,
    eac: EacContext,
    session: PinSession,
    exit: Option<Exit>,
}

impl<C: PaceChannel, U: PinUi> PinFlow<C, U> {
    /// Start a flow for a card that reported `remaining` PIN attempts
    pub fn new(
        channel: C,
        mut ui: U,
        eac: EacContext,
        remaining: u8,
        config: PinFlowConfig,
    ) -> Result<Self, PinError> {
        let capture = ui.capture_mode();
        let session = PinSession::new(remaining, capture, config)?;

        match session.status() {
            PinStatus::Rc3 => {}
            PinStatus::Rc2 => ui.update_remaining_attempts(2),
            PinStatus::Rc1 => {
                ui.update_remaining_attempts(1);
                ui.require_can_entry(capture);
            }
            PinStatus::Blocked => ui.update_remaining_attempts(0),
        }

        Ok(Self {
            channel,
            ui,
            eac,
            session,
            exit: None,
        })
    }

    /// Current session state
    pub const fn session(&self) -> &PinSession {
        &self.session
    }

    /// The UI collaborator
    pub const fn ui(&self) -> &U {
        &self.ui
    }

    /// The channel collaborator
    pub const fn channel(&self) -> &C {
        &self.channel
    }

    /// How the flow ended, if it did
    pub const fn exit(&self) -> Option<&Exit> {
        self.exit.as_ref()
    }

    /// Process one submission of the PIN dialog
    ///
    /// Performs at most one CAN and one PIN channel establishment. Once the
    /// flow has ended, the final result is returned again without card access.
    pub fn step(&mut self, credentials: Credentials) -> StepResult {
        if let Some(exit) = &self.exit {
            return finished(exit.clone());
        }

        let mut event = Event::Submitted(credentials);
        loop {
            let before = (self.session.remaining_attempts(), self.session.can_required());
            let (session, action) = transition(self.session.clone(), event);
            self.session = session;
            self.notify(before);

            match action {
                Action::EstablishChannel { kind, secret } => {
                    debug!(%kind, "Establishing PACE channel");
                    let (chat, description) = match kind {
                        PasswordKind::Pin => (
                            Some(self.eac.chat.as_slice()),
                            Some(self.eac.certificate_description.as_slice()),
                        ),
                        PasswordKind::Can => (None, None),
                    };
                    let outcome = self.channel.establish_channel(
                        kind,
                        secret.as_ref().map(|s| s.expose()),
                        chat,
                        description,
                    );
                    event = Event::ChannelEstablished(kind, outcome);
                }
                Action::Repeat(prompt) => {
                    if prompt.message.is_some() {
                        self.ui.show_error(&prompt);
                    }
                    return StepResult::Repeat(prompt);
                }
                Action::Finish(exit) => {
                    self.exit = Some(exit.clone());
                    return finished(exit);
                }
            }
        }
    }

    fn notify(&mut self, (remaining, can_required): (u8, bool)) {
        if self.session.remaining_attempts() != remaining {
            self.ui
                .update_remaining_attempts(self.session.remaining_attempts());
        }
        if self.session.can_required() && !can_required {
            self.ui.require_can_entry(self.session.capture());
        }
    }
}

fn finished(exit: Exit) -> StepResult {
    match exit {
        Exit::Established(response) => StepResult::Next(response),
        other => StepResult::Cancel(other),
    }
}
