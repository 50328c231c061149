//! Pure transition function of the PIN entry flow
//!
//! The machine never talks to the card itself. It answers each [`Event`]
//! with an [`Action`] and a new [`PinSession`]; the caller performs the
//! action and feeds the result back in.

use derive_more::Display;
use ecard_apdu_core::StatusWord;
use tracing::{debug, error, info, warn};

use crate::error::PinError;
use crate::state::{Credentials, InputError, PasswordKind, PinSession, PinStatus, Secret};

/// Data returned by a successful channel establishment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelResponse {
    /// Raw protocol output (EF.CardAccess, IDicc, CARs, ...) for the next EAC steps
    pub data: Vec<u8>,
}

/// Result of one establish-channel call
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum EstablishOutcome {
    /// Channel is up
    #[display("success")]
    Success(ChannelResponse),
    /// Wrong PIN, more attempts left
    #[display("password error")]
    PasswordError,
    /// Wrong PIN, the next attempt needs the CAN
    #[display("password suspended")]
    PasswordSuspended,
    /// Wrong PIN, no attempt left
    #[display("password blocked")]
    PasswordBlocked,
    /// Wrong CAN
    #[display("authentication failed")]
    AuthenticationFailed,
    /// Cancelled on the reader
    #[display("cancelled by user")]
    CancelledByUser,
    /// The slot handle no longer refers to a card
    #[display("invalid slot handle")]
    InvalidSlotHandle,
    /// Any other failure
    #[display("{_0}")]
    Other(String),
}

impl EstablishOutcome {
    /// Interpret the status word of a failed GENERAL AUTHENTICATE or PIN pad verification
    pub fn from_status(status: StatusWord) -> Self {
        match status.retry_counter() {
            Some(0) => return Self::PasswordBlocked,
            Some(1) => return Self::PasswordSuspended,
            Some(_) => return Self::PasswordError,
            None => {}
        }
        match status.to_u16() {
            0x6300 => Self::AuthenticationFailed,
            0x6983 => Self::PasswordBlocked,
            0x6984 => Self::PasswordSuspended,
            0x6401 => Self::CancelledByUser,
            _ => Self::Other(format!("{status}: {}", status.description())),
        }
    }
}

/// Input to [`transition`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The user submitted the form
    Submitted(Credentials),
    /// A requested channel establishment finished
    ChannelEstablished(PasswordKind, EstablishOutcome),
}

/// Message shown with a repeated prompt
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum PromptMessage {
    /// Input refused locally
    #[display("{_0}")]
    Input(InputError),
    /// The CAN was wrong
    #[display("The CAN is wrong")]
    WrongCan,
    /// The PIN was wrong
    #[display("The PIN is wrong, {_0} attempts left")]
    WrongPin(u8),
    /// The PIN is suspended, CAN needed
    #[display("The PIN is suspended, enter the CAN to continue")]
    PinSuspended,
    /// Unexpected failure
    #[display("Internal error: {_0}")]
    Internal(String),
}

/// What the caller shows before asking again
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// PIN state after the attempt
    pub status: PinStatus,
    /// Remaining PIN attempts
    pub remaining_attempts: u8,
    /// Whether a CAN field has to be shown
    pub can_required: bool,
    /// Error to show
    pub message: Option<PromptMessage>,
}

/// How the flow ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exit {
    /// Channel established with the PIN
    Established(ChannelResponse),
    /// The PIN is blocked
    PasswordBlocked,
    /// The user cancelled
    UserCancelled,
    /// The card was removed
    CardRemoved,
}

impl Exit {
    /// The error behind a failed exit
    pub const fn error(&self) -> Option<PinError> {
        match self {
            Self::Established(_) => None,
            Self::PasswordBlocked => Some(PinError::PasswordBlocked),
            Self::UserCancelled => Some(PinError::UserCancelled),
            Self::CardRemoved => Some(PinError::CardRemoved),
        }
    }
}

/// Output of [`transition`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Establish a PACE channel with this password, `None` for PIN pad capture
    EstablishChannel {
        /// Password kind
        kind: PasswordKind,
        /// Password typed on the device
        secret: Option<Secret>,
    },
    /// Ask the user again
    Repeat(Prompt),
    /// The flow is over
    Finish(Exit),
}

impl PinSession {
    fn prompt(&self, message: Option<PromptMessage>) -> Prompt {
        Prompt {
            status: self.status,
            remaining_attempts: self.remaining_attempts(),
            can_required: self.can_required,
            message,
        }
    }

    /// Prompt for the first attempt
    pub fn initial_prompt(&self) -> Prompt {
        self.prompt(None)
    }
}

/// Advance the flow by one event
pub fn transition(mut session: PinSession, event: Event) -> (PinSession, Action) {
    if session.status == PinStatus::Blocked {
        session.pending_pin = None;
        return (session, Action::Finish(Exit::PasswordBlocked));
    }

    let action = match event {
        Event::Submitted(credentials) => submitted(&mut session, credentials),
        Event::ChannelEstablished(PasswordKind::Can, outcome) => can_result(&mut session, outcome),
        Event::ChannelEstablished(PasswordKind::Pin, outcome) => pin_result(&mut session, outcome),
    };
    (session, action)
}

fn submitted(session: &mut PinSession, credentials: Credentials) -> Action {
    if let Err(reason) = session.check_input(&credentials) {
        debug!(%reason, "Input refused without card access");
        return Action::Repeat(session.prompt(Some(PromptMessage::Input(reason))));
    }

    let Credentials { pin, can } = credentials;
    if session.can_required {
        session.pending_pin = pin;
        Action::EstablishChannel {
            kind: PasswordKind::Can,
            secret: can,
        }
    } else {
        Action::EstablishChannel {
            kind: PasswordKind::Pin,
            secret: pin,
        }
    }
}

fn can_result(session: &mut PinSession, outcome: EstablishOutcome) -> Action {
    match outcome {
        EstablishOutcome::Success(_) => {
            debug!("CAN accepted, continuing with the PIN");
            Action::EstablishChannel {
                kind: PasswordKind::Pin,
                secret: session.pending_pin.take(),
            }
        }
        EstablishOutcome::AuthenticationFailed => {
            session.pending_pin = None;
            warn!("Failed to authenticate with the given CAN");
            Action::Repeat(session.prompt(Some(PromptMessage::WrongCan)))
        }
        other => {
            session.pending_pin = None;
            failure(session, other)
        }
    }
}

fn pin_result(session: &mut PinSession, outcome: EstablishOutcome) -> Action {
    session.pending_pin = None;
    match outcome {
        EstablishOutcome::Success(response) => {
            info!(status = %session.status, "PACE with PIN established");
            Action::Finish(Exit::Established(response))
        }
        EstablishOutcome::PasswordError => {
            match session.status {
                PinStatus::Rc3 => {
                    session.status = PinStatus::Rc2;
                    session.failed_attempts = 1;
                }
                PinStatus::Rc2 => {
                    session.status = PinStatus::Rc1;
                    session.failed_attempts = 2;
                    session.can_required = true;
                }
                // the card owns the counter, RC1 is only left through suspension or blocking
                PinStatus::Rc1 | PinStatus::Blocked => {}
            }
            info!(status = %session.status, attempt = session.failed_attempts, "Wrong PIN entered");
            let remaining = session.remaining_attempts();
            Action::Repeat(session.prompt(Some(PromptMessage::WrongPin(remaining))))
        }
        EstablishOutcome::PasswordSuspended => {
            session.status = PinStatus::Rc1;
            session.failed_attempts = 2;
            session.can_required = true;
            info!("Wrong PIN entered, PIN suspended");
            Action::Repeat(session.prompt(Some(PromptMessage::PinSuspended)))
        }
        EstablishOutcome::PasswordBlocked => {
            session.status = PinStatus::Blocked;
            warn!("Wrong PIN entered, the PIN is blocked");
            Action::Finish(Exit::PasswordBlocked)
        }
        other => failure(session, other),
    }
}

fn failure(session: &PinSession, outcome: EstablishOutcome) -> Action {
    match outcome {
        EstablishOutcome::CancelledByUser => {
            error!("User cancelled the authentication");
            Action::Finish(Exit::UserCancelled)
        }
        EstablishOutcome::InvalidSlotHandle => {
            error!("Slot handle invalid, card removed or reset");
            Action::Finish(Exit::CardRemoved)
        }
        other => {
            error!(outcome = %other, "Unexpected result while establishing the channel");
            Action::Repeat(session.prompt(Some(PromptMessage::Internal(other.to_string()))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PinFlowConfig;
    use crate::state::CaptureMode;

    fn session(remaining: u8) -> PinSession {
        PinSession::new(remaining, CaptureMode::OnDevice, PinFlowConfig::default()).unwrap()
    }

    fn pin_attempt(session: PinSession, outcome: EstablishOutcome) -> (PinSession, Action) {
        transition(
            session,
            Event::ChannelEstablished(PasswordKind::Pin, outcome),
        )
    }

    #[test]
    fn test_submit_pin() {
        let (session, action) = transition(session(3), Event::Submitted(Credentials::pin("123456")));
        assert_eq!(
            action,
            Action::EstablishChannel {
                kind: PasswordKind::Pin,
                secret: Some(Secret::new("123456")),
            }
        );
        assert_eq!(session.status(), PinStatus::Rc3);
    }

    #[test]
    fn test_password_errors_walk_down_to_rc1() {
        let mut current = session(3);
        let mut visited = vec![current.status()];
        for _ in 0..4 {
            let (next, action) = pin_attempt(current, EstablishOutcome::PasswordError);
            assert!(matches!(action, Action::Repeat(_)));
            visited.push(next.status());
            current = next;
        }
        assert_eq!(
            visited,
            vec![
                PinStatus::Rc3,
                PinStatus::Rc2,
                PinStatus::Rc1,
                PinStatus::Rc1,
                PinStatus::Rc1
            ]
        );
        assert!(current.can_required());
        assert_eq!(current.failed_attempts(), 2);
    }

    #[test]
    fn test_blocked_only_through_password_blocked() {
        let (session, action) = pin_attempt(session(1), EstablishOutcome::PasswordBlocked);
        assert_eq!(session.status(), PinStatus::Blocked);
        assert_eq!(action, Action::Finish(Exit::PasswordBlocked));

        // blocked is terminal
        let (session, action) = transition(session, Event::Submitted(Credentials::pin("1")));
        assert_eq!(session.status(), PinStatus::Blocked);
        assert_eq!(action, Action::Finish(Exit::PasswordBlocked));
    }

    #[test]
    fn test_suspension_requires_can() {
        let (session, action) = pin_attempt(session(3), EstablishOutcome::PasswordSuspended);
        assert_eq!(session.status(), PinStatus::Rc1);
        assert_eq!(session.failed_attempts(), 2);
        assert!(session.can_required());
        match action {
            Action::Repeat(prompt) => {
                assert!(prompt.can_required);
                assert_eq!(prompt.message, Some(PromptMessage::PinSuspended));
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn test_can_is_checked_locally() {
        let (session, action) = transition(
            session(1),
            Event::Submitted(Credentials::pin_and_can("123456", "1234")),
        );
        assert_eq!(session.status(), PinStatus::Rc1);
        match action {
            Action::Repeat(prompt) => assert_eq!(
                prompt.message,
                Some(PromptMessage::Input(InputError::CanFormat(6)))
            ),
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn test_can_then_pin_in_one_round() {
        let (session, action) = transition(
            session(1),
            Event::Submitted(Credentials::pin_and_can("123456", "654321")),
        );
        assert_eq!(
            action,
            Action::EstablishChannel {
                kind: PasswordKind::Can,
                secret: Some(Secret::new("654321")),
            }
        );

        let (session, action) = transition(
            session,
            Event::ChannelEstablished(PasswordKind::Can, EstablishOutcome::Success(ChannelResponse::default())),
        );
        assert_eq!(
            action,
            Action::EstablishChannel {
                kind: PasswordKind::Pin,
                secret: Some(Secret::new("123456")),
            }
        );

        let response = ChannelResponse { data: vec![0x01] };
        let (_, action) = pin_attempt(session, EstablishOutcome::Success(response.clone()));
        assert_eq!(action, Action::Finish(Exit::Established(response)));
    }

    #[test]
    fn test_wrong_can_keeps_counter() {
        let start = session(1);
        let (after, action) = transition(
            start.clone(),
            Event::ChannelEstablished(PasswordKind::Can, EstablishOutcome::AuthenticationFailed),
        );
        assert_eq!(after.status(), start.status());
        assert_eq!(after.failed_attempts(), start.failed_attempts());
        assert!(matches!(
            action,
            Action::Repeat(Prompt {
                message: Some(PromptMessage::WrongCan),
                ..
            })
        ));
    }

    #[test]
    fn test_terminal_exits_from_any_state() {
        for remaining in [3, 2, 1] {
            for kind in [PasswordKind::Pin, PasswordKind::Can] {
                let (_, action) = transition(
                    session(remaining),
                    Event::ChannelEstablished(kind, EstablishOutcome::CancelledByUser),
                );
                assert_eq!(action, Action::Finish(Exit::UserCancelled));

                let (_, action) = transition(
                    session(remaining),
                    Event::ChannelEstablished(kind, EstablishOutcome::InvalidSlotHandle),
                );
                assert_eq!(action, Action::Finish(Exit::CardRemoved));
            }
        }
    }

    #[test]
    fn test_only_terminal_exits_carry_errors() {
        assert_eq!(Exit::Established(ChannelResponse::default()).error(), None);
        assert_eq!(Exit::PasswordBlocked.error(), Some(PinError::PasswordBlocked));
        assert_eq!(Exit::UserCancelled.error(), Some(PinError::UserCancelled));
        assert_eq!(Exit::CardRemoved.error(), Some(PinError::CardRemoved));

        // a wrong PIN or CAN is retried, never an exit
        for outcome in [
            EstablishOutcome::PasswordError,
            EstablishOutcome::PasswordSuspended,
            EstablishOutcome::AuthenticationFailed,
        ] {
            let (_, action) =
                transition(session(3), Event::ChannelEstablished(PasswordKind::Pin, outcome));
            assert!(matches!(action, Action::Repeat(_)), "{action:?}");
        }
    }

    #[test]
    fn test_unknown_failure_repeats_without_state_change() {
        let start = session(2);
        let (after, action) = pin_attempt(start.clone(), EstablishOutcome::Other("reader gone".into()));
        assert_eq!(after, start);
        assert!(matches!(
            action,
            Action::Repeat(Prompt {
                message: Some(PromptMessage::Internal(_)),
                ..
            })
        ));
    }

    #[test]
    fn test_outcome_from_status() {
        assert_eq!(
            EstablishOutcome::from_status(StatusWord::new(0x63, 0xC2)),
            EstablishOutcome::PasswordError
        );
        assert_eq!(
            EstablishOutcome::from_status(StatusWord::new(0x63, 0xC1)),
            EstablishOutcome::PasswordSuspended
        );
        assert_eq!(
            EstablishOutcome::from_status(StatusWord::new(0x63, 0xC0)),
            EstablishOutcome::PasswordBlocked
        );
        assert_eq!(
            EstablishOutcome::from_status(StatusWord::new(0x63, 0x00)),
            EstablishOutcome::AuthenticationFailed
        );
        assert!(matches!(
            EstablishOutcome::from_status(StatusWord::new(0x6A, 0x80)),
            EstablishOutcome::Other(_)
        ));
    }
}
