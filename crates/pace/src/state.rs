use std::fmt;

use derive_more::Display;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::config::PinFlowConfig;
use crate::error::PinError;

/// PIN state as seen by the card, named after the remaining attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum PinStatus {
    /// Three attempts left
    #[display("RC3")]
    Rc3,
    /// Two attempts left
    #[display("RC2")]
    Rc2,
    /// One attempt left, the PIN is suspended until the CAN was entered
    #[display("RC1")]
    Rc1,
    /// No attempt left, only the PUK can unblock the PIN
    #[display("BLOCKED")]
    Blocked,
}

impl PinStatus {
    /// Map the retry counter reported by the card
    pub const fn from_remaining(remaining: u8) -> Result<Self, PinError> {
        match remaining {
            3 => Ok(Self::Rc3),
            2 => Ok(Self::Rc2),
            1 => Ok(Self::Rc1),
            0 => Ok(Self::Blocked),
            n => Err(PinError::InvalidRetryCounter(n)),
        }
    }

    /// Remaining PIN attempts
    pub const fn remaining(self) -> u8 {
        match self {
            Self::Rc3 => 3,
            Self::Rc2 => 2,
            Self::Rc1 => 1,
            Self::Blocked => 0,
        }
    }
}

/// Where the user types secrets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaptureMode {
    /// Entered in the application and handed to the flow
    #[default]
    OnDevice,
    /// Entered on the reader's PIN pad, never seen by the flow
    PinPad,
}

/// Password used to establish a PACE channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum PasswordKind {
    /// Card access number
    #[display("CAN")]
    Can,
    /// Personal identification number
    #[display("PIN")]
    Pin,
}

impl PasswordKind {
    /// PACE password reference
    pub const fn password_id(self) -> u8 {
        match self {
            Self::Can => 0x02,
            Self::Pin => 0x03,
        }
    }
}

/// A password held in memory that is wiped on drop
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Zeroizing<String>);

impl Secret {
    /// Take ownership of a password
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// The password
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether nothing was entered
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn is_digits(&self, len: usize) -> bool {
        self.0.len() == len && self.0.bytes().all(|b| b.is_ascii_digit())
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Input collected for one attempt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// PIN typed on the device
    pub pin: Option<Secret>,
    /// CAN typed on the device
    pub can: Option<Secret>,
}

impl Credentials {
    /// Only a PIN
    pub fn pin(pin: impl Into<Secret>) -> Self {
        Self {
            pin: Some(pin.into()),
            can: None,
        }
    }

    /// PIN together with the CAN
    pub fn pin_and_can(pin: impl Into<Secret>, can: impl Into<Secret>) -> Self {
        Self {
            pin: Some(pin.into()),
            can: Some(can.into()),
        }
    }

    /// Nothing entered on the device, the reader captures everything
    pub fn pin_pad() -> Self {
        Self::default()
    }
}

/// Reason a submitted password was refused before talking to the card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum InputError {
    /// The CAN does not have the expected number of digits
    #[display("CAN must consist of {_0} digits")]
    CanFormat(usize),
    /// The PIN is missing or too short
    #[display("PIN must have at least {_0} characters")]
    PinTooShort(usize),
}

/// State of one PIN entry flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinSession {
    pub(crate) status: PinStatus,
    pub(crate) failed_attempts: u8,
    pub(crate) can_required: bool,
    pub(crate) capture: CaptureMode,
    pub(crate) config: PinFlowConfig,
    pub(crate) pending_pin: Option<Secret>,
}

impl PinSession {
    /// Start a session from the retry counter the card reported
    pub fn new(remaining: u8, capture: CaptureMode, config: PinFlowConfig) -> Result<Self, PinError> {
        let status = PinStatus::from_remaining(remaining)?;
        Ok(Self {
            status,
            failed_attempts: 3u8.saturating_sub(status.remaining()).min(2),
            can_required: status == PinStatus::Rc1,
            capture,
            config,
            pending_pin: None,
        })
    }

    /// Current PIN state
    pub const fn status(&self) -> PinStatus {
        self.status
    }

    /// Failed attempts seen during this session or before it, 0 to 2
    pub const fn failed_attempts(&self) -> u8 {
        self.failed_attempts
    }

    /// Whether the CAN has to be entered before the next PIN attempt
    pub const fn can_required(&self) -> bool {
        self.can_required
    }

    /// How secrets are captured
    pub const fn capture(&self) -> CaptureMode {
        self.capture
    }

    /// Remaining PIN attempts
    pub const fn remaining_attempts(&self) -> u8 {
        self.status.remaining()
    }

    /// Validate what the user typed, on-device capture only
    pub(crate) fn check_input(&self, credentials: &Credentials) -> Result<(), InputError> {
        if self.capture == CaptureMode::PinPad {
            return Ok(());
        }
        if self.can_required {
            let can_length = self.config.can_length;
            if !credentials.can.as_ref().is_some_and(|can| can.is_digits(can_length)) {
                return Err(InputError::CanFormat(can_length));
            }
        }
        let min = self.config.min_pin_length.max(1);
        match &credentials.pin {
            Some(pin) if pin.expose().chars().count() >= min => Ok(()),
            _ => Err(InputError::PinTooShort(min)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_from_retry_counter() {
        let config = PinFlowConfig::default();

        let session = PinSession::new(3, CaptureMode::OnDevice, config).unwrap();
        assert_eq!(session.status(), PinStatus::Rc3);
        assert_eq!(session.failed_attempts(), 0);
        assert!(!session.can_required());

        let session = PinSession::new(2, CaptureMode::OnDevice, config).unwrap();
        assert_eq!(session.status(), PinStatus::Rc2);
        assert_eq!(session.failed_attempts(), 1);

        let session = PinSession::new(1, CaptureMode::PinPad, config).unwrap();
        assert_eq!(session.status(), PinStatus::Rc1);
        assert_eq!(session.failed_attempts(), 2);
        assert!(session.can_required());

        let session = PinSession::new(0, CaptureMode::OnDevice, config).unwrap();
        assert_eq!(session.status(), PinStatus::Blocked);

        assert_eq!(
            PinSession::new(4, CaptureMode::OnDevice, config),
            Err(PinError::InvalidRetryCounter(4))
        );
    }

    #[test]
    fn test_input_checks() {
        let config = PinFlowConfig::default();
        let mut session = PinSession::new(3, CaptureMode::OnDevice, config).unwrap();

        assert_eq!(session.check_input(&Credentials::pin("123456")), Ok(()));
        assert_eq!(
            session.check_input(&Credentials::pin("")),
            Err(InputError::PinTooShort(1))
        );
        assert_eq!(
            session.check_input(&Credentials::default()),
            Err(InputError::PinTooShort(1))
        );

        session.can_required = true;
        assert_eq!(
            session.check_input(&Credentials::pin_and_can("123456", "12345")),
            Err(InputError::CanFormat(6))
        );
        assert_eq!(
            session.check_input(&Credentials::pin_and_can("123456", "12345a")),
            Err(InputError::CanFormat(6))
        );
        assert_eq!(
            session.check_input(&Credentials::pin_and_can("123456", "123456")),
            Ok(())
        );

        session.capture = CaptureMode::PinPad;
        assert_eq!(session.check_input(&Credentials::pin_pad()), Ok(()));
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let credentials = Credentials::pin("424242");
        assert!(!format!("{credentials:?}").contains("4242"));
    }
}
