//! eCard-API minor result codes derived from card status words

use std::fmt;

use super::status::StatusWord;

/// Minor error code reported to eCard-API callers for a failed card command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MinorError {
    /// Wrong password, possibly with a retry counter
    PasswordError,
    /// The password is blocked
    PasswordBlocked,
    /// Access conditions are not met
    SecurityConditionNotSatisfied,
    /// The referenced data cannot be used with this operation
    InappropriateProtocolForAction,
    /// File, record or key not found
    NamedEntityNotFound,
    /// Malformed parameters or lengths
    IncorrectParameter,
    /// Instruction or class not supported by the card
    UnknownApiFunction,
    /// Card memory or processing failure
    InternalError,
    /// Any status word without a dedicated mapping
    UnknownError,
}

impl MinorError {
    /// Map a status word to its minor code
    pub const fn from_status(status: StatusWord) -> Self {
        match (status.sw1, status.sw2) {
            (0x63, 0x00) => Self::PasswordError,
            (0x63, n) if (n & 0xF0) == 0xC0 => Self::PasswordError,
            (0x69, 0x83) => Self::PasswordBlocked,
            (0x69, 0x82) => Self::SecurityConditionNotSatisfied,
            (0x69, 0x84..=0x86) => Self::InappropriateProtocolForAction,
            (0x6A, 0x82 | 0x83 | 0x88) => Self::NamedEntityNotFound,
            (0x67, 0x00) | (0x6A, 0x80 | 0x86 | 0x87) | (0x6B, 0x00) | (0x6C, _) => {
                Self::IncorrectParameter
            }
            (0x6A, 0x81) | (0x6D, 0x00) | (0x6E, 0x00) => Self::UnknownApiFunction,
            (0x64, 0x00) | (0x65, 0x81) | (0x6A, 0x84) => Self::InternalError,
            _ => Self::UnknownError,
        }
    }

    /// URI form of the minor code
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::PasswordError => "http://www.bsi.bund.de/ecard/api/1.1/resultminor/ifdl#passwordError",
            Self::PasswordBlocked => {
                "http://www.bsi.bund.de/ecard/api/1.1/resultminor/ifdl#passwordBlocked"
            }
            Self::SecurityConditionNotSatisfied => {
                "http://www.bsi.bund.de/ecard/api/1.1/resultminor/sal#securityConditionNotSatisfied"
            }
            Self::InappropriateProtocolForAction => {
                "http://www.bsi.bund.de/ecard/api/1.1/resultminor/sal#inappropriateProtocolForAction"
            }
            Self::NamedEntityNotFound => {
                "http://www.bsi.bund.de/ecard/api/1.1/resultminor/sal#namedEntityNotFound"
            }
            Self::IncorrectParameter => {
                "http://www.bsi.bund.de/ecard/api/1.1/resultminor/al/common#incorrectParameter"
            }
            Self::UnknownApiFunction => {
                "http://www.bsi.bund.de/ecard/api/1.1/resultminor/al/common#unknownAPIFunction"
            }
            Self::InternalError => {
                "http://www.bsi.bund.de/ecard/api/1.1/resultminor/al/common#internalError"
            }
            Self::UnknownError => {
                "http://www.bsi.bund.de/ecard/api/1.1/resultminor/al/common#unknownError"
            }
        }
    }
}

impl From<StatusWord> for MinorError {
    fn from(status: StatusWord) -> Self {
        Self::from_status(status)
    }
}

impl fmt::Display for MinorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uri())
    }
}
