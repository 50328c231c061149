/// Error type of the PIN entry flow
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PinError {
    /// The card reported a retry counter outside 0..=3
    #[error("Invalid PIN retry counter: {0}")]
    InvalidRetryCounter(u8),

    /// The PIN is blocked and needs the PUK
    #[error("PIN blocked")]
    PasswordBlocked,

    /// The user cancelled on the device or the reader
    #[error("Cancelled by user")]
    UserCancelled,

    /// The card went away during the flow
    #[error("Card removed")]
    CardRemoved,
}
