use serde::{Deserialize, Serialize};

/// Local input checks of the PIN entry flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PinFlowConfig {
    /// Number of digits of a CAN
    pub can_length: usize,
    /// Shortest PIN sent to the card, never below one
    pub min_pin_length: usize,
}

impl Default for PinFlowConfig {
    fn default() -> Self {
        Self {
            can_length: 6,
            min_pin_length: 1,
        }
    }
}
