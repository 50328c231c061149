use ecard_apdu_core::processor::DEFAULT_MAX_CHAINS;
use serde::{Deserialize, Serialize};

/// Settings of the signature sequencer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SequencerConfig {
    /// `Le` of PSO: COMPUTE DIGITAL SIGNATURE and INTERNAL AUTHENTICATE, `0x00` means 256
    pub block_size: u8,
    /// Maximum number of GET RESPONSE rounds per command
    pub max_chains: usize,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            block_size: 0x00,
            max_chains: DEFAULT_MAX_CHAINS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: SequencerConfig = serde_json::from_str(r#"{"block-size": 128}"#).unwrap();
        assert_eq!(config.block_size, 128);
        assert_eq!(config.max_chains, DEFAULT_MAX_CHAINS);
    }
}
