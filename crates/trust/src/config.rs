use serde::{Deserialize, Serialize};

/// Policy switches of the trust validator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TrustConfig {
    /// Check every certificate below the anchor against the revocation checker
    pub revocation_check: bool,
    /// Require the leaf subject to be allow-listed
    pub allow_list_enabled: bool,
}
