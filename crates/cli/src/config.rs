use std::path::{Path, PathBuf};

use ecard_pace::PinFlowConfig;
use ecard_signature::SequencerConfig;
use ecard_trust::TrustConfig;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, Serialize};

/// Prefix of environment overrides, `ECARD_TRUST__REVOCATION_CHECK=true`
pub(crate) const ENV_PREFIX: &str = "ECARD_";

#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub(crate) struct Config {
    pub(crate) trust: TrustSection,
    pub(crate) sequencer: SequencerConfig,
    pub(crate) pin: PinFlowConfig,
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub(crate) struct TrustSection {
    /// Files with trusted root certificates, DER or PEM bundles
    pub(crate) anchors: Vec<PathBuf>,
    /// CRL files, DER or PEM
    pub(crate) crls: Vec<PathBuf>,
    /// Accepted leaf subjects in RFC 4514 form
    pub(crate) allow_list: Vec<String>,
    #[serde(flatten)]
    pub(crate) policy: TrustConfig,
}

fn figment(path: Option<&Path>) -> Figment {
    let mut figment = Figment::new();
    if let Some(path) = path {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(
        Env::prefixed(ENV_PREFIX)
            .split("__")
            .map(|key| key.as_str().replace('_', "-").into()),
    )
}

pub(crate) fn load_config(path: Option<&Path>) -> eyre::Result<Config> {
    Ok(figment(path).extract()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let config: Config = Figment::new().extract().unwrap();
        assert_eq!(config, Config::default());
        assert!(!config.trust.policy.revocation_check);
    }

    #[test]
    fn test_toml_sections() {
        let config: Config = Figment::new()
            .merge(Toml::string(
                r#"
                [trust]
                anchors = ["/etc/ecard/roots.pem"]
                crls = ["/etc/ecard/root.crl"]
                allow-list = ["CN=eid.example"]
                revocation-check = true
                allow-list-enabled = true

                [sequencer]
                block-size = 64

                [pin]
                can-length = 6
                min-pin-length = 5
                "#,
            ))
            .extract()
            .unwrap();

        assert_eq!(config.trust.anchors, vec![PathBuf::from("/etc/ecard/roots.pem")]);
        assert_eq!(config.trust.allow_list, vec!["CN=eid.example".to_string()]);
        assert!(config.trust.policy.revocation_check);
        assert!(config.trust.policy.allow_list_enabled);
        assert_eq!(config.sequencer.block_size, 64);
        assert_eq!(config.pin.min_pin_length, 5);
    }
}
