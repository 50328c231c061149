use std::path::PathBuf;
use std::sync::Arc;

use ecard_trust::{CrlRevocationChecker, TrustAnchorSet, TrustValidator, read_certificates};
use tracing::info;

use crate::config::TrustSection;

/// Validate a presented chain, leaf first, against the configured anchors
pub(crate) fn verify_command(
    trust: &TrustSection,
    chain: &[PathBuf],
    hostname: &str,
) -> eyre::Result<()> {
    let anchors = TrustAnchorSet::from_pem_files(&trust.anchors)?
        .with_allow_list(trust.allow_list.iter().cloned());
    eyre::ensure!(!anchors.is_empty(), "no trust anchors configured");
    info!(anchors = anchors.len(), "Loaded trust anchors");

    let mut validator = TrustValidator::new(Arc::new(anchors), trust.policy);
    if !trust.crls.is_empty() {
        validator = validator.with_revocation_checker(CrlRevocationChecker::from_files(&trust.crls)?);
    }

    let mut certificates = Vec::new();
    for path in chain {
        certificates.extend(read_certificates(path)?);
    }

    let path = validator.validate_certificates(certificates, hostname, std::time::SystemTime::now())?;
    println!("Chain for {} is trusted", path.hostname);
    for (index, certificate) in path.chain.iter().enumerate() {
        println!("  {index}: {}", certificate.tbs_certificate.subject);
    }
    println!("  anchor: {}", path.anchor_subject);
    Ok(())
}
