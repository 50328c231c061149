//! Path validation of peer certificate chains

use std::sync::Arc;
use std::time::SystemTime;

use der::{Decode, Encode};
use tracing::{debug, warn};
use x509_cert::Certificate;
use x509_cert::ext::pkix::BasicConstraints;

use crate::anchors::TrustAnchorSet;
use crate::config::TrustConfig;
use crate::error::CertificateVerificationError;
use crate::extensions::{check_critical_extensions, check_key_usage, check_name_constraints};
use crate::revocation::{RevocationChecker, RevocationStatus};
use crate::signature::{SignatureFailure, verify_signed};

type Result<T, E = CertificateVerificationError> = std::result::Result<T, E>;

/// A chain that validated up to a trust anchor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPath {
    /// Presented certificates below the anchor, leaf first
    pub chain: Vec<Certificate>,
    /// Subject of the anchor the chain ends at
    pub anchor_subject: String,
    /// Host name the chain was presented for
    pub hostname: String,
}

impl ValidatedPath {
    /// The end-entity certificate
    pub fn leaf(&self) -> Option<&Certificate> {
        self.chain.first()
    }
}

/// Validates peer certificate chains against a shared [`TrustAnchorSet`]
#[derive(Debug)]
pub struct TrustValidator {
    anchors: Arc<TrustAnchorSet>,
    config: TrustConfig,
    revocation: Option<Box<dyn RevocationChecker>>,
}

impl TrustValidator {
    /// Validator without revocation source
    pub fn new(anchors: Arc<TrustAnchorSet>, config: TrustConfig) -> Self {
        Self {
            anchors,
            config,
            revocation: None,
        }
    }

    /// Use `checker` as the only revocation source
    pub fn with_revocation_checker(mut self, checker: impl RevocationChecker + 'static) -> Self {
        self.revocation = Some(Box::new(checker));
        self
    }

    /// Policy in use
    pub const fn config(&self) -> &TrustConfig {
        &self.config
    }

    /// Validate a DER chain, leaf first, at the current time
    pub fn validate<B: AsRef<[u8]>>(&self, chain: &[B], hostname: &str) -> Result<ValidatedPath> {
        self.validate_at(chain, hostname, SystemTime::now())
    }

    /// Validate a DER chain, leaf first, at `time`
    pub fn validate_at<B: AsRef<[u8]>>(
        &self,
        chain: &[B],
        hostname: &str,
        time: SystemTime,
    ) -> Result<ValidatedPath> {
        let certificates = chain
            .iter()
            .map(|der| Certificate::from_der(der.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        self.validate_certificates(certificates, hostname, time)
    }

    /// Validate parsed certificates, leaf first, at `time`
    pub fn validate_certificates(
        &self,
        mut path: Vec<Certificate>,
        hostname: &str,
        time: SystemTime,
    ) -> Result<ValidatedPath> {
        let result = self.check_path(&mut path, time);
        match result {
            Ok(anchor_subject) => {
                debug!(
                    hostname,
                    anchor = %anchor_subject,
                    length = path.len(),
                    "Certificate chain validated"
                );
                Ok(ValidatedPath {
                    chain: path,
                    anchor_subject,
                    hostname: hostname.to_string(),
                })
            }
            Err(e) => {
                warn!(hostname, error = %e, "Certificate chain rejected");
                Err(e)
            }
        }
    }

    fn check_path(&self, path: &mut Vec<Certificate>, time: SystemTime) -> Result<String> {
        if path.is_empty() {
            return Err(CertificateVerificationError::EmptyChain);
        }

        // a presented anchor ends the path, anything above it is ignored
        let anchor = match path.iter().position(|c| self.anchors.contains(c)) {
            Some(0) => {
                let leaf = &path[0];
                check_validity(leaf, time)?;
                self.check_allow_list(leaf)?;
                let subject = leaf.tbs_certificate.subject.to_string();
                path.truncate(1);
                return Ok(subject);
            }
            Some(index) => {
                let anchor = path[index].clone();
                path.truncate(index);
                anchor
            }
            None => self.find_anchor(path)?,
        };

        for index in 0..path.len() {
            let certificate = &path[index];
            let issuer = path.get(index + 1).unwrap_or(&anchor);

            if certificate.tbs_certificate.issuer != issuer.tbs_certificate.subject {
                return Err(CertificateVerificationError::IssuerMismatch { index });
            }
            check_validity(certificate, time)?;
            check_critical_extensions(certificate)?;
            // the anchor is trusted as installed, its extensions do not constrain the path
            if index + 1 < path.len() {
                check_issuer_constraints(issuer, index)?;
                check_key_usage(issuer)?;
                check_name_constraints(issuer, &path[..=index])?;
            }
            check_signature(certificate, issuer)?;
            self.check_revocation(certificate, issuer)?;
        }

        self.check_allow_list(&path[0])?;
        Ok(anchor.tbs_certificate.subject.to_string())
    }

    fn find_anchor(&self, path: &[Certificate]) -> Result<Certificate> {
        let Some(last) = path.last() else {
            return Err(CertificateVerificationError::EmptyChain);
        };
        let issuer = &last.tbs_certificate.issuer;

        let mut candidates = self.anchors.issuers_of(issuer).peekable();
        if candidates.peek().is_none() {
            return Err(CertificateVerificationError::UntrustedRoot {
                issuer: issuer.to_string(),
            });
        }
        candidates
            .find(|anchor| check_signature(last, anchor).is_ok())
            .cloned()
            .ok_or_else(|| CertificateVerificationError::InvalidSignature {
                subject: last.tbs_certificate.subject.to_string(),
            })
    }

    fn check_revocation(&self, certificate: &Certificate, issuer: &Certificate) -> Result<()> {
        if !self.config.revocation_check {
            return Ok(());
        }
        let subject = certificate.tbs_certificate.subject.to_string();
        let status = self
            .revocation
            .as_ref()
            .map_or(RevocationStatus::Unknown, |checker| {
                checker.status(certificate, issuer)
            });
        match status {
            RevocationStatus::Good => Ok(()),
            RevocationStatus::Revoked => Err(CertificateVerificationError::Revoked {
                subject,
                serial: hex::encode_upper(certificate.tbs_certificate.serial_number.as_bytes()),
            }),
            RevocationStatus::Unknown => {
                Err(CertificateVerificationError::RevocationUnknown { subject })
            }
        }
    }

    fn check_allow_list(&self, leaf: &Certificate) -> Result<()> {
        if !self.config.allow_list_enabled {
            return Ok(());
        }
        let subject = leaf.tbs_certificate.subject.to_string();
        if self.anchors.is_allowed(&subject) {
            Ok(())
        } else {
            Err(CertificateVerificationError::NotInAllowList(subject))
        }
    }
}

fn check_validity(certificate: &Certificate, time: SystemTime) -> Result<()> {
    let validity = &certificate.tbs_certificate.validity;
    if time < validity.not_before.to_system_time() || time > validity.not_after.to_system_time() {
        return Err(CertificateVerificationError::Expired {
            subject: certificate.tbs_certificate.subject.to_string(),
        });
    }
    Ok(())
}

/// `below` is the number of intermediates between `issuer` and the leaf
fn check_issuer_constraints(issuer: &Certificate, below: usize) -> Result<()> {
    let not_a_ca = || CertificateVerificationError::NotACa {
        subject: issuer.tbs_certificate.subject.to_string(),
    };
    match issuer.tbs_certificate.get::<BasicConstraints>()? {
        Some((_, constraints)) if constraints.ca => match constraints.path_len_constraint {
            Some(limit) if below > usize::from(limit) => Err(not_a_ca()),
            _ => Ok(()),
        },
        _ => Err(not_a_ca()),
    }
}

fn check_signature(certificate: &Certificate, issuer: &Certificate) -> Result<()> {
    let tbs = certificate.tbs_certificate.to_der()?;
    let signature = certificate.signature.as_bytes().ok_or_else(|| {
        CertificateVerificationError::Conversion("signature has unused bits".to_string())
    })?;
    verify_signed(
        &tbs,
        &certificate.signature_algorithm,
        signature,
        &issuer.tbs_certificate.subject_public_key_info,
    )
    .map_err(|failure| match failure {
        SignatureFailure::Unsupported(oid) => CertificateVerificationError::UnsupportedAlgorithm(oid),
        SignatureFailure::Invalid => CertificateVerificationError::InvalidSignature {
            subject: certificate.tbs_certificate.subject.to_string(),
        },
    })
}
