//! Revocation checking

use std::fmt;
use std::path::Path;

use der::{Decode, Encode};
use tracing::{debug, warn};
use x509_cert::Certificate;
use x509_cert::crl::CertificateList;

use crate::anchors::PEM_LABEL_PREFIX;
use crate::error::LoadError;
use crate::signature::verify_signed;

/// Revocation state of one certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationStatus {
    /// Not revoked according to a valid source
    Good,
    /// Revoked
    Revoked,
    /// No valid source covers the certificate
    Unknown,
}

/// Source of revocation information
pub trait RevocationChecker: fmt::Debug + Send + Sync {
    /// Status of `certificate`, issued by `issuer`
    fn status(&self, certificate: &Certificate, issuer: &Certificate) -> RevocationStatus;
}

/// Checks certificates against a fixed set of CRLs
#[derive(Debug, Clone, Default)]
pub struct CrlRevocationChecker {
    crls: Vec<CertificateList>,
}

impl CrlRevocationChecker {
    /// Checker over parsed CRLs
    pub fn new(crls: Vec<CertificateList>) -> Self {
        Self { crls }
    }

    /// Checker over DER or PEM encoded CRLs
    pub fn from_encoded<I, B>(crls: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let crls = crls
            .into_iter()
            .map(|crl| decode_crl(crl.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(crls))
    }

    /// Checker over CRL files
    pub fn from_files<I, P>(paths: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut crls = Vec::new();
        for path in paths {
            let path = path.as_ref();
            let content = std::fs::read(path).map_err(|source| LoadError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            crls.push(decode_crl(&content)?);
            debug!(path = %path.display(), "Loaded CRL");
        }
        Ok(Self::new(crls))
    }

    /// Number of loaded CRLs
    pub fn len(&self) -> usize {
        self.crls.len()
    }

    /// Whether no CRL is loaded
    pub fn is_empty(&self) -> bool {
        self.crls.is_empty()
    }
}

impl RevocationChecker for CrlRevocationChecker {
    fn status(&self, certificate: &Certificate, issuer: &Certificate) -> RevocationStatus {
        let issuer_name = &certificate.tbs_certificate.issuer;
        let serial = &certificate.tbs_certificate.serial_number;

        let mut covered = false;
        for crl in self
            .crls
            .iter()
            .filter(|crl| &crl.tbs_cert_list.issuer == issuer_name)
        {
            let Ok(tbs) = crl.tbs_cert_list.to_der() else {
                continue;
            };
            let Some(signature) = crl.signature.as_bytes() else {
                continue;
            };
            if let Err(e) = verify_signed(
                &tbs,
                &crl.signature_algorithm,
                signature,
                &issuer.tbs_certificate.subject_public_key_info,
            ) {
                warn!(issuer = %issuer_name, error = %e, "Ignoring CRL with bad signature");
                continue;
            }

            covered = true;
            let revoked = crl
                .tbs_cert_list
                .revoked_certificates
                .iter()
                .flatten()
                .any(|entry| &entry.serial_number == serial);
            if revoked {
                return RevocationStatus::Revoked;
            }
        }

        if covered {
            RevocationStatus::Good
        } else {
            RevocationStatus::Unknown
        }
    }
}

fn decode_crl(content: &[u8]) -> Result<CertificateList, LoadError> {
    if content.trim_ascii_start().starts_with(PEM_LABEL_PREFIX) {
        let (_, der) =
            der::pem::decode_vec(content).map_err(|e| LoadError::Pem(e.to_string()))?;
        Ok(CertificateList::from_der(&der)?)
    } else {
        Ok(CertificateList::from_der(content)?)
    }
}
