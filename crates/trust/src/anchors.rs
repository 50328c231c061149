//! Trusted root certificates and the endpoint allow-list

use std::collections::BTreeSet;
use std::path::Path;

use der::{Decode, Encode};
use tracing::debug;
use x509_cert::Certificate;
use x509_cert::name::Name;

use crate::error::LoadError;

pub(crate) const PEM_LABEL_PREFIX: &[u8] = b"-----BEGIN";

/// Read-only set of trust anchors, shared between validations
#[derive(Debug, Clone, Default)]
pub struct TrustAnchorSet {
    anchors: Vec<Certificate>,
    allow_list: BTreeSet<String>,
}

impl TrustAnchorSet {
    /// Build a set from parsed certificates
    pub fn new(anchors: Vec<Certificate>) -> Self {
        Self {
            anchors,
            allow_list: BTreeSet::new(),
        }
    }

    /// Build a set from DER encoded certificates
    pub fn from_der<I, B>(certificates: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let anchors = certificates
            .into_iter()
            .map(|der| Certificate::from_der(der.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(anchors))
    }

    /// Build a set from files holding one DER certificate or any number of PEM certificates
    pub fn from_pem_files<I, P>(paths: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut anchors = Vec::new();
        for path in paths {
            let loaded = read_certificates(path.as_ref())?;
            debug!(path = %path.as_ref().display(), count = loaded.len(), "Loaded trust anchors");
            anchors.extend(loaded);
        }
        Ok(Self::new(anchors))
    }

    /// Restrict accepted leaf subjects to the given RFC 4514 names
    pub fn with_allow_list<I, S>(mut self, subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow_list = subjects.into_iter().map(Into::into).collect();
        self
    }

    /// The anchor certificates
    pub fn anchors(&self) -> &[Certificate] {
        &self.anchors
    }

    /// Number of anchors
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Whether the set holds no anchor
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Whether `subject` is allow-listed
    pub fn is_allowed(&self, subject: &str) -> bool {
        self.allow_list.contains(subject)
    }

    /// Anchors whose subject is `issuer`
    pub(crate) fn issuers_of<'a>(&'a self, issuer: &'a Name) -> impl Iterator<Item = &'a Certificate> {
        self.anchors
            .iter()
            .filter(move |anchor| &anchor.tbs_certificate.subject == issuer)
    }

    /// Whether `certificate` is itself one of the anchors
    pub(crate) fn contains(&self, certificate: &Certificate) -> bool {
        let Ok(encoded) = certificate.to_der() else {
            return false;
        };
        self.anchors
            .iter()
            .any(|anchor| anchor.to_der().is_ok_and(|der| der == encoded))
    }
}

/// Read a file holding one DER certificate or a PEM bundle
pub fn read_certificates(path: &Path) -> Result<Vec<Certificate>, LoadError> {
    let content = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode_certificates(&content)
}

/// Decode one DER certificate or a PEM bundle
pub(crate) fn decode_certificates(content: &[u8]) -> Result<Vec<Certificate>, LoadError> {
    if content.trim_ascii_start().starts_with(PEM_LABEL_PREFIX) {
        Ok(Certificate::load_pem_chain(content)?)
    } else {
        Ok(vec![Certificate::from_der(content)?])
    }
}
