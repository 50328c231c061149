use std::path::PathBuf;

/// Why a certificate chain was not accepted
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CertificateVerificationError {
    /// The chain could not be decoded
    #[error("Certificate conversion failed: {0}")]
    Conversion(String),

    /// No certificate was presented
    #[error("Empty certificate chain")]
    EmptyChain,

    /// A certificate is not issued by the next one in the chain
    #[error("Certificate {index} is not issued by its successor")]
    IssuerMismatch {
        /// Position in the chain, leaf is 0
        index: usize,
    },

    /// Outside its validity period at validation time
    #[error("Certificate {subject} is not valid at validation time")]
    Expired {
        /// Subject of the certificate
        subject: String,
    },

    /// An issuing certificate is not a CA or exceeds its path length
    #[error("Certificate {subject} is not allowed to issue certificates")]
    NotACa {
        /// Subject of the issuer
        subject: String,
    },

    /// An issuing certificate has KeyUsage without keyCertSign
    #[error("Certificate {subject} lacks the keyCertSign key usage")]
    InvalidKeyUsage {
        /// Subject of the issuer
        subject: String,
    },

    /// A certificate carries a critical extension that is not processed
    #[error("Certificate {subject} has unsupported critical extension {oid}")]
    UnsupportedCriticalExtension {
        /// Subject of the certificate
        subject: String,
        /// Extension OID, dotted
        oid: String,
    },

    /// A name below a CA falls outside its name constraints
    #[error("Certificate {subject} violates the name constraints of {issuer}")]
    NameConstraintViolation {
        /// Subject of the constrained certificate
        subject: String,
        /// Subject of the constraining CA
        issuer: String,
    },

    /// Signature algorithm, key type or curve that is not handled
    #[error("Unsupported signature algorithm {0}")]
    UnsupportedAlgorithm(String),

    /// Signature does not verify with the issuer key
    #[error("Invalid signature on {subject}")]
    InvalidSignature {
        /// Subject of the signed certificate
        subject: String,
    },

    /// The chain does not end at a trust anchor
    #[error("No trust anchor for issuer {issuer}")]
    UntrustedRoot {
        /// Issuer of the last certificate
        issuer: String,
    },

    /// A certificate is on its issuer's revocation list
    #[error("Certificate {subject} (serial {serial}) is revoked")]
    Revoked {
        /// Subject of the revoked certificate
        subject: String,
        /// Serial number, hex
        serial: String,
    },

    /// No usable revocation information
    #[error("Revocation status of {subject} is unknown")]
    RevocationUnknown {
        /// Subject of the certificate
        subject: String,
    },

    /// The leaf subject is not allow-listed
    #[error("Subject {0} is not in the allow-list")]
    NotInAllowList(String),
}

impl From<der::Error> for CertificateVerificationError {
    fn from(error: der::Error) -> Self {
        Self::Conversion(error.to_string())
    }
}

/// Error loading trust anchors or revocation lists
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// File could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Content is neither valid DER nor PEM
    #[error("Failed to decode: {0}")]
    Decode(#[from] der::Error),

    /// PEM armor is broken
    #[error("Failed to decode PEM: {0}")]
    Pem(String),
}
