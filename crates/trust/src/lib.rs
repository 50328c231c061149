//! Trust validation for eCard server certificates
//!
//! A [`TrustValidator`] checks a presented chain, leaf first, against a
//! shared [`TrustAnchorSet`]: issuer chaining, validity periods, critical
//! extensions, CA basic constraints, key usage and name constraints of
//! intermediates, ECDSA and RSA signatures, termination at an anchor and,
//! when enabled, CRL revocation and a subject allow-list.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]

mod anchors;
mod config;
mod error;
mod extensions;
mod revocation;
mod signature;
mod validator;

pub use anchors::{TrustAnchorSet, read_certificates};
pub use config::TrustConfig;
pub use error::{CertificateVerificationError, LoadError};
pub use revocation::{CrlRevocationChecker, RevocationChecker, RevocationStatus};
pub use validator::{TrustValidator, ValidatedPath};

pub use x509_cert::Certificate;
