//! Certificate extensions that take part in path validation

use const_oid::{AssociatedOid, ObjectIdentifier};
use x509_cert::Certificate;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::{
    BasicConstraints, KeyUsage, KeyUsages, NameConstraints, SubjectAltName,
};

use crate::error::CertificateVerificationError;

type Result<T, E = CertificateVerificationError> = std::result::Result<T, E>;

/// Extensions whose content is evaluated, any other critical one fails the path
const PROCESSED: [ObjectIdentifier; 4] = [
    BasicConstraints::OID,
    KeyUsage::OID,
    NameConstraints::OID,
    SubjectAltName::OID,
];

fn subject(certificate: &Certificate) -> String {
    certificate.tbs_certificate.subject.to_string()
}

fn unsupported(certificate: &Certificate, oid: ObjectIdentifier) -> CertificateVerificationError {
    CertificateVerificationError::UnsupportedCriticalExtension {
        subject: subject(certificate),
        oid: oid.to_string(),
    }
}

pub(crate) fn check_critical_extensions(certificate: &Certificate) -> Result<()> {
    let extensions = certificate
        .tbs_certificate
        .extensions
        .as_deref()
        .unwrap_or_default();
    match extensions
        .iter()
        .find(|extension| extension.critical && !PROCESSED.contains(&extension.extn_id))
    {
        Some(extension) => Err(unsupported(certificate, extension.extn_id)),
        None => Ok(()),
    }
}

/// An issuer without KeyUsage is unrestricted
pub(crate) fn check_key_usage(issuer: &Certificate) -> Result<()> {
    match issuer.tbs_certificate.get::<KeyUsage>()? {
        Some((_, usage)) if !usage.0.contains(KeyUsages::KeyCertSign) => {
            Err(CertificateVerificationError::InvalidKeyUsage {
                subject: subject(issuer),
            })
        }
        _ => Ok(()),
    }
}

/// Apply the issuer's NameConstraints to every certificate below it
///
/// Subject names are matched as directoryName, SAN dNSName entries as
/// dNSName. Subtrees of any other form cannot be evaluated and fail closed.
pub(crate) fn check_name_constraints(issuer: &Certificate, below: &[Certificate]) -> Result<()> {
    let Some((_, constraints)) = issuer.tbs_certificate.get::<NameConstraints>()? else {
        return Ok(());
    };
    let permitted = constraints.permitted_subtrees.as_deref().unwrap_or_default();
    let excluded = constraints.excluded_subtrees.as_deref().unwrap_or_default();

    if permitted.iter().chain(excluded).any(|subtree| {
        !matches!(
            subtree.base,
            GeneralName::DirectoryName(_) | GeneralName::DnsName(_)
        )
    }) {
        return Err(unsupported(issuer, NameConstraints::OID));
    }

    for (index, certificate) in below.iter().enumerate() {
        let tbs = &certificate.tbs_certificate;
        // self-issued intermediates are exempt
        if index > 0 && tbs.subject == tbs.issuer {
            continue;
        }

        let mut names = Vec::new();
        if !tbs.subject.0.is_empty() {
            names.push(GeneralName::DirectoryName(tbs.subject.clone()));
        }
        if let Some((_, alt_names)) = tbs.get::<SubjectAltName>()? {
            names.extend(
                alt_names
                    .0
                    .into_iter()
                    .filter(|name| matches!(name, GeneralName::DnsName(_))),
            );
        }

        for name in &names {
            let excluded_hit = excluded
                .iter()
                .any(|subtree| within(name, &subtree.base) == Some(true));
            let mut same_form = permitted
                .iter()
                .filter_map(|subtree| within(name, &subtree.base))
                .peekable();
            let permitted_miss = same_form.peek().is_some() && !same_form.any(|hit| hit);

            if excluded_hit || permitted_miss {
                return Err(CertificateVerificationError::NameConstraintViolation {
                    subject: subject(certificate),
                    issuer: subject(issuer),
                });
            }
        }
    }
    Ok(())
}

/// `None` when `name` and `base` are of different forms
fn within(name: &GeneralName, base: &GeneralName) -> Option<bool> {
    match (name, base) {
        (GeneralName::DirectoryName(name), GeneralName::DirectoryName(base)) => {
            Some(name.0.starts_with(&base.0))
        }
        (GeneralName::DnsName(name), GeneralName::DnsName(base)) => {
            Some(dns_within(&name.to_string(), &base.to_string()))
        }
        _ => None,
    }
}

/// `base` matches itself and its subdomains, `.base` only subdomains
fn dns_within(name: &str, base: &str) -> bool {
    let name = name.trim_end_matches('.').to_ascii_lowercase();
    let base = base.trim_end_matches('.').to_ascii_lowercase();
    if base.is_empty() {
        return true;
    }
    if base.starts_with('.') {
        return name.ends_with(&base);
    }
    name == base || name.ends_with(&format!(".{base}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dns_within() {
        assert!(dns_within("eid.example", "eid.example"));
        assert!(dns_within("a.eid.example", "eid.example"));
        assert!(dns_within("EID.Example.", "eid.example"));
        assert!(!dns_within("badeid.example", "eid.example"));
        assert!(!dns_within("eid.example", ".eid.example"));
        assert!(dns_within("a.eid.example", ".eid.example"));
        assert!(dns_within("anything", ""));
    }
}
