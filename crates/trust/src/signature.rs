use const_oid::ObjectIdentifier;
use const_oid::db::rfc5912::{
    ECDSA_WITH_SHA_256, ECDSA_WITH_SHA_384, ECDSA_WITH_SHA_512, ID_EC_PUBLIC_KEY, ID_MGF_1,
    ID_RSASSA_PSS, ID_SHA_256, ID_SHA_384, ID_SHA_512, RSA_ENCRYPTION, SECP_256_R_1,
    SECP_384_R_1, SHA_256_WITH_RSA_ENCRYPTION, SHA_384_WITH_RSA_ENCRYPTION,
    SHA_512_WITH_RSA_ENCRYPTION,
};
use der::{Decode, Encode};
use rsa::pkcs1::{DecodeRsaPublicKey, RsaPssParams};
use rsa::{Pkcs1v15Sign, Pss, RsaPublicKey};
use sha2::{Digest, Sha256, Sha384, Sha512};
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};

/// Why a signature did not verify
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SignatureFailure {
    /// Signature algorithm, key type or curve that is not handled
    Unsupported(String),
    /// Malformed key or signature, or wrong signature
    Invalid,
}

impl std::fmt::Display for SignatureFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unsupported(oid) => write!(f, "unsupported algorithm {oid}"),
            Self::Invalid => f.write_str("invalid signature"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HashAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    fn from_oid(oid: ObjectIdentifier) -> Result<Self, SignatureFailure> {
        match oid {
            ID_SHA_256 => Ok(Self::Sha256),
            ID_SHA_384 => Ok(Self::Sha384),
            ID_SHA_512 => Ok(Self::Sha512),
            other => Err(SignatureFailure::Unsupported(other.to_string())),
        }
    }

    fn digest(self, message: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha256 => Sha256::digest(message).to_vec(),
            Self::Sha384 => Sha384::digest(message).to_vec(),
            Self::Sha512 => Sha512::digest(message).to_vec(),
        }
    }

    fn pkcs1v15(self) -> Pkcs1v15Sign {
        match self {
            Self::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
            Self::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
            Self::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
        }
    }

    fn pss(self, salt_len: usize) -> Pss {
        match self {
            Self::Sha256 => Pss::new_with_salt::<Sha256>(salt_len),
            Self::Sha384 => Pss::new_with_salt::<Sha384>(salt_len),
            Self::Sha512 => Pss::new_with_salt::<Sha512>(salt_len),
        }
    }
}

/// Verify `signature` over `message` with the issuer's public key
///
/// The key type and curve come from the issuer's SPKI, the digest from the
/// signature algorithm, so a P-384 key signing with SHA-256 is accepted.
pub(crate) fn verify_signed(
    message: &[u8],
    algorithm: &AlgorithmIdentifierOwned,
    signature: &[u8],
    issuer_key: &SubjectPublicKeyInfoOwned,
) -> Result<(), SignatureFailure> {
    let key = issuer_key.subject_public_key.raw_bytes();
    match issuer_key.algorithm.oid {
        ID_EC_PUBLIC_KEY => {
            let hash = match algorithm.oid {
                ECDSA_WITH_SHA_256 => HashAlgorithm::Sha256,
                ECDSA_WITH_SHA_384 => HashAlgorithm::Sha384,
                ECDSA_WITH_SHA_512 => HashAlgorithm::Sha512,
                other => return Err(SignatureFailure::Unsupported(other.to_string())),
            };
            let curve = issuer_key
                .algorithm
                .parameters
                .as_ref()
                .ok_or(SignatureFailure::Invalid)?
                .decode_as::<ObjectIdentifier>()
                .map_err(|_| SignatureFailure::Invalid)?;
            verify_ecdsa(curve, key, &hash.digest(message), signature)
        }
        RSA_ENCRYPTION => {
            let key = RsaPublicKey::from_pkcs1_der(key).map_err(|_| SignatureFailure::Invalid)?;
            let hashed = |hash: HashAlgorithm| hash.digest(message);
            let result = match algorithm.oid {
                SHA_256_WITH_RSA_ENCRYPTION => key.verify(
                    HashAlgorithm::Sha256.pkcs1v15(),
                    &hashed(HashAlgorithm::Sha256),
                    signature,
                ),
                SHA_384_WITH_RSA_ENCRYPTION => key.verify(
                    HashAlgorithm::Sha384.pkcs1v15(),
                    &hashed(HashAlgorithm::Sha384),
                    signature,
                ),
                SHA_512_WITH_RSA_ENCRYPTION => key.verify(
                    HashAlgorithm::Sha512.pkcs1v15(),
                    &hashed(HashAlgorithm::Sha512),
                    signature,
                ),
                ID_RSASSA_PSS => {
                    let (hash, salt_len) = pss_parameters(algorithm)?;
                    key.verify(hash.pss(salt_len), &hashed(hash), signature)
                }
                other => return Err(SignatureFailure::Unsupported(other.to_string())),
            };
            result.map_err(|_| SignatureFailure::Invalid)
        }
        other => Err(SignatureFailure::Unsupported(other.to_string())),
    }
}

fn verify_ecdsa(
    curve: ObjectIdentifier,
    key: &[u8],
    prehash: &[u8],
    signature: &[u8],
) -> Result<(), SignatureFailure> {
    match curve {
        SECP_256_R_1 => {
            use p256::ecdsa::signature::hazmat::PrehashVerifier;
            use p256::ecdsa::{Signature, VerifyingKey};

            let key = VerifyingKey::from_sec1_bytes(key).map_err(|_| SignatureFailure::Invalid)?;
            let signature = Signature::from_der(signature).map_err(|_| SignatureFailure::Invalid)?;
            key.verify_prehash(prehash, &signature)
                .map_err(|_| SignatureFailure::Invalid)
        }
        SECP_384_R_1 => {
            use p384::ecdsa::signature::hazmat::PrehashVerifier;
            use p384::ecdsa::{Signature, VerifyingKey};

            let key = VerifyingKey::from_sec1_bytes(key).map_err(|_| SignatureFailure::Invalid)?;
            let signature = Signature::from_der(signature).map_err(|_| SignatureFailure::Invalid)?;
            key.verify_prehash(prehash, &signature)
                .map_err(|_| SignatureFailure::Invalid)
        }
        other => Err(SignatureFailure::Unsupported(other.to_string())),
    }
}

/// Digest and salt length of an RSASSA-PSS algorithm identifier, MGF1 only
fn pss_parameters(
    algorithm: &AlgorithmIdentifierOwned,
) -> Result<(HashAlgorithm, usize), SignatureFailure> {
    let encoded = algorithm
        .parameters
        .as_ref()
        .ok_or(SignatureFailure::Invalid)?
        .to_der()
        .map_err(|_| SignatureFailure::Invalid)?;
    let params = RsaPssParams::from_der(&encoded).map_err(|_| SignatureFailure::Invalid)?;

    let hash = HashAlgorithm::from_oid(params.hash.oid)?;
    if params.mask_gen.oid != ID_MGF_1 {
        return Err(SignatureFailure::Unsupported(params.mask_gen.oid.to_string()));
    }
    let mgf_hash = params
        .mask_gen
        .parameters
        .map(|digest| digest.oid)
        .ok_or(SignatureFailure::Invalid)?;
    if HashAlgorithm::from_oid(mgf_hash)? != hash {
        return Err(SignatureFailure::Unsupported(mgf_hash.to_string()));
    }
    Ok((hash, usize::from(params.salt_len)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use der::asn1::BitString;
    use der::Any;

    const MESSAGE: &[u8] = b"tbsCertificate";

    fn p384_key() -> (p384::ecdsa::SigningKey, SubjectPublicKeyInfoOwned) {
        let signing = p384::ecdsa::SigningKey::from_slice(&[0x11; 48]).unwrap();
        let point = signing.verifying_key().to_encoded_point(false);
        let spki = SubjectPublicKeyInfoOwned {
            algorithm: AlgorithmIdentifierOwned {
                oid: ID_EC_PUBLIC_KEY,
                parameters: Some(Any::encode_from(&SECP_384_R_1).unwrap()),
            },
            subject_public_key: BitString::from_bytes(point.as_bytes()).unwrap(),
        };
        (signing, spki)
    }

    fn ecdsa(oid: ObjectIdentifier) -> AlgorithmIdentifierOwned {
        AlgorithmIdentifierOwned {
            oid,
            parameters: None,
        }
    }

    #[test]
    fn test_p384_key_with_sha256() {
        use p384::ecdsa::Signature;
        use p384::ecdsa::signature::hazmat::PrehashSigner;

        let (signing, spki) = p384_key();
        let signature: Signature = signing.sign_prehash(&Sha256::digest(MESSAGE)).unwrap();
        let der = signature.to_der();

        assert_eq!(
            verify_signed(MESSAGE, &ecdsa(ECDSA_WITH_SHA_256), der.as_bytes(), &spki),
            Ok(())
        );
        // digest taken from the algorithm, not the curve
        assert_eq!(
            verify_signed(MESSAGE, &ecdsa(ECDSA_WITH_SHA_384), der.as_bytes(), &spki),
            Err(SignatureFailure::Invalid)
        );
        assert_eq!(
            verify_signed(b"other", &ecdsa(ECDSA_WITH_SHA_256), der.as_bytes(), &spki),
            Err(SignatureFailure::Invalid)
        );
    }

    #[test]
    fn test_unknown_algorithms() {
        let (_, spki) = p384_key();
        assert_eq!(
            verify_signed(MESSAGE, &ecdsa(SHA_256_WITH_RSA_ENCRYPTION), &[0x30, 0x00], &spki),
            Err(SignatureFailure::Unsupported(
                SHA_256_WITH_RSA_ENCRYPTION.to_string()
            ))
        );

        let mut other_curve = spki;
        other_curve.algorithm.parameters = Some(Any::encode_from(&ID_SHA_256).unwrap());
        assert_eq!(
            verify_signed(MESSAGE, &ecdsa(ECDSA_WITH_SHA_256), &[0x30, 0x00], &other_curve),
            Err(SignatureFailure::Unsupported(ID_SHA_256.to_string()))
        );
    }
}
