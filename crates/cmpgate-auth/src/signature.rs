//! Protection signature verification.

use cmpgate_core::{ProtectionAlgorithm, ProtocolMessage, Rejection};
use ring::signature::{self, UnparsedPublicKey, VerificationAlgorithm};
use tracing::debug;

use crate::cert::ParsedCertificate;

/// Uncompressed P-256 point length.
const P256_POINT_LEN: usize = 65;
/// Uncompressed P-384 point length.
const P384_POINT_LEN: usize = 97;

/// Verify the message protection against the signer's public key.
///
/// Every failure maps to the same public rejection; the reason is only
/// logged.
pub fn verify_protection(
    message: &ProtocolMessage,
    signer: &ParsedCertificate<'_>,
) -> Result<(), Rejection> {
    let (Some(algorithm), Some(protection)) =
        (message.protection_algorithm(), message.protection())
    else {
        debug!("protection or protection algorithm missing");
        return Err(Rejection::SignatureInvalid);
    };

    let key = signer.public_key();
    let Some(verifier) = verification_algorithm(algorithm, key.len()) else {
        debug!(
            algorithm = ?algorithm,
            key_algorithm = %signer.public_key_algorithm(),
            "unsupported protection algorithm for signer key"
        );
        return Err(Rejection::SignatureInvalid);
    };

    UnparsedPublicKey::new(verifier, key)
        .verify(message.protected_part(), protection)
        .map_err(|_| {
            debug!(algorithm = ?algorithm, "protection signature does not verify");
            Rejection::SignatureInvalid
        })
}

/// ring algorithm for a declared protection algorithm. ECDSA curves are
/// told apart by the public key length.
fn verification_algorithm(
    algorithm: &ProtectionAlgorithm,
    key_len: usize,
) -> Option<&'static dyn VerificationAlgorithm> {
    let alg: &'static dyn VerificationAlgorithm = match (algorithm, key_len) {
        (ProtectionAlgorithm::EcdsaSha256, P256_POINT_LEN) => &signature::ECDSA_P256_SHA256_ASN1,
        (ProtectionAlgorithm::EcdsaSha256, P384_POINT_LEN) => &signature::ECDSA_P384_SHA256_ASN1,
        (ProtectionAlgorithm::EcdsaSha384, P256_POINT_LEN) => &signature::ECDSA_P256_SHA384_ASN1,
        (ProtectionAlgorithm::EcdsaSha384, P384_POINT_LEN) => &signature::ECDSA_P384_SHA384_ASN1,
        (ProtectionAlgorithm::RsaPkcs1Sha256, _) => &signature::RSA_PKCS1_2048_8192_SHA256,
        (ProtectionAlgorithm::RsaPkcs1Sha384, _) => &signature::RSA_PKCS1_2048_8192_SHA384,
        (ProtectionAlgorithm::RsaPkcs1Sha512, _) => &signature::RSA_PKCS1_2048_8192_SHA512,
        (ProtectionAlgorithm::RsaPssSha256, _) => &signature::RSA_PSS_2048_8192_SHA256,
        (ProtectionAlgorithm::RsaPssSha384, _) => &signature::RSA_PSS_2048_8192_SHA384,
        (ProtectionAlgorithm::RsaPssSha512, _) => &signature::RSA_PSS_2048_8192_SHA512,
        (ProtectionAlgorithm::Ed25519, _) => &signature::ED25519,
        _ => return None,
    };
    Some(alg)
}
