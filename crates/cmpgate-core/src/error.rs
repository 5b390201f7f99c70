//! Error types.
//!
//! Two classes of failure are kept apart:
//!
//! - [`Rejection`] -- the message is not authentic or not authorized. This is
//!   an ordinary outcome, carried inside a failed
//!   [`crate::AuthenticationOutcome`]; the caller answers the peer with a
//!   protocol-level error.
//! - [`AuthError`] -- the deployment is broken (corrupt trust store, profile
//!   pointing at a CA that does not exist, backend down). These abort the
//!   pipeline and belong in front of an operator, not in a rejected-login count.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::access::AccessResource;

/// Result type alias for pipeline operations that can hit a fatal error.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Fatal, environment-level errors.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The system random source failed.
    #[error("random source unavailable")]
    RandomSource,

    /// A CA certificate held by the CA subsystem cannot be parsed.
    #[error("trust store entry for CA '{ca}' is corrupt: {reason}")]
    TrustStore {
        /// CA name
        ca: String,
        /// Parser error
        reason: String,
    },

    /// An end-entity profile names a default CA id that does not exist.
    #[error("end entity profile {profile_id} references unknown CA {ca_id}")]
    ProfileReferencesUnknownCa {
        /// End-entity profile id
        profile_id: i32,
        /// Missing CA id
        ca_id: i32,
    },

    /// Configuration is invalid or references something that does not exist.
    #[error("config error: {0}")]
    Config(String),

    /// A collaborator backend failed.
    #[error("{service} unavailable: {reason}")]
    Collaborator {
        /// Which port failed
        service: &'static str,
        /// Backend error text
        reason: String,
    },

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AuthError {
    /// Wrap a collaborator failure.
    #[must_use]
    pub fn collaborator(service: &'static str, err: &StoreError) -> Self {
        Self::Collaborator {
            service,
            reason: err.to_string(),
        }
    }

    /// Returns true if the error stems from configuration rather than a backend.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::ProfileReferencesUnknownCa { .. }
        )
    }
}

/// Errors reported by collaborator ports.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The looked-up object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller may not read the looked-up object.
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),

    /// The backing store failed.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Which validity bound a certificate violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidityViolation {
    /// The certificate's notAfter lies in the past
    Expired {
        /// The violated bound
        not_after: DateTime<Utc>,
    },
    /// The certificate's notBefore lies in the future
    NotYetValid {
        /// The violated bound
        not_before: DateTime<Utc>,
    },
}

impl std::fmt::Display for ValidityViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Expired { not_after } => write!(f, "expired on {}", not_after.to_rfc3339()),
            Self::NotYetValid { not_before } => {
                write!(f, "not valid before {}", not_before.to_rfc3339())
            }
        }
    }
}

/// Why a message was not authenticated.
///
/// The `Display` text is the public error message returned to the peer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The message carries no protection.
    #[error("PKI message protection is missing")]
    MissingProtection,

    /// RA mode and vendor mode are both enabled for the alias.
    #[error("RA mode and vendor mode cannot be combined")]
    IncompatibleModes,

    /// Verification omission requested outside pre-authenticated RA traffic.
    #[error("verifications may only be omitted for pre-authenticated RA traffic")]
    OmissionNotAllowed,

    /// No certificate was attached.
    #[error("no certificate found in the extraCerts field")]
    NoCertificate,

    /// The attached certificate could not be parsed.
    #[error("the certificate in the extraCerts field could not be parsed")]
    UnparsableCertificate,

    /// The certificate issuer does not name a known CA.
    #[error("the issuer of the certificate in the extraCerts field is not a known CA")]
    UnknownIssuer,

    /// The caller may not use the CA that roots trust.
    #[error("not authorized to CA '{0}'")]
    CaAccessDenied(String),

    /// The CA that roots trust is expired or offline.
    #[error("CA '{0}' is not active")]
    CaNotActive(String),

    /// Vendor traffic whose certificate no vendor CA issued.
    #[error("the certificate in the extraCerts field is not issued by a vendor CA")]
    NotVendorIssued,

    /// A certificate on the path is outside its validity period.
    #[error("the certificate in the extraCerts field is not valid: {0}")]
    CertificateNotValid(ValidityViolation),

    /// No path from the certificate to the trust root.
    #[error("the certificate in the extraCerts field could not be verified against CA '{0}'")]
    Untrusted(String),

    /// The certificate is not known to the certificate store.
    #[error("the certificate in the extraCerts field could not be found in the database")]
    UnknownCertificate,

    /// The certificate is revoked or otherwise inactive.
    #[error("the certificate in the extraCerts field is not active")]
    CertificateNotActive,

    /// The certificate belongs to someone other than the request's user.
    #[error("the certificate in the extraCerts field does not belong to user '{0}'")]
    NotCertificateOwner(String),

    /// The request's username cannot be determined.
    #[error("cannot determine the username of the request")]
    MissingUsername,

    /// A key update request template carries no subject DN.
    #[error("cannot find a subject DN in the key update request")]
    MissingSubjectDn,

    /// No (unique) end entity matches the key update request.
    #[error("no such end entity")]
    NoSuchEndEntity,

    /// The signer could not be turned into an administrator identity.
    #[error("the certificate in the extraCerts field could not be authenticated")]
    AdminAuthenticationFailed,

    /// The administrator lacks a right.
    #[error("not authorized to resource {0}")]
    NotAuthorized(AccessResource),

    /// The certificate profile does not allow the CA.
    #[error("CA {ca_id} is not authorized for certificate profile {profile_id}")]
    CaNotAuthorizedForProfile {
        /// CA id
        ca_id: i32,
        /// Certificate profile id
        profile_id: i32,
    },

    /// Profile selection requires a senderKID and the header has none.
    #[error("the request has no senderKID but the configuration requires one")]
    MissingSenderKeyId,

    /// A profile named by the senderKID does not exist.
    #[error("profile '{0}' could not be found")]
    UnknownProfile(String),

    /// A CA named by the senderKID does not exist.
    #[error("CA '{0}' could not be found")]
    UnknownCa(String),

    /// The revocation request names no usable issuer DN.
    #[error("cannot find the issuer DN of the certificate to revoke")]
    InvalidRevocationTarget,

    /// A client asked to revoke a certificate that is not its own.
    #[error("the certificate to revoke does not belong to the requesting user")]
    RevocationTargetNotOwned,

    /// The protection does not verify.
    #[error("signature verification failed")]
    SignatureInvalid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_authorized_names_resource() {
        let r = Rejection::NotAuthorized(AccessResource::CaAccess(12));
        assert_eq!(r.to_string(), "not authorized to resource CAACCESS/12");
    }

    #[test]
    fn validity_message_reports_bound() {
        let bound = DateTime::parse_from_rfc3339("2021-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let r = Rejection::CertificateNotValid(ValidityViolation::Expired { not_after: bound });
        assert!(r.to_string().contains("expired on 2021-01-01"));
    }

    #[test]
    fn config_errors_are_classified() {
        assert!(AuthError::Config("x".into()).is_config_error());
        assert!(!AuthError::RandomSource.is_config_error());
        let err = AuthError::collaborator("end entity store", &StoreError::Unavailable("db".into()));
        assert_eq!(err.to_string(), "end entity store unavailable: backend unavailable: db");
    }
}
