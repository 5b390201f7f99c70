//! Inbound CMP protocol messages, as handed over by the wire layer.
//!
//! Decoding the wire format is not this crate's business: the wire layer
//! fills in a [`ProtocolMessage`] and the pipeline only reads it.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Certificate;

/// Kind of request carried by a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestType {
    /// `cr`
    Certification,
    /// `ir`
    Initialization,
    /// `kur`
    KeyUpdate,
    /// `rr`
    Revocation,
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Certification => write!(f, "CertificationRequest"),
            Self::Initialization => write!(f, "InitializationRequest"),
            Self::KeyUpdate => write!(f, "KeyUpdateRequest"),
            Self::Revocation => write!(f, "RevocationRequest"),
        }
    }
}

/// Algorithm declared in the message header for the protection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtectionAlgorithm {
    /// ecdsa-with-SHA256
    EcdsaSha256,
    /// ecdsa-with-SHA384
    EcdsaSha384,
    /// sha256WithRSAEncryption
    RsaPkcs1Sha256,
    /// sha384WithRSAEncryption
    RsaPkcs1Sha384,
    /// sha512WithRSAEncryption
    RsaPkcs1Sha512,
    /// RSASSA-PSS with SHA-256
    RsaPssSha256,
    /// RSASSA-PSS with SHA-384
    RsaPssSha384,
    /// RSASSA-PSS with SHA-512
    RsaPssSha512,
    /// Ed25519
    Ed25519,
    /// Password-based MAC; not signature protection
    PasswordBasedMac,
    /// Anything else, by OID
    Unknown(String),
}

impl ProtectionAlgorithm {
    /// Map an algorithm OID (dotted form) to a known algorithm.
    ///
    /// RSASSA-PSS needs its parameters to pick a hash, so the bare PSS OID
    /// maps to `Unknown`; the wire layer constructs the PSS variants itself.
    #[must_use]
    pub fn from_oid(oid: &str) -> Self {
        match oid {
            "1.2.840.10045.4.3.2" => Self::EcdsaSha256,
            "1.2.840.10045.4.3.3" => Self::EcdsaSha384,
            "1.2.840.113549.1.1.11" => Self::RsaPkcs1Sha256,
            "1.2.840.113549.1.1.12" => Self::RsaPkcs1Sha384,
            "1.2.840.113549.1.1.13" => Self::RsaPkcs1Sha512,
            "1.3.101.112" => Self::Ed25519,
            "1.2.840.113533.7.66.13" => Self::PasswordBasedMac,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// The certificate template of an ir/cr/kur request.
///
/// DNs are kept as sent; the pipeline parses them and rejects malformed ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertTemplate {
    /// Requested subject DN
    pub subject_dn: Option<String>,
    /// Requested issuer DN
    pub issuer_dn: Option<String>,
}

/// The certificate a revocation request targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationTarget {
    /// Issuer DN of the certificate to revoke
    pub issuer_dn: Option<String>,
    /// Serial number, hex
    pub serial: String,
}

/// Request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestBody {
    /// `cr`
    Certification(CertTemplate),
    /// `ir`
    Initialization(CertTemplate),
    /// `kur`
    KeyUpdate(CertTemplate),
    /// `rr`
    Revocation(RevocationTarget),
}

impl RequestBody {
    /// The request type of this body.
    #[must_use]
    pub const fn request_type(&self) -> RequestType {
        match self {
            Self::Certification(_) => RequestType::Certification,
            Self::Initialization(_) => RequestType::Initialization,
            Self::KeyUpdate(_) => RequestType::KeyUpdate,
            Self::Revocation(_) => RequestType::Revocation,
        }
    }

    /// The certificate template, for ir/cr/kur.
    #[must_use]
    pub const fn template(&self) -> Option<&CertTemplate> {
        match self {
            Self::Certification(t) | Self::Initialization(t) | Self::KeyUpdate(t) => Some(t),
            Self::Revocation(_) => None,
        }
    }
}

/// An inbound protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolMessage {
    body: RequestBody,
    sender_key_id: Option<String>,
    protection_algorithm: Option<ProtectionAlgorithm>,
    protected_part: Vec<u8>,
    protection: Option<Vec<u8>>,
    extra_certs: Vec<Certificate>,
    claimed_username: Option<String>,
}

impl ProtocolMessage {
    /// Create a message from its body and the canonical bytes the protection covers.
    #[must_use]
    pub const fn new(body: RequestBody, protected_part: Vec<u8>) -> Self {
        Self {
            body,
            sender_key_id: None,
            protection_algorithm: None,
            protected_part,
            protection: None,
            extra_certs: Vec::new(),
            claimed_username: None,
        }
    }

    /// Set the senderKID from the header.
    #[must_use]
    pub fn with_sender_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.sender_key_id = Some(key_id.into());
        self
    }

    /// Set the protection algorithm and signature bytes.
    #[must_use]
    pub fn with_protection(mut self, algorithm: ProtectionAlgorithm, signature: Vec<u8>) -> Self {
        self.protection_algorithm = Some(algorithm);
        self.protection = Some(signature);
        self
    }

    /// Set the attached certificate chain (`extraCerts`).
    #[must_use]
    pub fn with_extra_certs(mut self, certs: Vec<Certificate>) -> Self {
        self.extra_certs = certs;
        self
    }

    /// Set the username the sender claims.
    #[must_use]
    pub fn with_claimed_username(mut self, username: impl Into<String>) -> Self {
        self.claimed_username = Some(username.into());
        self
    }

    /// Request type.
    #[must_use]
    pub const fn request_type(&self) -> RequestType {
        self.body.request_type()
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> &RequestBody {
        &self.body
    }

    /// senderKID, if present.
    #[must_use]
    pub fn sender_key_id(&self) -> Option<&str> {
        self.sender_key_id.as_deref()
    }

    /// Declared protection algorithm.
    #[must_use]
    pub const fn protection_algorithm(&self) -> Option<&ProtectionAlgorithm> {
        self.protection_algorithm.as_ref()
    }

    /// The bytes the protection covers.
    #[must_use]
    pub fn protected_part(&self) -> &[u8] {
        &self.protected_part
    }

    /// Protection bytes, if present.
    #[must_use]
    pub fn protection(&self) -> Option<&[u8]> {
        self.protection.as_deref()
    }

    /// Certificates attached by the sender, in the order sent.
    #[must_use]
    pub fn extra_certs(&self) -> &[Certificate] {
        &self.extra_certs
    }

    /// Username claimed by the sender.
    #[must_use]
    pub fn claimed_username(&self) -> Option<&str> {
        self.claimed_username.as_deref()
    }
}
