//! Certificates and certificate store records.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::hash::sha256_hex;

/// A DER-encoded X.509 certificate.
///
/// Parsing is left to the consumer; this type only owns the bytes.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Certificate {
    der: Vec<u8>,
}

impl Certificate {
    /// Wrap DER bytes.
    #[must_use]
    pub const fn from_der(der: Vec<u8>) -> Self {
        Self { der }
    }

    /// Parse every `CERTIFICATE` block of a PEM bundle. Other blocks are skipped.
    pub fn from_pem(input: &str) -> Result<Vec<Self>, pem::PemError> {
        let blocks = pem::parse_many(input)?;
        Ok(blocks
            .into_iter()
            .filter(|p| p.tag() == "CERTIFICATE")
            .map(|p| Self::from_der(p.into_contents()))
            .collect())
    }

    /// The DER bytes.
    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// SHA-256 fingerprint of the DER encoding, lowercase hex.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        sha256_hex(&self.der)
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("fingerprint", &self.fingerprint())
            .field("len", &self.der.len())
            .finish()
    }
}

/// Lifecycle status of an issued certificate, as kept by the certificate store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CertificateStatus {
    /// Valid and in use
    Active,
    /// Valid; the owner has been told it expires soon
    NotifiedAboutExpiration,
    /// Revoked
    Revoked,
    /// Temporarily on hold
    OnHold,
    /// Superseded and archived
    Archived,
}

impl CertificateStatus {
    /// Whether the certificate may still authenticate its owner.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active | Self::NotifiedAboutExpiration)
    }
}

/// What the certificate store knows about an issued certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateInfo {
    /// SHA-256 fingerprint (hex)
    pub fingerprint: String,
    /// Owning end entity
    pub username: String,
    /// Store status
    pub status: CertificateStatus,
    /// Canonical issuer DN
    pub issuer_dn: String,
    /// Serial number, lowercase hex without separators
    pub serial: String,
}
