//! Administrator identity derived from a signer certificate.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dn::DistinguishedName;

/// An authenticated administrator, as produced by a
/// [`crate::CredentialAuthenticator`] and presented to the
/// [`crate::AuthorizationService`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdminToken {
    /// Subject DN of the administrator's certificate
    pub subject_dn: DistinguishedName,
    /// Issuer DN of the administrator's certificate
    pub issuer_dn: DistinguishedName,
    /// Certificate serial, lowercase hex
    pub serial: String,
    /// Certificate fingerprint (SHA-256 hex)
    pub fingerprint: String,
}

impl AdminToken {
    /// Key used by authorization backends to look up the administrator.
    #[must_use]
    pub fn principal(&self) -> String {
        format!("{}|{}", self.issuer_dn.canonical(), self.serial)
    }
}

impl fmt::Display for AdminToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (serial {})", self.subject_dn, self.serial)
    }
}
