//! Trust anchors: the CAs configured in the CA subsystem.

use serde::{Deserialize, Serialize};

use super::Certificate;
use crate::dn::DistinguishedName;

/// Operational status of a CA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaStatus {
    /// Issuing
    Active,
    /// CA certificate has expired
    Expired,
    /// Taken offline by an operator
    Offline,
}

/// A configured CA whose certificate chain roots trust decisions.
///
/// Owned by the CA subsystem; read-only to the authentication pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustAnchor {
    /// CA id
    pub id: i32,
    /// CA name
    pub name: String,
    /// Subject DN of the CA certificate
    pub subject_dn: DistinguishedName,
    /// Certificate chain, root first, the CA's own certificate last
    pub certificate_chain: Vec<Certificate>,
    /// Operational status
    pub status: CaStatus,
}

impl TrustAnchor {
    /// Build an anchor whose id is derived from its subject DN.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        subject_dn: DistinguishedName,
        certificate_chain: Vec<Certificate>,
    ) -> Self {
        Self {
            id: subject_dn.ca_id(),
            name: name.into(),
            subject_dn,
            certificate_chain,
            status: CaStatus::Active,
        }
    }

    /// The CA's own certificate (last entry of the chain).
    #[must_use]
    pub fn ca_certificate(&self) -> Option<&Certificate> {
        self.certificate_chain.last()
    }

    /// Set the status.
    #[must_use]
    pub fn with_status(mut self, status: CaStatus) -> Self {
        self.status = status;
        self
    }
}
