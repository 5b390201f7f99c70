//! End-entity records.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dn::DistinguishedName;

/// An existing managed identity, as kept by the end-entity store.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndEntityRecord {
    /// Unique username
    pub username: String,
    /// Subject DN
    pub subject_dn: DistinguishedName,
    /// DN of the issuing CA
    pub issuer_dn: DistinguishedName,
    /// Issuing CA id
    pub ca_id: i32,
    /// Certificate profile id
    pub certificate_profile_id: i32,
    /// End-entity profile id
    pub end_entity_profile_id: i32,
    /// Enrollment password, if one is set
    pub password: Option<String>,
}

impl fmt::Debug for EndEntityRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndEntityRecord")
            .field("username", &self.username)
            .field("subject_dn", &self.subject_dn.canonical())
            .field("issuer_dn", &self.issuer_dn.canonical())
            .field("ca_id", &self.ca_id)
            .field("certificate_profile_id", &self.certificate_profile_id)
            .field("end_entity_profile_id", &self.end_entity_profile_id)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
