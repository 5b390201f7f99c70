//! End-entity and certificate profiles, as far as authorization needs them.

use serde::{Deserialize, Serialize};

/// Wildcard entry in [`CertificateProfile::available_cas`].
pub const ANY_CA: i32 = -1;

/// Id of the built-in default end-entity profile.
pub const EMPTY_END_ENTITY_PROFILE: i32 = 1;

/// End-entity profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndEntityProfile {
    /// Profile id
    pub id: i32,
    /// Profile name
    pub name: String,
    /// CA used when the request does not pick one
    pub default_ca_id: i32,
    /// Certificate profile used when the request does not pick one
    pub default_certificate_profile_id: i32,
}

/// Certificate profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateProfile {
    /// Profile id
    pub id: i32,
    /// Profile name
    pub name: String,
    /// CAs allowed to issue under this profile; [`ANY_CA`] allows all
    pub available_cas: Vec<i32>,
}

impl CertificateProfile {
    /// Whether the given CA may issue under this profile.
    #[must_use]
    pub fn authorizes_ca(&self, ca_id: i32) -> bool {
        self.available_cas
            .iter()
            .any(|&id| id == ca_id || id == ANY_CA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(cas: Vec<i32>) -> CertificateProfile {
        CertificateProfile {
            id: 10,
            name: "ENDUSER".into(),
            available_cas: cas,
        }
    }

    #[test]
    fn listed_ca_is_authorized() {
        assert!(profile(vec![5, 6]).authorizes_ca(6));
        assert!(!profile(vec![5, 6]).authorizes_ca(7));
    }

    #[test]
    fn wildcard_authorizes_every_ca() {
        assert!(profile(vec![ANY_CA]).authorizes_ca(123_456));
    }

    #[test]
    fn empty_list_authorizes_nothing() {
        assert!(!profile(vec![]).authorizes_ca(1));
    }
}
