//! Access rules checked against the authorization service.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A resource an administrator must be authorized to before the pipeline
/// lets a request through.
///
/// [`AccessResource::path`] is what the authorization service is asked about;
/// the `Display` form is the short rule name used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessResource {
    /// Create end entities (any profile)
    CreateEndEntity,
    /// Edit end entities (any profile)
    EditEndEntity,
    /// Revoke end entities
    RevokeEndEntity,
    /// Request certificate issuance
    CreateCertificate,
    /// Create end entities under a specific end-entity profile
    ProfileCreateEndEntity(i32),
    /// Edit end entities under a specific end-entity profile
    ProfileEditEndEntity(i32),
    /// Access to a CA
    CaAccess(i32),
}

impl AccessResource {
    /// Resource path handed to [`crate::AuthorizationService::is_authorized`].
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::CreateEndEntity => "/ra_functionality/create_end_entity".to_string(),
            Self::EditEndEntity => "/ra_functionality/edit_end_entity".to_string(),
            Self::RevokeEndEntity => "/ra_functionality/revoke_end_entity".to_string(),
            Self::CreateCertificate => "/ca_functionality/create_certificate".to_string(),
            Self::ProfileCreateEndEntity(id) => {
                format!("/endentityprofilesrules/{id}/create_end_entity")
            }
            Self::ProfileEditEndEntity(id) => format!("/endentityprofilesrules/{id}/edit_end_entity"),
            Self::CaAccess(id) => format!("/ca/{id}"),
        }
    }
}

impl fmt::Display for AccessResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateEndEntity => write!(f, "CREATE_END_ENTITY"),
            Self::EditEndEntity => write!(f, "EDIT_END_ENTITY"),
            Self::RevokeEndEntity => write!(f, "REVOKE_END_ENTITY"),
            Self::CreateCertificate => write!(f, "CREATE_CERTIFICATE"),
            Self::ProfileCreateEndEntity(id) => write!(f, "ENDENTITYPROFILE/{id}/CREATE_END_ENTITY"),
            Self::ProfileEditEndEntity(id) => write!(f, "ENDENTITYPROFILE/{id}/EDIT_END_ENTITY"),
            Self::CaAccess(id) => write!(f, "CAACCESS/{id}"),
        }
    }
}
