//! Core data model.

mod admin;
mod anchor;
mod certificate;
mod end_entity;
mod message;
mod outcome;
mod profile;

pub use admin::AdminToken;
pub use anchor::{CaStatus, TrustAnchor};
pub use certificate::{Certificate, CertificateInfo, CertificateStatus};
pub use end_entity::EndEntityRecord;
pub use message::{
    CertTemplate, ProtectionAlgorithm, ProtocolMessage, RequestBody, RequestType,
    RevocationTarget,
};
pub use outcome::{AuthMode, AuthenticationOutcome};
pub use profile::{CertificateProfile, EndEntityProfile, ANY_CA, EMPTY_END_ENTITY_PROFILE};
