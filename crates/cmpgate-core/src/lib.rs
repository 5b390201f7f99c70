//! # cmpgate-core
//!
//! Core types for the cmpgate protocol-message authentication engine.
//!
//! The authentication pipeline in `cmpgate-auth` decides, for every inbound
//! CMP message, whether the message is authentic and whether its sender may
//! perform the administrative action it implies. This crate holds everything
//! that pipeline shares with the rest of a CA deployment:
//!
//! - **Data model** (`types`) -- protocol messages, trust anchors, end-entity
//!   records, profiles and the final [`AuthenticationOutcome`].
//! - **Ports** (`ports`) -- the collaborator traits the pipeline is given at
//!   construction (authorization, CA lookup, certificate store, end-entity
//!   store, profiles, vendor plugin, credential authenticator).
//! - **Access rules** (`access`) -- the resources checked against the
//!   authorization service.
//! - **Distinguished names** (`dn`) -- canonical DN strings and CA ids.
//! - **In-memory collaborators** (`memory`) -- reference implementations of
//!   every port, used by tests and embedders.

pub mod access;
pub mod dn;
pub mod error;
pub mod hash;
pub mod memory;
pub mod ports;
pub mod types;

pub use access::AccessResource;
pub use dn::{ca_id_from_dn, DistinguishedName, InvalidDn};
pub use error::{AuthError, Rejection, Result, StoreError, ValidityViolation};
pub use ports::{
    AuthorizationService, CaService, CertificateStore, Collaborators, CredentialAuthenticator,
    EndEntityStore, NoVendorMode, ProfileStore, VendorMode,
};
pub use types::*;
