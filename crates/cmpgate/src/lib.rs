//! Authentication and authorization of CMP protocol messages signed with
//! end-entity certificates.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use cmpgate::memory::*;
//! use cmpgate::{CmpConfig, Collaborators, EndEntityCertificateAuth, X509CredentialAuthenticator};
//!
//! let config = CmpConfig::load(Path::new("/etc/cmpgate/cmp.toml"))?;
//! let collaborators = Collaborators::new(
//!     Arc::new(MemoryAuthorization::new()),
//!     Arc::new(MemoryCaService::new()),
//!     Arc::new(MemoryCertificateStore::new()),
//!     Arc::new(MemoryEndEntityStore::new()),
//!     Arc::new(MemoryProfileStore::new()),
//!     Arc::new(X509CredentialAuthenticator),
//! );
//!
//! let module = EndEntityCertificateAuth::new("ra", &config, collaborators)?;
//! let outcome = module.authenticate(&message, false)?;
//! match outcome.shared_secret() {
//!     Some(secret) => issue_response(secret),
//!     None => send_error(&outcome.error_message().unwrap_or_default()),
//! }
//! ```

// Re-export core types
pub use cmpgate_core::*;

// Re-export the pipeline
pub use cmpgate_auth::{
    CmpConfig, ConfigIssue, EndEntityCertificateAuth, ModuleConfiguration, ParsedCertificate,
    ProfileSelector, TrustValidator, TrustVerdict, VendorCaList, X509CredentialAuthenticator,
};

/// The individual pipeline steps.
pub use cmpgate_auth as auth;
