//! # cmpgate-auth
//!
//! End-entity certificate authentication for CMP protocol messages.
//!
//! ## Pipeline
//!
//! ```text
//! message ──► protection? ──► mode (RA | vendor | client)
//!                                  │
//!             signer certificate ◄─┘
//!                    │
//!   (kur) end entity ├──► trust anchor ──► chain + rollover fallback
//!                    │
//!    RA: access rules │ client: ownership │ vendor: none
//!                    │
//!             signature ──► shared secret ──► AuthenticationOutcome
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use cmpgate_auth::{CmpConfig, EndEntityCertificateAuth};
//!
//! let config = CmpConfig::load(Path::new("cmp.toml"))?;
//! let module = EndEntityCertificateAuth::new("ra", &config, collaborators)?;
//! let outcome = module.authenticate(&message, false)?;
//! if let Some(secret) = outcome.shared_secret() {
//!     // protect the response with `secret`
//! }
//! ```

pub mod authorize;
pub mod cert;
pub mod config;
pub mod credentials;
pub mod error;
pub mod extract;
pub mod keyupdate;
pub mod mode;
pub mod module;
pub mod ownership;
pub mod secret;
pub mod signature;
pub mod trust;
pub mod username;
pub mod vendor;

#[cfg(test)]
mod testutil;

pub use cert::{CertificateParseError, ParsedCertificate};
pub use config::{CmpConfig, ConfigIssue, ModuleConfiguration, ProfileSelector};
pub use credentials::X509CredentialAuthenticator;
pub use error::{StepError, StepResult};
pub use mode::ResolvedMode;
pub use module::EndEntityCertificateAuth;
pub use trust::{TrustValidator, TrustVerdict};
pub use vendor::VendorCaList;
