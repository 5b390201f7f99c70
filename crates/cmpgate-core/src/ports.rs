//! Collaborator ports.
//!
//! The pipeline owns no state of its own beyond one message; everything it
//! consults lives behind these traits and is handed over at construction in
//! a [`Collaborators`] bundle. Implementations must be thread-safe, since
//! concurrent messages run concurrent pipelines over the same collaborators.

use std::sync::Arc;

use crate::dn::DistinguishedName;
use crate::error::StoreError;
use crate::types::{
    AdminToken, Certificate, CertificateInfo, CertificateProfile, EndEntityProfile,
    EndEntityRecord, RequestType, TrustAnchor,
};

/// Answers whether an administrator holds a right.
///
/// "Denied" is a normal `false`, never an error.
pub trait AuthorizationService: Send + Sync {
    /// Whether `admin` is authorized to `resource_path`.
    fn is_authorized(&self, admin: &AdminToken, resource_path: &str) -> bool;
}

/// Read access to the configured CAs.
pub trait CaService: Send + Sync {
    /// Look up a CA by name.
    ///
    /// # Errors
    /// `NotFound`, `AuthorizationDenied` when the CA may not be used, or `Unavailable`.
    fn trust_anchor_by_name(&self, name: &str) -> Result<TrustAnchor, StoreError>;

    /// Look up a CA by id.
    fn trust_anchor_by_id(&self, ca_id: i32) -> Result<TrustAnchor, StoreError>;

    /// Look up a CA by the hash of its subject DN (see [`crate::ca_id_from_dn`]).
    fn trust_anchor_by_issuer_hash(&self, issuer_hash: i32) -> Result<TrustAnchor, StoreError>;
}

/// Read access to issued certificates.
pub trait CertificateStore: Send + Sync {
    /// Status and owner of a certificate by SHA-256 fingerprint.
    fn find_certificate_info(&self, fingerprint: &str)
        -> Result<Option<CertificateInfo>, StoreError>;

    /// Status and owner of a certificate by issuer DN and serial (hex).
    fn find_certificate_info_by_serial(
        &self,
        issuer_dn: &DistinguishedName,
        serial: &str,
    ) -> Result<Option<CertificateInfo>, StoreError>;

    /// Every certificate ever issued with the given subject DN, including
    /// earlier CA certificates kept across a key rollover.
    fn find_certificates_by_subject_dn(
        &self,
        subject_dn: &DistinguishedName,
    ) -> Result<Vec<Certificate>, StoreError>;
}

/// Access to end-entity records.
pub trait EndEntityStore: Send + Sync {
    /// Find by username.
    fn find_by_username(&self, username: &str) -> Result<Option<EndEntityRecord>, StoreError>;

    /// Every record with the given subject DN.
    fn find_by_subject_dn(
        &self,
        subject_dn: &DistinguishedName,
    ) -> Result<Vec<EndEntityRecord>, StoreError>;

    /// Every record with the given subject and issuer DN.
    fn find_by_subject_and_issuer_dn(
        &self,
        subject_dn: &DistinguishedName,
        issuer_dn: &DistinguishedName,
    ) -> Result<Vec<EndEntityRecord>, StoreError>;

    /// Persist a new password for the record's user.
    fn set_password(&self, username: &str, password: &str) -> Result<(), StoreError>;
}

/// Read access to profiles.
pub trait ProfileStore: Send + Sync {
    /// Resolve an end-entity profile name to its id.
    fn end_entity_profile_id(&self, name: &str) -> Result<Option<i32>, StoreError>;

    /// Load an end-entity profile.
    fn end_entity_profile(&self, id: i32) -> Result<Option<EndEntityProfile>, StoreError>;

    /// Resolve a certificate profile name to its id.
    fn certificate_profile_id(&self, name: &str) -> Result<Option<i32>, StoreError>;

    /// Load a certificate profile.
    fn certificate_profile(&self, id: i32) -> Result<Option<CertificateProfile>, StoreError>;
}

/// Vendor-mode plugin.
///
/// Vendor mode lets a device present a certificate from its manufacturer's
/// CA to bootstrap its first enrollment.
pub trait VendorMode: Send + Sync {
    /// Whether this message should be handled as vendor traffic.
    fn is_vendor_traffic(&self, request_type: RequestType, alias: &str) -> bool;

    /// The vendor CA trusted on `alias` that issued the attached chain, if any.
    fn resolve_vendor_trust_anchor(
        &self,
        alias: &str,
        signer_chain: &[Certificate],
    ) -> Option<TrustAnchor>;
}

/// Vendor plugin that never triggers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVendorMode;

impl VendorMode for NoVendorMode {
    fn is_vendor_traffic(&self, _request_type: RequestType, _alias: &str) -> bool {
        false
    }

    fn resolve_vendor_trust_anchor(
        &self,
        _alias: &str,
        _signer_chain: &[Certificate],
    ) -> Option<TrustAnchor> {
        None
    }
}

/// Turns a certificate into an administrator identity.
pub trait CredentialAuthenticator: Send + Sync {
    /// Authenticate the certificate holder.
    ///
    /// # Errors
    /// `NotFound`/`AuthorizationDenied` when the certificate is no administrator credential.
    fn authenticate(&self, certificate: &Certificate) -> Result<AdminToken, StoreError>;
}

/// Everything the pipeline consults, bundled for construction.
#[derive(Clone)]
pub struct Collaborators {
    /// Authorization service
    pub authorization: Arc<dyn AuthorizationService>,
    /// CA service
    pub cas: Arc<dyn CaService>,
    /// Certificate store
    pub certificates: Arc<dyn CertificateStore>,
    /// End-entity store
    pub end_entities: Arc<dyn EndEntityStore>,
    /// Profile store
    pub profiles: Arc<dyn ProfileStore>,
    /// Credential authenticator
    pub credentials: Arc<dyn CredentialAuthenticator>,
    /// Vendor-mode plugin
    pub vendor: Arc<dyn VendorMode>,
}

impl Collaborators {
    /// Bundle collaborators with vendor mode disabled.
    #[must_use]
    pub fn new(
        authorization: Arc<dyn AuthorizationService>,
        cas: Arc<dyn CaService>,
        certificates: Arc<dyn CertificateStore>,
        end_entities: Arc<dyn EndEntityStore>,
        profiles: Arc<dyn ProfileStore>,
        credentials: Arc<dyn CredentialAuthenticator>,
    ) -> Self {
        Self {
            authorization,
            cas,
            certificates,
            end_entities,
            profiles,
            credentials,
            vendor: Arc::new(NoVendorMode),
        }
    }

    /// Install a vendor-mode plugin.
    #[must_use]
    pub fn with_vendor_mode(mut self, vendor: Arc<dyn VendorMode>) -> Self {
        self.vendor = vendor;
        self
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
