//! In-memory collaborators.
//!
//! Reference implementations of every port, backed by `RwLock`ed maps.
//! Useful for tests and for embedding the pipeline without a database.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

use crate::dn::DistinguishedName;
use crate::error::StoreError;
use crate::ports::{AuthorizationService, CaService, CertificateStore, EndEntityStore, ProfileStore};
use crate::types::{
    AdminToken, Certificate, CertificateInfo, CertificateProfile, EndEntityProfile,
    EndEntityRecord, TrustAnchor,
};

fn poisoned() -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}

/// Authorization backed by per-administrator path grants.
///
/// A granted path covers itself and everything beneath it, so granting `/ca`
/// authorizes `/ca/17`, and granting `/` authorizes everything.
#[derive(Debug, Default)]
pub struct MemoryAuthorization {
    grants: RwLock<HashMap<String, Vec<String>>>,
}

impl MemoryAuthorization {
    /// Create an empty authorization table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `path` to the administrator.
    pub fn grant(&self, admin: &AdminToken, path: impl Into<String>) {
        if let Ok(mut grants) = self.grants.write() {
            grants.entry(admin.principal()).or_default().push(path.into());
        }
    }

    /// Grant several paths at once.
    pub fn grant_all<I, S>(&self, admin: &AdminToken, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for path in paths {
            self.grant(admin, path);
        }
    }
}

fn path_covers(granted: &str, resource: &str) -> bool {
    if granted == "/" || granted == resource {
        return true;
    }
    resource
        .strip_prefix(granted)
        .is_some_and(|rest| rest.starts_with('/'))
}

impl AuthorizationService for MemoryAuthorization {
    fn is_authorized(&self, admin: &AdminToken, resource_path: &str) -> bool {
        let Ok(grants) = self.grants.read() else {
            return false;
        };
        let allowed = grants
            .get(&admin.principal())
            .is_some_and(|paths| paths.iter().any(|p| path_covers(p, resource_path)));
        debug!(admin = %admin, resource = resource_path, allowed, "authorization check");
        allowed
    }
}

/// CA service over a list of anchors.
#[derive(Debug, Default)]
pub struct MemoryCaService {
    anchors: RwLock<Vec<TrustAnchor>>,
    denied: RwLock<Vec<String>>,
}

impl MemoryCaService {
    /// Create an empty CA service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a CA, replacing one of the same name.
    pub fn add(&self, anchor: TrustAnchor) {
        if let Ok(mut anchors) = self.anchors.write() {
            anchors.retain(|a| a.name != anchor.name);
            anchors.push(anchor);
        }
    }

    /// Make lookups of the named CA fail with `AuthorizationDenied`.
    pub fn deny(&self, name: impl Into<String>) {
        if let Ok(mut denied) = self.denied.write() {
            denied.push(name.into());
        }
    }

    fn find(&self, pred: impl Fn(&TrustAnchor) -> bool) -> Result<Option<TrustAnchor>, StoreError> {
        let anchors = self.anchors.read().map_err(|_| poisoned())?;
        Ok(anchors.iter().find(|a| pred(a)).cloned())
    }

    fn check_denied(&self, anchor: TrustAnchor) -> Result<TrustAnchor, StoreError> {
        let denied = self.denied.read().map_err(|_| poisoned())?;
        if denied.iter().any(|n| *n == anchor.name) {
            return Err(StoreError::AuthorizationDenied(anchor.name));
        }
        Ok(anchor)
    }
}

impl CaService for MemoryCaService {
    fn trust_anchor_by_name(&self, name: &str) -> Result<TrustAnchor, StoreError> {
        let anchor = self
            .find(|a| a.name == name)?
            .ok_or_else(|| StoreError::NotFound(format!("CA '{name}'")))?;
        self.check_denied(anchor)
    }

    fn trust_anchor_by_id(&self, ca_id: i32) -> Result<TrustAnchor, StoreError> {
        let anchor = self
            .find(|a| a.id == ca_id)?
            .ok_or_else(|| StoreError::NotFound(format!("CA id {ca_id}")))?;
        self.check_denied(anchor)
    }

    fn trust_anchor_by_issuer_hash(&self, issuer_hash: i32) -> Result<TrustAnchor, StoreError> {
        let anchor = self
            .find(|a| a.subject_dn.ca_id() == issuer_hash)?
            .ok_or_else(|| StoreError::NotFound(format!("CA with issuer hash {issuer_hash}")))?;
        self.check_denied(anchor)
    }
}

/// Certificate store over in-memory records.
#[derive(Debug, Default)]
pub struct MemoryCertificateStore {
    infos: RwLock<HashMap<String, CertificateInfo>>,
    by_subject: RwLock<Vec<(DistinguishedName, Certificate)>>,
}

impl MemoryCertificateStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record status and owner of an issued certificate.
    pub fn add_info(&self, info: CertificateInfo) {
        if let Ok(mut infos) = self.infos.write() {
            infos.insert(info.fingerprint.clone(), info);
        }
    }

    /// Record a certificate under its subject DN (used for rollover lookups).
    pub fn add_certificate(&self, subject_dn: DistinguishedName, certificate: Certificate) {
        if let Ok(mut certs) = self.by_subject.write() {
            certs.push((subject_dn, certificate));
        }
    }
}

impl CertificateStore for MemoryCertificateStore {
    fn find_certificate_info(
        &self,
        fingerprint: &str,
    ) -> Result<Option<CertificateInfo>, StoreError> {
        let infos = self.infos.read().map_err(|_| poisoned())?;
        Ok(infos.get(fingerprint).cloned())
    }

    fn find_certificate_info_by_serial(
        &self,
        issuer_dn: &DistinguishedName,
        serial: &str,
    ) -> Result<Option<CertificateInfo>, StoreError> {
        let infos = self.infos.read().map_err(|_| poisoned())?;
        Ok(infos
            .values()
            .find(|i| {
                i.serial.eq_ignore_ascii_case(serial)
                    && DistinguishedName::parse(&i.issuer_dn).is_ok_and(|dn| dn == *issuer_dn)
            })
            .cloned())
    }

    fn find_certificates_by_subject_dn(
        &self,
        subject_dn: &DistinguishedName,
    ) -> Result<Vec<Certificate>, StoreError> {
        let certs = self.by_subject.read().map_err(|_| poisoned())?;
        Ok(certs
            .iter()
            .filter(|(dn, _)| dn == subject_dn)
            .map(|(_, c)| c.clone())
            .collect())
    }
}

/// End-entity store over an in-memory map keyed by username.
#[derive(Debug, Default)]
pub struct MemoryEndEntityStore {
    records: RwLock<HashMap<String, EndEntityRecord>>,
}

impl MemoryEndEntityStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record.
    pub fn insert(&self, record: EndEntityRecord) {
        if let Ok(mut records) = self.records.write() {
            records.insert(record.username.clone(), record);
        }
    }

    fn filter(
        &self,
        pred: impl Fn(&EndEntityRecord) -> bool,
    ) -> Result<Vec<EndEntityRecord>, StoreError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        let mut found: Vec<EndEntityRecord> = records.values().filter(|r| pred(r)).cloned().collect();
        found.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(found)
    }
}

impl EndEntityStore for MemoryEndEntityStore {
    fn find_by_username(&self, username: &str) -> Result<Option<EndEntityRecord>, StoreError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.get(username).cloned())
    }

    fn find_by_subject_dn(
        &self,
        subject_dn: &DistinguishedName,
    ) -> Result<Vec<EndEntityRecord>, StoreError> {
        self.filter(|r| r.subject_dn == *subject_dn)
    }

    fn find_by_subject_and_issuer_dn(
        &self,
        subject_dn: &DistinguishedName,
        issuer_dn: &DistinguishedName,
    ) -> Result<Vec<EndEntityRecord>, StoreError> {
        self.filter(|r| r.subject_dn == *subject_dn && r.issuer_dn == *issuer_dn)
    }

    fn set_password(&self, username: &str, password: &str) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let record = records
            .get_mut(username)
            .ok_or_else(|| StoreError::NotFound(format!("end entity '{username}'")))?;
        record.password = Some(password.to_string());
        Ok(())
    }
}

/// Profile store over in-memory maps.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    end_entity_profiles: RwLock<HashMap<i32, EndEntityProfile>>,
    certificate_profiles: RwLock<HashMap<i32, CertificateProfile>>,
}

impl MemoryProfileStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an end-entity profile.
    pub fn add_end_entity_profile(&self, profile: EndEntityProfile) {
        if let Ok(mut profiles) = self.end_entity_profiles.write() {
            profiles.insert(profile.id, profile);
        }
    }

    /// Register a certificate profile.
    pub fn add_certificate_profile(&self, profile: CertificateProfile) {
        if let Ok(mut profiles) = self.certificate_profiles.write() {
            profiles.insert(profile.id, profile);
        }
    }
}

impl ProfileStore for MemoryProfileStore {
    fn end_entity_profile_id(&self, name: &str) -> Result<Option<i32>, StoreError> {
        let profiles = self.end_entity_profiles.read().map_err(|_| poisoned())?;
        Ok(profiles.values().find(|p| p.name == name).map(|p| p.id))
    }

    fn end_entity_profile(&self, id: i32) -> Result<Option<EndEntityProfile>, StoreError> {
        let profiles = self.end_entity_profiles.read().map_err(|_| poisoned())?;
        Ok(profiles.get(&id).cloned())
    }

    fn certificate_profile_id(&self, name: &str) -> Result<Option<i32>, StoreError> {
        let profiles = self.certificate_profiles.read().map_err(|_| poisoned())?;
        Ok(profiles.values().find(|p| p.name == name).map(|p| p.id))
    }

    fn certificate_profile(&self, id: i32) -> Result<Option<CertificateProfile>, StoreError> {
        let profiles = self.certificate_profiles.read().map_err(|_| poisoned())?;
        Ok(profiles.get(&id).cloned())
    }
}
