//! Administrator rights checks for RA requests.
//!
//! Each request type maps to a fixed set of access rules. The first missing
//! rule rejects the request and is named in the rejection, so operators can
//! see which grant the RA lacks.

use cmpgate_core::{
    AccessResource, AdminToken, AuthError, CertificateProfile, Collaborators, DistinguishedName,
    EndEntityProfile, EndEntityRecord, ProtocolMessage, Rejection, RequestBody,
    RevocationTarget, StoreError, EMPTY_END_ENTITY_PROFILE,
};
use tracing::{debug, info};

use crate::config::{ModuleConfiguration, ProfileSelector};
use crate::error::{StepError, StepResult};

/// Checks an RA administrator's rights for one message.
pub struct RaAuthorizer<'a> {
    collaborators: &'a Collaborators,
    config: &'a ModuleConfiguration,
    admin: &'a AdminToken,
}

impl<'a> RaAuthorizer<'a> {
    /// Authorizer for `admin`.
    pub const fn new(
        collaborators: &'a Collaborators,
        config: &'a ModuleConfiguration,
        admin: &'a AdminToken,
    ) -> Self {
        Self {
            collaborators,
            config,
            admin,
        }
    }

    /// Check every right the message implies. `bound` is the end entity a
    /// key update renews.
    pub fn authorize(
        &self,
        message: &ProtocolMessage,
        bound: Option<&EndEntityRecord>,
    ) -> StepResult<()> {
        match message.body() {
            RequestBody::Certification(_) | RequestBody::Initialization(_) => {
                self.authorize_enrollment(message)
            }
            RequestBody::KeyUpdate(_) => {
                let record = bound.ok_or(Rejection::NoSuchEndEntity)?;
                self.authorize_key_update(record)
            }
            RequestBody::Revocation(target) => self.authorize_revocation(target),
        }
    }

    fn authorize_enrollment(&self, message: &ProtocolMessage) -> StepResult<()> {
        let profile = self.end_entity_profile(message)?;
        self.require(AccessResource::CreateEndEntity)?;
        self.require(AccessResource::ProfileCreateEndEntity(profile.id))?;
        self.require(AccessResource::EditEndEntity)?;
        self.require(AccessResource::ProfileEditEndEntity(profile.id))?;
        self.require(AccessResource::CreateCertificate)?;

        let ca_id = self.ca_id(message, &profile)?;
        self.require(AccessResource::CaAccess(ca_id))?;

        let cert_profile = self.certificate_profile(message, &profile)?;
        ensure_profile_allows_ca(&cert_profile, ca_id)
    }

    /// Renewal is checked against what the end entity already has, never
    /// against what the request asks for.
    fn authorize_key_update(&self, record: &EndEntityRecord) -> StepResult<()> {
        self.require(AccessResource::EditEndEntity)?;
        self.require(AccessResource::ProfileEditEndEntity(record.end_entity_profile_id))?;
        self.require(AccessResource::CreateCertificate)?;
        self.require(AccessResource::CaAccess(record.ca_id))?;

        let cert_profile = self
            .collaborators
            .profiles
            .certificate_profile(record.certificate_profile_id)
            .map_err(|e| StepError::backend("profile store", &e))?
            .ok_or_else(|| {
                AuthError::Config(format!(
                    "certificate profile {} of end entity '{}' does not exist",
                    record.certificate_profile_id, record.username
                ))
            })?;
        ensure_profile_allows_ca(&cert_profile, record.ca_id)
    }

    fn authorize_revocation(&self, target: &RevocationTarget) -> StepResult<()> {
        let issuer = target
            .issuer_dn
            .as_deref()
            .and_then(|s| DistinguishedName::parse(s).ok())
            .filter(|dn| !dn.is_empty())
            .ok_or(Rejection::InvalidRevocationTarget)?;
        let ca_id = issuer.ca_id();
        debug!(issuer = %issuer, ca_id, "revocation targets CA");
        self.require(AccessResource::CaAccess(ca_id))?;
        self.require(AccessResource::RevokeEndEntity)
    }

    fn require(&self, resource: AccessResource) -> StepResult<()> {
        if self
            .collaborators
            .authorization
            .is_authorized(self.admin, &resource.path())
        {
            Ok(())
        } else {
            info!(admin = %self.admin, resource = %resource, "administrator not authorized");
            Err(Rejection::NotAuthorized(resource).into())
        }
    }

    fn sender_key_id<'m>(message: &'m ProtocolMessage) -> StepResult<&'m str> {
        message
            .sender_key_id()
            .ok_or_else(|| Rejection::MissingSenderKeyId.into())
    }

    fn end_entity_profile(&self, message: &ProtocolMessage) -> StepResult<EndEntityProfile> {
        let profiles = &self.collaborators.profiles;
        let backend = |e: StoreError| StepError::backend("profile store", &e);

        let (id, missing): (i32, StepError) = match &self.config.end_entity_profile {
            ProfileSelector::KeyId => {
                let kid = Self::sender_key_id(message)?;
                let id = profiles
                    .end_entity_profile_id(kid)
                    .map_err(backend)?
                    .ok_or_else(|| Rejection::UnknownProfile(kid.to_string()))?;
                (id, Rejection::UnknownProfile(kid.to_string()).into())
            }
            ProfileSelector::ProfileDefault => (
                EMPTY_END_ENTITY_PROFILE,
                AuthError::Config(format!(
                    "default end entity profile {EMPTY_END_ENTITY_PROFILE} does not exist"
                ))
                .into(),
            ),
            ProfileSelector::Named(name) => {
                let id = profiles
                    .end_entity_profile_id(name)
                    .map_err(backend)?
                    .ok_or_else(|| {
                        AuthError::Config(format!("end entity profile '{name}' does not exist"))
                    })?;
                (
                    id,
                    AuthError::Config(format!("end entity profile '{name}' does not exist")).into(),
                )
            }
        };

        profiles.end_entity_profile(id).map_err(backend)?.ok_or(missing)
    }

    fn ca_id(&self, message: &ProtocolMessage, profile: &EndEntityProfile) -> StepResult<i32> {
        let cas = &self.collaborators.cas;
        match &self.config.ca {
            ProfileSelector::ProfileDefault => {
                let ca_id = profile.default_ca_id;
                match cas.trust_anchor_by_id(ca_id) {
                    Ok(anchor) => Ok(anchor.id),
                    Err(StoreError::NotFound(_)) => Err(AuthError::ProfileReferencesUnknownCa {
                        profile_id: profile.id,
                        ca_id,
                    }
                    .into()),
                    Err(StoreError::AuthorizationDenied(_)) => {
                        Err(Rejection::NotAuthorized(AccessResource::CaAccess(ca_id)).into())
                    }
                    Err(e) => Err(StepError::backend("CA service", &e)),
                }
            }
            ProfileSelector::KeyId => {
                let kid = Self::sender_key_id(message)?;
                match cas.trust_anchor_by_name(kid) {
                    Ok(anchor) => Ok(anchor.id),
                    Err(StoreError::NotFound(_)) => Err(Rejection::UnknownCa(kid.to_string()).into()),
                    Err(StoreError::AuthorizationDenied(_)) => {
                        Err(Rejection::CaAccessDenied(kid.to_string()).into())
                    }
                    Err(e) => Err(StepError::backend("CA service", &e)),
                }
            }
            ProfileSelector::Named(name) => match cas.trust_anchor_by_name(name) {
                Ok(anchor) => Ok(anchor.id),
                Err(StoreError::NotFound(_)) => {
                    Err(AuthError::Config(format!("CA '{name}' does not exist")).into())
                }
                Err(StoreError::AuthorizationDenied(_)) => {
                    Err(Rejection::CaAccessDenied(name.clone()).into())
                }
                Err(e) => Err(StepError::backend("CA service", &e)),
            },
        }
    }

    fn certificate_profile(
        &self,
        message: &ProtocolMessage,
        profile: &EndEntityProfile,
    ) -> StepResult<CertificateProfile> {
        let profiles = &self.collaborators.profiles;
        let backend = |e: StoreError| StepError::backend("profile store", &e);

        let (id, missing): (i32, StepError) = match &self.config.certificate_profile {
            ProfileSelector::ProfileDefault => (
                profile.default_certificate_profile_id,
                AuthError::Config(format!(
                    "end entity profile {} references unknown certificate profile {}",
                    profile.id, profile.default_certificate_profile_id
                ))
                .into(),
            ),
            ProfileSelector::KeyId => {
                let kid = Self::sender_key_id(message)?;
                let id = profiles
                    .certificate_profile_id(kid)
                    .map_err(backend)?
                    .ok_or_else(|| Rejection::UnknownProfile(kid.to_string()))?;
                (id, Rejection::UnknownProfile(kid.to_string()).into())
            }
            ProfileSelector::Named(name) => {
                let id = profiles
                    .certificate_profile_id(name)
                    .map_err(backend)?
                    .ok_or_else(|| {
                        AuthError::Config(format!("certificate profile '{name}' does not exist"))
                    })?;
                (
                    id,
                    AuthError::Config(format!("certificate profile '{name}' does not exist"))
                        .into(),
                )
            }
        };

        profiles.certificate_profile(id).map_err(backend)?.ok_or(missing)
    }
}

fn ensure_profile_allows_ca(profile: &CertificateProfile, ca_id: i32) -> StepResult<()> {
    if profile.authorizes_ca(ca_id) {
        Ok(())
    } else {
        info!(profile = %profile.name, ca_id, "certificate profile does not allow CA");
        Err(Rejection::CaNotAuthorizedForProfile {
            ca_id,
            profile_id: profile.id,
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::credentials::X509CredentialAuthenticator;
    use cmpgate_core::memory::{
        MemoryAuthorization, MemoryCaService, MemoryCertificateStore, MemoryEndEntityStore,
        MemoryProfileStore,
    };
    use cmpgate_core::{CertTemplate, TrustAnchor, ANY_CA};

    struct Fixture {
        auth: Arc<MemoryAuthorization>,
        profiles: Arc<MemoryProfileStore>,
        collaborators: Collaborators,
        admin: AdminToken,
        ca_id: i32,
    }

    fn fixture() -> Fixture {
        let auth = Arc::new(MemoryAuthorization::new());
        let cas = Arc::new(MemoryCaService::new());
        let profiles = Arc::new(MemoryProfileStore::new());

        let ca_dn = DistinguishedName::parse("CN=TestCA,O=Org").unwrap();
        let ca_id = ca_dn.ca_id();
        cas.add(TrustAnchor::new("TestCA", ca_dn, vec![]));

        profiles.add_end_entity_profile(EndEntityProfile {
            id: EMPTY_END_ENTITY_PROFILE,
            name: "EMPTY".into(),
            default_ca_id: ca_id,
            default_certificate_profile_id: 1,
        });
        profiles.add_end_entity_profile(EndEntityProfile {
            id: 7,
            name: "ROUTERS".into(),
            default_ca_id: ca_id,
            default_certificate_profile_id: 9,
        });
        profiles.add_certificate_profile(CertificateProfile {
            id: 1,
            name: "ENDUSER".into(),
            available_cas: vec![ANY_CA],
        });
        profiles.add_certificate_profile(CertificateProfile {
            id: 9,
            name: "ROUTER".into(),
            available_cas: vec![12345],
        });

        let collaborators = Collaborators::new(
            auth.clone(),
            cas,
            Arc::new(MemoryCertificateStore::new()),
            Arc::new(MemoryEndEntityStore::new()),
            profiles.clone(),
            Arc::new(X509CredentialAuthenticator),
        );

        Fixture {
            auth,
            profiles,
            collaborators,
            admin: AdminToken {
                subject_dn: DistinguishedName::parse("CN=RA").unwrap(),
                issuer_dn: DistinguishedName::parse("CN=ManagementCA").unwrap(),
                serial: "01".into(),
                fingerprint: "aa".into(),
            },
            ca_id,
        }
    }

    fn grant_enrollment(f: &Fixture, profile_id: i32) {
        f.auth.grant_all(
            &f.admin,
            [
                AccessResource::CreateEndEntity.path(),
                AccessResource::EditEndEntity.path(),
                AccessResource::CreateCertificate.path(),
                AccessResource::ProfileCreateEndEntity(profile_id).path(),
                AccessResource::ProfileEditEndEntity(profile_id).path(),
            ],
        );
    }

    fn enrollment() -> ProtocolMessage {
        ProtocolMessage::new(RequestBody::Initialization(CertTemplate::default()), vec![])
    }

    #[test]
    fn enrollment_needs_ca_access() {
        let f = fixture();
        let config = ModuleConfiguration::ra("TestCA");
        grant_enrollment(&f, EMPTY_END_ENTITY_PROFILE);
        let authorizer = RaAuthorizer::new(&f.collaborators, &config, &f.admin);

        let err = authorizer.authorize(&enrollment(), None).unwrap_err();
        match err {
            StepError::Rejected(r) => assert_eq!(
                r.to_string(),
                format!("not authorized to resource CAACCESS/{}", f.ca_id)
            ),
            StepError::Fatal(e) => panic!("unexpected fatal error {e}"),
        }

        f.auth.grant(&f.admin, AccessResource::CaAccess(f.ca_id).path());
        assert!(authorizer.authorize(&enrollment(), None).is_ok());
    }

    #[test]
    fn enrollment_by_key_id() {
        let f = fixture();
        let config = ModuleConfiguration {
            end_entity_profile: ProfileSelector::KeyId,
            ..ModuleConfiguration::ra("TestCA")
        };
        grant_enrollment(&f, 7);
        f.auth.grant(&f.admin, "/ca");
        let authorizer = RaAuthorizer::new(&f.collaborators, &config, &f.admin);

        // ROUTER certificate profile does not allow TestCA.
        let msg = enrollment().with_sender_key_id("ROUTERS");
        let err = authorizer.authorize(&msg, None).unwrap_err();
        assert!(matches!(
            err,
            StepError::Rejected(Rejection::CaNotAuthorizedForProfile { profile_id: 9, .. })
        ));

        f.profiles.add_certificate_profile(CertificateProfile {
            id: 9,
            name: "ROUTER".into(),
            available_cas: vec![f.ca_id],
        });
        assert!(authorizer.authorize(&msg, None).is_ok());

        let err = authorizer.authorize(&enrollment(), None).unwrap_err();
        assert!(matches!(err, StepError::Rejected(Rejection::MissingSenderKeyId)));

        let err = authorizer
            .authorize(&enrollment().with_sender_key_id("NOPE"), None)
            .unwrap_err();
        assert!(matches!(err, StepError::Rejected(Rejection::UnknownProfile(_))));
    }

    #[test]
    fn profile_pointing_at_missing_ca_is_fatal() {
        let f = fixture();
        f.profiles.add_end_entity_profile(EndEntityProfile {
            id: EMPTY_END_ENTITY_PROFILE,
            name: "EMPTY".into(),
            default_ca_id: 4711,
            default_certificate_profile_id: 1,
        });
        grant_enrollment(&f, EMPTY_END_ENTITY_PROFILE);
        let config = ModuleConfiguration::ra("TestCA");
        let authorizer = RaAuthorizer::new(&f.collaborators, &config, &f.admin);
        let err = authorizer.authorize(&enrollment(), None).unwrap_err();
        assert!(matches!(
            err,
            StepError::Fatal(AuthError::ProfileReferencesUnknownCa { ca_id: 4711, .. })
        ));
    }

    #[test]
    fn fixed_profile_name_must_exist() {
        let f = fixture();
        let config = ModuleConfiguration {
            end_entity_profile: ProfileSelector::Named("MISSING".into()),
            ..ModuleConfiguration::ra("TestCA")
        };
        let authorizer = RaAuthorizer::new(&f.collaborators, &config, &f.admin);
        let err = authorizer.authorize(&enrollment(), None).unwrap_err();
        assert!(matches!(err, StepError::Fatal(e) if e.is_config_error()));
    }

    #[test]
    fn key_update_uses_existing_record() {
        let f = fixture();
        let config = ModuleConfiguration::ra("TestCA");
        let record = EndEntityRecord {
            username: "alice".into(),
            subject_dn: DistinguishedName::parse("CN=alice").unwrap(),
            issuer_dn: DistinguishedName::parse("CN=TestCA,O=Org").unwrap(),
            ca_id: f.ca_id,
            certificate_profile_id: 1,
            end_entity_profile_id: 7,
            password: None,
        };
        f.auth.grant_all(
            &f.admin,
            [
                AccessResource::EditEndEntity.path(),
                AccessResource::ProfileEditEndEntity(7).path(),
                AccessResource::CreateCertificate.path(),
            ],
        );
        let authorizer = RaAuthorizer::new(&f.collaborators, &config, &f.admin);
        let msg = ProtocolMessage::new(RequestBody::KeyUpdate(CertTemplate::default()), vec![]);

        let err = authorizer.authorize(&msg, Some(&record)).unwrap_err();
        assert!(matches!(
            err,
            StepError::Rejected(Rejection::NotAuthorized(AccessResource::CaAccess(_)))
        ));

        f.auth.grant(&f.admin, AccessResource::CaAccess(f.ca_id).path());
        assert!(authorizer.authorize(&msg, Some(&record)).is_ok());
        assert!(authorizer.authorize(&msg, None).is_err());
    }

    #[test]
    fn revocation_needs_ca_access_and_revoke() {
        let f = fixture();
        let config = ModuleConfiguration::ra("TestCA");
        f.auth.grant(&f.admin, AccessResource::RevokeEndEntity.path());
        let authorizer = RaAuthorizer::new(&f.collaborators, &config, &f.admin);
        let msg = ProtocolMessage::new(
            RequestBody::Revocation(RevocationTarget {
                issuer_dn: Some("CN=TestCA,O=Org".into()),
                serial: "0a".into(),
            }),
            vec![],
        );

        let err = authorizer.authorize(&msg, None).unwrap_err();
        assert!(matches!(
            err,
            StepError::Rejected(Rejection::NotAuthorized(AccessResource::CaAccess(id))) if id == f.ca_id
        ));

        f.auth.grant(&f.admin, AccessResource::CaAccess(f.ca_id).path());
        assert!(authorizer.authorize(&msg, None).is_ok());

        let no_issuer = ProtocolMessage::new(
            RequestBody::Revocation(RevocationTarget::default()),
            vec![],
        );
        let err = authorizer.authorize(&no_issuer, None).unwrap_err();
        assert!(matches!(err, StepError::Rejected(Rejection::InvalidRevocationTarget)));
    }
}
