//! Shared fixtures: a CA, in-memory collaborators and signed messages.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use cmpgate_auth::{EndEntityCertificateAuth, ModuleConfiguration, X509CredentialAuthenticator};
use cmpgate_core::memory::{
    MemoryAuthorization, MemoryCaService, MemoryCertificateStore, MemoryEndEntityStore,
    MemoryProfileStore,
};
use cmpgate_core::{
    AccessResource, AdminToken, Certificate, CertificateInfo, CertificateProfile,
    CertificateStatus, Collaborators, CredentialAuthenticator, DistinguishedName,
    EndEntityProfile, EndEntityRecord, ProtectionAlgorithm, ProtocolMessage, RequestBody,
    TrustAnchor, ANY_CA, EMPTY_END_ENTITY_PROFILE,
};
use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair};
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, ECDSA_P256_SHA256_ASN1_SIGNING};

static NEXT_SERIAL: AtomicU64 = AtomicU64::new(5000);

pub const CA_NAME: &str = "TestCA";
pub const CA_DN: &str = "CN=TestCA,O=Org";

/// A certificate and its P-256 key.
pub struct Holder {
    pub key: KeyPair,
    pub certificate: Certificate,
}

impl Holder {
    pub fn sign(&self, data: &[u8]) -> Vec<u8> {
        let rng = SystemRandom::new();
        let pair = EcdsaKeyPair::from_pkcs8(
            &ECDSA_P256_SHA256_ASN1_SIGNING,
            &self.key.serialize_der(),
            &rng,
        )
        .unwrap();
        pair.sign(&rng, data).unwrap().as_ref().to_vec()
    }
}

pub struct Ca {
    key: KeyPair,
    cert: rcgen::Certificate,
    pub certificate: Certificate,
    pub subject_dn: DistinguishedName,
}

impl Ca {
    pub fn root(subject: &str) -> Self {
        let key = KeyPair::generate().unwrap();
        let cert = params(subject, true, false).self_signed(&key).unwrap();
        Self {
            certificate: Certificate::from_der(cert.der().to_vec()),
            subject_dn: DistinguishedName::parse(subject).unwrap(),
            key,
            cert,
        }
    }

    pub fn issue(&self, subject: &str) -> Holder {
        self.issue_with(subject, false)
    }

    pub fn issue_expired(&self, subject: &str) -> Holder {
        self.issue_with(subject, true)
    }

    fn issue_with(&self, subject: &str, expired: bool) -> Holder {
        let key = KeyPair::generate().unwrap();
        let cert = params(subject, false, expired)
            .signed_by(&key, &self.cert, &self.key)
            .unwrap();
        Holder {
            key,
            certificate: Certificate::from_der(cert.der().to_vec()),
        }
    }

    pub fn anchor(&self, name: &str) -> TrustAnchor {
        TrustAnchor::new(name, self.subject_dn.clone(), vec![self.certificate.clone()])
    }
}

fn params(subject: &str, is_ca: bool, expired: bool) -> CertificateParams {
    let mut params = CertificateParams::default();
    let mut dn = rcgen::DistinguishedName::new();
    for part in subject.split(',') {
        let (k, v) = part.split_once('=').unwrap();
        let ty = match k.trim() {
            "CN" => DnType::CommonName,
            "O" => DnType::OrganizationName,
            "C" => DnType::CountryName,
            other => panic!("unsupported attribute {other}"),
        };
        dn.push(ty, v.trim());
    }
    params.distinguished_name = dn;
    params.is_ca = if is_ca {
        IsCa::Ca(BasicConstraints::Unconstrained)
    } else {
        IsCa::NoCa
    };
    if expired {
        params.not_before = rcgen::date_time_ymd(2000, 1, 1);
        params.not_after = rcgen::date_time_ymd(2001, 1, 1);
    } else {
        params.not_before = rcgen::date_time_ymd(2020, 1, 1);
        params.not_after = rcgen::date_time_ymd(2099, 12, 31);
    }
    params.serial_number = Some(NEXT_SERIAL.fetch_add(1, Ordering::Relaxed).into());
    params
}

/// A deployment with one CA and in-memory collaborators.
pub struct World {
    pub auth: Arc<MemoryAuthorization>,
    pub cas: Arc<MemoryCaService>,
    pub certificates: Arc<MemoryCertificateStore>,
    pub end_entities: Arc<MemoryEndEntityStore>,
    pub profiles: Arc<MemoryProfileStore>,
    pub ca: Ca,
}

impl World {
    pub fn new() -> Self {
        let ca = Ca::root(CA_DN);
        let cas = Arc::new(MemoryCaService::new());
        cas.add(ca.anchor(CA_NAME));

        let profiles = Arc::new(MemoryProfileStore::new());
        profiles.add_end_entity_profile(EndEntityProfile {
            id: EMPTY_END_ENTITY_PROFILE,
            name: "EMPTY".into(),
            default_ca_id: ca.subject_dn.ca_id(),
            default_certificate_profile_id: 1,
        });
        profiles.add_certificate_profile(CertificateProfile {
            id: 1,
            name: "ENDUSER".into(),
            available_cas: vec![ANY_CA],
        });

        Self {
            auth: Arc::new(MemoryAuthorization::new()),
            cas,
            certificates: Arc::new(MemoryCertificateStore::new()),
            end_entities: Arc::new(MemoryEndEntityStore::new()),
            profiles,
            ca,
        }
    }

    pub fn ca_id(&self) -> i32 {
        self.ca.subject_dn.ca_id()
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators::new(
            self.auth.clone(),
            self.cas.clone(),
            self.certificates.clone(),
            self.end_entities.clone(),
            self.profiles.clone(),
            Arc::new(X509CredentialAuthenticator),
        )
    }

    pub fn module(&self, config: ModuleConfiguration) -> EndEntityCertificateAuth {
        EndEntityCertificateAuth::with_configuration("test", config, self.collaborators())
    }

    pub fn token(&self, holder: &Holder) -> AdminToken {
        X509CredentialAuthenticator
            .authenticate(&holder.certificate)
            .unwrap()
    }

    pub fn grant(&self, holder: &Holder, resources: &[AccessResource]) {
        self.auth
            .grant_all(&self.token(holder), resources.iter().map(AccessResource::path));
    }

    /// Every right an RA needs to enroll under the default profile.
    pub fn grant_enrollment(&self, holder: &Holder) {
        self.grant(
            holder,
            &[
                AccessResource::CreateEndEntity,
                AccessResource::EditEndEntity,
                AccessResource::CreateCertificate,
                AccessResource::ProfileCreateEndEntity(EMPTY_END_ENTITY_PROFILE),
                AccessResource::ProfileEditEndEntity(EMPTY_END_ENTITY_PROFILE),
            ],
        );
    }

    pub fn register_owner(&self, holder: &Holder, username: &str, status: CertificateStatus) {
        let token = self.token(holder);
        self.certificates.add_info(CertificateInfo {
            fingerprint: holder.certificate.fingerprint(),
            username: username.into(),
            status,
            issuer_dn: token.issuer_dn.canonical(),
            serial: token.serial,
        });
    }

    pub fn end_entity(&self, username: &str, subject: &str, password: Option<&str>) {
        self.end_entities.insert(EndEntityRecord {
            username: username.into(),
            subject_dn: DistinguishedName::parse(subject).unwrap(),
            issuer_dn: self.ca.subject_dn.clone(),
            ca_id: self.ca_id(),
            certificate_profile_id: 1,
            end_entity_profile_id: EMPTY_END_ENTITY_PROFILE,
            password: password.map(str::to_string),
        });
    }
}

/// A message protected by `signer` carrying `chain` as extraCerts.
pub fn signed(body: RequestBody, signer: &Holder, chain: Vec<Certificate>) -> ProtocolMessage {
    let protected = format!("header|{body:?}").into_bytes();
    let signature = signer.sign(&protected);
    ProtocolMessage::new(body, protected)
        .with_protection(ProtectionAlgorithm::EcdsaSha256, signature)
        .with_extra_certs(chain)
}
