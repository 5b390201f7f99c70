//! Certificate fixtures for unit tests.

use std::sync::atomic::{AtomicU64, Ordering};

use cmpgate_core::{Certificate, DistinguishedName, TrustAnchor};
use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair};
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, ECDSA_P256_SHA256_ASN1_SIGNING};

static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1000);

/// What to put in an issued certificate.
pub struct CertSpec {
    subject: String,
    is_ca: bool,
    validity: ((i32, u8, u8), (i32, u8, u8)),
}

impl CertSpec {
    pub fn leaf(subject: &str) -> Self {
        Self {
            subject: subject.to_string(),
            is_ca: false,
            validity: ((2020, 1, 1), (2099, 12, 31)),
        }
    }

    pub fn ca(subject: &str) -> Self {
        Self {
            is_ca: true,
            ..Self::leaf(subject)
        }
    }

    pub fn expired(mut self) -> Self {
        self.validity = ((2000, 1, 1), (2001, 1, 1));
        self
    }

    pub fn not_yet_valid(mut self) -> Self {
        self.validity = ((2090, 1, 1), (2099, 12, 31));
        self
    }
}

/// A certificate with its P-256 key.
pub struct TestCert {
    pub key: KeyPair,
    pub certificate: Certificate,
}

impl TestCert {
    /// ECDSA P-256 / SHA-256 signature over `data`.
    pub fn sign(&self, data: &[u8]) -> Vec<u8> {
        let rng = SystemRandom::new();
        let pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &self.key.serialize_der(), &rng)
                .unwrap();
        pair.sign(&rng, data).unwrap().as_ref().to_vec()
    }
}

/// A CA able to issue certificates.
pub struct TestCa {
    pub key: KeyPair,
    pub cert: rcgen::Certificate,
    pub certificate: Certificate,
    pub subject_dn: DistinguishedName,
}

impl TestCa {
    /// Self-signed root.
    pub fn new(subject: &str) -> Self {
        let key = KeyPair::generate().unwrap();
        let params = params_for(&CertSpec::ca(subject));
        let cert = params.self_signed(&key).unwrap();
        Self::wrap(subject, key, cert)
    }

    /// Sub-CA issued by this CA.
    pub fn sub_ca(&self, subject: &str) -> Self {
        let key = KeyPair::generate().unwrap();
        let params = params_for(&CertSpec::ca(subject));
        let cert = params.signed_by(&key, &self.cert, &self.key).unwrap();
        Self::wrap(subject, key, cert)
    }

    /// Issue a certificate.
    pub fn issue(&self, spec: &CertSpec) -> TestCert {
        let key = KeyPair::generate().unwrap();
        let cert = params_for(spec).signed_by(&key, &self.cert, &self.key).unwrap();
        TestCert {
            key,
            certificate: Certificate::from_der(cert.der().to_vec()),
        }
    }

    /// Trust anchor with this CA's certificate as the whole chain.
    pub fn anchor(&self, name: &str) -> TrustAnchor {
        TrustAnchor::new(name, self.subject_dn.clone(), vec![self.certificate.clone()])
    }

    fn wrap(subject: &str, key: KeyPair, cert: rcgen::Certificate) -> Self {
        Self {
            certificate: Certificate::from_der(cert.der().to_vec()),
            subject_dn: DistinguishedName::parse(subject).unwrap(),
            key,
            cert,
        }
    }
}

fn params_for(spec: &CertSpec) -> CertificateParams {
    let mut params = CertificateParams::default();
    let mut dn = rcgen::DistinguishedName::new();
    for part in spec.subject.split(',') {
        let (k, v) = part.split_once('=').unwrap();
        let ty = match k.trim() {
            "CN" => DnType::CommonName,
            "O" => DnType::OrganizationName,
            "OU" => DnType::OrganizationalUnitName,
            "C" => DnType::CountryName,
            "L" => DnType::LocalityName,
            "ST" => DnType::StateOrProvinceName,
            other => panic!("unsupported attribute {other}"),
        };
        dn.push(ty, v.trim());
    }
    params.distinguished_name = dn;
    params.is_ca = if spec.is_ca {
        IsCa::Ca(BasicConstraints::Unconstrained)
    } else {
        IsCa::NoCa
    };
    let ((by, bm, bd), (ay, am, ad)) = spec.validity;
    params.not_before = rcgen::date_time_ymd(by, bm, bd);
    params.not_after = rcgen::date_time_ymd(ay, am, ad);
    params.serial_number = Some(NEXT_SERIAL.fetch_add(1, Ordering::Relaxed).into());
    params
}
