//! X.509 views over stored DER certificates.

use chrono::{DateTime, TimeZone, Utc};
use cmpgate_core::{AdminToken, Certificate, DistinguishedName, InvalidDn, ValidityViolation};
use thiserror::Error;
use x509_parser::certificate::X509Certificate;
use x509_parser::objects::{oid2abbrev, oid_registry};
use x509_parser::x509::X509Name;

/// A certificate could not be parsed.
#[derive(Debug, Clone, Error)]
#[error("certificate parse error: {0}")]
pub struct CertificateParseError(String);

/// A parsed certificate borrowing its DER bytes.
pub struct ParsedCertificate<'a> {
    source: &'a Certificate,
    x509: X509Certificate<'a>,
}

impl<'a> ParsedCertificate<'a> {
    /// Parse a DER certificate. Trailing bytes are an error.
    pub fn parse(certificate: &'a Certificate) -> Result<Self, CertificateParseError> {
        let (rest, x509) = x509_parser::parse_x509_certificate(certificate.der())
            .map_err(|e| CertificateParseError(e.to_string()))?;
        if !rest.is_empty() {
            return Err(CertificateParseError(format!(
                "{} trailing bytes after certificate",
                rest.len()
            )));
        }
        Ok(Self {
            source: certificate,
            x509,
        })
    }

    /// The certificate this view was parsed from.
    #[must_use]
    pub const fn certificate(&self) -> &'a Certificate {
        self.source
    }

    /// Subject DN.
    pub fn subject_dn(&self) -> Result<DistinguishedName, InvalidDn> {
        name_to_dn(self.x509.subject())
    }

    /// Issuer DN.
    pub fn issuer_dn(&self) -> Result<DistinguishedName, InvalidDn> {
        name_to_dn(self.x509.issuer())
    }

    /// Serial number, lowercase hex.
    #[must_use]
    pub fn serial_hex(&self) -> String {
        hex::encode(self.x509.raw_serial())
    }

    /// Whether basic constraints mark this as a CA certificate.
    #[must_use]
    pub fn is_ca(&self) -> bool {
        self.x509
            .basic_constraints()
            .ok()
            .flatten()
            .is_some_and(|bc| bc.value.ca)
    }

    /// Start of the validity period.
    #[must_use]
    pub fn not_before(&self) -> DateTime<Utc> {
        asn1_to_utc(self.x509.validity().not_before)
    }

    /// End of the validity period.
    #[must_use]
    pub fn not_after(&self) -> DateTime<Utc> {
        asn1_to_utc(self.x509.validity().not_after)
    }

    /// The bound violated at `now`, if any.
    #[must_use]
    pub fn validity_violation(&self, now: DateTime<Utc>) -> Option<ValidityViolation> {
        let not_before = self.not_before();
        if now < not_before {
            return Some(ValidityViolation::NotYetValid { not_before });
        }
        let not_after = self.not_after();
        if now > not_after {
            return Some(ValidityViolation::Expired { not_after });
        }
        None
    }

    /// Raw subject public key (the BIT STRING contents of the SPKI).
    #[must_use]
    pub fn public_key(&self) -> &[u8] {
        &self.x509.public_key().subject_public_key.data
    }

    /// Algorithm OID of the subject public key, dotted form.
    #[must_use]
    pub fn public_key_algorithm(&self) -> String {
        self.x509.public_key().algorithm.algorithm.to_id_string()
    }

    /// Whether `issuer` signed this certificate: names chain and the
    /// signature verifies under the issuer's key.
    #[must_use]
    pub fn is_issued_by(&self, issuer: &ParsedCertificate<'_>) -> bool {
        match (self.issuer_dn(), issuer.subject_dn()) {
            (Ok(ours), Ok(theirs)) if ours == theirs => {}
            _ => return false,
        }
        self.x509
            .verify_signature(Some(issuer.x509.public_key()))
            .is_ok()
    }

    /// Administrator identity carried by this certificate.
    pub fn admin_token(&self) -> Result<AdminToken, InvalidDn> {
        Ok(AdminToken {
            subject_dn: self.subject_dn()?,
            issuer_dn: self.issuer_dn()?,
            serial: self.serial_hex(),
            fingerprint: self.source.fingerprint(),
        })
    }
}

impl std::fmt::Debug for ParsedCertificate<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedCertificate")
            .field("subject", &self.x509.subject().to_string())
            .field("issuer", &self.x509.issuer().to_string())
            .field("serial", &self.serial_hex())
            .finish()
    }
}

fn name_to_dn(name: &X509Name<'_>) -> Result<DistinguishedName, InvalidDn> {
    let registry = oid_registry();
    let mut pairs = Vec::new();
    for attr in name.iter_attributes() {
        let oid = attr.attr_type();
        let key = oid2abbrev(oid, registry).map_or_else(|_| oid.to_id_string(), str::to_string);
        let value = attr.as_str().map_err(|_| InvalidDn {
            component: format!("{key}=<non-string value>"),
        })?;
        pairs.push((key, value.to_string()));
    }
    DistinguishedName::from_components(pairs)
}

/// Convert an ASN.1 `GeneralizedTime` / `UTCTime` to `DateTime<Utc>`.
fn asn1_to_utc(t: x509_parser::time::ASN1Time) -> DateTime<Utc> {
    Utc.timestamp_opt(t.timestamp(), 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
