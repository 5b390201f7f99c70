//! Trust-chain validation with CA rollover fallback.
//!
//! A path runs from the signer certificate through attached intermediates
//! to a trust root. The root is the anchor CA's own certificate. When no
//! path reaches it, every certificate the store ever held under the anchor's
//! subject DN is tried in turn as the root, so peers still presenting chains
//! issued under a CA key that has since been rolled over keep working.

use chrono::{DateTime, Utc};
use cmpgate_core::{
    AuthError, Certificate, CertificateStore, StoreError, TrustAnchor, ValidityViolation,
};
use tracing::{debug, info, warn};

use crate::cert::ParsedCertificate;

/// Longest chain of attached intermediates followed.
const MAX_PATH_DEPTH: usize = 8;

/// Outcome of trust validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustVerdict {
    /// A valid path to a trust root exists
    Valid,
    /// A path exists but a certificate on it is outside its validity period
    NotValid(ValidityViolation),
    /// No path reaches any trust root
    NoPath,
}

/// Validates signer chains against trust anchors.
pub struct TrustValidator<'a> {
    certificates: &'a dyn CertificateStore,
    now: DateTime<Utc>,
}

impl<'a> TrustValidator<'a> {
    /// Validator at the current time.
    pub fn new(certificates: &'a dyn CertificateStore) -> Self {
        Self {
            certificates,
            now: Utc::now(),
        }
    }

    /// Validate at a fixed point in time.
    #[must_use]
    pub const fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Validate `signer` (with the rest of `chain` as candidate
    /// intermediates) against `anchor`.
    ///
    /// # Errors
    /// Fatal when the anchor holds no certificate, its certificate does not
    /// parse, or the certificate store is down.
    pub fn validate(
        &self,
        signer: &ParsedCertificate<'_>,
        chain: &[Certificate],
        anchor: &TrustAnchor,
    ) -> Result<TrustVerdict, AuthError> {
        let root_cert = anchor.ca_certificate().ok_or_else(|| AuthError::TrustStore {
            ca: anchor.name.clone(),
            reason: "no CA certificate".to_string(),
        })?;
        let root = ParsedCertificate::parse(root_cert).map_err(|e| AuthError::TrustStore {
            ca: anchor.name.clone(),
            reason: e.to_string(),
        })?;

        let signer_der = signer.certificate().der();
        let intermediates: Vec<ParsedCertificate<'_>> = chain
            .iter()
            .filter(|c| c.der() != signer_der && c.der() != root_cert.der())
            .filter_map(|c| match ParsedCertificate::parse(c) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    debug!(error = %e, "skipping unparsable extraCerts entry");
                    None
                }
            })
            .collect();

        match self.check_path(signer, &intermediates, &root) {
            TrustVerdict::NoPath => {}
            verdict => return Ok(verdict),
        }

        debug!(ca = %anchor.name, "no path to current CA certificate, trying earlier ones");
        self.rollover_fallback(signer, &intermediates, anchor, root_cert)
    }

    fn rollover_fallback(
        &self,
        signer: &ParsedCertificate<'_>,
        intermediates: &[ParsedCertificate<'_>],
        anchor: &TrustAnchor,
        current: &Certificate,
    ) -> Result<TrustVerdict, AuthError> {
        let candidates = match self
            .certificates
            .find_certificates_by_subject_dn(&anchor.subject_dn)
        {
            Ok(certs) => certs,
            Err(e @ StoreError::Unavailable(_)) => {
                return Err(AuthError::collaborator("certificate store", &e));
            }
            Err(e) => {
                warn!(ca = %anchor.name, error = %e, "rollover lookup failed");
                Vec::new()
            }
        };

        let mut violation = None;
        for candidate in candidates.iter().filter(|c| *c != current) {
            let root = match ParsedCertificate::parse(candidate) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(ca = %anchor.name, error = %e, "skipping unparsable stored CA certificate");
                    continue;
                }
            };
            match self.check_path(signer, intermediates, &root) {
                TrustVerdict::Valid => {
                    info!(
                        ca = %anchor.name,
                        root = %candidate.fingerprint(),
                        "signer chain verified against earlier CA certificate"
                    );
                    return Ok(TrustVerdict::Valid);
                }
                TrustVerdict::NotValid(v) => {
                    violation.get_or_insert(v);
                }
                TrustVerdict::NoPath => {}
            }
        }

        Ok(violation.map_or(TrustVerdict::NoPath, TrustVerdict::NotValid))
    }

    /// Build a path from `signer` to `root` and check every certificate on
    /// it, root included, for validity at `self.now`.
    fn check_path(
        &self,
        signer: &ParsedCertificate<'_>,
        intermediates: &[ParsedCertificate<'_>],
        root: &ParsedCertificate<'_>,
    ) -> TrustVerdict {
        let mut violation = signer.validity_violation(self.now);
        let mut current = None;
        let mut used = vec![false; intermediates.len()];
        let mut depth = 0;

        while !link_issued_by(signer, intermediates, current, root) {
            if depth >= MAX_PATH_DEPTH {
                return TrustVerdict::NoPath;
            }
            let next = (0..intermediates.len()).find(|&i| {
                !used[i]
                    && intermediates[i].is_ca()
                    && link_issued_by(signer, intermediates, current, &intermediates[i])
            });
            let Some(i) = next else {
                return TrustVerdict::NoPath;
            };
            used[i] = true;
            violation = violation.or_else(|| intermediates[i].validity_violation(self.now));
            current = Some(i);
            depth += 1;
        }

        violation
            .or_else(|| root.validity_violation(self.now))
            .map_or(TrustVerdict::Valid, TrustVerdict::NotValid)
    }
}

/// Whether the path's current end (`None` is the signer itself, `Some(i)`
/// the i-th intermediate) was issued by `issuer`.
fn link_issued_by(
    signer: &ParsedCertificate<'_>,
    intermediates: &[ParsedCertificate<'_>],
    at: Option<usize>,
    issuer: &ParsedCertificate<'_>,
) -> bool {
    match at {
        None => signer.is_issued_by(issuer),
        Some(i) => intermediates[i].is_issued_by(issuer),
    }
}
