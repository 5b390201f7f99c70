//! Certificate ownership checks for client-mode requests.
//!
//! A client signs with its own certificate, so instead of administrator
//! rights the pipeline checks that the certificate is known, active, and
//! belongs to the user the request is about.

use cmpgate_core::{
    Certificate, CertificateInfo, CertificateStore, DistinguishedName, EndEntityRecord,
    ProtocolMessage, Rejection, RequestBody,
};
use tracing::debug;

use crate::config::ModuleConfiguration;
use crate::error::{StepError, StepResult};
use crate::username::username_from_dn;

/// Verify the signer owns what the request touches. Returns the username
/// the request was bound to.
pub fn check_ownership(
    certificates: &dyn CertificateStore,
    config: &ModuleConfiguration,
    signer: &Certificate,
    message: &ProtocolMessage,
    bound: Option<&EndEntityRecord>,
) -> StepResult<String> {
    let info = certificates
        .find_certificate_info(&signer.fingerprint())
        .map_err(|e| StepError::from_store("certificate store", &e, Rejection::UnknownCertificate))?
        .ok_or(Rejection::UnknownCertificate)?;

    if !info.status.is_active() {
        debug!(owner = %info.username, status = ?info.status, "signer certificate not active");
        return Err(Rejection::CertificateNotActive.into());
    }

    let expected = match message.body() {
        RequestBody::KeyUpdate(_) => bound
            .map(|r| r.username.clone())
            .ok_or(Rejection::NoSuchEndEntity)?,
        RequestBody::Certification(template) | RequestBody::Initialization(template) => {
            requested_username(message, template.subject_dn.as_deref(), config)?
        }
        RequestBody::Revocation(target) => {
            check_revocation_target(certificates, &info, target.issuer_dn.as_deref(), &target.serial)?;
            info.username.clone()
        }
    };

    if info.username != expected {
        debug!(
            expected = %expected,
            actual = %info.username,
            "signer certificate belongs to another user"
        );
        return Err(Rejection::NotCertificateOwner(expected).into());
    }
    Ok(expected)
}

/// Username an enrollment is for: the claimed one, else derived from the
/// requested subject DN.
fn requested_username(
    message: &ProtocolMessage,
    subject_dn: Option<&str>,
    config: &ModuleConfiguration,
) -> StepResult<String> {
    if let Some(claimed) = message.claimed_username().filter(|u| !u.is_empty()) {
        return Ok(claimed.to_string());
    }
    subject_dn
        .and_then(|s| DistinguishedName::parse(s).ok())
        .and_then(|dn| username_from_dn(&dn, config))
        .ok_or_else(|| Rejection::MissingUsername.into())
}

fn check_revocation_target(
    certificates: &dyn CertificateStore,
    signer_info: &CertificateInfo,
    issuer_dn: Option<&str>,
    serial: &str,
) -> StepResult<()> {
    let issuer = issuer_dn
        .and_then(|s| DistinguishedName::parse(s).ok())
        .filter(|dn| !dn.is_empty())
        .ok_or(Rejection::InvalidRevocationTarget)?;
    let target = certificates
        .find_certificate_info_by_serial(&issuer, serial)
        .map_err(|e| {
            StepError::from_store("certificate store", &e, Rejection::RevocationTargetNotOwned)
        })?;
    match target {
        Some(t) if t.username == signer_info.username => Ok(()),
        Some(t) => {
            debug!(owner = %t.username, requester = %signer_info.username, "revocation target owned by another user");
            Err(Rejection::RevocationTargetNotOwned.into())
        }
        None => {
            debug!(issuer = %issuer, serial, "revocation target unknown");
            Err(Rejection::RevocationTargetNotOwned.into())
        }
    }
}
