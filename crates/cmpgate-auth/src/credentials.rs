//! Credential authenticator for X.509 signer certificates.

use cmpgate_core::{AdminToken, Certificate, CredentialAuthenticator, StoreError};

use crate::cert::ParsedCertificate;

/// Derives the administrator identity straight from the certificate. Any
/// certificate that parses yields a token; rights are left to the
/// authorization service.
#[derive(Debug, Clone, Copy, Default)]
pub struct X509CredentialAuthenticator;

impl CredentialAuthenticator for X509CredentialAuthenticator {
    fn authenticate(&self, certificate: &Certificate) -> Result<AdminToken, StoreError> {
        let parsed = ParsedCertificate::parse(certificate)
            .map_err(|e| StoreError::AuthorizationDenied(e.to_string()))?;
        parsed
            .admin_token()
            .map_err(|e| StoreError::AuthorizationDenied(e.to_string()))
    }
}
