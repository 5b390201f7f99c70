//! The single result of authenticating one protocol message.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{AdminToken, Certificate};
use crate::error::Rejection;

/// Which trust model authenticated (or tried to authenticate) a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthMode {
    /// The sender is the end entity itself
    Client,
    /// The sender is a Registration Authority acting for end entities
    Ra,
    /// The sender bootstraps with a vendor-issued certificate
    Vendor,
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client => write!(f, "client"),
            Self::Ra => write!(f, "RA"),
            Self::Vendor => write!(f, "vendor"),
        }
    }
}

/// Final result of the authentication pipeline.
///
/// Built exactly once by the last step that runs, and read-only afterwards.
/// A shared secret is present if and only if the message was authenticated.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthenticationOutcome {
    authenticated: bool,
    shared_secret: Option<String>,
    rejection: Option<Rejection>,
    signer_token: Option<AdminToken>,
    signer_certificate: Option<Certificate>,
    mode: Option<AuthMode>,
    end_entity_username: Option<String>,
}

impl AuthenticationOutcome {
    /// An accepted message.
    #[must_use]
    pub const fn accepted(
        mode: AuthMode,
        shared_secret: String,
        signer_token: AdminToken,
        signer_certificate: Certificate,
        end_entity_username: Option<String>,
    ) -> Self {
        Self {
            authenticated: true,
            shared_secret: Some(shared_secret),
            rejection: None,
            signer_token: Some(signer_token),
            signer_certificate: Some(signer_certificate),
            mode: Some(mode),
            end_entity_username,
        }
    }

    /// A rejected message. `mode` is `None` when rejection happened before a
    /// mode was resolved.
    #[must_use]
    pub const fn rejected(rejection: Rejection, mode: Option<AuthMode>) -> Self {
        Self {
            authenticated: false,
            shared_secret: None,
            rejection: Some(rejection),
            signer_token: None,
            signer_certificate: None,
            mode,
            end_entity_username: None,
        }
    }

    /// Whether the message was authenticated.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Shared secret for the issuance engine; `Some` iff authenticated.
    #[must_use]
    pub fn shared_secret(&self) -> Option<&str> {
        self.shared_secret.as_deref()
    }

    /// Why the message was rejected.
    #[must_use]
    pub const fn rejection(&self) -> Option<&Rejection> {
        self.rejection.as_ref()
    }

    /// Public error message for the peer.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.rejection.as_ref().map(ToString::to_string)
    }

    /// Administrator identity of the signer, set only after successful verification.
    #[must_use]
    pub const fn signer_token(&self) -> Option<&AdminToken> {
        self.signer_token.as_ref()
    }

    /// The accepted signer certificate.
    #[must_use]
    pub const fn signer_certificate(&self) -> Option<&Certificate> {
        self.signer_certificate.as_ref()
    }

    /// Resolved mode.
    #[must_use]
    pub const fn mode(&self) -> Option<AuthMode> {
        self.mode
    }

    /// Username of the end entity the request was bound to, if any.
    #[must_use]
    pub fn end_entity_username(&self) -> Option<&str> {
        self.end_entity_username.as_deref()
    }
}

impl fmt::Debug for AuthenticationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticationOutcome")
            .field("authenticated", &self.authenticated)
            .field("shared_secret", &self.shared_secret.as_ref().map(|_| "<redacted>"))
            .field("rejection", &self.rejection)
            .field("signer_token", &self.signer_token)
            .field("mode", &self.mode)
            .field("end_entity_username", &self.end_entity_username)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dn::DistinguishedName;

    fn token() -> AdminToken {
        AdminToken {
            subject_dn: DistinguishedName::parse("CN=admin").unwrap(),
            issuer_dn: DistinguishedName::parse("CN=CA").unwrap(),
            serial: "01".into(),
            fingerprint: "ff".into(),
        }
    }

    #[test]
    fn rejected_has_no_secret() {
        let o = AuthenticationOutcome::rejected(Rejection::NoCertificate, None);
        assert!(!o.is_authenticated());
        assert!(o.shared_secret().is_none());
        assert!(o.signer_token().is_none());
        assert_eq!(
            o.error_message().as_deref(),
            Some("no certificate found in the extraCerts field")
        );
    }

    #[test]
    fn accepted_has_secret_and_token() {
        let o = AuthenticationOutcome::accepted(
            AuthMode::Ra,
            "s3cret".into(),
            token(),
            Certificate::from_der(vec![1]),
            None,
        );
        assert!(o.is_authenticated());
        assert_eq!(o.shared_secret(), Some("s3cret"));
        assert!(o.error_message().is_none());
        assert_eq!(o.mode(), Some(AuthMode::Ra));
    }

    #[test]
    fn debug_redacts_secret() {
        let o = AuthenticationOutcome::accepted(
            AuthMode::Client,
            "s3cret".into(),
            token(),
            Certificate::from_der(vec![1]),
            Some("alice".into()),
        );
        let dbg = format!("{o:?}");
        assert!(!dbg.contains("s3cret"));
        assert!(dbg.contains("<redacted>"));
    }
}
