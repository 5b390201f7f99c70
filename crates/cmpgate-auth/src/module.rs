//! The end-entity certificate authentication module.
//!
//! An [`EndEntityCertificateAuth`] serves one alias and runs the pipeline:
//!
//! ```text
//! protection present -> mode -> signer certificate -> (kur) end entity
//!   -> trust anchor -> trust chain -> authorization -> signature -> secret
//! ```
//!
//! Every step either hands its result to the next or stops the pipeline.
//! Ordinary failures become a rejected [`AuthenticationOutcome`]; only a
//! broken deployment surfaces as an [`AuthError`].

use cmpgate_core::{
    AuthError, AuthMode, AuthenticationOutcome, Certificate, CaStatus, Collaborators,
    DistinguishedName, EndEntityRecord, ProtocolMessage, Rejection, RequestType, Result,
    StoreError, TrustAnchor,
};
use ring::rand::SystemRandom;
use tracing::{debug, error, info, warn};

use crate::authorize::RaAuthorizer;
use crate::cert::ParsedCertificate;
use crate::config::{CmpConfig, ModuleConfiguration};
use crate::error::{StepError, StepResult};
use crate::extract::select_signer;
use crate::keyupdate::resolve_end_entity;
use crate::mode::{resolve_mode, ResolvedMode};
use crate::ownership::check_ownership;
use crate::secret::generate_password;
use crate::signature::verify_protection;
use crate::trust::{TrustValidator, TrustVerdict};

/// Authenticates CMP messages signed with an end-entity certificate.
pub struct EndEntityCertificateAuth {
    alias: String,
    config: ModuleConfiguration,
    collaborators: Collaborators,
    rng: SystemRandom,
}

impl EndEntityCertificateAuth {
    /// Module name as used in alias configuration.
    pub const NAME: &'static str = "EndEntityCertificate";

    /// Build for a configured alias.
    ///
    /// # Errors
    /// `AuthError::Config` when the alias is not configured.
    pub fn new(alias: &str, config: &CmpConfig, collaborators: Collaborators) -> Result<Self> {
        let module_config = config
            .alias(alias)
            .cloned()
            .ok_or_else(|| AuthError::Config(format!("CMP alias '{alias}' is not configured")))?;
        Ok(Self::with_configuration(alias, module_config, collaborators))
    }

    /// Build from explicit alias settings.
    pub fn with_configuration(
        alias: impl Into<String>,
        config: ModuleConfiguration,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            alias: alias.into(),
            config,
            collaborators,
            rng: SystemRandom::new(),
        }
    }

    /// The alias this module serves.
    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// The alias settings.
    #[must_use]
    pub const fn configuration(&self) -> &ModuleConfiguration {
        &self.config
    }

    /// Authenticate and authorize one message.
    ///
    /// `already_authenticated` is set when an outer layer (a nested
    /// message signed by a trusted RA) has already vetted the message.
    ///
    /// # Errors
    /// Only for a broken deployment: corrupt trust store, profiles naming
    /// missing CAs, unknown configured names, backend outages, or a failing
    /// random source. Authentication failures are `Ok` with a rejected outcome.
    pub fn authenticate(
        &self,
        message: &ProtocolMessage,
        already_authenticated: bool,
    ) -> Result<AuthenticationOutcome> {
        let request = message.request_type();
        debug!(alias = %self.alias, request = %request, already_authenticated, "authenticating CMP message");

        if message.protection().is_none() {
            return Ok(self.reject(Rejection::MissingProtection, None));
        }

        let resolved = match resolve_mode(
            &self.config,
            &self.alias,
            request,
            already_authenticated,
            self.collaborators.vendor.as_ref(),
        ) {
            Ok(resolved) => resolved,
            Err(rejection) => return Ok(self.reject(rejection, None)),
        };

        match self.run(message, resolved) {
            Ok(outcome) => {
                info!(
                    alias = %self.alias,
                    request = %request,
                    mode = %resolved.mode,
                    "CMP message authenticated"
                );
                Ok(outcome)
            }
            Err(StepError::Rejected(rejection)) => Ok(self.reject(rejection, Some(resolved.mode))),
            Err(StepError::Fatal(e)) => {
                error!(alias = %self.alias, request = %request, error = %e, "authentication aborted");
                Err(e)
            }
        }
    }

    fn reject(&self, rejection: Rejection, mode: Option<AuthMode>) -> AuthenticationOutcome {
        info!(alias = %self.alias, mode = ?mode, reason = %rejection, "CMP message rejected");
        AuthenticationOutcome::rejected(rejection, mode)
    }

    fn run(
        &self,
        message: &ProtocolMessage,
        resolved: ResolvedMode,
    ) -> StepResult<AuthenticationOutcome> {
        let mode = resolved.mode;
        let chain = message.extra_certs();
        let signer_cert = select_signer(chain)?;
        let signer = ParsedCertificate::parse(signer_cert).map_err(|e| {
            debug!(error = %e, "signer certificate does not parse");
            Rejection::UnparsableCertificate
        })?;

        let bound = if message.request_type() == RequestType::KeyUpdate {
            Some(self.key_update_target(message, &signer, mode)?)
        } else {
            None
        };

        if resolved.omit_verifications {
            info!(alias = %self.alias, "trust validation omitted for pre-authenticated RA message");
        } else {
            let anchor = self.trust_anchor(mode, &signer, chain)?;
            self.validate_trust(&signer, chain, &anchor)?;
        }

        let token = self
            .collaborators
            .credentials
            .authenticate(signer_cert)
            .map_err(|e| {
                debug!(error = %e, "signer is no valid credential");
                StepError::from_store("credential authenticator", &e, Rejection::AdminAuthenticationFailed)
            })?;

        let username = match mode {
            AuthMode::Ra => {
                RaAuthorizer::new(&self.collaborators, &self.config, &token)
                    .authorize(message, bound.as_ref())?;
                bound.map(|r| r.username)
            }
            AuthMode::Client => Some(check_ownership(
                self.collaborators.certificates.as_ref(),
                &self.config,
                signer_cert,
                message,
                bound.as_ref(),
            )?),
            AuthMode::Vendor => None,
        };

        verify_protection(message, &signer)?;

        let secret = self.shared_secret(mode, username.as_deref())?;
        Ok(AuthenticationOutcome::accepted(
            mode,
            secret,
            token,
            signer_cert.clone(),
            username,
        ))
    }

    /// RA requests name the renewed end entity in the template; clients
    /// renew the entity their own certificate belongs to.
    fn key_update_target(
        &self,
        message: &ProtocolMessage,
        signer: &ParsedCertificate<'_>,
        mode: AuthMode,
    ) -> StepResult<EndEntityRecord> {
        let (subject, issuer) = if mode == AuthMode::Ra {
            let template = message.body().template();
            let subject = template
                .and_then(|t| t.subject_dn.as_deref())
                .and_then(|s| DistinguishedName::parse(s).ok())
                .filter(|dn| !dn.is_empty())
                .ok_or(Rejection::MissingSubjectDn)?;
            let issuer = match template.and_then(|t| t.issuer_dn.as_deref()) {
                None => None,
                Some(s) => Some(DistinguishedName::parse(s).map_err(|e| {
                    debug!(error = %e, "key update template issuer DN does not parse");
                    Rejection::NoSuchEndEntity
                })?),
            };
            (subject, issuer.filter(|dn| !dn.is_empty()))
        } else {
            let subject = signer
                .subject_dn()
                .map_err(|_| Rejection::UnparsableCertificate)?;
            let issuer = signer
                .issuer_dn()
                .map_err(|_| Rejection::UnparsableCertificate)?;
            (subject, Some(issuer))
        };
        resolve_end_entity(
            self.collaborators.end_entities.as_ref(),
            &subject,
            issuer.as_ref(),
        )
    }

    /// Only an active CA may root trust.
    fn trust_anchor(
        &self,
        mode: AuthMode,
        signer: &ParsedCertificate<'_>,
        chain: &[Certificate],
    ) -> StepResult<TrustAnchor> {
        let cas = &self.collaborators.cas;
        let anchor = if mode == AuthMode::Vendor {
            self.collaborators
                .vendor
                .resolve_vendor_trust_anchor(&self.alias, chain)
                .ok_or(Rejection::NotVendorIssued)?
        } else if self.config.anchor_by_issuer() {
            let issuer = signer
                .issuer_dn()
                .map_err(|_| Rejection::UnparsableCertificate)?;
            match cas.trust_anchor_by_issuer_hash(issuer.ca_id()) {
                Ok(anchor) => anchor,
                Err(StoreError::NotFound(_)) => {
                    debug!(issuer = %issuer, "signer issuer is no known CA");
                    return Err(Rejection::UnknownIssuer.into());
                }
                Err(StoreError::AuthorizationDenied(_)) => {
                    return Err(Rejection::CaAccessDenied(issuer.canonical()).into());
                }
                Err(e) => return Err(StepError::backend("CA service", &e)),
            }
        } else {
            let name = self.config.authentication_parameter.trim();
            match cas.trust_anchor_by_name(name) {
                Ok(anchor) => anchor,
                Err(StoreError::NotFound(_)) => {
                    return Err(AuthError::Config(format!(
                        "authentication CA '{name}' of alias '{}' does not exist",
                        self.alias
                    ))
                    .into());
                }
                Err(StoreError::AuthorizationDenied(_)) => {
                    return Err(Rejection::CaAccessDenied(name.to_string()).into());
                }
                Err(e) => return Err(StepError::backend("CA service", &e)),
            }
        };

        if anchor.status != CaStatus::Active {
            warn!(ca = %anchor.name, status = ?anchor.status, "trust anchor is not active");
            return Err(Rejection::CaNotActive(anchor.name).into());
        }
        debug!(ca = %anchor.name, ca_id = anchor.id, "selected trust anchor");
        Ok(anchor)
    }

    fn validate_trust(
        &self,
        signer: &ParsedCertificate<'_>,
        chain: &[Certificate],
        anchor: &TrustAnchor,
    ) -> StepResult<()> {
        let verdict = TrustValidator::new(self.collaborators.certificates.as_ref())
            .validate(signer, chain, anchor)?;
        match verdict {
            TrustVerdict::Valid => Ok(()),
            TrustVerdict::NotValid(violation) => {
                Err(Rejection::CertificateNotValid(violation).into())
            }
            TrustVerdict::NoPath => Err(Rejection::Untrusted(anchor.name.clone()).into()),
        }
    }

    /// Secret for this message only. Clients get their end entity's
    /// password; RA and vendor peers get a fresh one.
    fn shared_secret(&self, mode: AuthMode, username: Option<&str>) -> StepResult<String> {
        match (mode, username) {
            (AuthMode::Client, Some(username)) => self.end_entity_password(username),
            _ => Ok(generate_password(&self.rng)?),
        }
    }

    /// Stored password of the end entity, generated and persisted the first
    /// time one is needed.
    fn end_entity_password(&self, username: &str) -> StepResult<String> {
        let store = &self.collaborators.end_entities;
        let record = match store.find_by_username(username) {
            Ok(record) => record,
            Err(StoreError::NotFound(_)) => None,
            Err(e) => return Err(StepError::backend("end entity store", &e)),
        };

        match record {
            Some(EndEntityRecord {
                password: Some(password),
                ..
            }) => Ok(password),
            Some(_) => {
                let password = generate_password(&self.rng)?;
                store
                    .set_password(username, &password)
                    .map_err(|e| StepError::backend("end entity store", &e))?;
                info!(username, "stored new password for end entity");
                Ok(password)
            }
            None => {
                debug!(username, "no end entity record, using a fresh secret");
                Ok(generate_password(&self.rng)?)
            }
        }
    }
}

impl std::fmt::Debug for EndEntityCertificateAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndEntityCertificateAuth")
            .field("alias", &self.alias)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
