//! Step failures inside the pipeline.

use cmpgate_core::{AuthError, Rejection, StoreError};

/// Why a pipeline step stopped.
///
/// Steps return `Result<T, StepError>` so that both failure classes
/// propagate with `?`; the module splits them again at the end.
#[derive(Debug)]
pub enum StepError {
    /// Ordinary rejection of the message
    Rejected(Rejection),
    /// Broken deployment, aborts processing
    Fatal(AuthError),
}

impl StepError {
    /// Map a collaborator error: backend failures are fatal, anything else
    /// becomes `rejection`.
    pub fn from_store(service: &'static str, err: &StoreError, rejection: Rejection) -> Self {
        match err {
            StoreError::Unavailable(_) => Self::Fatal(AuthError::collaborator(service, err)),
            StoreError::NotFound(_) | StoreError::AuthorizationDenied(_) => {
                Self::Rejected(rejection)
            }
        }
    }

    /// Map a collaborator error where every failure is fatal.
    pub fn backend(service: &'static str, err: &StoreError) -> Self {
        Self::Fatal(AuthError::collaborator(service, err))
    }
}

impl From<Rejection> for StepError {
    fn from(r: Rejection) -> Self {
        Self::Rejected(r)
    }
}

impl From<AuthError> for StepError {
    fn from(e: AuthError) -> Self {
        Self::Fatal(e)
    }
}

/// Result of a single pipeline step.
pub type StepResult<T> = std::result::Result<T, StepError>;
