//! End-entity lookup for key update requests.

use cmpgate_core::{DistinguishedName, EndEntityRecord, EndEntityStore, Rejection};
use tracing::{debug, warn};

use crate::error::{StepError, StepResult};

/// Find the single end entity a key update request renews.
///
/// Without an issuer DN the subject DN alone is searched. Exactly one match
/// binds; none or several reject, since an ambiguous renewal target is never
/// guessed.
pub fn resolve_end_entity(
    store: &dyn EndEntityStore,
    subject_dn: &DistinguishedName,
    issuer_dn: Option<&DistinguishedName>,
) -> StepResult<EndEntityRecord> {
    let found = match issuer_dn {
        None => store.find_by_subject_dn(subject_dn),
        Some(issuer) => store.find_by_subject_and_issuer_dn(subject_dn, issuer),
    }
    .map_err(|e| StepError::from_store("end entity store", &e, Rejection::NoSuchEndEntity))?;

    let count = found.len();
    let mut found = found.into_iter();
    match (found.next(), count) {
        (Some(record), 1) => {
            debug!(username = %record.username, subject = %subject_dn, "bound key update to end entity");
            Ok(record)
        }
        (None, _) => {
            debug!(subject = %subject_dn, issuer = ?issuer_dn.map(ToString::to_string), "no end entity for key update");
            Err(Rejection::NoSuchEndEntity.into())
        }
        (Some(_), _) => {
            warn!(
                subject = %subject_dn,
                issuer = ?issuer_dn.map(ToString::to_string),
                matches = count,
                "several end entities match the key update request, refusing to pick one"
            );
            Err(Rejection::NoSuchEndEntity.into())
        }
    }
}
