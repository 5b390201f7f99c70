//! Signer certificate selection from `extraCerts`.

use cmpgate_core::{Certificate, Rejection};
use tracing::{debug, warn};

use crate::cert::ParsedCertificate;

/// Pick the certificate that claims to have signed the message.
///
/// A single attached certificate is used as is, CA or not. With several,
/// the first non-CA certificate wins; a chain of CA certificates only falls
/// back to its first entry. Entries that fail to parse count as non-CA, so
/// they get selected and rejected later rather than skipped.
pub fn select_signer(chain: &[Certificate]) -> Result<&Certificate, Rejection> {
    let first = chain.first().ok_or(Rejection::NoCertificate)?;
    if chain.len() == 1 {
        return Ok(first);
    }

    let selected = chain.iter().find(|c| {
        ParsedCertificate::parse(c).map_or(true, |parsed| !parsed.is_ca())
    });
    if let Some(cert) = selected {
        debug!(fingerprint = %cert.fingerprint(), "selected signer certificate");
        return Ok(cert);
    }

    warn!(
        count = chain.len(),
        "extraCerts holds only CA certificates, using the first one"
    );
    Ok(first)
}
