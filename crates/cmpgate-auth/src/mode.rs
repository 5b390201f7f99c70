//! Mode resolution.

use cmpgate_core::{AuthMode, Rejection, RequestType, VendorMode};
use tracing::error;

use crate::config::ModuleConfiguration;

/// Result of mode resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedMode {
    /// Trust model for this message
    pub mode: AuthMode,
    /// Trust validation is skipped (pre-authenticated RA traffic)
    pub omit_verifications: bool,
}

/// Decide which trust model applies to a message.
///
/// Checked in order: RA and vendor mode together are illegal; omission is
/// only legal for RA traffic an outer layer already authenticated; then RA
/// if configured, vendor if configured and the plugin claims the message,
/// client otherwise.
pub fn resolve_mode(
    config: &ModuleConfiguration,
    alias: &str,
    request_type: RequestType,
    already_authenticated: bool,
    vendor: &dyn VendorMode,
) -> Result<ResolvedMode, Rejection> {
    if config.ra_mode && config.vendor_mode {
        error!(alias, "RA mode and vendor mode are both enabled, rejecting all traffic");
        return Err(Rejection::IncompatibleModes);
    }

    let omit = config.omit_verifications_in_ra;
    if omit && !(config.ra_mode && already_authenticated) {
        return Err(Rejection::OmissionNotAllowed);
    }

    let mode = if config.ra_mode {
        AuthMode::Ra
    } else if config.vendor_mode && vendor.is_vendor_traffic(request_type, alias) {
        AuthMode::Vendor
    } else {
        AuthMode::Client
    };

    Ok(ResolvedMode {
        mode,
        omit_verifications: omit,
    })
}
