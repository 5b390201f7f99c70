//! Vendor-mode plugin backed by per-alias lists of vendor CA names.

use std::collections::BTreeMap;
use std::sync::Arc;

use cmpgate_core::{CaService, Certificate, RequestType, TrustAnchor, VendorMode};
use tracing::{debug, warn};

use crate::cert::ParsedCertificate;
use crate::config::CmpConfig;

/// Treats initialization and certification requests on vendor-mode aliases
/// as vendor traffic. Each alias trusts only its own vendor CAs.
pub struct VendorCaList {
    cas: Arc<dyn CaService>,
    aliases: BTreeMap<String, Vec<String>>,
}

impl VendorCaList {
    /// Build from the `vendor_mode` aliases of a configuration.
    pub fn from_config(cas: Arc<dyn CaService>, config: &CmpConfig) -> Self {
        let aliases = config
            .aliases
            .iter()
            .filter(|(_, c)| c.vendor_mode && !c.vendor_cas.is_empty())
            .map(|(alias, c)| (alias.clone(), c.vendor_cas.clone()))
            .collect();
        Self { cas, aliases }
    }
}

impl VendorMode for VendorCaList {
    fn is_vendor_traffic(&self, request_type: RequestType, alias: &str) -> bool {
        matches!(
            request_type,
            RequestType::Initialization | RequestType::Certification
        ) && self.aliases.contains_key(alias)
    }

    fn resolve_vendor_trust_anchor(
        &self,
        alias: &str,
        signer_chain: &[Certificate],
    ) -> Option<TrustAnchor> {
        let names = self.aliases.get(alias)?;
        let issuers: Vec<_> = signer_chain
            .iter()
            .filter_map(|c| ParsedCertificate::parse(c).ok())
            .filter_map(|p| p.issuer_dn().ok())
            .collect();

        for name in names {
            let anchor = match self.cas.trust_anchor_by_name(name) {
                Ok(anchor) => anchor,
                Err(e) => {
                    warn!(alias, ca = %name, error = %e, "configured vendor CA unavailable");
                    continue;
                }
            };
            if issuers.iter().any(|dn| *dn == anchor.subject_dn) {
                debug!(alias, ca = %name, "vendor certificate issued by configured vendor CA");
                return Some(anchor);
            }
        }
        None
    }
}

impl std::fmt::Debug for VendorCaList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VendorCaList")
            .field("aliases", &self.aliases)
            .finish_non_exhaustive()
    }
}
