//! Username derivation from subject DNs.

use cmpgate_core::DistinguishedName;

use crate::config::{ModuleConfiguration, WHOLE_DN};

/// Derive a username from a subject DN using the configured component and
/// name prefix/postfix. `None` when the DN lacks the component.
pub fn username_from_dn(dn: &DistinguishedName, config: &ModuleConfiguration) -> Option<String> {
    let component = config.extract_username_component.trim();
    let base = if component.eq_ignore_ascii_case(WHOLE_DN) {
        Some(dn.canonical()).filter(|s| !s.is_empty())
    } else {
        dn.get(component)
            .map(str::to_string)
            .filter(|s| !s.is_empty())
    }?;
    Some(format!(
        "{}{base}{}",
        config.ra_name_prefix, config.ra_name_postfix
    ))
}
