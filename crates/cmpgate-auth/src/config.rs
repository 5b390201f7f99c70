//! Per-alias module configuration.
//!
//! A deployment serves several CMP aliases (URL suffixes), each with its own
//! trust model. The whole set is kept in one TOML file:
//!
//! ```toml
//! [aliases.ra]
//! ra_mode = true
//! authentication_parameter = "ManagementCA"
//! end_entity_profile = "KeyId"
//!
//! [aliases.client]
//! extract_username_component = "CN"
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use cmpgate_core::{AuthError, Result};
use serde::{Deserialize, Serialize};

/// Value of `authentication_parameter` that selects the trust anchor by the
/// signer certificate's issuer instead of by name.
pub const ISSUER_OF_SIGNER: &str = "-";

/// Value of `extract_username_component` that uses the whole subject DN.
pub const WHOLE_DN: &str = "DN";

/// How a profile or CA is chosen for an RA request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProfileSelector {
    /// Use the message's senderKID as the name (`"KeyId"`)
    KeyId,
    /// Use the default of the enclosing profile (`"ProfileDefault"`)
    #[default]
    ProfileDefault,
    /// A fixed name
    Named(String),
}

impl From<String> for ProfileSelector {
    fn from(s: String) -> Self {
        match s.as_str() {
            "KeyId" => Self::KeyId,
            "ProfileDefault" => Self::ProfileDefault,
            _ => Self::Named(s),
        }
    }
}

impl From<ProfileSelector> for String {
    fn from(s: ProfileSelector) -> Self {
        s.to_string()
    }
}

impl fmt::Display for ProfileSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyId => f.write_str("KeyId"),
            Self::ProfileDefault => f.write_str("ProfileDefault"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Illegal combination of mode flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigIssue {
    /// `ra_mode` and `vendor_mode` are both set
    IncompatibleModes,
    /// `omit_verifications_in_ra` without `ra_mode`
    OmissionWithoutRaMode,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IncompatibleModes => f.write_str("ra_mode and vendor_mode are mutually exclusive"),
            Self::OmissionWithoutRaMode => {
                f.write_str("omit_verifications_in_ra requires ra_mode")
            }
        }
    }
}

/// Settings of one CMP alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfiguration {
    /// Peers are Registration Authorities acting for end entities.
    #[serde(default)]
    pub ra_mode: bool,

    /// Peers may bootstrap with a vendor-issued certificate.
    #[serde(default)]
    pub vendor_mode: bool,

    /// Skip trust validation for RA messages already authenticated by an
    /// outer layer.
    #[serde(default)]
    pub omit_verifications_in_ra: bool,

    /// Name of the CA whose certificate roots trust, or `"-"`.
    #[serde(default = "default_authentication_parameter")]
    pub authentication_parameter: String,

    /// End-entity profile selection (RA mode).
    #[serde(default)]
    pub end_entity_profile: ProfileSelector,

    /// Certificate profile selection (RA mode).
    #[serde(default)]
    pub certificate_profile: ProfileSelector,

    /// CA selection (RA mode).
    #[serde(default)]
    pub ca: ProfileSelector,

    /// DN attribute holding the username, or `"DN"` for the whole DN.
    #[serde(default = "default_username_component")]
    pub extract_username_component: String,

    /// Prepended to extracted usernames.
    #[serde(default)]
    pub ra_name_prefix: String,

    /// Appended to extracted usernames.
    #[serde(default)]
    pub ra_name_postfix: String,

    /// Names of the CAs trusted to issue vendor certificates.
    #[serde(default)]
    pub vendor_cas: Vec<String>,
}

impl Default for ModuleConfiguration {
    fn default() -> Self {
        Self {
            ra_mode: false,
            vendor_mode: false,
            omit_verifications_in_ra: false,
            authentication_parameter: default_authentication_parameter(),
            end_entity_profile: ProfileSelector::default(),
            certificate_profile: ProfileSelector::default(),
            ca: ProfileSelector::default(),
            extract_username_component: default_username_component(),
            ra_name_prefix: String::new(),
            ra_name_postfix: String::new(),
            vendor_cas: Vec::new(),
        }
    }
}

impl ModuleConfiguration {
    /// Settings for an RA alias trusting the named CA.
    #[must_use]
    pub fn ra(authentication_ca: impl Into<String>) -> Self {
        Self {
            ra_mode: true,
            authentication_parameter: authentication_ca.into(),
            ..Self::default()
        }
    }

    /// Settings for a client alias trusting the named CA.
    #[must_use]
    pub fn client(authentication_ca: impl Into<String>) -> Self {
        Self {
            authentication_parameter: authentication_ca.into(),
            ..Self::default()
        }
    }

    /// Check the mode flags. Message-dependent conditions (whether the
    /// message was already authenticated) are checked per message.
    pub const fn validate(&self) -> std::result::Result<(), ConfigIssue> {
        if self.ra_mode && self.vendor_mode {
            return Err(ConfigIssue::IncompatibleModes);
        }
        if self.omit_verifications_in_ra && !self.ra_mode {
            return Err(ConfigIssue::OmissionWithoutRaMode);
        }
        Ok(())
    }

    /// Whether the trust anchor follows the signer's issuer.
    #[must_use]
    pub fn anchor_by_issuer(&self) -> bool {
        self.authentication_parameter.trim() == ISSUER_OF_SIGNER
    }
}

/// All aliases of a deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmpConfig {
    /// Alias name to settings.
    #[serde(default)]
    pub aliases: BTreeMap<String, ModuleConfiguration>,
}

impl CmpConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse config from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| AuthError::Config(e.to_string()))
    }

    /// Settings of an alias.
    #[must_use]
    pub fn alias(&self, name: &str) -> Option<&ModuleConfiguration> {
        self.aliases.get(name)
    }

    /// Add or replace an alias.
    #[must_use]
    pub fn with_alias(mut self, name: impl Into<String>, config: ModuleConfiguration) -> Self {
        self.aliases.insert(name.into(), config);
        self
    }
}

// Default value functions for serde.
fn default_authentication_parameter() -> String {
    String::from(ISSUER_OF_SIGNER)
}

fn default_username_component() -> String {
    String::from(WHOLE_DN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ModuleConfiguration::default();
        assert!(!config.ra_mode);
        assert!(config.anchor_by_issuer());
        assert_eq!(config.extract_username_component, "DN");
        assert_eq!(config.end_entity_profile, ProfileSelector::ProfileDefault);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_selector_strings() {
        assert_eq!(ProfileSelector::from("KeyId".to_string()), ProfileSelector::KeyId);
        assert_eq!(
            ProfileSelector::from("ENDUSER".to_string()),
            ProfileSelector::Named("ENDUSER".into())
        );
        assert_eq!(String::from(ProfileSelector::ProfileDefault), "ProfileDefault");
    }

    #[test]
    fn test_validate_flags() {
        let mut config = ModuleConfiguration::ra("ManagementCA");
        config.vendor_mode = true;
        assert_eq!(config.validate(), Err(ConfigIssue::IncompatibleModes));

        let mut config = ModuleConfiguration::client("ManagementCA");
        config.omit_verifications_in_ra = true;
        assert_eq!(config.validate(), Err(ConfigIssue::OmissionWithoutRaMode));
    }

    #[test]
    fn test_parse_toml() {
        let config = CmpConfig::from_toml(
            r#"
            [aliases.ra]
            ra_mode = true
            authentication_parameter = "ManagementCA"
            end_entity_profile = "KeyId"
            certificate_profile = "ENDUSER"

            [aliases.client]
            extract_username_component = "CN"
            "#,
        )
        .unwrap();

        let ra = config.alias("ra").unwrap();
        assert!(ra.ra_mode);
        assert_eq!(ra.end_entity_profile, ProfileSelector::KeyId);
        assert_eq!(ra.certificate_profile, ProfileSelector::Named("ENDUSER".into()));
        assert_eq!(ra.ca, ProfileSelector::ProfileDefault);

        let client = config.alias("client").unwrap();
        assert_eq!(client.extract_username_component, "CN");
        assert!(config.alias("missing").is_none());
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CmpConfig::load(&dir.path().join("cmp.toml")).unwrap();
        assert!(config.aliases.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cmp.toml");
        std::fs::write(&path, "[aliases.vendor]\nvendor_mode = true\nvendor_cas = [\"VendorCA\"]\n")
            .unwrap();
        let config = CmpConfig::load(&path).unwrap();
        let vendor = config.alias("vendor").unwrap();
        assert!(vendor.vendor_mode);
        assert_eq!(vendor.vendor_cas, vec!["VendorCA".to_string()]);
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = CmpConfig::from_toml("aliases = 3").unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_config_serialization() {
        let config = CmpConfig::default().with_alias("ra", ModuleConfiguration::ra("ManagementCA"));
        let json = serde_json::to_string(&config).unwrap();
        let parsed: CmpConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
