//! Distinguished names.
//!
//! DNs reach the pipeline from several places: certificate subjects and
//! issuers rendered by the X.509 parser (`CN=Foo, O=Bar`), certificate
//! templates inside requests, and configuration. They are compared only in
//! canonical form: attribute types upper-cased and aliased, values trimmed,
//! and attributes ordered by a fixed precedence.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hash::sha256_raw;

/// Attribute precedence used when canonicalizing. Unknown types sort last,
/// keeping their original relative order.
const ATTRIBUTE_ORDER: &[&str] = &[
    "E",
    "UID",
    "CN",
    "SN",
    "SERIALNUMBER",
    "GIVENNAME",
    "INITIALS",
    "SURNAME",
    "T",
    "OU",
    "O",
    "L",
    "ST",
    "DC",
    "C",
];

/// A DN string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid distinguished name component '{component}'")]
pub struct InvalidDn {
    /// The offending `type=value` fragment
    pub component: String,
}

/// A parsed, canonically ordered distinguished name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DistinguishedName {
    components: Vec<(String, String)>,
}

impl DistinguishedName {
    /// Parse a DN string such as `CN=TestCA, O=Org`.
    ///
    /// Both `,` and `+` separate attributes; a backslash escapes the next
    /// character. An empty or all-whitespace string yields an empty DN.
    pub fn parse(input: &str) -> Result<Self, InvalidDn> {
        let mut components = Vec::new();
        for part in split_unescaped(input) {
            if part.trim().is_empty() {
                continue;
            }
            let Some((key, value)) = split_type_value(&part) else {
                return Err(InvalidDn { component: part });
            };
            let key = normalize_type(key.trim());
            if key.is_empty() {
                return Err(InvalidDn { component: part });
            }
            components.push((key, unescape(value.trim())));
        }

        components.sort_by_key(|(k, _)| rank(k));
        Ok(Self { components })
    }

    /// Build a DN from already separated `(type, value)` pairs, as read
    /// attribute by attribute from a certificate.
    pub fn from_components<I, K, V>(pairs: I) -> Result<Self, InvalidDn>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut components = Vec::new();
        for (key, value) in pairs {
            let normalized = normalize_type(key.as_ref().trim());
            if normalized.is_empty() {
                return Err(InvalidDn {
                    component: format!("={}", value.as_ref()),
                });
            }
            components.push((normalized, value.as_ref().trim().to_string()));
        }
        components.sort_by_key(|(k, _)| rank(k));
        Ok(Self { components })
    }

    /// True when the DN carries no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// First value of the given attribute type (case-insensitive, aliases honoured).
    #[must_use]
    pub fn get(&self, attribute: &str) -> Option<&str> {
        let wanted = normalize_type(attribute);
        self.components
            .iter()
            .find(|(k, _)| *k == wanted)
            .map(|(_, v)| v.as_str())
    }

    /// Canonical string form, e.g. `CN=TestCA,O=Org`.
    #[must_use]
    pub fn canonical(&self) -> String {
        self.components
            .iter()
            .map(|(k, v)| format!("{k}={}", escape(v)))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// The CA id implied by this DN. See [`ca_id_from_dn`].
    #[must_use]
    pub fn ca_id(&self) -> i32 {
        let digest = sha256_raw(self.canonical().as_bytes());
        i32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl FromStr for DistinguishedName {
    type Err = InvalidDn;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DistinguishedName {
    type Error = InvalidDn;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DistinguishedName> for String {
    fn from(dn: DistinguishedName) -> Self {
        dn.canonical()
    }
}

/// Derive the CA id a DN refers to.
///
/// The id is the first four bytes (big-endian, signed) of SHA-256 over the
/// canonical DN, so `CN=TestCA, O=Org` and `O=Org,CN=TestCA` map to the same
/// CA. The same value is used by [`crate::CaService::trust_anchor_by_issuer_hash`].
pub fn ca_id_from_dn(dn: &str) -> Result<i32, InvalidDn> {
    DistinguishedName::parse(dn).map(|d| d.ca_id())
}

fn rank(key: &str) -> usize {
    ATTRIBUTE_ORDER
        .iter()
        .position(|k| *k == key)
        .unwrap_or(ATTRIBUTE_ORDER.len())
}

fn normalize_type(key: &str) -> String {
    let upper = key.to_ascii_uppercase();
    match upper.as_str() {
        "EMAIL" | "EMAILADDRESS" | "1.2.840.113549.1.9.1" => "E".to_string(),
        "S" | "STATEORPROVINCENAME" => "ST".to_string(),
        "COMMONNAME" | "2.5.4.3" => "CN".to_string(),
        "ORGANIZATIONNAME" | "2.5.4.10" => "O".to_string(),
        "ORGANIZATIONALUNITNAME" | "2.5.4.11" => "OU".to_string(),
        "COUNTRYNAME" | "2.5.4.6" => "C".to_string(),
        "LOCALITYNAME" | "2.5.4.7" => "L".to_string(),
        "USERID" => "UID".to_string(),
        _ => upper,
    }
}

fn split_unescaped(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ',' | '+' | ';' => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts
}

fn split_type_value(part: &str) -> Option<(&str, &str)> {
    let idx = part.find('=')?;
    Some((&part[..idx], &part[idx + 1..]))
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, ',' | '+' | ';' | '\\' | '=') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_orders_attributes() {
        let dn = DistinguishedName::parse("C=SE, O=Org, CN=TestCA").unwrap();
        assert_eq!(dn.canonical(), "CN=TestCA,O=Org,C=SE");
    }

    #[test]
    fn equal_regardless_of_spacing_and_order() {
        let a = DistinguishedName::parse("CN=TestCA,O=Org").unwrap();
        let b = DistinguishedName::parse("o=Org ,  cn = TestCA").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.ca_id(), b.ca_id());
    }

    #[test]
    fn escaped_comma_stays_in_value() {
        let dn = DistinguishedName::parse(r"CN=Doe\, John,O=Org").unwrap();
        assert_eq!(dn.get("cn"), Some("Doe, John"));
        assert_eq!(dn.canonical(), r"CN=Doe\, John,O=Org");
    }

    #[test]
    fn aliases_normalize() {
        let dn = DistinguishedName::parse("emailAddress=a@b.c,commonName=x").unwrap();
        assert_eq!(dn.get("E"), Some("a@b.c"));
        assert_eq!(dn.get("CN"), Some("x"));
    }

    #[test]
    fn from_components_matches_parse() {
        let built =
            DistinguishedName::from_components([("O", "Org"), ("commonName", "Doe, John")]).unwrap();
        let parsed = DistinguishedName::parse(r"CN=Doe\, John,O=Org").unwrap();
        assert_eq!(built, parsed);
    }

    #[test]
    fn empty_dn() {
        let dn = DistinguishedName::parse("  ").unwrap();
        assert!(dn.is_empty());
        assert_eq!(dn.canonical(), "");
    }

    #[test]
    fn component_without_equals_is_rejected() {
        let err = DistinguishedName::parse("CN=ok,garbage").unwrap_err();
        assert_eq!(err.component, "garbage");
    }

    #[test]
    fn different_dns_have_different_ca_ids() {
        let a = ca_id_from_dn("CN=TestCA,O=Org").unwrap();
        let b = ca_id_from_dn("CN=OtherCA,O=Org").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn serde_uses_canonical_string() {
        let dn = DistinguishedName::parse("O=Org,CN=A").unwrap();
        let json = serde_json::to_string(&dn).unwrap();
        assert_eq!(json, "\"CN=A,O=Org\"");
        let back: DistinguishedName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dn);
    }
}
