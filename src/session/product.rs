//! Product specs and per-product regcode resolution.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::scc::ProductRequest;

/// A product to activate on a system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSpec {
    pub identifier: String,
    pub version: String,
    pub arch: String,
    /// Overrides the system regcode for this product only.
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub regcode: Option<String>,
}

impl ProductSpec {
    pub fn new(identifier: &str, version: &str, arch: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            version: version.to_string(),
            arch: arch.to_string(),
            regcode: None,
        }
    }

    pub fn with_regcode(mut self, regcode: &str) -> Self {
        self.regcode = non_empty(regcode.to_string());
        self
    }

    /// The product's own regcode if it has one, otherwise the system's.
    pub fn resolve_regcode<'a>(&'a self, system_regcode: &'a str) -> &'a str {
        self.regcode.as_deref().unwrap_or(system_regcode)
    }

    /// Build the wire request, with the regcode already resolved.
    pub fn to_request(&self, system_regcode: &str) -> ProductRequest {
        ProductRequest {
            identifier: self.identifier.clone(),
            version: self.version.clone(),
            arch: self.arch.clone(),
            regcode: self.resolve_regcode(system_regcode).to_string(),
        }
    }
}

impl fmt::Display for ProductSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.identifier, self.version, self.arch)
    }
}

/// Parses `identifier/version/arch[:regcode]`, e.g. `SLES/12.3/x86_64`.
impl FromStr for ProductSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let usage = || format!("invalid product '{s}'. Use: identifier/version/arch[:regcode]");

        let (triple, regcode) = match s.split_once(':') {
            Some((triple, regcode)) => (triple, Some(regcode)),
            None => (s, None),
        };

        let parts: Vec<&str> = triple.split('/').collect();
        let [identifier, version, arch] = parts.as_slice() else {
            return Err(usage());
        };
        if [identifier, version, arch].iter().any(|p| p.is_empty()) {
            return Err(usage());
        }

        let spec = Self::new(identifier, version, arch);
        Ok(match regcode {
            Some(regcode) => spec.with_regcode(regcode),
            None => spec,
        })
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.and_then(non_empty))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_regcode_overrides_system() {
        let spec = ProductSpec::new("sle-module-hpc", "12", "x86_64").with_regcode("R2");
        assert_eq!(spec.resolve_regcode("R1"), "R2");
        assert_eq!(spec.to_request("R1").regcode, "R2");
    }

    #[test]
    fn test_missing_regcode_falls_back_to_system() {
        let spec = ProductSpec::new("SLES", "12.3", "x86_64");
        assert_eq!(spec.resolve_regcode("R1"), "R1");

        let blank = ProductSpec::new("SLES", "12.3", "x86_64").with_regcode("");
        assert_eq!(blank.regcode, None);
        assert_eq!(blank.to_request("R1").regcode, "R1");
    }

    #[test]
    fn test_parse_product() {
        let spec: ProductSpec = "SLES/12.3/x86_64".parse().unwrap();
        assert_eq!(spec, ProductSpec::new("SLES", "12.3", "x86_64"));

        let spec: ProductSpec = "sle-sdk/12.3/x86_64:R2".parse().unwrap();
        assert_eq!(spec.identifier, "sle-sdk");
        assert_eq!(spec.regcode.as_deref(), Some("R2"));
        assert_eq!(spec.to_string(), "sle-sdk/12.3/x86_64");
    }

    #[test]
    fn test_parse_product_invalid() {
        assert!("SLES".parse::<ProductSpec>().is_err());
        assert!("SLES/12.3".parse::<ProductSpec>().is_err());
        assert!("SLES//x86_64".parse::<ProductSpec>().is_err());
        assert!("a/b/c/d".parse::<ProductSpec>().is_err());
    }

    #[test]
    fn test_empty_regcode_in_toml_is_none() {
        let spec: ProductSpec = toml::from_str(
            r#"
            identifier = "SLES"
            version = "12.3"
            arch = "x86_64"
            regcode = ""
            "#,
        )
        .unwrap();
        assert_eq!(spec.regcode, None);

        let spec: ProductSpec =
            toml::from_str("identifier = \"SLES\"\nversion = \"15\"\narch = \"aarch64\"").unwrap();
        assert_eq!(spec.regcode, None);
    }
}
