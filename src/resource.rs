//! Compact `key=value,key=value` resource strings.
//!
//! A resource string names quantities for a fixed set of resources, e.g.
//! `cpu=0.1,memory=1024Mi,disk=10Gi,accelerator=1`. Whitespace around the
//! separators is ignored. When a key repeats, the last occurrence wins.

use crate::error::{LaunchError, LaunchResult};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use strum::{Display, EnumString};

static QUANTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d+(?:\.\d+)?|\.\d+)(?:m|k|M|G|T|P|E|Ki|Mi|Gi|Ti|Pi|Ei)?$")
        .expect("quantity pattern is valid")
});

/// Resources a spec may name. Declaration order is the rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ResourceKind {
    Cpu,
    Memory,
    Disk,
    Accelerator,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceSpec {
    quantities: BTreeMap<ResourceKind, String>,
}

impl ResourceSpec {
    /// Parse a non-empty resource string.
    pub fn parse(spec: &str) -> LaunchResult<Self> {
        let trimmed = spec.trim();
        if trimmed.is_empty() {
            return Err(LaunchError::resource_spec(spec, "resource spec cannot be empty"));
        }

        let mut quantities = BTreeMap::new();
        for pair in trimmed.split(',') {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| LaunchError::resource_spec(spec, format!("'{}' lacks '='", pair.trim())))?;
            let (key, value) = (key.trim(), value.trim());

            let kind = ResourceKind::from_str(key).map_err(|_| {
                LaunchError::resource_spec(
                    spec,
                    format!("unknown resource '{key}', expected one of cpu, memory, disk, accelerator"),
                )
            })?;
            validate_quantity(spec, kind, value)?;

            // Later occurrences replace earlier ones.
            quantities.insert(kind, value.to_string());
        }

        Ok(Self { quantities })
    }

    /// Parse an optional resource string, treating a blank value as absent.
    pub fn parse_optional(spec: Option<&str>) -> LaunchResult<Option<Self>> {
        match spec {
            Some(s) if !s.trim().is_empty() => Self::parse(s).map(Some),
            _ => Ok(None),
        }
    }

    pub fn get(&self, kind: ResourceKind) -> Option<&str> {
        self.quantities.get(&kind).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, &str)> {
        self.quantities.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }
}

fn validate_quantity(spec: &str, kind: ResourceKind, value: &str) -> LaunchResult<()> {
    if value.is_empty() {
        return Err(LaunchError::resource_spec(
            spec,
            format!("missing value for '{kind}'"),
        ));
    }

    let valid = match kind {
        ResourceKind::Accelerator => value.bytes().all(|b| b.is_ascii_digit()),
        _ => QUANTITY.is_match(value),
    };
    if !valid {
        let expected = match kind {
            ResourceKind::Accelerator => "a whole number",
            _ => "a quantity such as 0.5, 500m or 4096Mi",
        };
        return Err(LaunchError::resource_spec(
            spec,
            format!("invalid value '{value}' for '{kind}', expected {expected}"),
        ));
    }
    Ok(())
}

impl FromStr for ResourceSpec {
    type Err = LaunchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Renders the canonical form: known keys in declaration order.
impl fmt::Display for ResourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (kind, value) in &self.quantities {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{kind}={value}")?;
            first = false;
        }
        Ok(())
    }
}
