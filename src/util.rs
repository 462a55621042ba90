//! Pure helpers shared across the model graph
//!
//! Namespace/short-name splitting, the closed primitive type set, and the
//! compact version-requirement matcher used for `concertoVersion` pinning.

use crate::error::{ConcertoError, Result};
use serde::{Deserialize, Serialize};

/// The closed set of primitive field types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    /// UTF-8 text
    String,
    /// true / false
    Boolean,
    /// Instant in time with offset
    DateTime,
    /// 64-bit IEEE float
    Double,
    /// 64-bit signed integer
    Long,
    /// 32-bit signed integer
    Integer,
}

impl PrimitiveType {
    /// Look up a primitive by its schema-level name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "String" => Some(Self::String),
            "Boolean" => Some(Self::Boolean),
            "DateTime" => Some(Self::DateTime),
            "Double" => Some(Self::Double),
            "Long" => Some(Self::Long),
            "Integer" => Some(Self::Integer),
            _ => None,
        }
    }

    /// The schema-level name of this primitive
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Boolean => "Boolean",
            Self::DateTime => "DateTime",
            Self::Double => "Double",
            Self::Long => "Long",
            Self::Integer => "Integer",
        }
    }

    /// Whether this primitive is one of the numeric kinds
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Double | Self::Long | Self::Integer)
    }
}

/// Whether a type name denotes a primitive
pub fn is_primitive(name: &str) -> bool {
    PrimitiveType::from_name(name).is_some()
}

/// Whether a type name is fully qualified (carries a namespace)
pub fn is_fully_qualified(name: &str) -> bool {
    name.contains('.')
}

/// The namespace portion of a fully qualified name
///
/// Returns the empty string for a bare short name.
pub fn get_namespace(fqn: &str) -> &str {
    match fqn.rfind('.') {
        Some(idx) => &fqn[..idx],
        None => "",
    }
}

/// The short-name portion of a fully qualified name
pub fn get_short_name(fqn: &str) -> &str {
    match fqn.rfind('.') {
        Some(idx) => &fqn[idx + 1..],
        None => fqn,
    }
}

/// Join a namespace and a short name into a fully qualified name
pub fn join_fqn(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", namespace, name)
    }
}

/// A parsed `major.minor.patch` version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Version {
    major: u64,
    minor: u64,
    patch: u64,
}

impl Version {
    fn parse(text: &str) -> Result<Self> {
        let mut parts = text.trim().splitn(3, '.');
        let mut next = |label: &str| -> Result<u64> {
            parts
                .next()
                .ok_or_else(|| {
                    ConcertoError::IllegalModel(format!(
                        "Invalid version \"{}\": missing {} component",
                        text, label
                    ))
                })?
                .parse::<u64>()
                .map_err(|_| {
                    ConcertoError::IllegalModel(format!(
                        "Invalid version \"{}\": non-numeric {} component",
                        text, label
                    ))
                })
        };
        Ok(Self {
            major: next("major")?,
            minor: next("minor")?,
            patch: next("patch")?,
        })
    }
}

/// Check whether `version` satisfies a version requirement
///
/// Supported requirement forms: an exact version (`1.2.3`), a caret range
/// (`^1.2.0` accepts any `1.x.y >= 1.2.0`), and space-separated comparators
/// (`>=1.0.0 <2.0.0`). Used to enforce a model file's `concertoVersion` pin.
pub fn version_satisfies(requirement: &str, version: &str) -> Result<bool> {
    let actual = Version::parse(version)?;
    for clause in requirement.split_whitespace() {
        let ok = if let Some(rest) = clause.strip_prefix('^') {
            let wanted = Version::parse(rest)?;
            actual.major == wanted.major && actual >= wanted
        } else if let Some(rest) = clause.strip_prefix(">=") {
            actual >= Version::parse(rest)?
        } else if let Some(rest) = clause.strip_prefix("<=") {
            actual <= Version::parse(rest)?
        } else if let Some(rest) = clause.strip_prefix('>') {
            actual > Version::parse(rest)?
        } else if let Some(rest) = clause.strip_prefix('<') {
            actual < Version::parse(rest)?
        } else if let Some(rest) = clause.strip_prefix('=') {
            actual == Version::parse(rest)?
        } else {
            actual == Version::parse(clause)?
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}
