//! Label selectors.
//!
//! A selector is a comma-separated list of requirements, all of which must
//! hold for a label set to match:
//!
//! ```text
//! env=prod            label present and equal
//! env==prod           same as above
//! tier!=db            label absent or different
//! gpu                 label present
//! !legacy             label absent
//! ```
//!
//! The empty selector matches every label set.

use crate::error::MetadataError;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A single selector requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Requirement {
    Equals(String, String),
    NotEquals(String, String),
    Exists(String),
    DoesNotExist(String),
}

impl Requirement {
    fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        match self {
            Self::Equals(k, v) => labels.get(k) == Some(v),
            Self::NotEquals(k, v) => labels.get(k) != Some(v),
            Self::Exists(k) => labels.contains_key(k),
            Self::DoesNotExist(k) => !labels.contains_key(k),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals(k, v) => write!(f, "{}={}", k, v),
            Self::NotEquals(k, v) => write!(f, "{}!={}", k, v),
            Self::Exists(k) => write!(f, "{}", k),
            Self::DoesNotExist(k) => write!(f, "!{}", k),
        }
    }
}

/// Conjunction of label requirements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector {
    requirements: Vec<Requirement>,
}

impl LabelSelector {
    /// Selector requiring every pair of `set` to be present with the same value.
    pub fn from_set(set: &BTreeMap<String, String>) -> Self {
        Self {
            requirements: set
                .iter()
                .map(|(k, v)| Requirement::Equals(k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Parse a selector expression.
    pub fn parse(expr: &str) -> Result<Self, MetadataError> {
        let invalid = |reason: &str| MetadataError::InvalidSelector {
            selector: expr.to_string(),
            reason: reason.to_string(),
        };

        let mut requirements = Vec::new();
        if expr.trim().is_empty() {
            return Ok(Self { requirements });
        }

        for term in expr.split(',').map(str::trim) {
            if term.is_empty() {
                return Err(invalid("empty requirement"));
            }

            let requirement = if let Some((key, value)) = term.split_once("!=") {
                Requirement::NotEquals(key.trim().to_string(), value.trim().to_string())
            } else if let Some((key, value)) = term.split_once("==") {
                Requirement::Equals(key.trim().to_string(), value.trim().to_string())
            } else if let Some((key, value)) = term.split_once('=') {
                Requirement::Equals(key.trim().to_string(), value.trim().to_string())
            } else if let Some(key) = term.strip_prefix('!') {
                Requirement::DoesNotExist(key.trim().to_string())
            } else {
                Requirement::Exists(term.to_string())
            };

            match &requirement {
                Requirement::Equals(key, value) | Requirement::NotEquals(key, value) => {
                    validate_key(key).map_err(invalid)?;
                    validate_value(value).map_err(invalid)?;
                }
                Requirement::Exists(key) | Requirement::DoesNotExist(key) => {
                    validate_key(key).map_err(invalid)?;
                }
            }
            requirements.push(requirement);
        }

        Ok(Self { requirements })
    }

    /// Whether this selector matches everything.
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// Check a label set against every requirement.
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.requirements.iter().all(|r| r.matches(labels))
    }
}

fn validate_key(key: &str) -> Result<(), &'static str> {
    if key.is_empty() {
        return Err("label key cannot be empty");
    }
    // Keys may carry a DNS prefix, e.g. "example.com/role"
    if key.chars().all(|c| is_label_char(c) || c == '/') {
        Ok(())
    } else {
        Err("label key contains invalid characters")
    }
}

fn validate_value(value: &str) -> Result<(), &'static str> {
    if value.chars().all(is_label_char) {
        Ok(())
    } else {
        Err("label value contains invalid characters")
    }
}

fn is_label_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

impl FromStr for LabelSelector {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, r) in self.requirements.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", r)?;
        }
        Ok(())
    }
}
