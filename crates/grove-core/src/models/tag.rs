//! Tag identifier model

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shape of a normalized tag id: uppercase hex bytes, colon-delimited.
pub const TAG_ID_PATTERN: &str = "^[0-9A-F]{2}(:[0-9A-F]{2})*$";

/// Prefix used to derive a tree record id from a tag id.
const DERIVED_ID_PREFIX: &str = "TR-";

/// A physical tag's unique identifier, normalized to uppercase
/// colon-delimited hex (e.g. `04:5A:2B:8C`).
///
/// Produced once per successful read and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagIdentifier(String);

impl TagIdentifier {
    /// Normalize raw uid bytes into a tag identifier.
    ///
    /// Returns `None` for an empty uid (a tag that responded without one).
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.is_empty() {
            return None;
        }
        let hex = bytes
            .iter()
            .map(|byte| format!("{byte:02X}"))
            .collect::<Vec<_>>()
            .join(":");
        Some(Self(hex))
    }

    /// Get the normalized string form of this identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derive the tree record id for this tag.
    ///
    /// Pure function of the tag id: the same tag always yields the same
    /// derived id (`04:5A:2B:8C` -> `TR-045A2B8C`).
    #[must_use]
    pub fn derived_id(&self) -> String {
        format!("{DERIVED_ID_PREFIX}{}", self.0.replace(':', ""))
    }
}

impl fmt::Display for TagIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TagIdentifier {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let re = Regex::new(TAG_ID_PATTERN).expect("Invalid regex");
        if re.is_match(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(crate::Error::InvalidInput(format!(
                "not a normalized tag id: {s}"
            )))
        }
    }
}
