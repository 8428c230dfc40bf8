//! Identifiers for graph nodes and inbound requests.
//!
//! Node ids are plain strings on the wire. Compilers assign small
//! increasing integers in topological order, but any unique non-empty
//! string is a legal id. Request ids are UUIDs used for log correlation.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Node identifier - key of a node inside one graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId(String);

impl NodeId {
    /// Create a node id from a raw string
    ///
    /// # Errors
    ///
    /// Returns error if the id is empty or contains whitespace
    pub fn new(raw: impl Into<String>) -> CoreResult<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(CoreError::InvalidId {
                reason: "node id is empty".to_string(),
            });
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(CoreError::InvalidId {
                reason: format!("node id {:?} contains whitespace", raw),
            });
        }
        Ok(Self(raw))
    }

    /// Create the conventional numeric id for a 1-based position
    #[must_use]
    pub fn from_index(index: u32) -> Self {
        Self(index.to_string())
    }

    /// Numeric value of the id, if it follows the `^[0-9]+$` convention
    #[must_use]
    pub fn index(&self) -> Option<u32> {
        if self.0.bytes().all(|b| b.is_ascii_digit()) {
            self.0.parse().ok()
        } else {
            None
        }
    }

    /// Get as string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for NodeId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for NodeId {
    type Error = CoreError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Request identifier - correlates one inbound request across log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Create a new random RequestId
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "req_{}", self.0)
    }
}
