use serde::{Deserialize, Serialize};

use crate::{kind, Resource};

/// A lock disabling access for a matched target (user, role, node, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lock {
    pub name: String,
    #[serde(default)]
    pub revision: String,
    /// Target expression, e.g. `user:alice`.
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Lock {
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            ..Self::default()
        }
    }
}

impl Resource for Lock {
    fn kind(&self) -> &str {
        kind::LOCK
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn revision(&self) -> &str {
        &self.revision
    }
}

/// An access list delegating membership management to its owners.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessList {
    pub name: String,
    #[serde(default)]
    pub revision: String,
    pub title: String,
    #[serde(default)]
    pub owners: Vec<String>,
}

impl AccessList {
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            ..Self::default()
        }
    }
}

impl Resource for AccessList {
    fn kind(&self) -> &str {
        kind::ACCESS_LIST
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn revision(&self) -> &str {
        &self.revision
    }
}
