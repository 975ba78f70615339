use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{kind, Resource};

/// A role granting or denying access to resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    #[serde(default)]
    pub revision: String,
    /// Unix logins permitted by this role.
    #[serde(default)]
    pub logins: Vec<String>,
    /// Label selectors the role applies to, keyed by resource kind.
    #[serde(default)]
    pub node_labels: BTreeMap<String, Vec<String>>,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Resource for Role {
    fn kind(&self) -> &str {
        kind::ROLE
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn revision(&self) -> &str {
        &self.revision
    }
}
