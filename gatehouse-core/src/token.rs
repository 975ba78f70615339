use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::{kind, Resource};

/// A provisioning token used to join new services to the cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionToken {
    pub name: String,
    #[serde(default)]
    pub revision: String,
    /// System roles the token can join as (e.g. `node`, `proxy`).
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<SystemTime>,
}

impl ProvisionToken {
    pub fn new(name: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            name: name.into(),
            roles,
            ..Self::default()
        }
    }
}

impl Resource for ProvisionToken {
    fn kind(&self) -> &str {
        kind::TOKEN
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn revision(&self) -> &str {
        &self.revision
    }
}
