use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{kind, Resource};

/// A registered SSH node.
///
/// `name` is the host UUID; the human-facing hostname is a separate field
/// and is what consumers usually look nodes up by.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub name: String,
    #[serde(default)]
    pub revision: String,
    pub hostname: String,
    /// Dialable address, `host:port`.
    #[serde(default)]
    pub addr: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl Server {
    pub fn new(name: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hostname: hostname.into(),
            ..Self::default()
        }
    }
}

impl Resource for Server {
    fn kind(&self) -> &str {
        kind::NODE
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn revision(&self) -> &str {
        &self.revision
    }
}
