use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{kind, Resource};

/// A gatehouse user account.
///
/// The catalogue copy never carries login secrets; reads that need them go
/// straight to the authority.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    #[serde(default)]
    pub revision: String,
    /// Names of the roles granted to this user.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Free-form identity traits (e.g. `logins`, `groups`) used during role
    /// template expansion.
    #[serde(default)]
    pub traits: BTreeMap<String, Vec<String>>,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Resource for User {
    fn kind(&self) -> &str {
        kind::USER
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn revision(&self) -> &str {
        &self.revision
    }
}
