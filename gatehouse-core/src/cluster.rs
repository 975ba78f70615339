use serde::{Deserialize, Serialize};

use crate::{kind, Resource};

/// Fixed names of the singleton cluster resources.
pub const CLUSTER_NAME_NAME: &str = "cluster-name";
pub const AUTH_PREFERENCE_NAME: &str = "auth-preference";

/// The cluster's immutable name. Singleton.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterName {
    #[serde(default)]
    pub revision: String,
    pub cluster_name: String,
}

impl ClusterName {
    pub fn new(cluster_name: impl Into<String>) -> Self {
        Self {
            revision: String::new(),
            cluster_name: cluster_name.into(),
        }
    }
}

impl Resource for ClusterName {
    fn kind(&self) -> &str {
        kind::CLUSTER_NAME
    }

    fn name(&self) -> &str {
        CLUSTER_NAME_NAME
    }

    fn revision(&self) -> &str {
        &self.revision
    }
}

/// Cluster-wide authentication settings. Singleton.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthPreference {
    #[serde(default)]
    pub revision: String,
    /// Primary authentication type, e.g. `local` or `oidc`.
    #[serde(default)]
    pub auth_type: String,
    #[serde(default)]
    pub second_factor: bool,
}

impl Resource for AuthPreference {
    fn kind(&self) -> &str {
        kind::AUTH_PREFERENCE
    }

    fn name(&self) -> &str {
        AUTH_PREFERENCE_NAME
    }

    fn revision(&self) -> &str {
        &self.revision
    }
}
