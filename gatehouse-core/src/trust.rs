use serde::{Deserialize, Serialize};

use crate::{kind, Resource};

/// A certificate authority trusted by the cluster. `name` is the cluster the
/// authority certifies.
///
/// Only public key material is carried here; signing keys never leave the
/// authority and reads that need them bypass the replica.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertAuthority {
    pub name: String,
    #[serde(default)]
    pub revision: String,
    /// Authorized public keys, one per active key pair.
    #[serde(default)]
    pub checking_keys: Vec<String>,
    /// Rotation state advertised by the authority, empty when standby.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rotation_phase: String,
}

impl CertAuthority {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Resource for CertAuthority {
    fn kind(&self) -> &str {
        kind::CERT_AUTHORITY
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn revision(&self) -> &str {
        &self.revision
    }
}
