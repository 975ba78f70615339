//! Resource kind names and the watch/dispatch keys built from them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const USER: &str = "user";
pub const ROLE: &str = "role";
pub const NODE: &str = "node";
pub const TOKEN: &str = "token";
pub const CERT_AUTHORITY: &str = "cert_authority";
pub const LOCK: &str = "lock";
pub const ACCESS_LIST: &str = "access_list";
pub const WEB_SESSION: &str = "web_session";
pub const CLUSTER_NAME: &str = "cluster_name";
pub const AUTH_PREFERENCE: &str = "cluster_auth_preference";

/// Sub-kinds of [`WEB_SESSION`]. Sessions of different sub-kinds share a
/// schema but live in distinct collections.
pub const SUB_KIND_WEB: &str = "web";
pub const SUB_KIND_APP: &str = "app";
pub const SUB_KIND_SNOWFLAKE: &str = "snowflake";
pub const SUB_KIND_SAML_IDP: &str = "saml_idp";

/// The normalised dispatch key of a resource family.
///
/// `sub_kind` participates in the key only for kinds that split into
/// sub-kinded families (web sessions); for every other kind it is empty no
/// matter what the resource or watch declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceKey {
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sub_kind: String,
}

impl ResourceKey {
    /// Key for a kind that does not use sub-kinds.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            sub_kind: String::new(),
        }
    }

    /// Builds the normalised key from raw kind/sub-kind strings.
    pub fn from_parts(kind: &str, sub_kind: &str) -> Self {
        match kind {
            WEB_SESSION => Self {
                kind: kind.to_string(),
                sub_kind: sub_kind.to_string(),
            },
            _ => Self::new(kind),
        }
    }

    /// The dispatch key a declared watch resolves to.
    pub fn from_watch(watch: &WatchKind) -> Self {
        Self::from_parts(&watch.kind, &watch.sub_kind)
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sub_kind.is_empty() {
            f.write_str(&self.kind)
        } else {
            write!(f, "{}/{}", self.kind, self.sub_kind)
        }
    }
}

/// A declared interest in one resource family.
///
/// The set of watches passed to the cache at construction fixes which
/// collections exist for its whole lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchKind {
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sub_kind: String,
    /// Ask the authority to include secret payloads on the stream. The
    /// replica never stores them; this only matters to consumers of the raw
    /// stream.
    #[serde(default)]
    pub load_secrets: bool,
    /// Opaque label filter forwarded to the authority.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filter: BTreeMap<String, String>,
}

impl WatchKind {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_sub_kind(mut self, sub_kind: impl Into<String>) -> Self {
        self.sub_kind = sub_kind.into();
        self
    }

    #[must_use]
    pub fn with_secrets(mut self) -> Self {
        self.load_secrets = true;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: BTreeMap<String, String>) -> Self {
        self.filter = filter;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_kind_only_keys_web_sessions() {
        let session = ResourceKey::from_parts(WEB_SESSION, SUB_KIND_APP);
        assert_eq!(session.sub_kind, SUB_KIND_APP);

        // Stray sub-kinds on other kinds are dropped from the key.
        let node = ResourceKey::from_parts(NODE, "openssh");
        assert_eq!(node, ResourceKey::new(NODE));
    }

    #[test]
    fn key_display() {
        assert_eq!(ResourceKey::new(USER).to_string(), "user");
        assert_eq!(
            ResourceKey::from_parts(WEB_SESSION, SUB_KIND_SAML_IDP).to_string(),
            "web_session/saml_idp"
        );
    }
}
