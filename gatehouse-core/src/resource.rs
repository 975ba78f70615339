use serde::{Deserialize, Serialize};

use crate::kind::ResourceKey;

/// An accessor trait for a gatehouse resource.
///
/// Every catalogue resource carries a stable identity: `kind` discriminates
/// the resource family, `sub_kind` further splits families that share a
/// schema (today only web sessions), and `name` is unique within
/// `(kind, sub_kind)`. `revision` is an opaque version assigned by the
/// authority on every write.
pub trait Resource {
    /// Returns the kind of this resource, one of the [`crate::kind`] constants.
    fn kind(&self) -> &str;

    /// Returns the sub-kind of this resource, or `""` for families that do
    /// not use sub-kinds.
    fn sub_kind(&self) -> &str {
        ""
    }

    /// Returns the name of this resource, unique within `(kind, sub_kind)`.
    fn name(&self) -> &str;

    /// Returns the opaque revision assigned by the authority.
    fn revision(&self) -> &str;

    /// Returns the dispatch key for this resource.
    fn resource_key(&self) -> ResourceKey {
        ResourceKey::from_parts(self.kind(), self.sub_kind())
    }

    /// Returns the full identity reference of this resource.
    fn to_ref(&self) -> ResourceRef {
        ResourceRef {
            kind: self.kind().to_string(),
            sub_kind: self.sub_kind().to_string(),
            name: self.name().to_string(),
        }
    }
}

/// A reference to a resource by its full `(kind, sub_kind, name)` identity.
///
/// Delete events on the watch stream carry a `ResourceRef` rather than the
/// deleted payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sub_kind: String,
    pub name: String,
}

impl ResourceRef {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            sub_kind: String::new(),
            name: name.into(),
        }
    }

    #[must_use]
    pub fn with_sub_kind(mut self, sub_kind: impl Into<String>) -> Self {
        self.sub_kind = sub_kind.into();
        self
    }

    /// The dispatch key of the referenced resource.
    pub fn resource_key(&self) -> ResourceKey {
        ResourceKey::from_parts(&self.kind, &self.sub_kind)
    }
}

impl std::fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.sub_kind.is_empty() {
            write!(f, "{}/{}", self.kind, self.name)
        } else {
            write!(f, "{}/{}/{}", self.kind, self.sub_kind, self.name)
        }
    }
}
