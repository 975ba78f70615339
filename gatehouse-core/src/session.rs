use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::{kind, Resource};

/// The family a web session belongs to.
///
/// Sessions of all sub-kinds share the [`WebSession`] schema but are watched,
/// cached and queried as distinct collections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionSubKind {
    #[default]
    Web,
    App,
    Snowflake,
    SamlIdp,
}

impl SessionSubKind {
    pub const ALL: [SessionSubKind; 4] = [
        SessionSubKind::Web,
        SessionSubKind::App,
        SessionSubKind::Snowflake,
        SessionSubKind::SamlIdp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SessionSubKind::Web => kind::SUB_KIND_WEB,
            SessionSubKind::App => kind::SUB_KIND_APP,
            SessionSubKind::Snowflake => kind::SUB_KIND_SNOWFLAKE,
            SessionSubKind::SamlIdp => kind::SUB_KIND_SAML_IDP,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            kind::SUB_KIND_WEB => Some(SessionSubKind::Web),
            kind::SUB_KIND_APP => Some(SessionSubKind::App),
            kind::SUB_KIND_SNOWFLAKE => Some(SessionSubKind::Snowflake),
            kind::SUB_KIND_SAML_IDP => Some(SessionSubKind::SamlIdp),
            _ => None,
        }
    }
}

/// An authenticated web session. `name` is the session id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSession {
    pub name: String,
    #[serde(default)]
    pub sub_kind: SessionSubKind,
    #[serde(default)]
    pub revision: String,
    /// The user this session was issued to.
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<SystemTime>,
}

impl WebSession {
    pub fn new(
        sub_kind: SessionSubKind,
        name: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            sub_kind,
            user: user.into(),
            ..Self::default()
        }
    }
}

impl Resource for WebSession {
    fn kind(&self) -> &str {
        kind::WEB_SESSION
    }

    fn sub_kind(&self) -> &str {
        self.sub_kind.as_str()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn revision(&self) -> &str {
        &self.revision
    }
}
