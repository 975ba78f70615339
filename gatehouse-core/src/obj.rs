use serde::{Deserialize, Serialize};

use crate::{
    kind::ResourceKey, AccessList, AuthPreference, CertAuthority, ClusterName, Lock,
    ProvisionToken, Resource, ResourceRef, Role, Server, User, WebSession,
};

/// A resource of any cached kind, as carried by watch events.
///
/// The replica dispatches on [`ResourceObj::resource_key`] and each collection
/// downcasts to its concrete type via `TryFrom`; a failed downcast hands the
/// value back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceObj {
    User(User),
    Role(Role),
    Server(Server),
    ProvisionToken(ProvisionToken),
    CertAuthority(CertAuthority),
    Lock(Lock),
    AccessList(AccessList),
    WebSession(WebSession),
    ClusterName(ClusterName),
    AuthPreference(AuthPreference),
}

impl ResourceObj {
    fn as_resource(&self) -> &dyn Resource {
        match self {
            ResourceObj::User(r) => r,
            ResourceObj::Role(r) => r,
            ResourceObj::Server(r) => r,
            ResourceObj::ProvisionToken(r) => r,
            ResourceObj::CertAuthority(r) => r,
            ResourceObj::Lock(r) => r,
            ResourceObj::AccessList(r) => r,
            ResourceObj::WebSession(r) => r,
            ResourceObj::ClusterName(r) => r,
            ResourceObj::AuthPreference(r) => r,
        }
    }

    pub fn kind(&self) -> &str {
        self.as_resource().kind()
    }

    pub fn sub_kind(&self) -> &str {
        self.as_resource().sub_kind()
    }

    pub fn name(&self) -> &str {
        self.as_resource().name()
    }

    /// The dispatch key of the carried resource.
    pub fn resource_key(&self) -> ResourceKey {
        self.as_resource().resource_key()
    }

    pub fn to_ref(&self) -> ResourceRef {
        self.as_resource().to_ref()
    }
}

macro_rules! obj_conversions {
    ($($variant:ident => $ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for ResourceObj {
                fn from(value: $ty) -> Self {
                    ResourceObj::$variant(value)
                }
            }

            impl TryFrom<ResourceObj> for $ty {
                type Error = ResourceObj;

                fn try_from(obj: ResourceObj) -> Result<Self, ResourceObj> {
                    match obj {
                        ResourceObj::$variant(value) => Ok(value),
                        other => Err(other),
                    }
                }
            }
        )+
    };
}

obj_conversions! {
    User => User,
    Role => Role,
    Server => Server,
    ProvisionToken => ProvisionToken,
    CertAuthority => CertAuthority,
    Lock => Lock,
    AccessList => AccessList,
    WebSession => WebSession,
    ClusterName => ClusterName,
    AuthPreference => AuthPreference,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{kind, SessionSubKind};

    #[test]
    fn key_of_sub_kinded_resource() {
        let obj = ResourceObj::from(WebSession::new(SessionSubKind::App, "s1", "alice"));
        assert_eq!(
            obj.resource_key(),
            ResourceKey::from_parts(kind::WEB_SESSION, kind::SUB_KIND_APP)
        );
    }

    #[test]
    fn failed_downcast_returns_value() {
        let obj = ResourceObj::from(User::new("alice"));
        let back = Role::try_from(obj).unwrap_err();
        assert_eq!(back.name(), "alice");
        assert_eq!(back.kind(), kind::USER);
    }
}
