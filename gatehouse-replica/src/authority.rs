//! Upstream authority client contracts.
//!
//! The replica never talks a wire protocol itself; the embedding process
//! hands it one client per resource family, plus an event source for the
//! watch stream. Implementations must be safe to share across tasks. The
//! same contracts double as the read interface of the replica's fallback
//! path: when the cache is unhealthy or a kind is unsupported, reader calls
//! are forwarded verbatim to these clients.

use async_trait::async_trait;
use futures::stream::BoxStream;
use gatehouse_core::{
    watch::{Page, PageRequest, WatchEvent},
    AccessList, AuthPreference, CertAuthority, ClusterName, Lock, ProvisionToken, Result, Role,
    Server, SessionSubKind, User, WatchKind, WebSession,
};

/// A live watch subscription. The first frame is always
/// [`WatchEvent::KindsConfirmed`].
pub type EventStream = BoxStream<'static, Result<WatchEvent>>;

/// Opens watch streams against the authority.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn watch(&self, watches: Vec<WatchKind>) -> Result<EventStream>;
}

#[async_trait]
pub trait UserService: Send + Sync {
    async fn get_user(&self, name: &str, with_secrets: bool) -> Result<User>;
    async fn list_users(&self, req: PageRequest, with_secrets: bool) -> Result<Page<User>>;
}

/// Roles and locks, the access-control halves of the catalogue.
#[async_trait]
pub trait AccessService: Send + Sync {
    async fn get_role(&self, name: &str) -> Result<Role>;
    async fn list_roles(&self, req: PageRequest) -> Result<Page<Role>>;
    async fn get_lock(&self, name: &str) -> Result<Lock>;
    async fn list_locks(&self, req: PageRequest) -> Result<Page<Lock>>;
}

/// Registered servers.
#[async_trait]
pub trait PresenceService: Send + Sync {
    async fn get_node(&self, name: &str) -> Result<Server>;
    async fn list_nodes(&self, req: PageRequest) -> Result<Page<Server>>;
}

#[async_trait]
pub trait ProvisionService: Send + Sync {
    async fn get_token(&self, name: &str) -> Result<ProvisionToken>;
    async fn list_tokens(&self, req: PageRequest) -> Result<Page<ProvisionToken>>;
}

/// Certificate authorities. `load_signing_keys` reads never come from the
/// replica; they always reach the authority directly.
#[async_trait]
pub trait TrustService: Send + Sync {
    async fn get_cert_authority(&self, name: &str, load_signing_keys: bool)
        -> Result<CertAuthority>;
    async fn list_cert_authorities(
        &self,
        req: PageRequest,
        load_signing_keys: bool,
    ) -> Result<Page<CertAuthority>>;
}

#[async_trait]
pub trait AccessListService: Send + Sync {
    async fn get_access_list(&self, name: &str) -> Result<AccessList>;
    async fn list_access_lists(&self, req: PageRequest) -> Result<Page<AccessList>>;
}

/// Web sessions of every sub-kind; the sub-kind selects the family.
#[async_trait]
pub trait SessionService: Send + Sync {
    async fn get_web_session(&self, sub_kind: SessionSubKind, name: &str) -> Result<WebSession>;
    async fn list_web_sessions(
        &self,
        sub_kind: SessionSubKind,
        req: PageRequest,
    ) -> Result<Page<WebSession>>;
}

/// The singleton cluster configuration resources.
#[async_trait]
pub trait ClusterConfigService: Send + Sync {
    async fn get_cluster_name(&self) -> Result<ClusterName>;
    async fn get_auth_preference(&self) -> Result<AuthPreference>;
}
