//! Per-family readers: the cache's only consumer-facing read surface.
//!
//! Every call samples the health tuple and picks its data source: a healthy
//! cache serves the call from the collection's store snapshot, anything else
//! forwards to the upstream client. The choice is made per call, never per
//! reader, so a reader held across a degradation transparently follows the
//! cache's state. Secret-bearing reads never touch the store.

use std::sync::Arc;

use gatehouse_core::{
    kind,
    watch::{Page, PageRequest},
    AccessList, AuthPreference, CertAuthority, ClusterName, Error, Lock, ProvisionToken,
    ResourceKey, Result, Role, Server, SessionSubKind, User, WebSession, AUTH_PREFERENCE_NAME,
    CLUSTER_NAME_NAME,
};

use crate::authority::{
    AccessListService, AccessService, ClusterConfigService, PresenceService, ProvisionService,
    SessionService, TrustService, UserService,
};
use crate::collection::{collect_pages, INDEX_HOSTNAME, INDEX_USER};
use crate::health::Health;
use crate::store::Store;

fn clone_page<K: Clone>(page: Page<Arc<K>>) -> Page<K> {
    page.map(|item| (*item).clone())
}

/// Reads users from the replica, or from the authority when the cache is
/// unhealthy or the read wants secrets.
pub struct UserReader {
    store: Arc<Store<User>>,
    upstream: Arc<dyn UserService>,
    health: Arc<Health>,
    key: ResourceKey,
}

impl UserReader {
    pub(crate) fn new(
        store: Arc<Store<User>>,
        upstream: Arc<dyn UserService>,
        health: Arc<Health>,
    ) -> Self {
        Self {
            store,
            upstream,
            health,
            key: ResourceKey::new(kind::USER),
        }
    }

    pub async fn get(&self, name: &str, with_secrets: bool) -> Result<User> {
        if with_secrets || !self.health.read_ok(&self.key) {
            return self.upstream.get_user(name, with_secrets).await;
        }
        self.store
            .get(name)
            .map(|user| (*user).clone())
            .ok_or_else(|| Error::not_found(kind::USER, name))
    }

    pub async fn list(&self, req: PageRequest) -> Result<Page<User>> {
        if !self.health.read_ok(&self.key) {
            return self.upstream.list_users(req, false).await;
        }
        Ok(clone_page(self.store.page(&req)))
    }
}

pub struct RoleReader {
    store: Arc<Store<Role>>,
    upstream: Arc<dyn AccessService>,
    health: Arc<Health>,
    key: ResourceKey,
}

impl RoleReader {
    pub(crate) fn new(
        store: Arc<Store<Role>>,
        upstream: Arc<dyn AccessService>,
        health: Arc<Health>,
    ) -> Self {
        Self {
            store,
            upstream,
            health,
            key: ResourceKey::new(kind::ROLE),
        }
    }

    pub async fn get(&self, name: &str) -> Result<Role> {
        if !self.health.read_ok(&self.key) {
            return self.upstream.get_role(name).await;
        }
        self.store
            .get(name)
            .map(|role| (*role).clone())
            .ok_or_else(|| Error::not_found(kind::ROLE, name))
    }

    pub async fn list(&self, req: PageRequest) -> Result<Page<Role>> {
        if !self.health.read_ok(&self.key) {
            return self.upstream.list_roles(req).await;
        }
        Ok(clone_page(self.store.page(&req)))
    }
}

/// Reads registered nodes; hostname lookups are index-backed when cached.
pub struct NodeReader {
    store: Arc<Store<Server>>,
    upstream: Arc<dyn PresenceService>,
    health: Arc<Health>,
    key: ResourceKey,
}

impl NodeReader {
    pub(crate) fn new(
        store: Arc<Store<Server>>,
        upstream: Arc<dyn PresenceService>,
        health: Arc<Health>,
    ) -> Self {
        Self {
            store,
            upstream,
            health,
            key: ResourceKey::new(kind::NODE),
        }
    }

    pub async fn get(&self, name: &str) -> Result<Server> {
        if !self.health.read_ok(&self.key) {
            return self.upstream.get_node(name).await;
        }
        self.store
            .get(name)
            .map(|node| (*node).clone())
            .ok_or_else(|| Error::not_found(kind::NODE, name))
    }

    pub async fn list(&self, req: PageRequest) -> Result<Page<Server>> {
        if !self.health.read_ok(&self.key) {
            return self.upstream.list_nodes(req).await;
        }
        Ok(clone_page(self.store.page(&req)))
    }

    /// All nodes advertising `hostname`, in name order.
    pub async fn get_by_hostname(&self, hostname: &str) -> Result<Vec<Server>> {
        if !self.health.read_ok(&self.key) {
            let all = collect_pages(|req| self.upstream.list_nodes(req)).await?;
            return Ok(all
                .into_iter()
                .filter(|node| node.hostname == hostname)
                .collect());
        }
        Ok(self
            .store
            .get_by_index(INDEX_HOSTNAME, hostname)
            .into_iter()
            .map(|node| (*node).clone())
            .collect())
    }
}

pub struct TokenReader {
    store: Arc<Store<ProvisionToken>>,
    upstream: Arc<dyn ProvisionService>,
    health: Arc<Health>,
    key: ResourceKey,
}

impl TokenReader {
    pub(crate) fn new(
        store: Arc<Store<ProvisionToken>>,
        upstream: Arc<dyn ProvisionService>,
        health: Arc<Health>,
    ) -> Self {
        Self {
            store,
            upstream,
            health,
            key: ResourceKey::new(kind::TOKEN),
        }
    }

    pub async fn get(&self, name: &str) -> Result<ProvisionToken> {
        if !self.health.read_ok(&self.key) {
            return self.upstream.get_token(name).await;
        }
        self.store
            .get(name)
            .map(|token| (*token).clone())
            .ok_or_else(|| Error::not_found(kind::TOKEN, name))
    }

    pub async fn list(&self, req: PageRequest) -> Result<Page<ProvisionToken>> {
        if !self.health.read_ok(&self.key) {
            return self.upstream.list_tokens(req).await;
        }
        Ok(clone_page(self.store.page(&req)))
    }
}

/// Certificate-authority reads. Signing-key loads bypass the replica
/// unconditionally; the store only ever holds public material.
pub struct CertAuthorityReader {
    store: Arc<Store<CertAuthority>>,
    upstream: Arc<dyn TrustService>,
    health: Arc<Health>,
    key: ResourceKey,
}

impl CertAuthorityReader {
    pub(crate) fn new(
        store: Arc<Store<CertAuthority>>,
        upstream: Arc<dyn TrustService>,
        health: Arc<Health>,
    ) -> Self {
        Self {
            store,
            upstream,
            health,
            key: ResourceKey::new(kind::CERT_AUTHORITY),
        }
    }

    pub async fn get(&self, name: &str, load_signing_keys: bool) -> Result<CertAuthority> {
        if load_signing_keys || !self.health.read_ok(&self.key) {
            return self.upstream.get_cert_authority(name, load_signing_keys).await;
        }
        self.store
            .get(name)
            .map(|ca| (*ca).clone())
            .ok_or_else(|| Error::not_found(kind::CERT_AUTHORITY, name))
    }

    pub async fn list(&self, req: PageRequest) -> Result<Page<CertAuthority>> {
        if !self.health.read_ok(&self.key) {
            return self.upstream.list_cert_authorities(req, false).await;
        }
        Ok(clone_page(self.store.page(&req)))
    }
}

pub struct LockReader {
    store: Arc<Store<Lock>>,
    upstream: Arc<dyn AccessService>,
    health: Arc<Health>,
    key: ResourceKey,
}

impl LockReader {
    pub(crate) fn new(
        store: Arc<Store<Lock>>,
        upstream: Arc<dyn AccessService>,
        health: Arc<Health>,
    ) -> Self {
        Self {
            store,
            upstream,
            health,
            key: ResourceKey::new(kind::LOCK),
        }
    }

    pub async fn get(&self, name: &str) -> Result<Lock> {
        if !self.health.read_ok(&self.key) {
            return self.upstream.get_lock(name).await;
        }
        self.store
            .get(name)
            .map(|lock| (*lock).clone())
            .ok_or_else(|| Error::not_found(kind::LOCK, name))
    }

    pub async fn list(&self, req: PageRequest) -> Result<Page<Lock>> {
        if !self.health.read_ok(&self.key) {
            return self.upstream.list_locks(req).await;
        }
        Ok(clone_page(self.store.page(&req)))
    }
}

pub struct AccessListReader {
    store: Arc<Store<AccessList>>,
    upstream: Arc<dyn AccessListService>,
    health: Arc<Health>,
    key: ResourceKey,
}

impl AccessListReader {
    pub(crate) fn new(
        store: Arc<Store<AccessList>>,
        upstream: Arc<dyn AccessListService>,
        health: Arc<Health>,
    ) -> Self {
        Self {
            store,
            upstream,
            health,
            key: ResourceKey::new(kind::ACCESS_LIST),
        }
    }

    pub async fn get(&self, name: &str) -> Result<AccessList> {
        if !self.health.read_ok(&self.key) {
            return self.upstream.get_access_list(name).await;
        }
        self.store
            .get(name)
            .map(|list| (*list).clone())
            .ok_or_else(|| Error::not_found(kind::ACCESS_LIST, name))
    }

    pub async fn list(&self, req: PageRequest) -> Result<Page<AccessList>> {
        if !self.health.read_ok(&self.key) {
            return self.upstream.list_access_lists(req).await;
        }
        Ok(clone_page(self.store.page(&req)))
    }
}

/// Reads one web-session family; constructed per sub-kind.
pub struct SessionReader {
    store: Arc<Store<WebSession>>,
    upstream: Arc<dyn SessionService>,
    health: Arc<Health>,
    sub_kind: SessionSubKind,
    key: ResourceKey,
}

impl SessionReader {
    pub(crate) fn new(
        store: Arc<Store<WebSession>>,
        upstream: Arc<dyn SessionService>,
        health: Arc<Health>,
        sub_kind: SessionSubKind,
    ) -> Self {
        Self {
            store,
            upstream,
            health,
            sub_kind,
            key: ResourceKey::from_parts(kind::WEB_SESSION, sub_kind.as_str()),
        }
    }

    pub async fn get(&self, name: &str) -> Result<WebSession> {
        if !self.health.read_ok(&self.key) {
            return self.upstream.get_web_session(self.sub_kind, name).await;
        }
        self.store
            .get(name)
            .map(|session| (*session).clone())
            .ok_or_else(|| Error::not_found(kind::WEB_SESSION, name))
    }

    pub async fn list(&self, req: PageRequest) -> Result<Page<WebSession>> {
        if !self.health.read_ok(&self.key) {
            return self.upstream.list_web_sessions(self.sub_kind, req).await;
        }
        Ok(clone_page(self.store.page(&req)))
    }

    /// Sessions of this family issued to `user`, in session-id order.
    pub async fn list_for_user(&self, user: &str) -> Result<Vec<WebSession>> {
        if !self.health.read_ok(&self.key) {
            let all =
                collect_pages(|req| self.upstream.list_web_sessions(self.sub_kind, req)).await?;
            return Ok(all.into_iter().filter(|s| s.user == user).collect());
        }
        Ok(self
            .store
            .get_by_index(INDEX_USER, user)
            .into_iter()
            .map(|session| (*session).clone())
            .collect())
    }
}

pub struct ClusterNameReader {
    store: Arc<Store<ClusterName>>,
    upstream: Arc<dyn ClusterConfigService>,
    health: Arc<Health>,
    key: ResourceKey,
}

impl ClusterNameReader {
    pub(crate) fn new(
        store: Arc<Store<ClusterName>>,
        upstream: Arc<dyn ClusterConfigService>,
        health: Arc<Health>,
    ) -> Self {
        Self {
            store,
            upstream,
            health,
            key: ResourceKey::new(kind::CLUSTER_NAME),
        }
    }

    pub async fn get(&self) -> Result<ClusterName> {
        if !self.health.read_ok(&self.key) {
            return self.upstream.get_cluster_name().await;
        }
        self.store
            .single()
            .map(|name| (*name).clone())
            .ok_or_else(|| Error::not_found(kind::CLUSTER_NAME, CLUSTER_NAME_NAME))
    }
}

pub struct AuthPreferenceReader {
    store: Arc<Store<AuthPreference>>,
    upstream: Arc<dyn ClusterConfigService>,
    health: Arc<Health>,
    key: ResourceKey,
}

impl AuthPreferenceReader {
    pub(crate) fn new(
        store: Arc<Store<AuthPreference>>,
        upstream: Arc<dyn ClusterConfigService>,
        health: Arc<Health>,
    ) -> Self {
        Self {
            store,
            upstream,
            health,
            key: ResourceKey::new(kind::AUTH_PREFERENCE),
        }
    }

    pub async fn get(&self) -> Result<AuthPreference> {
        if !self.health.read_ok(&self.key) {
            return self.upstream.get_auth_preference().await;
        }
        self.store
            .single()
            .map(|pref| (*pref).clone())
            .ok_or_else(|| Error::not_found(kind::AUTH_PREFERENCE, AUTH_PREFERENCE_NAME))
    }
}
