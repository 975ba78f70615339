//! Per-family bulk-load adapters over the authority clients.
//!
//! Each source drains the family's paginated list RPC. Sources never load
//! secret material: the replica does not store it, and reads that need it
//! are routed to the authority by the readers.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use gatehouse_core::{
    watch::{Page, PageRequest, DEFAULT_PAGE_SIZE},
    AccessList, AuthPreference, CertAuthority, ClusterName, Lock, ProvisionToken, Result, Role,
    Server, SessionSubKind, User, WebSession,
};

use super::ListSource;
use crate::authority::{
    AccessListService, AccessService, ClusterConfigService, PresenceService, ProvisionService,
    SessionService, TrustService, UserService,
};

/// Drain every page of a list call.
pub(crate) async fn collect_pages<K, F, Fut>(mut list: F) -> Result<Vec<K>>
where
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = Result<Page<K>>>,
{
    let mut out = Vec::new();
    let mut token: Option<String> = None;
    loop {
        let mut req = PageRequest::first(DEFAULT_PAGE_SIZE);
        req.page_token = token;
        let page = list(req).await?;
        out.extend(page.items);
        match page.next_page_token {
            Some(next) if !next.is_empty() => token = Some(next),
            _ => return Ok(out),
        }
    }
}

/// A singleton family's load: the one value, or nothing if the authority has
/// none configured.
fn single_or_empty<K>(value: Result<K>) -> Result<Vec<K>> {
    match value {
        Ok(value) => Ok(vec![value]),
        Err(err) if err.is_not_found() => Ok(Vec::new()),
        Err(err) => Err(err),
    }
}

pub(crate) struct UserSource(pub(crate) Arc<dyn UserService>);

#[async_trait]
impl ListSource<User> for UserSource {
    async fn list_all(&self) -> Result<Vec<User>> {
        collect_pages(|req| self.0.list_users(req, false)).await
    }
}

pub(crate) struct RoleSource(pub(crate) Arc<dyn AccessService>);

#[async_trait]
impl ListSource<Role> for RoleSource {
    async fn list_all(&self) -> Result<Vec<Role>> {
        collect_pages(|req| self.0.list_roles(req)).await
    }
}

pub(crate) struct LockSource(pub(crate) Arc<dyn AccessService>);

#[async_trait]
impl ListSource<Lock> for LockSource {
    async fn list_all(&self) -> Result<Vec<Lock>> {
        collect_pages(|req| self.0.list_locks(req)).await
    }
}

pub(crate) struct NodeSource(pub(crate) Arc<dyn PresenceService>);

#[async_trait]
impl ListSource<Server> for NodeSource {
    async fn list_all(&self) -> Result<Vec<Server>> {
        collect_pages(|req| self.0.list_nodes(req)).await
    }
}

pub(crate) struct TokenSource(pub(crate) Arc<dyn ProvisionService>);

#[async_trait]
impl ListSource<ProvisionToken> for TokenSource {
    async fn list_all(&self) -> Result<Vec<ProvisionToken>> {
        collect_pages(|req| self.0.list_tokens(req)).await
    }
}

pub(crate) struct CertAuthoritySource(pub(crate) Arc<dyn TrustService>);

#[async_trait]
impl ListSource<CertAuthority> for CertAuthoritySource {
    async fn list_all(&self) -> Result<Vec<CertAuthority>> {
        collect_pages(|req| self.0.list_cert_authorities(req, false)).await
    }
}

pub(crate) struct AccessListSource(pub(crate) Arc<dyn AccessListService>);

#[async_trait]
impl ListSource<AccessList> for AccessListSource {
    async fn list_all(&self) -> Result<Vec<AccessList>> {
        collect_pages(|req| self.0.list_access_lists(req)).await
    }
}

pub(crate) struct SessionSource {
    pub(crate) sessions: Arc<dyn SessionService>,
    pub(crate) sub_kind: SessionSubKind,
}

#[async_trait]
impl ListSource<WebSession> for SessionSource {
    async fn list_all(&self) -> Result<Vec<WebSession>> {
        collect_pages(|req| self.sessions.list_web_sessions(self.sub_kind, req)).await
    }
}

pub(crate) struct ClusterNameSource(pub(crate) Arc<dyn ClusterConfigService>);

#[async_trait]
impl ListSource<ClusterName> for ClusterNameSource {
    async fn list_all(&self) -> Result<Vec<ClusterName>> {
        single_or_empty(self.0.get_cluster_name().await)
    }
}

pub(crate) struct AuthPreferenceSource(pub(crate) Arc<dyn ClusterConfigService>);

#[async_trait]
impl ListSource<AuthPreference> for AuthPreferenceSource {
    async fn list_all(&self) -> Result<Vec<AuthPreference>> {
        single_or_empty(self.0.get_auth_preference().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_core::Error;
    use std::sync::Mutex;

    #[tokio::test]
    async fn collect_pages_follows_tokens() {
        let calls = Mutex::new(Vec::new());
        let all = collect_pages(|req| {
            calls.lock().unwrap().push(req.page_token.clone());
            let page = match req.page_token.as_deref() {
                None => Page {
                    items: vec![1, 2],
                    next_page_token: Some("t1".to_string()),
                },
                Some("t1") => Page::last(vec![3]),
                Some(other) => panic!("unexpected token {other}"),
            };
            async move { Ok(page) }
        })
        .await
        .unwrap();
        assert_eq!(all, vec![1, 2, 3]);
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn collect_pages_treats_empty_token_as_terminal() {
        let all = collect_pages(|_req| async {
            Ok(Page {
                items: vec![1],
                next_page_token: Some(String::new()),
            })
        })
        .await
        .unwrap();
        assert_eq!(all, vec![1]);
    }

    #[tokio::test]
    async fn singleton_not_found_is_an_empty_load() {
        let missing: Result<ClusterName> =
            Err(Error::not_found(gatehouse_core::kind::CLUSTER_NAME, "cluster-name"));
        assert!(single_or_empty(missing).unwrap().is_empty());

        let upstream: Result<ClusterName> = Err(Error::Upstream("boom".to_string()));
        assert!(single_or_empty(upstream).is_err());
    }
}
