//! Builds the collection set from the declared watches.

use std::sync::Arc;

use ahash::AHashMap;
use gatehouse_core::{
    kind, AccessList, AuthPreference, CertAuthority, ClusterName, Error, Lock, ProvisionToken,
    ResourceKey, Result, Role, Server, SessionSubKind, User, WebSession,
};

use super::sources::{
    AccessListSource, AuthPreferenceSource, CertAuthoritySource, ClusterNameSource, LockSource,
    NodeSource, RoleSource, SessionSource, TokenSource, UserSource,
};
use super::{Collection, CollectionHandler};
use crate::cache::Config;
use crate::store::Index;

/// Secondary index names declared by the built-in collections.
pub(crate) const INDEX_HOSTNAME: &str = "hostname";
pub(crate) const INDEX_USER: &str = "user";

/// The resource collections a cache instance carries, fixed at construction.
#[derive(Default)]
pub(crate) struct Collections {
    /// Dispatch table for watch events.
    pub(crate) by_kind: AHashMap<ResourceKey, Arc<dyn CollectionHandler>>,

    pub(crate) users: Option<Arc<Collection<User>>>,
    pub(crate) roles: Option<Arc<Collection<Role>>>,
    pub(crate) nodes: Option<Arc<Collection<Server>>>,
    pub(crate) tokens: Option<Arc<Collection<ProvisionToken>>>,
    pub(crate) cert_authorities: Option<Arc<Collection<CertAuthority>>>,
    pub(crate) locks: Option<Arc<Collection<Lock>>>,
    pub(crate) access_lists: Option<Arc<Collection<AccessList>>>,
    pub(crate) web_sessions: Option<Arc<Collection<WebSession>>>,
    pub(crate) app_sessions: Option<Arc<Collection<WebSession>>>,
    pub(crate) snowflake_sessions: Option<Arc<Collection<WebSession>>>,
    pub(crate) saml_idp_sessions: Option<Arc<Collection<WebSession>>>,
    pub(crate) cluster_name: Option<Arc<Collection<ClusterName>>>,
    pub(crate) auth_preference: Option<Arc<Collection<AuthPreference>>>,
}

impl std::fmt::Debug for Collections {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collections")
            .field("by_kind_len", &self.by_kind.len())
            .finish()
    }
}

impl Collections {
    pub(crate) fn dispatch(&self, key: &ResourceKey) -> Option<&Arc<dyn CollectionHandler>> {
        self.by_kind.get(key)
    }

    pub(crate) fn sessions(&self, sub_kind: SessionSubKind) -> Option<&Arc<Collection<WebSession>>> {
        match sub_kind {
            SessionSubKind::Web => self.web_sessions.as_ref(),
            SessionSubKind::App => self.app_sessions.as_ref(),
            SessionSubKind::Snowflake => self.snowflake_sessions.as_ref(),
            SessionSubKind::SamlIdp => self.saml_idp_sessions.as_ref(),
        }
    }
}

fn required<T: ?Sized>(client: &Option<Arc<T>>, name: &str, watch: &str) -> Result<Arc<T>> {
    client
        .clone()
        .ok_or_else(|| Error::Config(format!("watch for {watch} requires the {name} client")))
}

/// Instantiate a collection for every declared watch, failing fast when a
/// watch has no handler or its upstream client is unset.
pub(crate) fn setup_collections(config: &Config) -> Result<Collections> {
    let mut out = Collections::default();

    for watch in &config.watches {
        let key = ResourceKey::from_watch(watch);
        if out.by_kind.contains_key(&key) {
            return Err(Error::Config(format!("duplicate watch for {key}")));
        }

        let handler: Arc<dyn CollectionHandler> = match watch.kind.as_str() {
            kind::USER => {
                let users = required(&config.users, "users", kind::USER)?;
                let collect = Arc::new(Collection::new(
                    watch.clone(),
                    Arc::new(UserSource(users)),
                    Vec::new(),
                    false,
                ));
                out.users = Some(Arc::clone(&collect));
                collect
            }
            kind::ROLE => {
                let access = required(&config.access, "access", kind::ROLE)?;
                let collect = Arc::new(Collection::new(
                    watch.clone(),
                    Arc::new(RoleSource(access)),
                    Vec::new(),
                    false,
                ));
                out.roles = Some(Arc::clone(&collect));
                collect
            }
            kind::NODE => {
                let presence = required(&config.presence, "presence", kind::NODE)?;
                let collect = Arc::new(Collection::new(
                    watch.clone(),
                    Arc::new(NodeSource(presence)),
                    vec![Index {
                        name: INDEX_HOSTNAME,
                        key: |server: &Server| Some(server.hostname.clone()),
                    }],
                    false,
                ));
                out.nodes = Some(Arc::clone(&collect));
                collect
            }
            kind::TOKEN => {
                let provisioner = required(&config.provisioner, "provisioner", kind::TOKEN)?;
                let collect = Arc::new(Collection::new(
                    watch.clone(),
                    Arc::new(TokenSource(provisioner)),
                    Vec::new(),
                    false,
                ));
                out.tokens = Some(Arc::clone(&collect));
                collect
            }
            kind::CERT_AUTHORITY => {
                let trust = required(&config.trust, "trust", kind::CERT_AUTHORITY)?;
                let collect = Arc::new(Collection::new(
                    watch.clone(),
                    Arc::new(CertAuthoritySource(trust)),
                    Vec::new(),
                    false,
                ));
                out.cert_authorities = Some(Arc::clone(&collect));
                collect
            }
            kind::LOCK => {
                let access = required(&config.access, "access", kind::LOCK)?;
                let collect = Arc::new(Collection::new(
                    watch.clone(),
                    Arc::new(LockSource(access)),
                    Vec::new(),
                    false,
                ));
                out.locks = Some(Arc::clone(&collect));
                collect
            }
            kind::ACCESS_LIST => {
                let access_lists =
                    required(&config.access_lists, "access_lists", kind::ACCESS_LIST)?;
                let collect = Arc::new(Collection::new(
                    watch.clone(),
                    Arc::new(AccessListSource(access_lists)),
                    Vec::new(),
                    false,
                ));
                out.access_lists = Some(Arc::clone(&collect));
                collect
            }
            kind::WEB_SESSION => {
                let sub_kind = SessionSubKind::parse(&watch.sub_kind).ok_or_else(|| {
                    Error::Config(format!(
                        "unknown web session sub-kind {:?}",
                        watch.sub_kind
                    ))
                })?;
                let sessions = required(&config.web_sessions, "web_sessions", kind::WEB_SESSION)?;
                let collect = Arc::new(Collection::new(
                    watch.clone(),
                    Arc::new(SessionSource { sessions, sub_kind }),
                    vec![Index {
                        name: INDEX_USER,
                        key: |session: &WebSession| Some(session.user.clone()),
                    }],
                    false,
                ));
                match sub_kind {
                    SessionSubKind::Web => out.web_sessions = Some(Arc::clone(&collect)),
                    SessionSubKind::App => out.app_sessions = Some(Arc::clone(&collect)),
                    SessionSubKind::Snowflake => {
                        out.snowflake_sessions = Some(Arc::clone(&collect));
                    }
                    SessionSubKind::SamlIdp => out.saml_idp_sessions = Some(Arc::clone(&collect)),
                }
                collect
            }
            kind::CLUSTER_NAME => {
                let cluster_config =
                    required(&config.cluster_config, "cluster_config", kind::CLUSTER_NAME)?;
                let collect = Arc::new(Collection::new(
                    watch.clone(),
                    Arc::new(ClusterNameSource(cluster_config)),
                    Vec::new(),
                    true,
                ));
                out.cluster_name = Some(Arc::clone(&collect));
                collect
            }
            kind::AUTH_PREFERENCE => {
                let cluster_config = required(
                    &config.cluster_config,
                    "cluster_config",
                    kind::AUTH_PREFERENCE,
                )?;
                let collect = Arc::new(Collection::new(
                    watch.clone(),
                    Arc::new(AuthPreferenceSource(cluster_config)),
                    Vec::new(),
                    true,
                ));
                out.auth_preference = Some(Arc::clone(&collect));
                collect
            }
            other => {
                return Err(Error::Config(format!("watch kind {other:?} is not supported")));
            }
        };

        out.by_kind.insert(key, handler);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Config;
    use async_trait::async_trait;
    use gatehouse_core::WatchKind;

    struct EmptyUsers;

    #[async_trait]
    impl crate::authority::UserService for EmptyUsers {
        async fn get_user(&self, name: &str, _with_secrets: bool) -> Result<User> {
            Err(Error::not_found(kind::USER, name))
        }

        async fn list_users(
            &self,
            _req: gatehouse_core::watch::PageRequest,
            _with_secrets: bool,
        ) -> Result<gatehouse_core::watch::Page<User>> {
            Ok(gatehouse_core::watch::Page::last(Vec::new()))
        }
    }

    #[test]
    fn declared_watch_without_client_fails_construction() {
        let config = Config {
            watches: vec![WatchKind::new(kind::USER)],
            ..Config::default()
        };
        let err = setup_collections(&config).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn unknown_watch_kind_fails_construction() {
        let config = Config {
            watches: vec![WatchKind::new("desktop")],
            ..Config::default()
        };
        let err = setup_collections(&config).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn session_watches_dispatch_by_sub_kind() {
        struct NoSessions;

        #[async_trait]
        impl crate::authority::SessionService for NoSessions {
            async fn get_web_session(
                &self,
                _sub_kind: SessionSubKind,
                name: &str,
            ) -> Result<WebSession> {
                Err(Error::not_found(kind::WEB_SESSION, name))
            }

            async fn list_web_sessions(
                &self,
                _sub_kind: SessionSubKind,
                _req: gatehouse_core::watch::PageRequest,
            ) -> Result<gatehouse_core::watch::Page<WebSession>> {
                Ok(gatehouse_core::watch::Page::last(Vec::new()))
            }
        }

        let config = Config {
            watches: vec![
                WatchKind::new(kind::WEB_SESSION).with_sub_kind(kind::SUB_KIND_APP),
                WatchKind::new(kind::WEB_SESSION).with_sub_kind(kind::SUB_KIND_SAML_IDP),
            ],
            web_sessions: Some(Arc::new(NoSessions)),
            ..Config::default()
        };
        let collections = setup_collections(&config).unwrap();
        assert!(collections.app_sessions.is_some());
        assert!(collections.saml_idp_sessions.is_some());
        assert!(collections.web_sessions.is_none());
        assert!(collections
            .dispatch(&ResourceKey::from_parts(kind::WEB_SESSION, kind::SUB_KIND_APP))
            .is_some());
        assert!(collections
            .dispatch(&ResourceKey::from_parts(kind::WEB_SESSION, kind::SUB_KIND_WEB))
            .is_none());
    }

    #[test]
    fn duplicate_watches_are_rejected() {
        let config = Config {
            watches: vec![WatchKind::new(kind::USER), WatchKind::new(kind::USER)],
            users: Some(Arc::new(EmptyUsers)),
            ..Config::default()
        };
        let err = setup_collections(&config).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn registered_collection_uses_its_source() {
        let config = Config {
            watches: vec![WatchKind::new(kind::USER)],
            users: Some(Arc::new(EmptyUsers)),
            ..Config::default()
        };
        let collections = setup_collections(&config).unwrap();
        let users = collections.users.as_ref().unwrap();
        // An empty upstream is a valid, empty bulk load.
        let apply = users.fetch(true).await.unwrap();
        apply(1);
        assert_eq!(users.store().generation(), 1);
    }
}
