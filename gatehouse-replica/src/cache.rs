//! The cache handle: construction, reader accessors, health, shutdown.

use std::sync::Arc;
use std::time::Duration;

use backon::{BackoffBuilder, ExponentialBuilder};
use gatehouse_core::{kind, Error, Result, SessionSubKind, WatchKind};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::authority::{
    AccessListService, AccessService, ClusterConfigService, EventSource, PresenceService,
    ProvisionService, SessionService, TrustService, UserService,
};
use crate::collection::{setup_collections, Collections};
use crate::engine::WatchEngine;
use crate::health::{Health, HealthStatus};
use crate::readers::{
    AccessListReader, AuthPreferenceReader, CertAuthorityReader, ClusterNameReader, LockReader,
    NodeReader, RoleReader, SessionReader, TokenReader, UserReader,
};

/// How long [`Cache::close`] waits for the engine task to drain.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Reconnect backoff bounds for the watch engine. Jitter is always applied
/// so a fleet of replicas does not reconnect in lockstep.
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    pub min: Duration,
    pub max: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(1),
            max: Duration::from_secs(30),
        }
    }
}

impl BackoffConfig {
    pub(crate) fn build(&self) -> impl Iterator<Item = Duration> {
        ExponentialBuilder::default()
            .with_min_delay(self.min)
            .with_max_delay(self.max)
            .with_jitter()
            .without_max_times()
            .build()
    }
}

/// Everything a cache needs: the watch set, one upstream client per declared
/// family, and the reconnect policy. A watch declared without its client is
/// a construction error.
#[derive(Default, Clone)]
pub struct Config {
    pub watches: Vec<WatchKind>,
    pub events: Option<Arc<dyn EventSource>>,
    pub users: Option<Arc<dyn UserService>>,
    pub access: Option<Arc<dyn AccessService>>,
    pub presence: Option<Arc<dyn PresenceService>>,
    pub provisioner: Option<Arc<dyn ProvisionService>>,
    pub trust: Option<Arc<dyn TrustService>>,
    pub access_lists: Option<Arc<dyn AccessListService>>,
    pub web_sessions: Option<Arc<dyn SessionService>>,
    pub cluster_config: Option<Arc<dyn ClusterConfigService>>,
    pub backoff: BackoffConfig,
}

/// A process-local, read-optimised mirror of the authority's resource
/// catalogue.
///
/// The cache is read-only for consumers; mutations go directly to the
/// authority and come back around through the watch stream. State is memory
/// resident: a restarted process re-seeds from the authority.
pub struct Cache {
    collections: Arc<Collections>,
    health: Arc<Health>,
    config: Config,
    cancel: CancellationToken,
    engine: Mutex<Option<JoinHandle<()>>>,
}

impl Cache {
    /// Validate the configuration, build the collections, and start the
    /// watch engine. Must be called within a tokio runtime.
    pub fn new(config: Config) -> Result<Self> {
        let collections = Arc::new(setup_collections(&config)?);
        let events = config
            .events
            .clone()
            .ok_or_else(|| Error::Config("missing events client".to_string()))?;
        let health = Arc::new(Health::new());
        let cancel = CancellationToken::new();

        let engine = WatchEngine::new(
            events,
            Arc::clone(&collections),
            Arc::clone(&health),
            config.watches.clone(),
            config.backoff.clone(),
            cancel.child_token(),
        );
        let handle = tokio::spawn(engine.run());

        Ok(Self {
            collections,
            health,
            config,
            cancel,
            engine: Mutex::new(Some(handle)),
        })
    }

    /// The current `(healthy, supported_kinds, generation)` tuple, read
    /// atomically.
    pub fn health(&self) -> HealthStatus {
        self.health.status()
    }

    pub fn users(&self) -> Result<UserReader> {
        let collection = self
            .collections
            .users
            .as_ref()
            .ok_or_else(|| not_watched(kind::USER))?;
        let upstream = self
            .config
            .users
            .clone()
            .ok_or_else(|| not_watched(kind::USER))?;
        Ok(UserReader::new(
            collection.store(),
            upstream,
            Arc::clone(&self.health),
        ))
    }

    pub fn roles(&self) -> Result<RoleReader> {
        let collection = self
            .collections
            .roles
            .as_ref()
            .ok_or_else(|| not_watched(kind::ROLE))?;
        let upstream = self
            .config
            .access
            .clone()
            .ok_or_else(|| not_watched(kind::ROLE))?;
        Ok(RoleReader::new(
            collection.store(),
            upstream,
            Arc::clone(&self.health),
        ))
    }

    pub fn nodes(&self) -> Result<NodeReader> {
        let collection = self
            .collections
            .nodes
            .as_ref()
            .ok_or_else(|| not_watched(kind::NODE))?;
        let upstream = self
            .config
            .presence
            .clone()
            .ok_or_else(|| not_watched(kind::NODE))?;
        Ok(NodeReader::new(
            collection.store(),
            upstream,
            Arc::clone(&self.health),
        ))
    }

    pub fn tokens(&self) -> Result<TokenReader> {
        let collection = self
            .collections
            .tokens
            .as_ref()
            .ok_or_else(|| not_watched(kind::TOKEN))?;
        let upstream = self
            .config
            .provisioner
            .clone()
            .ok_or_else(|| not_watched(kind::TOKEN))?;
        Ok(TokenReader::new(
            collection.store(),
            upstream,
            Arc::clone(&self.health),
        ))
    }

    pub fn cert_authorities(&self) -> Result<CertAuthorityReader> {
        let collection = self
            .collections
            .cert_authorities
            .as_ref()
            .ok_or_else(|| not_watched(kind::CERT_AUTHORITY))?;
        let upstream = self
            .config
            .trust
            .clone()
            .ok_or_else(|| not_watched(kind::CERT_AUTHORITY))?;
        Ok(CertAuthorityReader::new(
            collection.store(),
            upstream,
            Arc::clone(&self.health),
        ))
    }

    pub fn locks(&self) -> Result<LockReader> {
        let collection = self
            .collections
            .locks
            .as_ref()
            .ok_or_else(|| not_watched(kind::LOCK))?;
        let upstream = self
            .config
            .access
            .clone()
            .ok_or_else(|| not_watched(kind::LOCK))?;
        Ok(LockReader::new(
            collection.store(),
            upstream,
            Arc::clone(&self.health),
        ))
    }

    pub fn access_lists(&self) -> Result<AccessListReader> {
        let collection = self
            .collections
            .access_lists
            .as_ref()
            .ok_or_else(|| not_watched(kind::ACCESS_LIST))?;
        let upstream = self
            .config
            .access_lists
            .clone()
            .ok_or_else(|| not_watched(kind::ACCESS_LIST))?;
        Ok(AccessListReader::new(
            collection.store(),
            upstream,
            Arc::clone(&self.health),
        ))
    }

    pub fn web_sessions(&self, sub_kind: SessionSubKind) -> Result<SessionReader> {
        let collection = self
            .collections
            .sessions(sub_kind)
            .ok_or_else(|| not_watched(kind::WEB_SESSION))?;
        let upstream = self
            .config
            .web_sessions
            .clone()
            .ok_or_else(|| not_watched(kind::WEB_SESSION))?;
        Ok(SessionReader::new(
            collection.store(),
            upstream,
            Arc::clone(&self.health),
            sub_kind,
        ))
    }

    pub fn cluster_name(&self) -> Result<ClusterNameReader> {
        let collection = self
            .collections
            .cluster_name
            .as_ref()
            .ok_or_else(|| not_watched(kind::CLUSTER_NAME))?;
        let upstream = self
            .config
            .cluster_config
            .clone()
            .ok_or_else(|| not_watched(kind::CLUSTER_NAME))?;
        Ok(ClusterNameReader::new(
            collection.store(),
            upstream,
            Arc::clone(&self.health),
        ))
    }

    pub fn auth_preference(&self) -> Result<AuthPreferenceReader> {
        let collection = self
            .collections
            .auth_preference
            .as_ref()
            .ok_or_else(|| not_watched(kind::AUTH_PREFERENCE))?;
        let upstream = self
            .config
            .cluster_config
            .clone()
            .ok_or_else(|| not_watched(kind::AUTH_PREFERENCE))?;
        Ok(AuthPreferenceReader::new(
            collection.store(),
            upstream,
            Arc::clone(&self.health),
        ))
    }

    /// Shut the cache down: cancel the engine, wait for it to drain, keep
    /// the stores for any in-flight readers. Idempotent.
    pub async fn close(&self) {
        self.cancel.cancel();
        let handle = self.engine.lock().take();
        if let Some(handle) = handle {
            if tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await.is_err() {
                warn!("watch engine did not drain within the shutdown timeout");
            }
        }
    }
}

impl Drop for Cache {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn not_watched(kind: &str) -> Error {
    Error::Config(format!("{kind} is not watched by this cache"))
}
