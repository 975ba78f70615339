//! The watch engine: keeps the stores coherent with the authority.
//!
//! One background task per cache runs the connect cycle for the cache's
//! whole lifetime:
//!
//! 1. open a stream with the declared watches,
//! 2. take the leading kind-confirmation frame and narrow the supported set,
//! 3. fetch every collection's bulk load without touching any store,
//! 4. commit all the deferred applies under one new generation and flip
//!    healthy,
//! 5. stream events into the collections until the stream fails, the
//!    authority demands a reset, or a collection exhausts its skip budget,
//!
//! then marks the cache unhealthy (readers fall back to the authority; the
//! stale store contents are retained rather than dropped until the next
//! successful rebuild replaces them) and retries with exponential backoff.
//! Cancellation is honoured at every await point; a started apply always
//! runs to completion.

use std::collections::HashSet;
use std::sync::Arc;

use ahash::AHashMap;
use futures::StreamExt;
use gatehouse_core::{watch::WatchEvent, Error, ResourceKey, Result, WatchKind};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::authority::EventSource;
use crate::cache::BackoffConfig;
use crate::collection::Collections;
use crate::health::Health;

/// Consecutive bad events from one collection before the stream is declared
/// corrupt and rebuilt.
pub(crate) const MAX_CONSECUTIVE_SKIPS: usize = 5;

/// Tracks consecutive undispatchable events per collection. Any good event
/// for a collection clears its count.
#[derive(Default)]
struct SkipBudget {
    counts: AHashMap<ResourceKey, usize>,
}

impl SkipBudget {
    fn good(&mut self, key: &ResourceKey) {
        self.counts.remove(key);
    }

    /// Record a bad event; errors once a collection exhausts its budget.
    fn bad(&mut self, key: ResourceKey, err: &Error) -> Result<()> {
        let count = self.counts.entry(key.clone()).or_insert(0);
        *count += 1;
        warn!(%key, error = %err, skipped = *count, "skipping undispatchable event");
        if *count >= MAX_CONSECUTIVE_SKIPS {
            return Err(Error::AuthorityReset);
        }
        Ok(())
    }
}

pub(crate) struct WatchEngine {
    events: Arc<dyn EventSource>,
    collections: Arc<Collections>,
    health: Arc<Health>,
    watches: Vec<WatchKind>,
    backoff: BackoffConfig,
    cancel: CancellationToken,
}

impl WatchEngine {
    pub(crate) fn new(
        events: Arc<dyn EventSource>,
        collections: Arc<Collections>,
        health: Arc<Health>,
        watches: Vec<WatchKind>,
        backoff: BackoffConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            events,
            collections,
            health,
            watches,
            backoff,
            cancel,
        }
    }

    /// Run until cancelled.
    pub(crate) async fn run(self) {
        let mut backoff = self.backoff.build();
        loop {
            let generation_before = self.health.status().generation;
            match self.run_once().await {
                Ok(()) => {
                    debug!("watch engine cancelled, draining");
                    return;
                }
                Err(err) => {
                    self.health.set_unhealthy();
                    if self.health.status().generation > generation_before {
                        // The failed attempt got as far as a commit; start the
                        // backoff schedule over.
                        backoff = self.backoff.build();
                    }
                    let delay = backoff.next().unwrap_or(self.backoff.max);
                    warn!(error = %err, ?delay, "watch failed, backing off before rebuild");
                    tokio::select! {
                        () = self.cancel.cancelled() => return,
                        () = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    /// One full connect cycle. `Ok(())` means cancellation; any error means
    /// the cycle must be retried from scratch.
    async fn run_once(&self) -> Result<()> {
        // Initialising.
        let mut stream = tokio::select! {
            () = self.cancel.cancelled() => return Ok(()),
            res = self.events.watch(self.watches.clone()) => res?,
        };

        // ConfirmingKinds: the first frame names what the authority carries.
        let confirmed = tokio::select! {
            () = self.cancel.cancelled() => return Ok(()),
            frame = stream.next() => match frame {
                Some(Ok(WatchEvent::KindsConfirmed(kinds))) => kinds,
                Some(Ok(_)) => {
                    return Err(Error::Upstream(
                        "watch stream did not begin with a kind confirmation".to_string(),
                    ))
                }
                Some(Err(err)) => return Err(err),
                None => return Err(Error::StreamClosed),
            },
        };
        let confirmed: HashSet<ResourceKey> = confirmed.into_iter().collect();
        let mut supported = HashSet::with_capacity(self.collections.by_kind.len());
        for key in self.collections.by_kind.keys() {
            if confirmed.contains(key) {
                supported.insert(key.clone());
            } else {
                debug!(%key, "kind not confirmed by the authority, reads fall through");
            }
        }
        self.health.confirm_kinds(supported.clone());

        // LoadingSnapshot: gather every read before committing anything, so
        // no reader can observe a torn load across kinds.
        let mut applies = Vec::with_capacity(self.collections.by_kind.len());
        for (key, handler) in &self.collections.by_kind {
            let cache_ok = supported.contains(key);
            let apply = tokio::select! {
                () = self.cancel.cancelled() => return Ok(()),
                res = handler.fetch(cache_ok) => res?,
            };
            applies.push(apply);
        }

        // Committing: each apply swaps its own collection atomically.
        let generation = self.health.next_generation();
        for apply in applies {
            apply(generation);
        }
        self.health.commit(generation);
        debug!(generation, supported = supported.len(), "replica loaded");

        // Streaming.
        let mut skips = SkipBudget::default();
        loop {
            let event = tokio::select! {
                () = self.cancel.cancelled() => return Ok(()),
                event = stream.next() => event,
            };
            match event {
                None => return Err(Error::StreamClosed),
                Some(Err(err)) => return Err(err),
                Some(Ok(WatchEvent::Reset)) => return Err(Error::AuthorityReset),
                Some(Ok(WatchEvent::KindsConfirmed(_))) => {
                    return Err(Error::Upstream(
                        "unexpected kind confirmation mid-stream".to_string(),
                    ))
                }
                Some(Ok(WatchEvent::Put(obj))) => {
                    let key = obj.resource_key();
                    match self.collections.dispatch(&key) {
                        None => warn!(%key, "dropping put for a kind we did not subscribe to"),
                        Some(handler) => match handler.on_put(obj) {
                            Ok(()) => skips.good(&key),
                            Err(err) => skips.bad(key, &err)?,
                        },
                    }
                }
                Some(Ok(WatchEvent::Delete(target))) => {
                    let key = target.resource_key();
                    match self.collections.dispatch(&key) {
                        None => warn!(%key, "dropping delete for a kind we did not subscribe to"),
                        Some(handler) => match handler.on_delete(&target) {
                            Ok(()) => skips.good(&key),
                            Err(err) => skips.bad(key, &err)?,
                        },
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_core::kind;

    #[test]
    fn skip_budget_is_per_collection_and_resets_on_good_events() {
        let mut budget = SkipBudget::default();
        let users = ResourceKey::new(kind::USER);
        let roles = ResourceKey::new(kind::ROLE);
        let err = Error::Upstream("bad payload".to_string());

        for _ in 0..MAX_CONSECUTIVE_SKIPS - 1 {
            budget.bad(users.clone(), &err).unwrap();
            budget.bad(roles.clone(), &err).unwrap();
        }

        // A good event clears one collection's count without touching the
        // other's.
        budget.good(&users);
        budget.bad(users.clone(), &err).unwrap();
        assert!(matches!(
            budget.bad(roles, &err),
            Err(Error::AuthorityReset)
        ));
    }

    #[test]
    fn exhausted_budget_demands_a_rebuild() {
        let mut budget = SkipBudget::default();
        let key = ResourceKey::new(kind::USER);
        let err = Error::Upstream("bad payload".to_string());
        for _ in 0..MAX_CONSECUTIVE_SKIPS - 1 {
            budget.bad(key.clone(), &err).unwrap();
        }
        assert!(matches!(budget.bad(key, &err), Err(Error::AuthorityReset)));
    }
}
