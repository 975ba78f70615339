//! A replicated, read-optimised mirror of the gatehouse authority's
//! resource catalogue.
//!
//! The replica bulk-loads the catalogue over the authority's paginated list
//! RPCs, then keeps it live by consuming the streaming watch protocol. Reads
//! are served from in-memory per-kind stores while the cache is healthy and
//! transparently fall back to the authority while it is not, so consumers
//! never need to know which side answered.
//!
//! ## Usage
//!
//! Declare the kinds to mirror and hand over one upstream client per family:
//!
//! ```no_run
//! use std::sync::Arc;
//! use gatehouse_core::{kind, WatchKind};
//! use gatehouse_replica::{Cache, Config};
//! # async fn wrapper(events: Arc<dyn gatehouse_replica::authority::EventSource>,
//! #                  users: Arc<dyn gatehouse_replica::authority::UserService>)
//! #     -> Result<(), gatehouse_core::Error> {
//! let cache = Cache::new(Config {
//!     watches: vec![WatchKind::new(kind::USER)],
//!     events: Some(events),
//!     users: Some(users),
//!     ..Config::default()
//! })?;
//!
//! let alice = cache.users()?.get("alice", false).await?;
//! # drop(alice);
//! # Ok(())
//! # }
//! ```
//!
//! Readers route per call: a reader held across a degradation keeps working
//! against the authority and moves back to the store after the rebuild.

pub mod authority;
mod cache;
mod collection;
mod engine;
mod health;
mod readers;
pub mod store;

pub use cache::{BackoffConfig, Cache, Config};
pub use health::HealthStatus;
pub use readers::{
    AccessListReader, AuthPreferenceReader, CertAuthorityReader, ClusterNameReader, LockReader,
    NodeReader, RoleReader, SessionReader, TokenReader, UserReader,
};
