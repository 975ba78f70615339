//! Shared types for the gatehouse resource catalogue.
//!
//! This crate carries no I/O: it defines the typed resource schemas served by
//! the authority server, the `(kind, sub_kind, name)` identity model, the
//! watch wire protocol, and the shared error taxonomy. The replica cache in
//! `gatehouse-replica` and any authority client build on top of these.

mod access;
mod cluster;
mod error;
pub mod kind;
mod obj;
mod resource;
mod role;
mod server;
mod session;
mod token;
mod trust;
mod user;
pub mod watch;

pub use access::{AccessList, Lock};
pub use cluster::{AuthPreference, ClusterName, AUTH_PREFERENCE_NAME, CLUSTER_NAME_NAME};
pub use error::{Error, Result};
pub use kind::{ResourceKey, WatchKind};
pub use obj::ResourceObj;
pub use resource::{Resource, ResourceRef};
pub use role::Role;
pub use server::Server;
pub use session::{SessionSubKind, WebSession};
pub use token::ProvisionToken;
pub use trust::CertAuthority;
pub use user::User;
