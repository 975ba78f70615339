use thiserror::Error;

use crate::kind::ResourceKey;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors shared by the authority clients and the replica cache.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration. The only error class that fails cache
    /// construction; everything else is survived at runtime.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The requested resource does not exist. A normal signalled value on
    /// reads, never a cache failure.
    #[error("{kind} {name:?} not found")]
    NotFound { kind: String, name: String },

    /// A transient upstream failure (network, timeout, server error).
    #[error("upstream authority request failed: {0}")]
    Upstream(String),

    /// The authority demanded a rebuild (reset event or buffer overrun).
    #[error("authority reset, cache must reload")]
    AuthorityReset,

    /// The watch stream closed without being cancelled.
    #[error("watch stream closed by the authority")]
    StreamClosed,

    /// An event payload did not match the collection it was dispatched to.
    #[error("unexpected resource {got} in {expected} collection")]
    UnexpectedResource {
        expected: ResourceKey,
        got: ResourceKey,
    },

    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,

    /// The cache has been closed.
    #[error("cache is closed")]
    Closed,
}

impl Error {
    /// Shorthand for the [`Error::NotFound`] constructor.
    pub fn not_found(kind: &str, name: &str) -> Self {
        Error::NotFound {
            kind: kind.to_string(),
            name: name.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}
