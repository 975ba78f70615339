//! The watch wire protocol and pagination types.
//!
//! A watch stream opened against the authority begins with a single
//! [`WatchEvent::KindsConfirmed`] control frame naming the subset of the
//! requested kinds the authority actually carries, followed by data events
//! until the stream is cancelled or the authority demands a rebuild.

use serde::{Deserialize, Serialize};

use crate::{kind::ResourceKey, obj::ResourceObj, resource::ResourceRef};

/// Default page size for bulk list calls against the authority.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Events delivered on a watch stream.
///
/// The authority sends events in per-kind causal order; no ordering is
/// promised across kinds. Events are buffered from stream open, so nothing is
/// lost between the confirm frame and the first delivered event; if that
/// buffer overruns the authority sends [`WatchEvent::Reset`] instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchEvent {
    /// First frame on every stream: the requested kinds the authority
    /// supports. Kinds missing from the set must be served by direct reads.
    KindsConfirmed(Vec<ResourceKey>),
    /// A resource was created or updated.
    Put(ResourceObj),
    /// A resource was deleted.
    Delete(ResourceRef),
    /// The authority lost continuity; consumers must discard local state and
    /// reload from scratch.
    Reset,
}

/// A cursor-driven page request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Maximum items to return; `0` lets the server choose.
    pub page_size: usize,
    /// Opaque continuation token from the previous page, `None` for the
    /// first page.
    pub page_token: Option<String>,
}

impl PageRequest {
    pub fn first(page_size: usize) -> Self {
        Self {
            page_size,
            page_token: None,
        }
    }

    #[must_use]
    pub fn after(mut self, token: impl Into<String>) -> Self {
        self.page_token = Some(token.into());
        self
    }
}

/// One page of a list call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Token for the next page; `None` when this page is the last.
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    /// A terminal page carrying everything that is left.
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_page_token: None,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_page_token: self.next_page_token,
        }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::last(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ResourceObj, User};

    #[test]
    fn events_survive_the_wire() {
        let event = WatchEvent::Put(ResourceObj::from(User::new("alice")));
        let json = serde_json::to_string(&event).unwrap();
        let back: WatchEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
