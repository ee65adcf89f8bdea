//! Session identity and merge semantics.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::net::IpAddr;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::identifiers::SessionId;

// ============================================================================
// Session
// ============================================================================

/// Canonical identity of one remote client across reconnects.
///
/// A session owns a domain (a real domain from a host group, or the bare
/// address used as a pseudo-domain), the set of addresses known to belong
/// to it, and browsing state that follows the client between connections.
///
/// Ids are process-local: a session loaded from settings gets a fresh id.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Process-local identity.
    #[serde(skip, default = "SessionId::next")]
    id: SessionId,

    /// Group domain or pseudo-domain address.
    #[serde(default)]
    pub domain: Option<String>,

    /// Known addresses, without duplicates.
    #[serde(default)]
    hosts: Vec<IpAddr>,

    /// Visited links, oldest first, without duplicates.
    #[serde(default)]
    history: Vec<String>,

    /// Free-form owner state.
    #[serde(default)]
    labels: FxHashMap<String, String>,
}

// ============================================================================
// Session - Display
// ============================================================================

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("domain", &self.domain)
            .field("hosts", &self.hosts)
            .field("history_len", &self.history.len())
            .finish_non_exhaustive()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Session - Constructor
// ============================================================================

impl Session {
    /// Creates an empty session with a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: SessionId::next(),
            domain: None,
            hosts: Vec::new(),
            history: Vec::new(),
            labels: FxHashMap::default(),
        }
    }
}

// ============================================================================
// Session - Accessors
// ============================================================================

impl Session {
    /// Returns the session id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Returns the known addresses in insertion order.
    #[inline]
    #[must_use]
    pub fn hosts(&self) -> &[IpAddr] {
        &self.hosts
    }

    /// Returns `true` if the address belongs to this session.
    #[inline]
    #[must_use]
    pub fn contains_host(&self, address: &IpAddr) -> bool {
        self.hosts.contains(address)
    }

    /// Adds an address. Returns `false` if it was already known.
    pub fn add_host(&mut self, address: IpAddr) -> bool {
        if self.contains_host(&address) {
            return false;
        }
        self.hosts.push(address);
        true
    }

    /// Returns visited links, oldest first.
    #[inline]
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Records a visited link. Already visited links are not repeated.
    pub fn visit(&mut self, link: impl Into<String>) -> bool {
        let link = link.into();
        if self.history.contains(&link) {
            return false;
        }
        self.history.push(link);
        true
    }

    /// Returns a label value.
    #[inline]
    #[must_use]
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    /// Sets a label, returning the previous value.
    pub fn set_label(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.labels.insert(key.into(), value.into())
    }
}

// ============================================================================
// Session - Merge
// ============================================================================

impl Session {
    /// Folds `source` into `target`.
    ///
    /// Hosts and history are unioned with `target` entries first. Labels
    /// already present on `target` are kept; `source` only fills gaps. The
    /// target's id and domain are left alone.
    pub fn merge(target: &mut Session, source: &Session) {
        for address in &source.hosts {
            target.add_host(*address);
        }

        for link in &source.history {
            target.visit(link.clone());
        }

        for (key, value) in &source.labels {
            target
                .labels
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }

        trace!(into = %target.id, from = %source.id, "Session merged");
    }
}

// ============================================================================
// Tests
// ============================================================================
