//! Session registry and identity resolution.
//!
//! # Resolution
//!
//! ```text
//! TrackTarget::Session ──► register if absent ──► same session
//!
//! TrackTarget::Remote
//!   normalize address (::1, 127.0.0.x → 127.0.0.1)
//!   group = first HostGroup containing the address
//!   matches = group ? sessions named after the group (or a member address)
//!                   : sessions holding the address
//!   > 1 match  → new session, fold every match in, drop the matches
//!   = 1 match  → that session
//!   = 0 match  → new session
//!   finalize: domain + hosts from group (or the address), register
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::net::IpAddr;

use tracing::{debug, info};

use crate::identifiers::SessionId;

use super::host::{HostGroup, find_group};
use super::remote::{RemoteIdentity, normalize_address};
use super::session::Session;

// ============================================================================
// TrackTarget
// ============================================================================

/// Input to [`SessionRegistry::resolve`].
#[derive(Debug, Clone)]
pub enum TrackTarget {
    /// An explicit session handle, registered as-is.
    Session(Session),
    /// A connecting client to resolve to a canonical session.
    Remote(RemoteIdentity),
}

impl From<Session> for TrackTarget {
    fn from(session: Session) -> Self {
        Self::Session(session)
    }
}

impl From<RemoteIdentity> for TrackTarget {
    fn from(remote: RemoteIdentity) -> Self {
        Self::Remote(remote)
    }
}

// ============================================================================
// SessionRegistry
// ============================================================================

/// Ordered set of live sessions.
///
/// Registry order is insertion order and drives merge order. No two entries
/// share an id.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Vec<Session>,
}

// ============================================================================
// SessionRegistry - Constructor
// ============================================================================

impl SessionRegistry {
    /// Creates an empty registry.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry from previously persisted sessions.
    ///
    /// Duplicate ids are dropped, keeping the first.
    #[must_use]
    pub fn with_sessions(sessions: impl IntoIterator<Item = Session>) -> Self {
        let mut registry = Self::new();
        for session in sessions {
            registry.insert(session);
        }
        registry
    }
}

// ============================================================================
// SessionRegistry - Accessors
// ============================================================================

impl SessionRegistry {
    /// Returns the number of registered sessions.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if no session is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Returns `true` if a session with this id is registered.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: SessionId) -> bool {
        self.position(id).is_some()
    }

    /// Returns a registered session by id.
    #[must_use]
    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.iter().find(|session| session.id() == id)
    }

    /// Returns a registered session by id, mutably.
    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|session| session.id() == id)
    }

    /// Iterates sessions in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }

    /// Returns a snapshot of every session, in registry order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Session> {
        self.sessions.clone()
    }

    fn position(&self, id: SessionId) -> Option<usize> {
        self.sessions.iter().position(|session| session.id() == id)
    }
}

// ============================================================================
// SessionRegistry - Mutation
// ============================================================================

impl SessionRegistry {
    /// Registers a session unless one with the same id exists.
    ///
    /// Returns the index of the registered entry.
    fn insert(&mut self, session: Session) -> usize {
        match self.position(session.id()) {
            Some(index) => index,
            None => {
                self.sessions.push(session);
                self.sessions.len() - 1
            }
        }
    }

    /// Removes a session by id.
    pub fn remove(&mut self, id: SessionId) -> Option<Session> {
        self.position(id).map(|index| self.sessions.remove(index))
    }
}

// ============================================================================
// SessionRegistry - Resolution
// ============================================================================

impl SessionRegistry {
    /// Resolves a track target to its canonical, registered session.
    ///
    /// Resolving the same remote twice returns the same session and leaves
    /// its host set unchanged.
    pub fn resolve(&mut self, target: TrackTarget, groups: &[HostGroup]) -> &Session {
        let index = match target {
            TrackTarget::Session(session) => self.insert(session),
            TrackTarget::Remote(remote) => self.resolve_remote(remote, groups),
        };

        &self.sessions[index]
    }

    fn resolve_remote(&mut self, remote: RemoteIdentity, groups: &[HostGroup]) -> usize {
        let address = remote.normalized();
        let group = find_group(groups, &address);

        let matched: Vec<usize> = self
            .sessions
            .iter()
            .enumerate()
            .filter(|(_, session)| Self::is_match(session, &address, group))
            .map(|(index, _)| index)
            .collect();

        let index = match matched.as_slice() {
            [] => {
                let session = Session::new();
                debug!(session_id = %session.id(), remote = %remote, "New session");
                self.insert(session)
            }
            [only] => *only,
            _ => self.absorb(&matched),
        };

        let session = &mut self.sessions[index];
        Self::finalize(session, &address, group);

        index
    }

    fn is_match(session: &Session, address: &IpAddr, group: Option<&HostGroup>) -> bool {
        match group {
            Some(group) => session.domain.as_deref().is_some_and(|domain| {
                domain == group.domain || group.is_member_pseudo_domain(domain)
            }),
            None => session.contains_host(address),
        }
    }

    /// Replaces the matched sessions with one merged session.
    fn absorb(&mut self, matched: &[usize]) -> usize {
        let mut merged = Session::new();

        for &index in matched {
            Session::merge(&mut merged, &self.sessions[index]);
        }

        for &index in matched.iter().rev() {
            self.sessions.remove(index);
        }

        info!(
            session_id = %merged.id(),
            absorbed = matched.len(),
            "Sessions merged"
        );

        self.insert(merged)
    }

    fn finalize(session: &mut Session, address: &IpAddr, group: Option<&HostGroup>) {
        match group {
            Some(group) => {
                session.domain = Some(group.domain.clone());
                for member in &group.hosts {
                    session.add_host(normalize_address(*member));
                }
            }
            None => {
                session.domain = Some(address.to_string());
                session.add_host(*address);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::{Ipv4Addr, Ipv6Addr};

    use proptest::prelude::*;

    use crate::session::remote::CANONICAL_LOOPBACK;

    fn remote(a: u8, b: u8, c: u8, d: u8) -> RemoteIdentity {
        RemoteIdentity::new(IpAddr::V4(Ipv4Addr::new(a, b, c, d)), 40000)
    }

    fn lan(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn test_explicit_session_is_registered_once() {
        let mut registry = SessionRegistry::new();
        let session = Session::new();
        let id = session.id();

        assert_eq!(registry.resolve(session.clone().into(), &[]).id(), id);
        assert_eq!(registry.resolve(session.into(), &[]).id(), id);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_explicit_session_returns_registered_state() {
        let mut registry = SessionRegistry::new();
        let session = Session::new();
        let id = session.id();
        registry.resolve(session.clone().into(), &[]);
        registry.get_mut(id).unwrap().visit("https://example.com/");

        let resolved = registry.resolve(session.into(), &[]);
        assert_eq!(resolved.history().len(), 1);
    }

    #[test]
    fn test_remote_creates_session_named_after_address() {
        let mut registry = SessionRegistry::new();
        let session = registry.resolve(remote(10, 0, 0, 2).into(), &[]);

        assert_eq!(session.domain.as_deref(), Some("10.0.0.2"));
        assert_eq!(session.hosts(), &[lan(2)]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remote_resolution_is_idempotent() {
        let mut registry = SessionRegistry::new();
        let first = registry.resolve(remote(10, 0, 0, 2).into(), &[]).clone();
        let second = registry.resolve(remote(10, 0, 0, 2).into(), &[]).clone();

        assert_eq!(first.id(), second.id());
        assert_eq!(first.hosts().len(), second.hosts().len());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_loopback_aliases_share_session() {
        let mut registry = SessionRegistry::new();
        let v6 = RemoteIdentity::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 1);
        let first = registry.resolve(v6.into(), &[]).id();

        for last in [5u8, 77, 255] {
            let session = registry.resolve(remote(127, 0, 0, last).into(), &[]);
            assert_eq!(session.id(), first);
            assert_eq!(session.hosts(), &[CANONICAL_LOOPBACK]);
        }
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_host_group_members_share_session() {
        let groups = vec![HostGroup::new("laptop.home", [lan(2), lan(3)])];
        let mut registry = SessionRegistry::new();

        let a = registry.resolve(remote(10, 0, 0, 2).into(), &groups).id();
        let b = registry.resolve(remote(10, 0, 0, 3).into(), &groups).clone();

        assert_eq!(a, b.id());
        assert_eq!(b.domain.as_deref(), Some("laptop.home"));
        assert_eq!(b.hosts(), &[lan(2), lan(3)]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_group_absorbs_per_address_sessions() {
        let mut registry = SessionRegistry::new();
        let a = registry.resolve(remote(10, 0, 0, 2).into(), &[]).id();
        let b = registry.resolve(remote(10, 0, 0, 3).into(), &[]).id();
        registry.get_mut(a).unwrap().visit("https://a.example/");
        registry.get_mut(b).unwrap().visit("https://b.example/");
        assert_eq!(registry.len(), 2);

        let groups = vec![HostGroup::new("laptop.home", [lan(2), lan(3)])];
        let merged = registry.resolve(remote(10, 0, 0, 3).into(), &groups).clone();

        assert_ne!(merged.id(), a);
        assert_ne!(merged.id(), b);
        assert_eq!(merged.domain.as_deref(), Some("laptop.home"));
        assert_eq!(merged.hosts(), &[lan(2), lan(3)]);
        assert_eq!(merged.history(), &["https://a.example/", "https://b.example/"]);
        assert!(!registry.contains(a));
        assert!(!registry.contains(b));
        assert_eq!(registry.len(), 1);

        let again = registry.resolve(remote(10, 0, 0, 2).into(), &groups);
        assert_eq!(again.id(), merged.id());
    }

    #[test]
    fn test_group_renames_single_per_address_session() {
        let mut registry = SessionRegistry::new();
        let old = registry.resolve(remote(10, 0, 0, 2).into(), &[]).id();

        let groups = vec![HostGroup::new("laptop.home", [lan(2), lan(3)])];
        let resolved = registry.resolve(remote(10, 0, 0, 2).into(), &groups);

        assert_eq!(resolved.id(), old);
        assert_eq!(resolved.domain.as_deref(), Some("laptop.home"));
        assert_eq!(resolved.hosts(), &[lan(2), lan(3)]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_group_sessions_are_merged_in_registry_order() {
        let mut first = Session::new();
        first.domain = Some("laptop.home".into());
        first.set_label("theme", "dark");
        let mut second = Session::new();
        second.domain = Some("laptop.home".into());
        second.set_label("theme", "light");
        let (first_id, second_id) = (first.id(), second.id());

        let mut registry = SessionRegistry::with_sessions([first, second]);
        let groups = vec![HostGroup::new("laptop.home", [lan(2)])];
        let merged = registry.resolve(remote(10, 0, 0, 2).into(), &groups);

        assert_eq!(merged.label("theme"), Some("dark"));
        assert!(!registry.contains(first_id));
        assert!(!registry.contains(second_id));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unrelated_sessions_untouched() {
        let mut registry = SessionRegistry::new();
        let other = registry.resolve(remote(192, 168, 1, 9).into(), &[]).id();
        let groups = vec![HostGroup::new("laptop.home", [lan(2)])];
        registry.resolve(remote(10, 0, 0, 2).into(), &groups);

        assert!(registry.contains(other));
        assert_eq!(registry.len(), 2);
    }

    proptest! {
        #[test]
        fn prop_repeated_resolution_is_stable(
            addresses in proptest::collection::vec(any::<[u8; 4]>(), 1..16),
        ) {
            let groups = vec![HostGroup::new("grouped.home", [lan(2), lan(3)])];
            let mut registry = SessionRegistry::new();

            for octets in &addresses {
                let target = RemoteIdentity::new(IpAddr::from(*octets), 1);
                registry.resolve(target.into(), &groups);
            }
            let before = registry.snapshot();

            for octets in &addresses {
                let target = RemoteIdentity::new(IpAddr::from(*octets), 1);
                let id = registry.resolve(target.into(), &groups).id();
                prop_assert!(before.iter().any(|s| s.id() == id));
            }

            prop_assert_eq!(registry.snapshot(), before);
        }
    }
}
