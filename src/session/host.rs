//! Configured host groups.

// ============================================================================
// Imports
// ============================================================================

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use super::remote::normalize_address;

// ============================================================================
// HostGroup
// ============================================================================

/// A domain identity shared by several known addresses.
///
/// Used for multi-homed clients: every address in the group resolves to
/// the same session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostGroup {
    /// Domain the group's session is named after.
    pub domain: String,

    /// Member addresses.
    #[serde(default)]
    pub hosts: Vec<IpAddr>,
}

impl HostGroup {
    /// Creates a host group.
    #[must_use]
    pub fn new(domain: impl Into<String>, hosts: impl IntoIterator<Item = IpAddr>) -> Self {
        Self {
            domain: domain.into(),
            hosts: hosts.into_iter().collect(),
        }
    }

    /// Returns `true` if the (already normalized) address is a member.
    ///
    /// Members are compared in normalized form, so a group listing `::1`
    /// matches the canonical loopback.
    #[must_use]
    pub fn contains(&self, address: &IpAddr) -> bool {
        self.hosts
            .iter()
            .any(|member| normalize_address(*member) == *address)
    }

    /// Returns `true` if `domain` is the pseudo-domain of one of the members.
    #[must_use]
    pub fn is_member_pseudo_domain(&self, domain: &str) -> bool {
        self.hosts
            .iter()
            .any(|member| normalize_address(*member).to_string() == domain)
    }
}

/// Finds the first group containing the address.
#[must_use]
pub fn find_group<'a>(groups: &'a [HostGroup], address: &IpAddr) -> Option<&'a HostGroup> {
    groups.iter().find(|group| group.contains(address))
}

// ============================================================================
// Tests
// ============================================================================
