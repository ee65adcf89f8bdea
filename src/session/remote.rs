//! Remote identities reported by the transport and their normalization.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Canonical loopback every local alias collapses to.
pub const CANONICAL_LOOPBACK: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

// ============================================================================
// RemoteIdentity
// ============================================================================

/// Address and port of a connecting client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteIdentity {
    /// Remote address as reported.
    pub host: IpAddr,
    /// Remote port.
    pub port: u16,
}

impl RemoteIdentity {
    /// Creates a remote identity.
    #[inline]
    #[must_use]
    pub const fn new(host: IpAddr, port: u16) -> Self {
        Self { host, port }
    }

    /// Parses a textual address. Returns `None` if it is not an IP address.
    #[must_use]
    pub fn parse(host: &str, port: u16) -> Option<Self> {
        let host = host.trim().trim_start_matches('[').trim_end_matches(']');
        host.parse().ok().map(|host| Self::new(host, port))
    }

    /// Returns the normalized address used for identity matching.
    #[inline]
    #[must_use]
    pub fn normalized(&self) -> IpAddr {
        normalize_address(self.host)
    }
}

impl From<SocketAddr> for RemoteIdentity {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip(), addr.port())
    }
}

impl fmt::Display for RemoteIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", SocketAddr::new(self.host, self.port))
    }
}

// ============================================================================
// Normalization
// ============================================================================

/// Normalizes an address for identity matching.
///
/// IPv4-mapped IPv6 addresses become plain IPv4. `::1` and every address in
/// `127.0.0.0/24` collapse to `127.0.0.1`; some clients connect from spurious
/// adjacent loopback addresses.
#[must_use]
pub fn normalize_address(address: IpAddr) -> IpAddr {
    match address.to_canonical() {
        IpAddr::V6(v6) if v6.is_loopback() => CANONICAL_LOOPBACK,
        IpAddr::V4(v4) if v4.octets()[..3] == [127, 0, 0] => CANONICAL_LOOPBACK,
        other => other,
    }
}

// ============================================================================
// Tests
// ============================================================================
