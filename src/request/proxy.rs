//! Proxy override attached to outbound requests.
//!
//! # Example
//!
//! ```
//! use stealth_core::request::{ProxyConfig, ProxyType};
//!
//! let proxy = ProxyConfig::anonymizing();
//! assert_eq!(proxy.proxy_type, ProxyType::Socks5);
//! assert_eq!(proxy.port, 9050);
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Host of the local anonymizing SOCKS endpoint.
pub const ANONYMIZING_PROXY_HOST: &str = "127.0.0.1";

/// Port of the local anonymizing SOCKS endpoint.
pub const ANONYMIZING_PROXY_PORT: u16 = 9050;

// ============================================================================
// ProxyType
// ============================================================================

/// Proxy protocol type.
///
/// The anonymizing overlay only speaks SOCKS v5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProxyType {
    /// SOCKS v5 proxy.
    #[serde(rename = "socks")]
    Socks5,
}

impl ProxyType {
    /// Returns the string representation used by request executors.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Socks5 => "socks",
        }
    }
}

// ============================================================================
// ProxyConfig
// ============================================================================

/// Proxy a request must be routed through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Proxy type.
    #[serde(rename = "type")]
    pub proxy_type: ProxyType,

    /// Proxy hostname.
    pub host: String,

    /// Proxy port.
    pub port: u16,

    /// Whether DNS queries go through the proxy.
    #[serde(rename = "proxyDns", default)]
    pub proxy_dns: bool,
}

impl ProxyConfig {
    /// Creates a SOCKS5 proxy configuration.
    #[must_use]
    pub fn socks5(host: impl Into<String>, port: u16) -> Self {
        Self {
            proxy_type: ProxyType::Socks5,
            host: host.into(),
            port,
            proxy_dns: false,
        }
    }

    /// The local anonymizing overlay endpoint, resolving DNS remotely.
    #[must_use]
    pub fn anonymizing() -> Self {
        Self::socks5(ANONYMIZING_PROXY_HOST, ANONYMIZING_PROXY_PORT).with_proxy_dns(true)
    }

    /// Enables DNS proxying.
    #[must_use]
    pub fn with_proxy_dns(mut self, proxy_dns: bool) -> Self {
        self.proxy_dns = proxy_dns;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
