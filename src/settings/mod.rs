//! Orchestrator configuration.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Settings`] | Connection class, platform, mode profiles, host groups, sessions |
//! | [`ConnectionClass`] | Network link category and admission budget |
//! | [`SettingsStore`] | Async persistence seam, default [`MemoryStore`] |
//!
//! # Example
//!
//! ```
//! use stealth_core::settings::{ConnectionClass, Settings};
//!
//! let settings = Settings::from_json(r#"{
//!     "internet": { "connection": "mobile" },
//!     "useragent": "browser-desktop",
//!     "modes": [{ "domain": "example.com", "mode": { "text": true } }],
//!     "hosts": [{ "domain": "laptop.home", "hosts": ["10.0.0.2", "10.0.0.3"] }]
//! }"#).unwrap();
//!
//! assert_eq!(settings.internet.connection, ConnectionClass::Mobile);
//! assert_eq!(settings.hosts[0].hosts.len(), 2);
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Connection classes and admission budgets.
pub mod connection;

/// Settings persistence.
pub mod store;

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::resolve::{ModeProfile, Platform};
use crate::session::{HostGroup, Session};

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{ConnectionClass, DEBUG_BUDGET};
pub use store::{MemoryStore, SettingsStore};

// ============================================================================
// InternetSettings
// ============================================================================

/// Network link settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InternetSettings {
    /// Link category.
    #[serde(default)]
    pub connection: ConnectionClass,
}

// ============================================================================
// Settings
// ============================================================================

/// Everything the orchestrator reads from configuration.
///
/// `sessions` seeds the session registry at startup and receives the live
/// registry snapshot whenever settings are saved.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Network link settings.
    #[serde(default)]
    pub internet: InternetSettings,

    /// User-agent platform.
    #[serde(default)]
    pub useragent: Platform,

    /// Content mode profiles.
    #[serde(default)]
    pub modes: Vec<ModeProfile>,

    /// Host groups.
    #[serde(default)]
    pub hosts: Vec<HostGroup>,

    /// Known sessions.
    #[serde(default)]
    pub sessions: Vec<Session>,
}

// ============================================================================
// Settings - Builder Methods
// ============================================================================

impl Settings {
    /// Sets the connection class.
    #[inline]
    #[must_use]
    pub fn with_connection(mut self, connection: ConnectionClass) -> Self {
        self.internet.connection = connection;
        self
    }

    /// Sets the user-agent platform.
    #[inline]
    #[must_use]
    pub fn with_useragent(mut self, platform: Platform) -> Self {
        self.useragent = platform;
        self
    }

    /// Adds a mode profile.
    #[inline]
    #[must_use]
    pub fn with_mode(mut self, mode: ModeProfile) -> Self {
        self.modes.push(mode);
        self
    }

    /// Adds a host group.
    #[inline]
    #[must_use]
    pub fn with_host_group(mut self, group: HostGroup) -> Self {
        self.hosts.push(group);
        self
    }
}

// ============================================================================
// Settings - Conversion
// ============================================================================

impl Settings {
    /// Parses settings from JSON. Missing sections take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes settings to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::{IpAddr, Ipv4Addr};

    use crate::resolve::ContentMode;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.internet.connection, ConnectionClass::Broadband);
        assert_eq!(settings.useragent, Platform::Native);
        assert!(settings.modes.is_empty());
        assert!(settings.hosts.is_empty());
        assert!(settings.sessions.is_empty());
    }

    #[test]
    fn test_from_json_partial() {
        let settings = Settings::from_json(r#"{"internet":{"connection":"tor"}}"#).unwrap();
        assert_eq!(settings.internet.connection, ConnectionClass::Anonymizing);
        assert_eq!(settings.useragent, Platform::Native);
    }

    #[test]
    fn test_from_json_unknown_connection() {
        let settings = Settings::from_json(r#"{"internet":{"connection":"dialup"}}"#).unwrap();
        assert_eq!(settings.internet.connection, ConnectionClass::Unknown);
    }

    #[test]
    fn test_from_json_malformed() {
        let err = Settings::from_json("{").unwrap_err();
        assert!(matches!(err, crate::Error::Json(_)));
    }

    #[test]
    fn test_json_preserves_configuration() {
        let settings = Settings::default()
            .with_connection(ConnectionClass::Mobile)
            .with_useragent(Platform::SpiderMobile)
            .with_mode(ModeProfile::new("example.com", ContentMode::text_only()))
            .with_host_group(HostGroup::new(
                "laptop.home",
                [IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2))],
            ));

        let parsed = Settings::from_json(&settings.to_json().unwrap()).unwrap();
        assert_eq!(parsed, settings);
    }
}
