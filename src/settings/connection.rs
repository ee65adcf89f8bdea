//! Network connection classes and their admission budgets.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Budget applied to every class while the debug flag is set.
pub const DEBUG_BUDGET: usize = 1;

// ============================================================================
// ConnectionClass
// ============================================================================

/// Configured category of the network link.
///
/// Determines how many requests may be in flight at once. Values that are
/// not recognized deserialize to [`ConnectionClass::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionClass {
    /// Metered mobile link.
    Mobile,

    /// Fixed broadband link.
    #[default]
    Broadband,

    /// Peer-to-peer link.
    Peer,

    /// Anonymizing overlay network. Requests are routed through a local
    /// SOCKS proxy.
    #[serde(rename = "tor")]
    Anonymizing,

    /// Unrecognized class. Admits nothing.
    #[serde(other)]
    Unknown,
}

impl ConnectionClass {
    /// Returns the configuration name of the class.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Broadband => "broadband",
            Self::Peer => "peer",
            Self::Anonymizing => "tor",
            Self::Unknown => "unknown",
        }
    }

    /// Returns the number of requests this class may run concurrently.
    ///
    /// [`ConnectionClass::Unknown`] yields zero, which starves the queue
    /// until the class changes.
    #[inline]
    #[must_use]
    pub const fn budget(&self) -> usize {
        match self {
            Self::Mobile => 2,
            Self::Broadband => 8,
            Self::Peer => 2,
            Self::Anonymizing => 2,
            Self::Unknown => 0,
        }
    }

    /// Returns the admission budget, honoring the debug override.
    #[inline]
    #[must_use]
    pub const fn admission_budget(&self, debug: bool) -> usize {
        if debug { DEBUG_BUDGET } else { self.budget() }
    }

    /// Returns `true` if requests must be routed through the anonymizing proxy.
    #[inline]
    #[must_use]
    pub const fn is_anonymizing(&self) -> bool {
        matches!(self, Self::Anonymizing)
    }
}

// ============================================================================
// Tests
// ============================================================================
