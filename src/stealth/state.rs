//! Orchestrator lifecycle states.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// LifecycleState
// ============================================================================

/// Connection lifecycle of the orchestrator.
///
/// ```text
/// Disconnected ──connect──► Connecting ──ack──► Connected
///      ▲                                            │
///      └────────ack──────── Disconnecting ◄──disconnect
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Transport is down.
    #[default]
    Disconnected,
    /// Transport asked to start, awaiting its ack.
    Connecting,
    /// Transport is up and admission is running.
    Connected,
    /// Settings are being saved or the transport is shutting down.
    Disconnecting,
}

impl LifecycleState {
    /// Returns the state name.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnecting => "disconnecting",
        }
    }

    /// Returns `true` if the transport may be up or coming up.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Disconnected)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================
