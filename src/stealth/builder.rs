//! Builder pattern for orchestrator configuration.
//!
//! Provides a fluent API for wiring collaborators into a [`Stealth`]
//! orchestrator.
//!
//! # Example
//!
//! ```ignore
//! use stealth_core::{Settings, Stealth};
//!
//! let stealth = Stealth::builder()
//!     .settings(Settings::from_json(&json)?)
//!     .transport(transport)
//!     .store(store)
//!     .build()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::resolve::{BuiltinUserAgents, DomainMatcher, SuffixMatcher, UserAgentCodec};
use crate::scheduler::{AdmissionScheduler, DEFAULT_ADMISSION_PERIOD};
use crate::settings::{MemoryStore, Settings, SettingsStore};
use crate::transport::Transport;

use super::core::Stealth;
use super::orchestrator::{Collaborators, Orchestrator};

// ============================================================================
// StealthBuilder
// ============================================================================

/// Builder for configuring a [`Stealth`] orchestrator.
///
/// Use [`Stealth::builder()`] to create a new builder. Only the transport
/// is required.
#[derive(Clone)]
pub struct StealthBuilder {
    /// Initial settings, sessions included.
    settings: Settings,
    /// Listener collaborator.
    transport: Option<Arc<dyn Transport>>,
    /// Settings persistence, defaults to [`MemoryStore`].
    store: Option<Arc<dyn SettingsStore>>,
    /// Domain pattern matcher, defaults to [`SuffixMatcher`].
    matcher: Option<Arc<dyn DomainMatcher>>,
    /// User-agent codec, defaults to [`BuiltinUserAgents`].
    codec: Option<Arc<dyn UserAgentCodec>>,
    /// Debug mode: budget 1, no save on disconnect.
    debug: bool,
    /// Admission tick period.
    admission_period: Duration,
}

impl Default for StealthBuilder {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            transport: None,
            store: None,
            matcher: None,
            codec: None,
            debug: false,
            admission_period: DEFAULT_ADMISSION_PERIOD,
        }
    }
}

impl fmt::Debug for StealthBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StealthBuilder")
            .field("settings", &self.settings)
            .field("transport", &self.transport.is_some())
            .field("store", &self.store.is_some())
            .field("matcher", &self.matcher.is_some())
            .field("codec", &self.codec.is_some())
            .field("debug", &self.debug)
            .field("admission_period", &self.admission_period)
            .finish()
    }
}

// ============================================================================
// StealthBuilder Implementation
// ============================================================================

impl StealthBuilder {
    /// Creates a builder with default settings and no transport.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial settings.
    #[inline]
    #[must_use]
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the transport.
    #[inline]
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the settings store.
    #[inline]
    #[must_use]
    pub fn store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the domain matcher used by mode resolution.
    #[inline]
    #[must_use]
    pub fn matcher(mut self, matcher: Arc<dyn DomainMatcher>) -> Self {
        self.matcher = Some(matcher);
        self
    }

    /// Sets the user-agent codec.
    #[inline]
    #[must_use]
    pub fn codec(mut self, codec: Arc<dyn UserAgentCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Enables debug mode.
    #[inline]
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Sets the admission tick period.
    #[inline]
    #[must_use]
    pub fn admission_period(mut self, period: Duration) -> Self {
        self.admission_period = period;
        self
    }

    /// Spawns the orchestrator loop and returns its handle.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if no transport is set
    /// - [`Error::Config`] if called outside a tokio runtime
    /// - [`Error::InvalidArgument`] if the admission period is zero
    pub fn build(self) -> Result<Stealth> {
        let transport = self.validate_transport()?;
        self.validate_period()?;
        let runtime = Handle::try_current()
            .map_err(|_| Error::config("Stealth::builder().build() requires a tokio runtime"))?;

        let collaborators = Collaborators {
            transport,
            store: self.store.unwrap_or_else(|| Arc::new(MemoryStore::new())),
            matcher: self.matcher.unwrap_or_else(|| Arc::new(SuffixMatcher)),
            codec: self.codec.unwrap_or_else(|| Arc::new(BuiltinUserAgents)),
        };

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let orchestrator = Orchestrator::new(
            self.settings,
            self.debug,
            AdmissionScheduler::new(self.admission_period),
            collaborators,
            events_tx,
        );
        runtime.spawn(orchestrator.run(events_rx, command_rx));

        debug!(
            debug = self.debug,
            period_ms = self.admission_period.as_millis() as u64,
            "Orchestrator spawned"
        );

        Ok(Stealth::new(command_tx))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl StealthBuilder {
    /// Validates the transport configuration.
    fn validate_transport(&self) -> Result<Arc<dyn Transport>> {
        self.transport.clone().ok_or_else(|| {
            Error::config(
                "Transport is required. Use .transport() to set it.\n\
                 Example: Stealth::builder().transport(Arc::new(MyTransport))",
            )
        })
    }

    /// Validates the admission period.
    fn validate_period(&self) -> Result<()> {
        if self.admission_period.is_zero() {
            return Err(Error::invalid_argument("Admission period must be non-zero"));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
