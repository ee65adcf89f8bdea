//! Public orchestrator handle.
//!
//! [`Stealth`] is a cheap, cloneable handle onto the orchestrator loop.
//! Every method is a message round-trip; the loop answers in the order
//! calls were made.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::request::RequestInfo;
use crate::session::{RemoteIdentity, Session, TrackTarget};
use crate::settings::Settings;

use super::builder::StealthBuilder;
use super::event::Command;
use super::signals;
use super::state::LifecycleState;

// ============================================================================
// Stealth
// ============================================================================

/// Handle onto a running orchestrator.
///
/// The loop runs until the last handle is dropped, at which point the
/// admission timer and every queued request are stopped.
///
/// # Example
///
/// ```ignore
/// let stealth = Stealth::builder().transport(transport).build()?;
///
/// if stealth.connect().await? {
///     stealth.request("https://example.com/").await?;
/// }
/// ```
#[derive(Clone)]
pub struct Stealth {
    command_tx: mpsc::UnboundedSender<Command>,
}

impl fmt::Debug for Stealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stealth")
            .field("closed", &self.command_tx.is_closed())
            .finish()
    }
}

// ============================================================================
// Stealth - Construction
// ============================================================================

impl Stealth {
    /// Creates a builder.
    #[inline]
    #[must_use]
    pub fn builder() -> StealthBuilder {
        StealthBuilder::new()
    }

    pub(crate) fn new(command_tx: mpsc::UnboundedSender<Command>) -> Self {
        Self { command_tx }
    }

    /// Returns `true` once the loop has terminated.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed()
    }

    #[cfg(test)]
    pub(crate) fn command_sender(&self) -> &mpsc::UnboundedSender<Command> {
        &self.command_tx
    }

    async fn call<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(command(reply))
            .map_err(|_| Error::OrchestratorClosed)?;
        rx.await.map_err(|_| Error::OrchestratorClosed)
    }
}

// ============================================================================
// Stealth - Lifecycle
// ============================================================================

impl Stealth {
    /// Starts the transport.
    ///
    /// Returns `false` unless the orchestrator was disconnected and the
    /// transport accepted. The state becomes connected once the transport
    /// acknowledges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OrchestratorClosed`] if the loop is gone.
    pub async fn connect(&self) -> Result<bool> {
        self.call(|reply| Command::Connect { reply }).await
    }

    /// Saves settings and stops the transport.
    ///
    /// Returns `false` unless connected. In debug mode the save is skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OrchestratorClosed`] if the loop is gone.
    pub async fn disconnect(&self) -> Result<bool> {
        self.call(|reply| Command::Disconnect { reply }).await
    }

    /// Disconnects if connected, otherwise does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OrchestratorClosed`] if the loop is gone.
    pub async fn destroy(&self) -> Result<bool> {
        self.call(|reply| Command::Destroy { reply }).await
    }

    /// Returns the lifecycle state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OrchestratorClosed`] if the loop is gone.
    pub async fn state(&self) -> Result<LifecycleState> {
        self.call(|reply| Command::State { reply }).await
    }

    /// Returns `true` while connected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OrchestratorClosed`] if the loop is gone.
    pub async fn is_connected(&self) -> Result<bool> {
        Ok(self.state().await? == LifecycleState::Connected)
    }

    /// Maps process termination signals to [`Stealth::disconnect`].
    ///
    /// The watcher does not keep the orchestrator alive and exits once
    /// every handle is dropped and a signal arrives.
    #[must_use = "dropping the handle detaches the watcher, abort it to stop watching"]
    pub fn watch_signals(&self) -> JoinHandle<()> {
        signals::spawn_watcher(self.command_tx.downgrade())
    }
}

// ============================================================================
// Stealth - Requests
// ============================================================================

impl Stealth {
    /// Queues a request for `url`.
    ///
    /// Returns `None` if `url` does not parse. If the link is already
    /// queued, the existing request is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OrchestratorClosed`] if the loop is gone.
    pub async fn request(&self, url: &str) -> Result<Option<RequestInfo>> {
        match Url::parse(url) {
            Ok(url) => self.request_url(url).await.map(Some),
            Err(e) => {
                debug!(url, error = %e, "Request for invalid URL ignored");
                Ok(None)
            }
        }
    }

    /// Queues a request for an already parsed URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OrchestratorClosed`] if the loop is gone.
    pub async fn request_url(&self, url: Url) -> Result<RequestInfo> {
        self.call(|reply| Command::Request { url, reply }).await
    }

    /// Returns snapshots of every queued request in submission order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OrchestratorClosed`] if the loop is gone.
    pub async fn pending_requests(&self) -> Result<Vec<RequestInfo>> {
        self.call(|reply| Command::PendingRequests { reply }).await
    }
}

// ============================================================================
// Stealth - Sessions
// ============================================================================

impl Stealth {
    /// Resolves a session or remote identity to its canonical session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OrchestratorClosed`] if the loop is gone.
    pub async fn track(&self, target: impl Into<TrackTarget>) -> Result<Session> {
        let target = Some(target.into());
        self.call(|reply| Command::Track { target, reply }).await
    }

    /// Resolves a remote given as a textual address.
    ///
    /// An address that does not parse yields a fresh session that is not
    /// registered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OrchestratorClosed`] if the loop is gone.
    pub async fn track_remote(&self, host: &str, port: u16) -> Result<Session> {
        let target = RemoteIdentity::parse(host, port).map(TrackTarget::from);
        self.call(|reply| Command::Track { target, reply }).await
    }

    /// Returns snapshots of every registered session in registry order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OrchestratorClosed`] if the loop is gone.
    pub async fn sessions(&self) -> Result<Vec<Session>> {
        self.call(|reply| Command::Sessions { reply }).await
    }
}

// ============================================================================
// Stealth - Settings
// ============================================================================

impl Stealth {
    /// Returns the current settings, sessions included.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OrchestratorClosed`] if the loop is gone.
    pub async fn settings(&self) -> Result<Settings> {
        self.call(|reply| Command::Settings { reply }).await
    }

    /// Applies `update` to the live settings.
    ///
    /// Changes take effect for the next request and the next admission
    /// tick. The `sessions` field is owned by the registry and ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OrchestratorClosed`] if the loop is gone.
    pub async fn update_settings(
        &self,
        update: impl FnOnce(&mut Settings) + Send + 'static,
    ) -> Result<()> {
        let update = Box::new(update);
        self.call(|reply| Command::UpdateSettings { update, reply })
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================
