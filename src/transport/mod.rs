//! Transport and request-execution seams.
//!
//! The orchestrator never touches sockets itself. A [`Transport`] accepts
//! connections and owns the network; its [`Services`] turn a
//! [`RequestConfig`] into a running [`Execution`].
//!
//! # Connection Lifecycle
//!
//! ```text
//! Stealth::connect ──► Transport::connect(acks) ──► true/false
//!                              │
//!                              ├─ acks.connected()    ──► Connected, scheduler armed
//!                              └─ acks.disconnected() ──► Disconnected, queue stopped
//!
//! Stealth::disconnect ──► (save settings) ──► Transport::disconnect
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// One-shot lifecycle acknowledgments.
pub mod acks;

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use crate::request::{RequestConfig, RequestEvents};

// ============================================================================
// Re-exports
// ============================================================================

pub use acks::TransportAcks;

// ============================================================================
// Transport
// ============================================================================

/// Listener side of the proxy.
pub trait Transport: Send + Sync {
    /// Starts the transport.
    ///
    /// Returns `false` if the transport refused to start. On success the
    /// transport keeps `acks` and calls [`TransportAcks::connected`] once it
    /// is up and [`TransportAcks::disconnected`] once it is down again.
    fn connect(&self, acks: TransportAcks) -> bool;

    /// Stops the transport. Completion is reported through the acks.
    fn disconnect(&self);

    /// Returns the services used to execute requests.
    fn services(&self) -> Arc<dyn Services>;
}

// ============================================================================
// Services
// ============================================================================

/// Factory for request executions.
pub trait Services: Send + Sync {
    /// Creates an execution for `config`.
    ///
    /// The execution must not do any I/O before [`Execution::start`]. It
    /// reports its terminal outcome through `events`.
    fn execute(&self, config: &RequestConfig, events: RequestEvents) -> Box<dyn Execution>;
}

// ============================================================================
// Execution
// ============================================================================

/// A single request's I/O, driven by the admission scheduler.
pub trait Execution: Send {
    /// Begins the request. Called at most once.
    fn start(&mut self);

    /// Aborts the request. Must be safe in any state, including before
    /// [`Execution::start`].
    fn stop(&mut self);
}
