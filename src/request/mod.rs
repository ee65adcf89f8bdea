//! Outbound requests owned by the orchestrator.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`RequestQueue`] | FIFO keyed by link, with the admission scan |
//! | [`PendingRequest`] | Queued request wrapping an executor |
//! | [`RequestConfig`] | URL, mode, user-agent and proxy for one request |
//! | [`RequestEvents`] | Terminal notification reporter for executors |
//! | [`ProxyConfig`] | Proxy override |

// ============================================================================
// Submodules
// ============================================================================

/// Queued requests and timelines.
pub mod pending;

/// Proxy configuration.
pub mod proxy;

/// Request queue and admission scan.
pub mod queue;

// ============================================================================
// Re-exports
// ============================================================================

pub use pending::{
    PendingRequest, RequestConfig, RequestEvents, RequestInfo, RequestOutcome, Timeline,
    TimelineEntry, TimelineEvent,
};
pub use proxy::{ProxyConfig, ProxyType};
pub use queue::RequestQueue;
