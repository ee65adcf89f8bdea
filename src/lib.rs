//! Stealth core - orchestration core of a privacy-oriented proxy.
//!
//! This library owns the set of in-flight outbound requests, admits them
//! onto the network under a bandwidth-aware concurrency budget, and maps
//! connecting clients to persistent session identities.
//!
//! # Architecture
//!
//! The orchestrator follows a single-owner actor model:
//!
//! - **Handle ([`Stealth`])**: Cloneable, sends commands, awaits replies
//! - **Loop (internal task)**: Owns the request queue, the session registry
//!   and the lifecycle state
//!
//! Key design principles:
//!
//! - All state is mutated from the loop, never shared behind locks
//! - Network I/O belongs to the [`Transport`] and [`Services`] collaborators
//! - Bad input degrades to safe defaults instead of errors
//! - The admission timer lives exactly as long as the connection
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use stealth_core::{Result, Settings, Stealth};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let stealth = Stealth::builder()
//!         .settings(Settings::from_json(&std::fs::read_to_string("settings.json")?)?)
//!         .transport(Arc::new(MyTransport::default()))
//!         .build()?;
//!
//!     let _signals = stealth.watch_signals();
//!
//!     if stealth.connect().await? {
//!         stealth.request("https://example.com/").await?;
//!         let session = stealth.track_remote("192.168.0.12", 50412).await?;
//!         println!("Client session: {}", session.id());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`stealth`] | Orchestrator handle, builder and lifecycle |
//! | [`scheduler`] | Admission timer and budgeted admission pass |
//! | [`request`] | Request queue, configuration and timelines |
//! | [`session`] | Session registry and merge engine |
//! | [`resolve`] | Mode and user-agent resolvers |
//! | [`settings`] | Configuration and persistence seam |
//! | [`transport`] | Transport and execution seams |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |

// ============================================================================
// Modules
// ============================================================================

/// Error types and result aliases.
///
/// Only the async handle, the builder and settings persistence return
/// [`Result<T>`].
pub mod error;

/// Type-safe identifiers for sessions and requests.
pub mod identifiers;

/// Outbound requests owned by the orchestrator.
pub mod request;

/// Per-request configuration resolvers.
pub mod resolve;

/// Admission scheduling.
///
/// Bounds concurrent request execution by connection class.
pub mod scheduler;

/// Session identity resolution and merge.
pub mod session;

/// Orchestrator configuration.
pub mod settings;

/// Orchestrator handle and event loop.
///
/// Use [`Stealth::builder()`] to create a running orchestrator.
pub mod stealth;

/// Transport and request-execution seams.
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Re-exports
// ============================================================================

// Orchestrator types
pub use stealth::{LifecycleState, Stealth, StealthBuilder};

// Request types
pub use request::{
    ProxyConfig, ProxyType, RequestConfig, RequestEvents, RequestInfo, RequestOutcome,
    TimelineEvent,
};

// Resolver types
pub use resolve::{
    BuiltinUserAgents, ContentMode, DomainMatcher, ModeProfile, Platform, SuffixMatcher,
    UserAgent, UserAgentCodec,
};

// Session types
pub use session::{HostGroup, RemoteIdentity, Session, TrackTarget};

// Settings types
pub use settings::{ConnectionClass, MemoryStore, Settings, SettingsStore};

// Transport types
pub use transport::{Execution, Services, Transport, TransportAcks};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{RequestId, SessionId};
