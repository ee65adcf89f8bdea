//! Session identity resolution.
//!
//! Maps connecting clients to canonical, deduplicated sessions so browsing
//! state follows a host (or a configured host group) across reconnects.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Session`] | Identity with domain, host set and browsing state |
//! | [`SessionRegistry`] | Ordered live sessions and the resolve/merge engine |
//! | [`HostGroup`] | Configured domain shared by several addresses |
//! | [`RemoteIdentity`] | Address and port reported on connect |
//! | [`TrackTarget`] | Explicit session or remote identity to resolve |

// ============================================================================
// Submodules
// ============================================================================

/// Configured host groups.
pub mod host;

/// Session registry and resolution.
pub mod registry;

/// Remote identities and address normalization.
pub mod remote;

/// Session identity and merge.
#[allow(clippy::module_inception)]
pub mod session;

// ============================================================================
// Re-exports
// ============================================================================

pub use host::HostGroup;
pub use registry::{SessionRegistry, TrackTarget};
pub use remote::{CANONICAL_LOOPBACK, RemoteIdentity, normalize_address};
pub use session::Session;
