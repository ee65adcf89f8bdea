//! Orchestrator: lifecycle, request submission and session tracking.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Stealth`] | Cloneable async handle onto the orchestrator loop |
//! | [`StealthBuilder`] | Wires collaborators and spawns the loop |
//! | [`LifecycleState`] | Disconnected, connecting, connected, disconnecting |
//!
//! # Architecture
//!
//! ```text
//! Stealth ──Command──► ┌──────────────────────────────┐ ──► Transport
//!                      │ Orchestrator loop            │ ──► Services::execute
//! acks / ticks /       │  RequestQueue                │ ──► SettingsStore::save
//! outcomes ─LoopEvent► │  SessionRegistry             │
//!                      │  AdmissionScheduler          │
//!                      └──────────────────────────────┘
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Orchestrator builder.
pub mod builder;

/// Public handle.
pub mod core;

/// Loop messages.
pub(crate) mod event;

/// Event loop.
mod orchestrator;

/// Termination signal watcher.
mod signals;

/// Lifecycle states.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::StealthBuilder;
pub use self::core::Stealth;
pub use state::LifecycleState;
