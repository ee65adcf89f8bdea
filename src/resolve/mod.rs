//! Per-request configuration resolvers.
//!
//! # Components
//!
//! | Type / Function | Description |
//! |-----------------|-------------|
//! | [`resolve_mode`] | Most specific [`ModeProfile`] for a URL |
//! | [`resolve_user_agent`] | [`UserAgent`] override for the configured [`Platform`] |
//! | [`DomainMatcher`] | Domain-pattern matching seam, default [`SuffixMatcher`] |
//! | [`UserAgentCodec`] | Render/parse seam, default [`BuiltinUserAgents`] |

// ============================================================================
// Submodules
// ============================================================================

/// Domain extraction and pattern matching.
pub mod domain;

/// Content mode profiles.
pub mod mode;

/// User-agent synthesis.
pub mod useragent;

// ============================================================================
// Re-exports
// ============================================================================

pub use domain::{DomainMatcher, SuffixMatcher, to_domain};
pub use mode::{ContentMode, ModeProfile, resolve_mode};
pub use useragent::{
    AgentKind, BuiltinUserAgents, Platform, SystemKind, UserAgent, UserAgentCodec,
    UserAgentProfile, resolve_user_agent,
};
