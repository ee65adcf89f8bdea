//! Per-domain content mode profiles.
//!
//! A [`ModeProfile`] says which kinds of content a request to a domain may
//! load. Profiles are configured by pattern; the most specific pattern wins.
//!
//! # Example
//!
//! ```
//! use stealth_core::resolve::{ContentMode, ModeProfile, SuffixMatcher, resolve_mode};
//! use url::Url;
//!
//! let modes = vec![
//!     ModeProfile::new("example.com", ContentMode::text_only()),
//!     ModeProfile::new("cdn.example.com", ContentMode::all()),
//! ];
//!
//! let url = Url::parse("https://cdn.example.com/logo.png").unwrap();
//! let mode = resolve_mode(Some(&url), &modes, &SuffixMatcher);
//! assert!(mode.mode.image);
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use tracing::trace;
use url::Url;

use super::domain::{DomainMatcher, to_domain};

// ============================================================================
// ContentMode
// ============================================================================

/// Content flags of a mode profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContentMode {
    /// Documents, stylesheets, scripts.
    #[serde(default)]
    pub text: bool,
    /// Images.
    #[serde(default)]
    pub image: bool,
    /// Audio streams.
    #[serde(default)]
    pub audio: bool,
    /// Video streams.
    #[serde(default)]
    pub video: bool,
    /// Anything else.
    #[serde(default)]
    pub other: bool,
}

impl ContentMode {
    /// Everything disabled. Used while a domain is pending classification.
    #[inline]
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            text: false,
            image: false,
            audio: false,
            video: false,
            other: false,
        }
    }

    /// Text only.
    #[inline]
    #[must_use]
    pub const fn text_only() -> Self {
        Self {
            text: true,
            ..Self::disabled()
        }
    }

    /// Everything enabled.
    #[inline]
    #[must_use]
    pub const fn all() -> Self {
        Self {
            text: true,
            image: true,
            audio: true,
            video: true,
            other: true,
        }
    }

    /// Returns `true` if no content type is enabled.
    #[inline]
    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        !(self.text || self.image || self.audio || self.video || self.other)
    }
}

// ============================================================================
// ModeProfile
// ============================================================================

/// Domain pattern mapped to content flags.
///
/// Configured profiles always carry a domain pattern. The resolver returns
/// a profile without a domain only when the request had no usable URL.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModeProfile {
    /// Domain pattern, or the looked-up domain for default profiles.
    pub domain: Option<String>,

    /// Enabled content types.
    #[serde(default)]
    pub mode: ContentMode,
}

impl ModeProfile {
    /// Creates a configured profile for a domain pattern.
    #[must_use]
    pub fn new(domain: impl Into<String>, mode: ContentMode) -> Self {
        Self {
            domain: Some(domain.into()),
            mode,
        }
    }

    /// Creates the pending-classification profile for a domain.
    #[must_use]
    pub fn pending(domain: Option<String>) -> Self {
        Self {
            domain,
            mode: ContentMode::disabled(),
        }
    }

    /// Length of the domain pattern, used as specificity.
    #[inline]
    fn specificity(&self) -> usize {
        self.domain.as_deref().map_or(0, str::len)
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Picks the mode profile for a URL.
///
/// Among all profiles whose pattern matches the URL's domain, the one with
/// the longest pattern wins; ties go to the first configured. When nothing
/// matches the result carries the domain with every flag off. A missing URL
/// or a URL without a host yields the disabled profile with no domain.
#[must_use]
pub fn resolve_mode(
    url: Option<&Url>,
    profiles: &[ModeProfile],
    matcher: &dyn DomainMatcher,
) -> ModeProfile {
    let Some(search) = url.and_then(to_domain) else {
        return ModeProfile::pending(None);
    };

    let mut best: Option<&ModeProfile> = None;

    for profile in profiles {
        let Some(pattern) = profile.domain.as_deref() else {
            continue;
        };

        if !matcher.matches(pattern, &search) {
            continue;
        }

        if best.is_none_or(|current| profile.specificity() > current.specificity()) {
            best = Some(profile);
        }
    }

    match best {
        Some(profile) => {
            trace!(domain = %search, pattern = ?profile.domain, "Mode profile matched");
            profile.clone()
        }
        None => ModeProfile::pending(Some(search)),
    }
}

// ============================================================================
// Tests
// ============================================================================
