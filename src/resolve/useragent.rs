//! User-agent synthesis from the configured platform.
//!
//! The configured [`Platform`] names a browser or crawler profile on a
//! desktop or mobile system. [`resolve_user_agent`] renders that profile
//! through a [`UserAgentCodec`] and parses the result back, so the request
//! carries the same descriptor the codec would produce for a real header.

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

// ============================================================================
// Platform
// ============================================================================

/// Configured user-agent platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    /// No override; the request keeps its own native identity.
    #[default]
    #[serde(rename = "stealth")]
    Native,

    /// Desktop web browser.
    BrowserDesktop,

    /// Mobile web browser.
    BrowserMobile,

    /// Desktop crawler.
    SpiderDesktop,

    /// Mobile crawler.
    SpiderMobile,

    /// Unrecognized platform. Treated like [`Platform::Native`].
    #[serde(other)]
    Other,
}

impl Platform {
    /// Returns the profile encoded in this platform, if any.
    #[must_use]
    pub const fn profile(&self) -> Option<UserAgentProfile> {
        let (agent, system) = match self {
            Self::BrowserDesktop => (AgentKind::Browser, SystemKind::Desktop),
            Self::BrowserMobile => (AgentKind::Browser, SystemKind::Mobile),
            Self::SpiderDesktop => (AgentKind::Spider, SystemKind::Desktop),
            Self::SpiderMobile => (AgentKind::Spider, SystemKind::Mobile),
            Self::Native | Self::Other => return None,
        };

        Some(UserAgentProfile { agent, system })
    }
}

// ============================================================================
// UserAgentProfile
// ============================================================================

/// Kind of agent a user-agent string claims to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    /// Interactive web browser.
    Browser,
    /// Search engine crawler.
    Spider,
}

/// System class a user-agent string claims to run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemKind {
    /// Desktop operating system.
    Desktop,
    /// Phone or tablet.
    Mobile,
}

/// Agent/system pair to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserAgentProfile {
    /// Browser or crawler.
    #[serde(rename = "platform")]
    pub agent: AgentKind,
    /// Desktop or mobile.
    pub system: SystemKind,
}

// ============================================================================
// UserAgent
// ============================================================================

/// Parsed user-agent descriptor attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAgent {
    /// Browser or crawler.
    pub platform: AgentKind,
    /// Desktop or mobile.
    pub system: SystemKind,
    /// Product name (`Firefox`, `Googlebot`, ...).
    pub engine: String,
    /// Product version, if the string carried one.
    pub version: Option<String>,
    /// The full header value.
    pub raw: String,
}

// ============================================================================
// UserAgentCodec
// ============================================================================

/// Renders user-agent profiles to header strings and parses them back.
pub trait UserAgentCodec: Send + Sync {
    /// Renders a header value for the profile.
    fn render(&self, profile: UserAgentProfile) -> String;

    /// Parses a header value. Returns `None` for unrecognized strings.
    fn parse(&self, raw: &str) -> Option<UserAgent>;
}

// ============================================================================
// BuiltinUserAgents
// ============================================================================

const FIREFOX_DESKTOP: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:128.0) Gecko/20100101 Firefox/128.0";
const FIREFOX_MOBILE: &str =
    "Mozilla/5.0 (Android 14; Mobile; rv:128.0) Gecko/128.0 Firefox/128.0";
const CRAWLER_DESKTOP: &str =
    "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";
const CRAWLER_MOBILE: &str = "Mozilla/5.0 (Linux; Android 6.0.1; Nexus 5X Build/MMB29P) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Mobile Safari/537.36 \
     (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";

static PRODUCT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<engine>Googlebot|Bingbot|Firefox|Chrome|Safari)/(?P<version>[0-9][0-9.]*)")
        .unwrap_or_else(|e| panic!("invalid product pattern: {e}"))
});

static SPIDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(bot|crawler|spider)\b|bot/")
        .unwrap_or_else(|e| panic!("invalid spider pattern: {e}"))
});

static MOBILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(Mobile|Android|iPhone|iPad)\b")
        .unwrap_or_else(|e| panic!("invalid mobile pattern: {e}"))
});

/// Default codec with one fixed header per profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinUserAgents;

impl UserAgentCodec for BuiltinUserAgents {
    fn render(&self, profile: UserAgentProfile) -> String {
        match (profile.agent, profile.system) {
            (AgentKind::Browser, SystemKind::Desktop) => FIREFOX_DESKTOP,
            (AgentKind::Browser, SystemKind::Mobile) => FIREFOX_MOBILE,
            (AgentKind::Spider, SystemKind::Desktop) => CRAWLER_DESKTOP,
            (AgentKind::Spider, SystemKind::Mobile) => CRAWLER_MOBILE,
        }
        .to_string()
    }

    fn parse(&self, raw: &str) -> Option<UserAgent> {
        let platform = if SPIDER_RE.is_match(raw) {
            AgentKind::Spider
        } else {
            AgentKind::Browser
        };

        let system = if MOBILE_RE.is_match(raw) {
            SystemKind::Mobile
        } else {
            SystemKind::Desktop
        };

        // Crawlers often embed a browser token; prefer the bot product.
        let mut products = PRODUCT_RE.captures_iter(raw);
        let captures = match platform {
            AgentKind::Spider => PRODUCT_RE
                .captures_iter(raw)
                .find(|c| c["engine"].ends_with("bot"))
                .or_else(|| products.next()),
            AgentKind::Browser => products.next(),
        }?;

        Some(UserAgent {
            platform,
            system,
            engine: captures["engine"].to_string(),
            version: Some(captures["version"].to_string()),
            raw: raw.to_string(),
        })
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Synthesizes the user-agent override for a request.
///
/// Returns `None` when the URL is missing or the platform is native or
/// unrecognized. Otherwise the platform's profile is rendered and parsed
/// back through the codec.
#[must_use]
pub fn resolve_user_agent(
    url: Option<&Url>,
    platform: Platform,
    codec: &dyn UserAgentCodec,
) -> Option<UserAgent> {
    url?;
    let profile = platform.profile()?;
    codec.parse(&codec.render(profile))
}

// ============================================================================
// Tests
// ============================================================================
