//! Settings persistence seam.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::Result;

use super::Settings;

// ============================================================================
// SettingsStore
// ============================================================================

/// Persists settings on behalf of the orchestrator.
///
/// The storage format belongs to the implementor.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Persists `settings`.
    ///
    /// `flush` is set when the process is about to disconnect and buffered
    /// writes must reach durable storage before returning.
    async fn save(&self, settings: &Settings, flush: bool) -> Result<()>;
}

// ============================================================================
// MemoryStore
// ============================================================================

/// Store that keeps every saved snapshot in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    saved: Mutex<Vec<Settings>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of saves so far.
    #[inline]
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saved.lock().len()
    }

    /// Returns the most recent snapshot.
    #[must_use]
    pub fn last(&self) -> Option<Settings> {
        self.saved.lock().last().cloned()
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn save(&self, settings: &Settings, flush: bool) -> Result<()> {
        let mut saved = self.saved.lock();
        saved.push(settings.clone());
        debug!(count = saved.len(), flush, "Settings saved to memory");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
