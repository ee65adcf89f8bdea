//! Admission scheduler.
//!
//! While the orchestrator is connected, a periodic task asks the loop to
//! run the admission scan once per period. The task lives exactly as long
//! as the connection: [`AdmissionScheduler::start`] arms it once and
//! [`AdmissionScheduler::stop`] cancels it so a later reconnect can re-arm.
//!
//! ```text
//! ┌───────────────┐   AdmissionTick    ┌──────────────────────────────┐
//! │ interval task │ ─────────────────► │ loop: queue.admit(budget)    │
//! └───────────────┘   every period     └──────────────────────────────┘
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, trace};

use crate::request::RequestQueue;
use crate::settings::ConnectionClass;
use crate::stealth::event::LoopEvent;

// ============================================================================
// Constants
// ============================================================================

/// Default admission period.
pub const DEFAULT_ADMISSION_PERIOD: Duration = Duration::from_secs(1);

// ============================================================================
// AdmissionScheduler
// ============================================================================

/// Owner of the single periodic admission task.
#[derive(Debug)]
pub struct AdmissionScheduler {
    period: Duration,
    handle: Option<JoinHandle<()>>,
}

impl AdmissionScheduler {
    /// Creates a stopped scheduler.
    #[inline]
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            handle: None,
        }
    }

    /// Returns the admission period.
    #[inline]
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Returns `true` while the periodic task is armed.
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Arms the periodic task. No-op, returning `false`, if already armed.
    ///
    /// The first tick fires one period after arming.
    pub(crate) fn start(&mut self, events: mpsc::UnboundedSender<LoopEvent>) -> bool {
        if self.handle.is_some() {
            return false;
        }

        let period = self.period;
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if events.send(LoopEvent::AdmissionTick).is_err() {
                    break;
                }
            }

            trace!("Admission task exited");
        }));

        debug!(period_ms = period.as_millis() as u64, "Admission scheduler started");
        true
    }

    /// Cancels the periodic task. Returns `false` if it was not armed.
    pub fn stop(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                handle.abort();
                debug!("Admission scheduler stopped");
                true
            }
            None => false,
        }
    }
}

impl Drop for AdmissionScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

// ============================================================================
// Admission
// ============================================================================

/// Runs one admission pass over the queue.
///
/// Returns the number of requests started.
pub fn admit(queue: &mut RequestQueue, connection: ConnectionClass, debug: bool) -> usize {
    let budget = connection.admission_budget(debug);
    let started = queue.admit(budget);

    if started > 0 {
        debug!(
            budget,
            started,
            queued = queue.len(),
            connection = connection.as_str(),
            "Admitted requests"
        );
    }

    started
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::identifiers::RequestId;
    use crate::request::PendingRequest;
    use crate::testing::{ExecutionProbe, config_for};

    fn queue(count: usize) -> RequestQueue {
        let mut queue = RequestQueue::new();
        for i in 0..count {
            let link = format!("https://host{i}.example/");
            let (execution, _) = ExecutionProbe::execution();
            queue.push(PendingRequest::new(RequestId::generate(), config_for(&link), execution));
        }
        queue
    }

    #[test]
    fn test_admit_uses_class_budget() {
        for (class, expected) in [
            (ConnectionClass::Mobile, 2),
            (ConnectionClass::Broadband, 8),
            (ConnectionClass::Peer, 2),
            (ConnectionClass::Anonymizing, 2),
            (ConnectionClass::Unknown, 0),
        ] {
            let mut queue = queue(10);
            assert_eq!(admit(&mut queue, class, false), expected, "{class:?}");
        }
    }

    #[test]
    fn test_admit_debug_budget() {
        let mut queue = queue(10);
        assert_eq!(admit(&mut queue, ConnectionClass::Broadband, true), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_idempotent() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut scheduler = AdmissionScheduler::new(DEFAULT_ADMISSION_PERIOD);

        assert!(scheduler.start(tx.clone()));
        assert!(!scheduler.start(tx));
        assert!(scheduler.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_allows_rearm() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut scheduler = AdmissionScheduler::new(DEFAULT_ADMISSION_PERIOD);

        assert!(!scheduler.stop());
        scheduler.start(tx.clone());
        assert!(scheduler.stop());
        assert!(!scheduler.is_running());
        assert!(scheduler.start(tx));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_once_per_period() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = AdmissionScheduler::new(Duration::from_millis(500));
        scheduler.start(tx);

        tokio::time::sleep(Duration::from_millis(1250)).await;
        scheduler.stop();

        let mut ticks = 0;
        while let Ok(event) = rx.try_recv() {
            assert!(matches!(event, LoopEvent::AdmissionTick));
            ticks += 1;
        }
        assert_eq!(ticks, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_tick_after_stop() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = AdmissionScheduler::new(Duration::from_millis(100));
        scheduler.start(tx);
        scheduler.stop();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(rx.try_recv().is_err());
    }
}
