//! Test doubles for the transport and execution seams.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use url::Url;

use crate::error::{Error, Result};
use crate::request::{RequestConfig, RequestEvents, RequestOutcome};
use crate::resolve::ModeProfile;
use crate::settings::{Settings, SettingsStore};
use crate::stealth::{LifecycleState, Stealth};
use crate::transport::{Execution, Services, Transport, TransportAcks};

// ============================================================================
// ExecutionProbe
// ============================================================================

/// Counts start/stop calls on one execution.
#[derive(Debug, Default)]
pub(crate) struct ExecutionProbe {
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl ExecutionProbe {
    /// Creates an execution and the probe observing it.
    pub(crate) fn execution() -> (Box<dyn Execution>, Arc<ExecutionProbe>) {
        let probe = Arc::new(ExecutionProbe::default());
        (Box::new(ProbeExecution(Arc::clone(&probe))), probe)
    }

    pub(crate) fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub(crate) fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

struct ProbeExecution(Arc<ExecutionProbe>);

impl Execution for ProbeExecution {
    fn start(&mut self) {
        self.0.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn stop(&mut self) {
        self.0.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Plain configuration for `link`: pending mode, no overrides.
pub(crate) fn config_for(link: &str) -> RequestConfig {
    RequestConfig {
        url: Url::parse(link).unwrap(),
        mode: ModeProfile::pending(None),
        user_agent: None,
        proxy: None,
    }
}

// ============================================================================
// RecordingServices
// ============================================================================

struct Recorded {
    config: RequestConfig,
    events: RequestEvents,
    probe: Arc<ExecutionProbe>,
}

/// Services that record every execution they create.
#[derive(Default)]
pub(crate) struct RecordingServices {
    recorded: Mutex<Vec<Recorded>>,
}

impl RecordingServices {
    pub(crate) fn count(&self) -> usize {
        self.recorded.lock().len()
    }

    pub(crate) fn probes(&self) -> Vec<Arc<ExecutionProbe>> {
        self.recorded
            .lock()
            .iter()
            .map(|r| Arc::clone(&r.probe))
            .collect()
    }

    /// Reports `outcome` for the request queued under `link`.
    pub(crate) fn finish(&self, link: &str, outcome: RequestOutcome) -> bool {
        let recorded = self.recorded.lock();
        match recorded.iter().find(|r| r.config.link() == link) {
            Some(r) => {
                r.events.finish(outcome);
                true
            }
            None => false,
        }
    }
}

impl Services for RecordingServices {
    fn execute(&self, config: &RequestConfig, events: RequestEvents) -> Box<dyn Execution> {
        let (execution, probe) = ExecutionProbe::execution();
        self.recorded.lock().push(Recorded {
            config: config.clone(),
            events,
            probe,
        });
        execution
    }
}

// ============================================================================
// RecordingTransport
// ============================================================================

/// Transport double.
///
/// Auto mode acknowledges connect and disconnect immediately. Manual mode
/// holds the acks until the test delivers them.
pub(crate) struct RecordingTransport {
    services: Arc<RecordingServices>,
    auto_ack: bool,
    refuse: bool,
    acks: Mutex<Option<TransportAcks>>,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
}

impl RecordingTransport {
    fn with(auto_ack: bool, refuse: bool) -> Arc<Self> {
        Arc::new(Self {
            services: Arc::default(),
            auto_ack,
            refuse,
            acks: Mutex::new(None),
            connects: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
        })
    }

    pub(crate) fn new() -> Arc<Self> {
        Self::with(true, false)
    }

    pub(crate) fn manual() -> Arc<Self> {
        Self::with(false, false)
    }

    pub(crate) fn refusing() -> Arc<Self> {
        Self::with(true, true)
    }

    pub(crate) fn recorder(&self) -> Arc<RecordingServices> {
        Arc::clone(&self.services)
    }

    pub(crate) fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub(crate) fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    pub(crate) fn ack_connected(&self) -> bool {
        self.acks.lock().as_mut().is_some_and(TransportAcks::connected)
    }

    pub(crate) fn ack_disconnected(&self) -> bool {
        self.acks.lock().as_mut().is_some_and(TransportAcks::disconnected)
    }
}

impl Transport for RecordingTransport {
    fn connect(&self, mut acks: TransportAcks) -> bool {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.refuse {
            return false;
        }
        if self.auto_ack {
            acks.connected();
        }
        *self.acks.lock() = Some(acks);
        true
    }

    fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        if self.auto_ack {
            self.ack_disconnected();
        }
    }

    fn services(&self) -> Arc<dyn Services> {
        self.services.clone()
    }
}

// ============================================================================
// FailingStore
// ============================================================================

/// Store whose saves always fail.
pub(crate) struct FailingStore;

#[async_trait]
impl SettingsStore for FailingStore {
    async fn save(&self, _settings: &Settings, _flush: bool) -> Result<()> {
        Err(Error::settings("disk full"))
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Yields until the orchestrator reaches `expected`.
pub(crate) async fn settle(stealth: &Stealth, expected: LifecycleState) {
    for _ in 0..100 {
        if stealth.state().await.unwrap() == expected {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("orchestrator never reached {expected}");
}
