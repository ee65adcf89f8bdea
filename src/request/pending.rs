//! Queued requests, their configuration and lifecycle timeline.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, trace};
use url::Url;

use crate::identifiers::RequestId;
use crate::resolve::{ModeProfile, UserAgent};
use crate::stealth::event::LoopEvent;
use crate::transport::Execution;

use super::proxy::ProxyConfig;

// ============================================================================
// RequestConfig
// ============================================================================

/// Everything a request executor needs to run one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Target URL.
    pub url: Url,

    /// Content mode resolved for the URL's domain.
    pub mode: ModeProfile,

    /// User-agent override, `None` to keep the native identity.
    #[serde(rename = "ua")]
    pub user_agent: Option<UserAgent>,

    /// Proxy override, set on anonymizing connections.
    pub proxy: Option<ProxyConfig>,
}

impl RequestConfig {
    /// Returns the canonical link string identifying the request.
    #[inline]
    #[must_use]
    pub fn link(&self) -> &str {
        self.url.as_str()
    }
}

// ============================================================================
// RequestOutcome
// ============================================================================

/// Terminal notification from a request executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RequestOutcome {
    /// The request failed.
    Error {
        /// Failure description.
        message: String,
    },
    /// The target redirected elsewhere.
    Redirect {
        /// Redirect location.
        location: String,
    },
    /// A final response arrived.
    Response {
        /// Response status code.
        status: u16,
    },
}

impl RequestOutcome {
    fn timeline_event(&self) -> TimelineEvent {
        match self {
            Self::Error { .. } => TimelineEvent::Error,
            Self::Redirect { .. } => TimelineEvent::Redirect,
            Self::Response { .. } => TimelineEvent::Response,
        }
    }
}

// ============================================================================
// RequestEvents
// ============================================================================

/// Reporter handed to an executor for delivering its terminal notification.
///
/// Notifications are delivered back onto the orchestrator loop. Reporting
/// after the orchestrator has stopped is a no-op.
#[derive(Clone)]
pub struct RequestEvents {
    id: RequestId,
    events: mpsc::UnboundedSender<LoopEvent>,
}

impl fmt::Debug for RequestEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestEvents")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl RequestEvents {
    pub(crate) fn new(id: RequestId, events: mpsc::UnboundedSender<LoopEvent>) -> Self {
        Self { id, events }
    }

    /// Returns the id of the request this reporter belongs to.
    #[inline]
    #[must_use]
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Reports a failure.
    pub fn error(&self, message: impl Into<String>) {
        self.finish(RequestOutcome::Error {
            message: message.into(),
        });
    }

    /// Reports a redirect.
    pub fn redirect(&self, location: impl Into<String>) {
        self.finish(RequestOutcome::Redirect {
            location: location.into(),
        });
    }

    /// Reports a final response.
    pub fn response(&self, status: u16) {
        self.finish(RequestOutcome::Response { status });
    }

    /// Reports any terminal outcome.
    pub fn finish(&self, outcome: RequestOutcome) {
        let event = LoopEvent::RequestFinished {
            id: self.id,
            outcome,
        };
        if self.events.send(event).is_err() {
            trace!(request_id = %self.id, "Orchestrator gone, outcome dropped");
        }
    }
}

// ============================================================================
// Timeline
// ============================================================================

/// Lifecycle event recorded on a request timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimelineEvent {
    /// Request was queued.
    #[serde(rename = "@init")]
    Init,
    /// Request was admitted and started.
    #[serde(rename = "@start")]
    Start,
    /// Request was force-stopped.
    #[serde(rename = "@stop")]
    Stop,
    /// Request failed.
    #[serde(rename = "error")]
    Error,
    /// Request was redirected.
    #[serde(rename = "redirect")]
    Redirect,
    /// Request received its response.
    #[serde(rename = "response")]
    Response,
}

/// One timeline entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// What happened.
    pub event: TimelineEvent,
    /// When it happened.
    pub time: SystemTime,
}

/// Ordered lifecycle events of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timeline(Vec<TimelineEntry>);

impl Timeline {
    /// Appends an event stamped with the current time.
    pub fn record(&mut self, event: TimelineEvent) {
        self.0.push(TimelineEntry {
            event,
            time: SystemTime::now(),
        });
    }

    /// Returns `true` if the event was recorded at least once.
    #[inline]
    #[must_use]
    pub fn contains(&self, event: TimelineEvent) -> bool {
        self.0.iter().any(|entry| entry.event == event)
    }

    /// Returns the recorded events in order.
    pub fn events(&self) -> impl Iterator<Item = TimelineEvent> + '_ {
        self.0.iter().map(|entry| entry.event)
    }

    /// Returns the number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing was recorded.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// PendingRequest
// ============================================================================

/// A request owned by the orchestrator's queue.
pub struct PendingRequest {
    id: RequestId,
    config: RequestConfig,
    execution: Box<dyn Execution>,
    timeline: Timeline,
}

impl fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequest")
            .field("id", &self.id)
            .field("link", &self.link())
            .field("started", &self.is_started())
            .finish_non_exhaustive()
    }
}

impl PendingRequest {
    /// Wraps an execution created for `config`.
    #[must_use]
    pub fn new(id: RequestId, config: RequestConfig, execution: Box<dyn Execution>) -> Self {
        let mut timeline = Timeline::default();
        timeline.record(TimelineEvent::Init);

        Self {
            id,
            config,
            execution,
            timeline,
        }
    }

    /// Returns the request id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Returns the queue key.
    #[inline]
    #[must_use]
    pub fn link(&self) -> &str {
        self.config.link()
    }

    /// Returns the request configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    /// Returns the lifecycle timeline.
    #[inline]
    #[must_use]
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Returns `true` once the request carries a start marker.
    #[inline]
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.timeline.contains(TimelineEvent::Start)
    }

    /// Starts the execution. Returns `false` if it was already started.
    pub fn start(&mut self) -> bool {
        if self.is_started() {
            return false;
        }

        self.timeline.record(TimelineEvent::Start);
        self.execution.start();
        debug!(request_id = %self.id, link = %self.link(), "Request started");
        true
    }

    /// Stops the execution. Safe in any state, including never started.
    pub fn stop(&mut self) {
        self.timeline.record(TimelineEvent::Stop);
        self.execution.stop();
        trace!(request_id = %self.id, link = %self.link(), "Request stopped");
    }

    /// Records a terminal outcome on the timeline.
    pub fn record(&mut self, outcome: &RequestOutcome) {
        self.timeline.record(outcome.timeline_event());
    }

    /// Returns a read-only snapshot.
    #[must_use]
    pub fn info(&self) -> RequestInfo {
        RequestInfo {
            id: self.id,
            config: self.config.clone(),
            timeline: self.timeline.clone(),
        }
    }
}

// ============================================================================
// RequestInfo
// ============================================================================

/// Snapshot of a queued request, safe to hand to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestInfo {
    /// Request id.
    pub id: RequestId,
    /// Configuration the request runs with.
    pub config: RequestConfig,
    /// Timeline at snapshot time.
    pub timeline: Timeline,
}

impl RequestInfo {
    /// Returns the queue key.
    #[inline]
    #[must_use]
    pub fn link(&self) -> &str {
        self.config.link()
    }

    /// Returns `true` if the request was started.
    #[inline]
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.timeline.contains(TimelineEvent::Start)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::testing::{ExecutionProbe, config_for};

    #[test]
    fn test_new_request_is_queued_not_started() {
        let (execution, _probe) = ExecutionProbe::execution();
        let request = PendingRequest::new(
            RequestId::generate(),
            config_for("https://example.com/"),
            execution,
        );

        assert!(!request.is_started());
        assert_eq!(request.timeline().events().collect::<Vec<_>>(), [TimelineEvent::Init]);
        assert_eq!(request.link(), "https://example.com/");
    }

    #[test]
    fn test_start_is_idempotent() {
        let (execution, probe) = ExecutionProbe::execution();
        let mut request = PendingRequest::new(
            RequestId::generate(),
            config_for("https://example.com/"),
            execution,
        );

        assert!(request.start());
        assert!(!request.start());
        assert_eq!(probe.starts(), 1);
        assert!(request.is_started());
    }

    #[test]
    fn test_stop_unstarted_request() {
        let (execution, probe) = ExecutionProbe::execution();
        let mut request = PendingRequest::new(
            RequestId::generate(),
            config_for("https://example.com/"),
            execution,
        );

        request.stop();
        assert_eq!(probe.stops(), 1);
        assert_eq!(probe.starts(), 0);
        assert!(request.timeline().contains(TimelineEvent::Stop));
    }

    #[test]
    fn test_record_outcome() {
        let (execution, _probe) = ExecutionProbe::execution();
        let mut request = PendingRequest::new(
            RequestId::generate(),
            config_for("https://example.com/"),
            execution,
        );

        request.record(&RequestOutcome::Redirect {
            location: "https://example.org/".into(),
        });
        assert!(request.timeline().contains(TimelineEvent::Redirect));
    }

    #[test]
    fn test_events_reach_loop() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = RequestId::generate();
        let events = RequestEvents::new(id, tx);

        events.response(200);

        match rx.try_recv() {
            Ok(LoopEvent::RequestFinished { id: got, outcome }) => {
                assert_eq!(got, id);
                assert_eq!(outcome, RequestOutcome::Response { status: 200 });
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_events_after_loop_gone_is_noop() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        RequestEvents::new(RequestId::generate(), tx).error("connection reset");
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_string(&RequestOutcome::Response { status: 204 }).unwrap();
        assert_eq!(json, r#"{"type":"response","status":204}"#);
    }
}
