//! Messages consumed by the orchestrator loop.
//!
//! Two channels feed the loop. [`LoopEvent`] carries notifications from
//! tasks the loop spawned itself (transport acks, admission ticks, request
//! outcomes). [`Command`] carries calls made through the public handle,
//! each with a oneshot reply.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tokio::sync::oneshot;
use url::Url;

use crate::identifiers::RequestId;
use crate::request::{RequestInfo, RequestOutcome};
use crate::session::{Session, TrackTarget};
use crate::settings::Settings;

use super::state::LifecycleState;

// ============================================================================
// LoopEvent
// ============================================================================

/// Internal notification delivered onto the orchestrator loop.
#[derive(Debug)]
pub(crate) enum LoopEvent {
    /// Transport acknowledged connect attempt `attempt`.
    TransportConnected { attempt: u64 },
    /// Transport acknowledged it is down for attempt `attempt`.
    TransportDisconnected { attempt: u64 },
    /// Admission period elapsed.
    AdmissionTick,
    /// An executor reported a terminal outcome.
    RequestFinished {
        id: RequestId,
        outcome: RequestOutcome,
    },
}

// ============================================================================
// Command
// ============================================================================

/// Settings mutation applied on the loop.
pub(crate) type SettingsUpdate = Box<dyn FnOnce(&mut Settings) + Send>;

/// Call made through [`Stealth`](super::Stealth).
pub(crate) enum Command {
    Connect {
        reply: oneshot::Sender<bool>,
    },
    Disconnect {
        reply: oneshot::Sender<bool>,
    },
    Destroy {
        reply: oneshot::Sender<bool>,
    },
    Request {
        url: Url,
        reply: oneshot::Sender<RequestInfo>,
    },
    Track {
        target: Option<TrackTarget>,
        reply: oneshot::Sender<Session>,
    },
    Settings {
        reply: oneshot::Sender<Settings>,
    },
    UpdateSettings {
        update: SettingsUpdate,
        reply: oneshot::Sender<()>,
    },
    State {
        reply: oneshot::Sender<LifecycleState>,
    },
    PendingRequests {
        reply: oneshot::Sender<Vec<RequestInfo>>,
    },
    Sessions {
        reply: oneshot::Sender<Vec<Session>>,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "Connect",
            Self::Disconnect { .. } => "Disconnect",
            Self::Destroy { .. } => "Destroy",
            Self::Request { .. } => "Request",
            Self::Track { .. } => "Track",
            Self::Settings { .. } => "Settings",
            Self::UpdateSettings { .. } => "UpdateSettings",
            Self::State { .. } => "State",
            Self::PendingRequests { .. } => "PendingRequests",
            Self::Sessions { .. } => "Sessions",
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
