//! Orchestrator event loop.
//!
//! The loop task exclusively owns the request queue, the session registry
//! and the lifecycle state. Everything else talks to it through messages,
//! so no state is ever mutated from two places at once.
//!
//! # Event Loop
//!
//! - Loop events (transport acks, admission ticks, request outcomes) are
//!   drained before handle commands
//! - Handle commands are answered through their oneshot reply
//! - When every handle is gone the loop stops the scheduler, stops every
//!   queued request and takes the transport down

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::identifiers::RequestId;
use crate::request::{
    PendingRequest, ProxyConfig, RequestConfig, RequestEvents, RequestInfo, RequestOutcome,
    RequestQueue,
};
use crate::resolve::{DomainMatcher, UserAgentCodec, resolve_mode, resolve_user_agent};
use crate::scheduler::{self, AdmissionScheduler};
use crate::session::{Session, SessionRegistry, TrackTarget};
use crate::settings::{Settings, SettingsStore};
use crate::transport::{Transport, acks};

use super::event::{Command, LoopEvent, SettingsUpdate};
use super::state::LifecycleState;

// ============================================================================
// Collaborators
// ============================================================================

/// External collaborators the loop calls out to.
pub(crate) struct Collaborators {
    pub transport: Arc<dyn Transport>,
    pub store: Arc<dyn SettingsStore>,
    pub matcher: Arc<dyn DomainMatcher>,
    pub codec: Arc<dyn UserAgentCodec>,
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Loop-side state.
pub(crate) struct Orchestrator {
    settings: Settings,
    debug: bool,
    state: LifecycleState,
    attempt: u64,
    requests: RequestQueue,
    registry: SessionRegistry,
    scheduler: AdmissionScheduler,
    collaborators: Collaborators,
    events_tx: mpsc::UnboundedSender<LoopEvent>,
}

impl Orchestrator {
    /// Creates the loop state. `settings.sessions` seeds the registry.
    pub(crate) fn new(
        mut settings: Settings,
        debug: bool,
        scheduler: AdmissionScheduler,
        collaborators: Collaborators,
        events_tx: mpsc::UnboundedSender<LoopEvent>,
    ) -> Self {
        let registry = SessionRegistry::with_sessions(std::mem::take(&mut settings.sessions));

        Self {
            settings,
            debug,
            state: LifecycleState::Disconnected,
            attempt: 0,
            requests: RequestQueue::new(),
            registry,
            scheduler,
            collaborators,
            events_tx,
        }
    }

    /// Runs until every command sender is dropped.
    pub(crate) async fn run(
        mut self,
        mut events_rx: mpsc::UnboundedReceiver<LoopEvent>,
        mut command_rx: mpsc::UnboundedReceiver<Command>,
    ) {
        debug!(
            debug = self.debug,
            sessions = self.registry.len(),
            "Orchestrator loop started"
        );

        loop {
            tokio::select! {
                biased;

                event = events_rx.recv() => {
                    match event {
                        Some(event) => self.handle_event(event),
                        // Unreachable while `self.events_tx` is alive
                        None => break,
                    }
                }

                command = command_rx.recv() => {
                    match command {
                        Some(command) => self.handle_command(command),
                        None => {
                            debug!("Command channel closed");
                            break;
                        }
                    }
                }
            }
        }

        self.shutdown();
        debug!("Orchestrator loop terminated");
    }

    // ========================================================================
    // Events
    // ========================================================================

    fn handle_event(&mut self, event: LoopEvent) {
        match event {
            LoopEvent::TransportConnected { attempt } => self.on_connected(attempt),
            LoopEvent::TransportDisconnected { attempt } => self.on_disconnected(attempt),
            LoopEvent::AdmissionTick => self.on_tick(),
            LoopEvent::RequestFinished { id, outcome } => self.on_finished(id, &outcome),
        }
    }

    fn on_connected(&mut self, attempt: u64) {
        if attempt != self.attempt || self.state != LifecycleState::Connecting {
            trace!(attempt, state = %self.state, "Stale connect ack ignored");
            return;
        }

        self.state = LifecycleState::Connected;
        self.scheduler.start(self.events_tx.clone());
        info!(attempt, "Connected");
    }

    fn on_disconnected(&mut self, attempt: u64) {
        if attempt != self.attempt || self.state == LifecycleState::Disconnected {
            trace!(attempt, state = %self.state, "Stale disconnect ack ignored");
            return;
        }

        self.state = LifecycleState::Disconnected;
        self.scheduler.stop();
        let stopped = self.requests.stop_all();
        info!(attempt, stopped, "Disconnected");
    }

    fn on_tick(&mut self) {
        if self.state != LifecycleState::Connected {
            return;
        }

        scheduler::admit(
            &mut self.requests,
            self.settings.internet.connection,
            self.debug,
        );
    }

    fn on_finished(&mut self, id: RequestId, outcome: &RequestOutcome) {
        match self.requests.finish(id, outcome) {
            Some(request) => {
                debug!(request_id = %id, link = %request.link(), ?outcome, "Request finished");
            }
            None => trace!(request_id = %id, "Outcome for unknown request"),
        }
    }

    // ========================================================================
    // Commands
    // ========================================================================

    fn handle_command(&mut self, command: Command) {
        trace!(?command, "Command received");

        match command {
            Command::Connect { reply } => {
                let _ = reply.send(self.connect());
            }
            Command::Disconnect { reply } => {
                let _ = reply.send(self.disconnect());
            }
            Command::Destroy { reply } => {
                let _ = reply.send(self.destroy());
            }
            Command::Request { url, reply } => {
                let _ = reply.send(self.request(url));
            }
            Command::Track { target, reply } => {
                let _ = reply.send(self.track(target));
            }
            Command::Settings { reply } => {
                let _ = reply.send(self.settings_snapshot());
            }
            Command::UpdateSettings { update, reply } => {
                self.update_settings(update);
                let _ = reply.send(());
            }
            Command::State { reply } => {
                let _ = reply.send(self.state);
            }
            Command::PendingRequests { reply } => {
                let _ = reply.send(self.requests.infos());
            }
            Command::Sessions { reply } => {
                let _ = reply.send(self.registry.snapshot());
            }
        }
    }

    fn connect(&mut self) -> bool {
        if self.state != LifecycleState::Disconnected {
            debug!(state = %self.state, "Connect ignored");
            return false;
        }

        self.attempt += 1;
        self.state = LifecycleState::Connecting;

        let acks = acks::subscribe(self.attempt, &self.events_tx);
        if !self.collaborators.transport.connect(acks) {
            self.state = LifecycleState::Disconnected;
            warn!(attempt = self.attempt, "Transport refused to connect");
            return false;
        }

        debug!(attempt = self.attempt, "Connecting");
        true
    }

    fn disconnect(&mut self) -> bool {
        if self.state != LifecycleState::Connected {
            debug!(state = %self.state, "Disconnect ignored");
            return false;
        }

        self.state = LifecycleState::Disconnecting;
        let transport = Arc::clone(&self.collaborators.transport);

        if self.debug {
            debug!("Disconnecting without saving settings");
            transport.disconnect();
            return true;
        }

        let store = Arc::clone(&self.collaborators.store);
        let settings = self.settings_snapshot();
        tokio::spawn(async move {
            if let Err(e) = store.save(&settings, true).await {
                warn!(error = %e, "Failed to save settings before disconnect");
            }
            transport.disconnect();
        });

        debug!("Saving settings, then disconnecting");
        true
    }

    fn destroy(&mut self) -> bool {
        if self.state == LifecycleState::Connected {
            self.disconnect()
        } else {
            false
        }
    }

    fn request(&mut self, url: Url) -> RequestInfo {
        if let Some(existing) = self.requests.find(url.as_str()) {
            trace!(link = %url, "Request already queued");
            return existing.info();
        }

        let config = self.request_config(url);
        let id = RequestId::generate();
        let events = RequestEvents::new(id, self.events_tx.clone());
        let execution = self.collaborators.transport.services().execute(&config, events);

        let request = PendingRequest::new(id, config, execution);
        let info = request.info();
        self.requests.push(request);

        debug!(
            request_id = %id,
            link = %info.link(),
            queued = self.requests.len(),
            "Request queued"
        );
        info
    }

    fn request_config(&self, url: Url) -> RequestConfig {
        let mode = resolve_mode(
            Some(&url),
            &self.settings.modes,
            self.collaborators.matcher.as_ref(),
        );
        let user_agent = resolve_user_agent(
            Some(&url),
            self.settings.useragent,
            self.collaborators.codec.as_ref(),
        );
        let proxy = self
            .settings
            .internet
            .connection
            .is_anonymizing()
            .then(ProxyConfig::anonymizing);

        RequestConfig {
            url,
            mode,
            user_agent,
            proxy,
        }
    }

    fn track(&mut self, target: Option<TrackTarget>) -> Session {
        match target {
            Some(target) => self.registry.resolve(target, &self.settings.hosts).clone(),
            None => {
                let session = Session::new();
                debug!(session_id = %session.id(), "Unresolvable track input, fresh session");
                session
            }
        }
    }

    fn settings_snapshot(&self) -> Settings {
        let mut settings = self.settings.clone();
        settings.sessions = self.registry.snapshot();
        settings
    }

    fn update_settings(&mut self, update: SettingsUpdate) {
        update(&mut self.settings);

        // The registry owns sessions
        if !self.settings.sessions.is_empty() {
            warn!(
                ignored = self.settings.sessions.len(),
                "Session edits through settings are ignored"
            );
            self.settings.sessions.clear();
        }

        debug!(
            connection = self.settings.internet.connection.as_str(),
            modes = self.settings.modes.len(),
            hosts = self.settings.hosts.len(),
            "Settings updated"
        );
    }

    // ========================================================================
    // Shutdown
    // ========================================================================

    fn shutdown(&mut self) {
        self.scheduler.stop();
        let stopped = self.requests.stop_all();

        // A pending save task disconnects on its own
        if matches!(
            self.state,
            LifecycleState::Connecting | LifecycleState::Connected
        ) {
            self.collaborators.transport.disconnect();
        }
        self.state = LifecycleState::Disconnected;

        debug!(stopped, "Orchestrator shut down");
    }
}
