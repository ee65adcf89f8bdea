//! Process termination signals.
//!
//! SIGINT, SIGTERM and SIGQUIT (unix) or Ctrl-C (elsewhere) all map to the
//! same disconnect path.

// ============================================================================
// Imports
// ============================================================================

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::event::Command;

// ============================================================================
// Watcher
// ============================================================================

/// Spawns the signal watcher.
///
/// Holds only a weak sender, so the orchestrator shuts down normally once
/// every handle is dropped.
pub(crate) fn spawn_watcher(commands: mpsc::WeakUnboundedSender<Command>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut signals = match ProcessSignals::new() {
            Ok(signals) => signals,
            Err(e) => {
                warn!(error = %e, "Failed to install signal handlers");
                return;
            }
        };

        loop {
            let Some(name) = signals.recv().await else {
                debug!("Signal streams closed");
                break;
            };

            if !forward(&commands, name).await {
                break;
            }
        }

        debug!("Signal watcher exited");
    })
}

/// Requests a disconnect in response to `signal`.
///
/// Returns `false` once the orchestrator is gone.
async fn forward(commands: &mpsc::WeakUnboundedSender<Command>, signal: &'static str) -> bool {
    let Some(commands) = commands.upgrade() else {
        return false;
    };

    let (reply, rx) = oneshot::channel();
    if commands.send(Command::Disconnect { reply }).is_err() {
        return false;
    }

    match rx.await {
        Ok(disconnecting) => {
            info!(signal, disconnecting, "Termination signal received");
            true
        }
        Err(_) => false,
    }
}

// ============================================================================
// ProcessSignals
// ============================================================================

#[cfg(unix)]
struct ProcessSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
    quit: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ProcessSignals {
    fn new() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            quit: signal(SignalKind::quit())?,
        })
    }

    async fn recv(&mut self) -> Option<&'static str> {
        tokio::select! {
            received = self.interrupt.recv() => received.map(|()| "SIGINT"),
            received = self.terminate.recv() => received.map(|()| "SIGTERM"),
            received = self.quit.recv() => received.map(|()| "SIGQUIT"),
        }
    }
}

#[cfg(not(unix))]
struct ProcessSignals;

#[cfg(not(unix))]
impl ProcessSignals {
    fn new() -> std::io::Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> Option<&'static str> {
        tokio::signal::ctrl_c().await.ok().map(|()| "ctrl-c")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::stealth::{LifecycleState, Stealth};
    use crate::testing::{RecordingTransport, settle};

    #[tokio::test]
    async fn test_forward_disconnects() {
        let transport = RecordingTransport::new();
        let stealth = Stealth::builder()
            .transport(transport.clone())
            .debug(true)
            .build()
            .unwrap();
        stealth.connect().await.unwrap();
        settle(&stealth, LifecycleState::Connected).await;

        let weak = stealth_sender(&stealth);

        assert!(forward(&weak, "SIGTERM").await);
        settle(&stealth, LifecycleState::Disconnected).await;
        assert_eq!(transport.disconnects(), 1);
    }

    #[tokio::test]
    async fn test_forward_when_not_connected_is_noop() {
        let transport = RecordingTransport::new();
        let stealth = Stealth::builder().transport(transport.clone()).build().unwrap();

        assert!(forward(&stealth_sender(&stealth), "SIGINT").await);
        assert_eq!(transport.disconnects(), 0);
    }

    #[tokio::test]
    async fn test_forward_after_handles_dropped() {
        let transport = RecordingTransport::new();
        let stealth = Stealth::builder().transport(transport).build().unwrap();
        let weak = stealth_sender(&stealth);
        drop(stealth);

        assert!(!forward(&weak, "SIGQUIT").await);
    }

    #[tokio::test]
    async fn test_watcher_does_not_keep_loop_alive() {
        let transport = RecordingTransport::new();
        let stealth = Stealth::builder().transport(transport).build().unwrap();
        let watcher = stealth.watch_signals();
        let weak = stealth_sender(&stealth);
        drop(stealth);

        assert!(weak.upgrade().is_none());
        watcher.abort();
    }

    fn stealth_sender(stealth: &Stealth) -> mpsc::WeakUnboundedSender<Command> {
        stealth.command_sender().downgrade()
    }
}
