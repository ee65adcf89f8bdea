//! One-shot lifecycle acknowledgments from the transport.
//!
//! Each [`TransportAcks`] belongs to one connect attempt. The connect and
//! disconnect acknowledgments can each be delivered once; later calls are
//! ignored.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tokio::sync::{mpsc, oneshot};
use tracing::trace;

use crate::stealth::event::LoopEvent;

// ============================================================================
// TransportAcks
// ============================================================================

/// Acknowledgment handles passed to [`Transport::connect`](super::Transport::connect).
pub struct TransportAcks {
    connected: Option<oneshot::Sender<()>>,
    disconnected: Option<oneshot::Sender<()>>,
}

impl fmt::Debug for TransportAcks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportAcks")
            .field("connected_pending", &self.connected.is_some())
            .field("disconnected_pending", &self.disconnected.is_some())
            .finish()
    }
}

impl TransportAcks {
    /// Signals that the transport is up. Returns `false` if already sent
    /// or nobody is listening.
    pub fn connected(&mut self) -> bool {
        self.connected
            .take()
            .is_some_and(|tx| tx.send(()).is_ok())
    }

    /// Signals that the transport is down. Returns `false` if already sent
    /// or nobody is listening.
    pub fn disconnected(&mut self) -> bool {
        self.disconnected
            .take()
            .is_some_and(|tx| tx.send(()).is_ok())
    }

    /// Returns `true` while the disconnect acknowledgment is still pending.
    #[inline]
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.disconnected.is_some()
    }
}

// ============================================================================
// Wiring
// ============================================================================

/// Creates acks for connect attempt `attempt` and forwards them onto the
/// orchestrator loop.
///
/// A dropped sender forwards nothing.
pub(crate) fn subscribe(attempt: u64, events: &mpsc::UnboundedSender<LoopEvent>) -> TransportAcks {
    let (connected_tx, connected_rx) = oneshot::channel();
    let (disconnected_tx, disconnected_rx) = oneshot::channel();

    let tx = events.clone();
    tokio::spawn(async move {
        if connected_rx.await.is_ok() {
            let _ = tx.send(LoopEvent::TransportConnected { attempt });
        } else {
            trace!(attempt, "Connect ack dropped");
        }
    });

    let tx = events.clone();
    tokio::spawn(async move {
        if disconnected_rx.await.is_ok() {
            let _ = tx.send(LoopEvent::TransportDisconnected { attempt });
        } else {
            trace!(attempt, "Disconnect ack dropped");
        }
    });

    TransportAcks {
        connected: Some(connected_tx),
        disconnected: Some(disconnected_tx),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acks_are_delivered_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut acks = subscribe(3, &tx);

        assert!(acks.connected());
        assert!(!acks.connected());
        assert!(acks.is_pending());
        assert!(acks.disconnected());
        assert!(!acks.disconnected());
        assert!(!acks.is_pending());

        let mut seen = [false, false];
        for _ in 0..2 {
            match rx.recv().await {
                Some(LoopEvent::TransportConnected { attempt: 3 }) => seen[0] = true,
                Some(LoopEvent::TransportDisconnected { attempt: 3 }) => seen[1] = true,
                other => panic!("unexpected event: {other:?}"),
            }
        }
        assert_eq!(seen, [true, true]);
    }

    #[tokio::test]
    async fn test_dropped_acks_forward_nothing() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        drop(subscribe(1, &tx));
        drop(tx);

        assert!(rx.recv().await.is_none());
    }
}
