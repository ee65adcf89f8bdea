//! Request queue and the admission scan.
//!
//! The queue keeps requests in submission order and is keyed by link: a
//! link is queued at most once. The admission scan walks the queue front
//! to back, so the earliest submissions get the available slots.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::identifiers::RequestId;

use super::pending::{PendingRequest, RequestInfo, RequestOutcome};

// ============================================================================
// RequestQueue
// ============================================================================

/// FIFO of in-flight and waiting requests.
#[derive(Debug, Default)]
pub struct RequestQueue {
    requests: Vec<PendingRequest>,
    links: FxHashSet<String>,
}

// ============================================================================
// RequestQueue - Accessors
// ============================================================================

impl RequestQueue {
    /// Creates an empty queue.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of queued requests.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Returns `true` if nothing is queued.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Returns `true` if the link is queued.
    #[inline]
    #[must_use]
    pub fn contains(&self, link: &str) -> bool {
        self.links.contains(link)
    }

    /// Returns the queued request for a link.
    #[must_use]
    pub fn find(&self, link: &str) -> Option<&PendingRequest> {
        if !self.contains(link) {
            return None;
        }
        self.requests.iter().find(|request| request.link() == link)
    }

    /// Iterates requests in submission order.
    pub fn iter(&self) -> impl Iterator<Item = &PendingRequest> {
        self.requests.iter()
    }

    /// Returns the number of started requests.
    #[must_use]
    pub fn started(&self) -> usize {
        self.requests.iter().filter(|r| r.is_started()).count()
    }

    /// Returns snapshots of every request in submission order.
    #[must_use]
    pub fn infos(&self) -> Vec<RequestInfo> {
        self.requests.iter().map(PendingRequest::info).collect()
    }
}

// ============================================================================
// RequestQueue - Mutation
// ============================================================================

impl RequestQueue {
    /// Appends a request. Returns `false`, dropping it, if the link is
    /// already queued.
    pub fn push(&mut self, request: PendingRequest) -> bool {
        if !self.links.insert(request.link().to_string()) {
            return false;
        }
        self.requests.push(request);
        true
    }

    /// Records a terminal outcome and removes the request.
    ///
    /// Unknown ids (already removed, or stopped on disconnect) are ignored.
    pub fn finish(&mut self, id: RequestId, outcome: &RequestOutcome) -> Option<PendingRequest> {
        let index = self.requests.iter().position(|r| r.id() == id)?;
        let mut request = self.requests.remove(index);
        self.links.remove(request.link());
        request.record(outcome);
        Some(request)
    }

    /// Stops every request, started or not, and empties the queue.
    ///
    /// Returns the number of requests stopped.
    pub fn stop_all(&mut self) -> usize {
        let count = self.requests.len();
        for mut request in self.requests.drain(..) {
            request.stop();
        }
        self.links.clear();

        if count > 0 {
            debug!(count, "Stopped queued requests");
        }
        count
    }

    /// Starts waiting requests until `budget` requests are running.
    ///
    /// Already started requests count toward the budget and are never
    /// restarted. The scan stops at the first waiting request that does not
    /// fit. Returns the number of requests started by this call.
    pub fn admit(&mut self, budget: usize) -> usize {
        let mut active = 0;
        let mut started = 0;

        for request in &mut self.requests {
            if request.is_started() {
                active += 1;
            } else if active < budget {
                request.start();
                active += 1;
                started += 1;
            } else {
                break;
            }
        }

        started
    }
}

// ============================================================================
// Tests
// ============================================================================
