//! Pending fault queue
//!
//! Multi-producer, single-consumer mailbox between reporters and the
//! dispatch worker.
//! - `offer` appends and wakes the worker; it never waits on dispatch
//! - `drain_all` swaps the whole pending batch out in one step
//! - the queue lock is separate from the registry lock

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use super::types::Fault;

/// An entry in the mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultEvent {
    /// A detector reported a fault
    Reported(Fault),
    /// A detector reported that a fault no longer applies
    Cleared(Fault),
}

/// Why the consumer woke up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Events are pending
    Work,
    /// Shutdown was requested; pending events are abandoned
    Shutdown,
}

#[derive(Debug, Default)]
struct QueueInner {
    events: Vec<FaultEvent>,
    shutdown: bool,
}

/// The pending fault mailbox.
#[derive(Debug, Default)]
pub struct PendingFaultQueue {
    inner: Mutex<QueueInner>,
    available: Condvar,
}

impl PendingFaultQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append `event` and wake the consumer.
    ///
    /// Returns false, dropping the event, once shutdown was requested.
    pub fn offer(&self, event: FaultEvent) -> bool {
        let mut inner = self.lock();
        if inner.shutdown {
            return false;
        }
        inner.events.push(event);
        self.available.notify_one();
        true
    }

    /// Take every pending event, leaving the queue empty.
    pub fn drain_all(&self) -> Vec<FaultEvent> {
        std::mem::take(&mut self.lock().events)
    }

    /// Block until events are pending or shutdown is requested.
    pub fn wait_for_work(&self) -> WaitOutcome {
        let mut inner = self.lock();
        while inner.events.is_empty() && !inner.shutdown {
            inner = self
                .available
                .wait(inner)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if inner.shutdown {
            WaitOutcome::Shutdown
        } else {
            WaitOutcome::Work
        }
    }

    /// Refuse further offers and wake the consumer.
    pub fn request_shutdown(&self) {
        let mut inner = self.lock();
        inner.shutdown = true;
        self.available.notify_all();
    }

    /// Whether shutdown was requested.
    pub fn is_shut_down(&self) -> bool {
        self.lock().shutdown
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.lock().events.len()
    }

    /// Whether no events are pending.
    pub fn is_empty(&self) -> bool {
        self.lock().events.is_empty()
    }
}
