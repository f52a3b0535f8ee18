/// Statistics tracking for the event bus
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of event bus activity for monitoring
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventBusStats {
    /// Total number of `post` calls since the bus was created
    pub events_posted: u64,
    /// Posts whose event type had no registered handlers
    pub events_unhandled: u64,
    /// Handler invocations performed
    pub handler_invocations: u64,
    /// Invocations whose handler returned an error or panicked
    pub handler_failures: u64,
    /// Invocations slower than the configured threshold
    pub slow_invocations: u64,
    /// Successful `register` calls
    pub registrations: u64,
    /// `unregister` calls that removed at least one handler
    pub unregistrations: u64,
    /// Listeners currently registered
    pub listeners: usize,
    /// Event types with a published plan
    pub event_types: usize,
    /// Bindings across all published plans
    pub bindings: usize,
}

/// Lock-free counters updated on the dispatch path.
#[derive(Debug, Default)]
pub(super) struct StatsCounters {
    pub(super) events_posted: AtomicU64,
    pub(super) events_unhandled: AtomicU64,
    pub(super) handler_invocations: AtomicU64,
    pub(super) handler_failures: AtomicU64,
    pub(super) slow_invocations: AtomicU64,
    pub(super) registrations: AtomicU64,
    pub(super) unregistrations: AtomicU64,
}

impl StatsCounters {
    #[inline]
    pub(super) fn bump(counter: &AtomicU64, by: u64) {
        if by > 0 {
            counter.fetch_add(by, Ordering::Relaxed);
        }
    }

    pub(super) fn snapshot(&self) -> EventBusStats {
        EventBusStats {
            events_posted: self.events_posted.load(Ordering::Relaxed),
            events_unhandled: self.events_unhandled.load(Ordering::Relaxed),
            handler_invocations: self.handler_invocations.load(Ordering::Relaxed),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
            slow_invocations: self.slow_invocations.load(Ordering::Relaxed),
            registrations: self.registrations.load(Ordering::Relaxed),
            unregistrations: self.unregistrations.load(Ordering::Relaxed),
            ..EventBusStats::default()
        }
    }
}
